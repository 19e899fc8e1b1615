//! Candidate selection across a batch of markets.

use crate::collector::MarketData;
use crate::domain::{MarketId, PriceSeries};
use crate::strategy::scorer::{MarketScorer, Score};
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, warn};

/// The winning candidate of one scan
#[derive(Debug, Clone)]
pub struct Selected {
    pub market: MarketId,
    /// Latest close of the fetched series, used as the entry price
    pub price: Decimal,
    pub score: Decimal,
}

/// Fetches and scores a batch of candidates, keeping the best accepted one
pub struct MarketSelector<'a, D: MarketData> {
    data: &'a D,
    scorer: MarketScorer,
    lookback_candles: usize,
    granularity_secs: u32,
}

impl<'a, D: MarketData> MarketSelector<'a, D> {
    pub fn new(
        data: &'a D,
        scorer: MarketScorer,
        lookback_candles: usize,
        granularity_secs: u32,
    ) -> Self {
        Self {
            data,
            scorer,
            lookback_candles,
            granularity_secs,
        }
    }

    /// Pick the best accepted candidate not already held.
    ///
    /// Fetch failures and rejections are silent skips; on an equal score
    /// the first-encountered candidate wins.
    pub async fn pick_best(
        &self,
        candidates: &[MarketId],
        held: &HashSet<MarketId>,
    ) -> Option<Selected> {
        let mut best: Option<Selected> = None;
        let mut best_score = Score::Rejected(crate::strategy::RejectReason::InsufficientHistory);

        for market in candidates {
            if held.contains(market) {
                debug!("{} already held, skipping", market);
                continue;
            }

            let series: PriceSeries = match self
                .data
                .fetch_series(market, self.lookback_candles, self.granularity_secs)
                .await
            {
                Ok(series) => series,
                Err(e) => {
                    warn!("Failed to fetch candles for {}: {}", market, e);
                    continue;
                }
            };
            let Some(price) = series.last() else {
                continue;
            };

            let score = self.scorer.score(&series);
            debug!("{} score: {}", market, score);

            if score.beats(&best_score) {
                if let Score::Accepted(value) = score {
                    best = Some(Selected {
                        market: market.clone(),
                        price,
                        score: value,
                    });
                }
                best_score = score;
            }
        }

        best
    }
}
