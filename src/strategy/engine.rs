//! Decision engine: the periodic scan/decide/act loop.
//!
//! One cycle refreshes prices for held positions, runs the risk gates,
//! closes positions that hit their exit thresholds, and opens at most one
//! new position from a random slice of the universe.

use crate::collector::MarketData;
use crate::config::AppConfig;
use crate::domain::{AccountState, MarketId};
use crate::error::Result;
use crate::strategy::journal::{TradeEvent, TradeJournal};
use crate::strategy::positions::PositionManager;
use crate::strategy::risk::RiskController;
use crate::strategy::sampler::Sampler;
use crate::strategy::scorer::MarketScorer;
use crate::strategy::selector::MarketSelector;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info, warn};

pub struct Engine<D: MarketData, S: Sampler> {
    data: D,
    sampler: S,
    positions: PositionManager,
    journal: TradeJournal,
    account: AccountState,
    risk: RiskController,

    universe: Vec<MarketId>,
    markets_per_scan: usize,
    lookback_candles: usize,
    granularity_secs: u32,
    poll_interval: Duration,
    error_backoff: Duration,
    scorer: MarketScorer,
}

impl<D: MarketData, S: Sampler> Engine<D, S> {
    pub fn new(config: &AppConfig, data: D, sampler: S) -> Self {
        let params = config.params();
        let journal = match &config.journal.path {
            Some(path) => TradeJournal::new(path),
            None => TradeJournal::disabled(),
        };
        let account = AccountState::new(config.account.start_balance);
        let risk = RiskController::new(&params, Utc::now().date_naive(), account.cash_balance);

        Self {
            data,
            sampler,
            positions: PositionManager::new(params.clone(), journal.clone()),
            journal,
            account,
            risk,
            universe: config
                .engine
                .universe
                .iter()
                .map(|s| MarketId::from(s.as_str()))
                .collect(),
            markets_per_scan: config.engine.markets_per_scan,
            lookback_candles: config.data.lookback_candles,
            granularity_secs: config.data.granularity_secs,
            poll_interval: Duration::from_secs(config.engine.poll_interval_secs),
            error_backoff: Duration::from_secs(config.engine.error_backoff_secs),
            scorer: MarketScorer::new(params),
        }
    }

    pub fn account(&self) -> &AccountState {
        &self.account
    }

    pub fn risk(&self) -> &RiskController {
        &self.risk
    }

    /// Run cycles forever, sleeping between them. Cycle errors are logged
    /// and retried after a backoff; they never kill the loop.
    pub async fn run(&mut self) {
        info!(
            "Engine started: {} markets in universe, {} per scan, polling every {:?}",
            self.universe.len(),
            self.markets_per_scan,
            self.poll_interval
        );

        loop {
            match self.cycle(Utc::now()).await {
                Ok(()) => tokio::time::sleep(self.poll_interval).await,
                Err(e) => {
                    error!("Cycle failed: {}; backing off {:?}", e, self.error_backoff);
                    tokio::time::sleep(self.error_backoff).await;
                }
            }
        }
    }

    /// One full decision cycle at the given wall-clock instant.
    pub async fn cycle(&mut self, now: DateTime<Utc>) -> Result<()> {
        let prices = self.latest_prices().await;
        let equity = self.account.equity(&prices);

        if self.risk.begin_cycle(now.date_naive(), equity) {
            self.journal_drawdown_lock(equity);
        }

        let closed = self.positions.check_exits(&mut self.account, &prices, &mut self.risk);
        let equity = if closed.is_empty() {
            equity
        } else {
            // Exits moved cash around; re-check the drawdown on the
            // post-exit equity so a losing close can still trip the latch.
            let equity = self.account.equity(&prices);
            if self.risk.observe_equity(equity) {
                self.journal_drawdown_lock(equity);
            }
            equity
        };

        info!(
            "Cycle: equity={:.2}, cash={:.2}, positions={}, drawdown={:.2}%, streak={}, trades={}",
            equity,
            self.account.cash_balance,
            self.account.open_count(),
            self.risk.drawdown(equity) * Decimal::from(100),
            self.risk.losing_streak(),
            self.account.trade_count
        );

        if let Err(block) = self.risk.check_entry(self.account.open_count()) {
            info!("No entry this cycle: {}", block);
            self.journal.record(&TradeEvent::hold(
                self.account.cash_balance,
                self.account.open_count(),
                equity,
                format!("{}", block),
            ));
            return Ok(());
        }

        let candidates = self.sampler.sample(&self.universe, self.markets_per_scan);
        let held = self.account.held_markets();
        let selector = MarketSelector::new(
            &self.data,
            self.scorer.clone(),
            self.lookback_candles,
            self.granularity_secs,
        );

        match selector.pick_best(&candidates, &held).await {
            Some(selected) => {
                info!(
                    "Best candidate: {} @ {} (score {:.4})",
                    selected.market, selected.price, selected.score
                );
                if let Err(refusal) = self.positions.enter(
                    &mut self.account,
                    selected.market,
                    selected.price,
                    now,
                    &prices,
                ) {
                    info!("Entry refused: {}", refusal);
                    self.journal.record(&TradeEvent::hold(
                        self.account.cash_balance,
                        self.account.open_count(),
                        equity,
                        format!("entry refused: {}", refusal),
                    ));
                }
            }
            None => {
                info!("No acceptable candidate among {} scanned", candidates.len());
                self.journal.record(&TradeEvent::hold(
                    self.account.cash_balance,
                    self.account.open_count(),
                    equity,
                    "no acceptable candidate",
                ));
            }
        }

        Ok(())
    }

    /// Latest prices for every held market. A market whose price fetch
    /// fails is simply absent, which leaves its position untouched this
    /// cycle and values it at entry price in the equity figure.
    async fn latest_prices(&self) -> HashMap<MarketId, Decimal> {
        let mut prices = HashMap::new();
        for market in self.account.held_markets() {
            match self.data.fetch_latest_price(&market).await {
                Ok(price) => {
                    prices.insert(market, price);
                }
                Err(e) => {
                    warn!("Failed to fetch latest price for {}: {}", market, e);
                }
            }
        }
        prices
    }

    fn journal_drawdown_lock(&self, equity: Decimal) {
        self.journal.record(&TradeEvent::drawdown_lock(
            self.account.cash_balance,
            self.account.open_count(),
            equity,
            self.risk.drawdown(equity),
        ));
    }
}
