//! Market attractiveness scoring.
//!
//! Applies the indicator filters to one market's close series and produces
//! either an accepted numeric score or a typed rejection. Any accepted
//! score outranks any rejection, so callers never compare against a magic
//! sentinel value.

use crate::config::StrategyParams;
use crate::domain::PriceSeries;
use crate::indicators::{average_abs_return, rsi, sma};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;

/// Short/long moving-average windows for the trend filter
const SHORT_SMA_PERIOD: usize = 9;
const LONG_SMA_PERIOD: usize = 21;
/// RSI lookback
const RSI_PERIOD: usize = 14;

/// Weight of the trend term; trend dominates the accepted score
const TREND_WEIGHT: Decimal = dec!(1000);
/// Maximum bonus for RSI / volatility sitting mid-band
const CENTERING_WEIGHT: Decimal = dec!(5);

/// Why a market was rejected by the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Fewer than the minimum closes required for scoring
    InsufficientHistory,
    /// One of the indicators could not be computed
    IndicatorUnavailable,
    /// Trend below the configured minimum strength (or not an uptrend)
    WeakTrend,
    /// RSI outside the acceptance band
    RsiOutOfBand,
    /// Volatility outside the acceptance band
    VolatilityOutOfBand,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::InsufficientHistory => "insufficient history",
            RejectReason::IndicatorUnavailable => "indicator unavailable",
            RejectReason::WeakTrend => "weak trend",
            RejectReason::RsiOutOfBand => "RSI out of band",
            RejectReason::VolatilityOutOfBand => "volatility out of band",
        };
        write!(f, "{}", s)
    }
}

/// Scoring outcome: accepted with a value, or rejected with a reason
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Accepted(Decimal),
    Rejected(RejectReason),
}

impl Score {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Score::Accepted(_))
    }

    /// Strict ordering used for candidate selection: any accepted score
    /// beats any rejection, accepted scores compare by value, rejections
    /// never beat anything. Ties do not beat, so the first candidate wins.
    pub fn beats(&self, other: &Score) -> bool {
        match (self, other) {
            (Score::Accepted(a), Score::Accepted(b)) => a > b,
            (Score::Accepted(_), Score::Rejected(_)) => true,
            (Score::Rejected(_), _) => false,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Accepted(v) => write!(f, "{:.4}", v),
            Score::Rejected(reason) => write!(f, "rejected ({})", reason),
        }
    }
}

/// Scores one market's series against the configured filters
#[derive(Debug, Clone)]
pub struct MarketScorer {
    params: StrategyParams,
}

impl MarketScorer {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }

    /// Score a close series. All filters must pass for acceptance.
    pub fn score(&self, series: &PriceSeries) -> Score {
        if !series.has_scoring_history() {
            return Score::Rejected(RejectReason::InsufficientHistory);
        }
        let closes = series.closes();

        let short_ma = sma(closes, SHORT_SMA_PERIOD);
        let long_ma = sma(closes, LONG_SMA_PERIOD);
        let current_rsi = rsi(closes, RSI_PERIOD);
        let volatility = average_abs_return(closes, self.params.volatility_window);

        let (short_ma, long_ma, current_rsi, volatility) =
            match (short_ma, long_ma, current_rsi, volatility) {
                (Some(s), Some(l), Some(r), Some(v)) => (s, l, r, v),
                _ => return Score::Rejected(RejectReason::IndicatorUnavailable),
            };

        let trend = (short_ma - long_ma) / long_ma;

        // Filters must all pass; only uptrends are considered.
        if trend <= self.params.min_trend_strength {
            return Score::Rejected(RejectReason::WeakTrend);
        }
        if current_rsi < self.params.rsi_buy_min || current_rsi > self.params.rsi_buy_max {
            return Score::Rejected(RejectReason::RsiOutOfBand);
        }
        if volatility < self.params.min_volatility || volatility > self.params.max_volatility {
            return Score::Rejected(RejectReason::VolatilityOutOfBand);
        }

        Score::Accepted(self.accepted_score(trend, current_rsi, volatility))
    }

    /// Combine passing indicators into a single score. Trend dominates and
    /// the score is strictly increasing in trend; the secondary terms
    /// reward RSI and volatility sitting near the center of their bands.
    fn accepted_score(&self, trend: Decimal, rsi_value: Decimal, volatility: Decimal) -> Decimal {
        trend * TREND_WEIGHT
            + centering_bonus(rsi_value, self.params.rsi_buy_min, self.params.rsi_buy_max)
            + centering_bonus(
                volatility,
                self.params.min_volatility,
                self.params.max_volatility,
            )
    }
}

/// Bonus in `[0, CENTERING_WEIGHT]`: maximal at the band midpoint, zero at
/// the band edges.
fn centering_bonus(value: Decimal, band_min: Decimal, band_max: Decimal) -> Decimal {
    let half_width = (band_max - band_min) / dec!(2);
    if half_width <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mid = (band_max + band_min) / dec!(2);
    let offset = (value - mid).abs() / half_width;
    (Decimal::ONE - offset) * CENTERING_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MIN_SCORING_LEN;

    fn scorer() -> MarketScorer {
        MarketScorer::new(StrategyParams::conservative())
    }

    /// Gentle uptrend with alternating pullbacks: passes every filter in
    /// conservative mode (trend ~0.45%, RSI ~61, volatility ~0.33%).
    fn trending_series() -> PriceSeries {
        let mut closes = vec![dec!(100)];
        for i in 0..40 {
            let prev = *closes.last().unwrap();
            let next = if i % 2 == 0 {
                prev * dec!(1.004)
            } else {
                prev * dec!(0.9975)
            };
            closes.push(next);
        }
        PriceSeries::new(closes)
    }

    use rust_decimal_macros::dec;

    #[test]
    fn test_short_series_rejected() {
        let series = PriceSeries::new(vec![dec!(100); MIN_SCORING_LEN - 1]);
        assert_eq!(
            scorer().score(&series),
            Score::Rejected(RejectReason::InsufficientHistory)
        );
    }

    #[test]
    fn test_flat_series_rejected_for_trend() {
        let series = PriceSeries::new(vec![dec!(100); 40]);
        assert_eq!(
            scorer().score(&series),
            Score::Rejected(RejectReason::WeakTrend)
        );
    }

    #[test]
    fn test_trending_series_accepted() {
        let score = scorer().score(&trending_series());
        assert!(score.is_accepted(), "expected accepted, got {}", score);
    }

    #[test]
    fn test_runaway_rally_rejected_for_rsi() {
        // Monotonic rally: RSI = 100, far above the buy band.
        let mut closes = vec![dec!(100)];
        for _ in 0..40 {
            let prev = *closes.last().unwrap();
            closes.push(prev * dec!(1.005));
        }
        assert_eq!(
            scorer().score(&PriceSeries::new(closes)),
            Score::Rejected(RejectReason::RsiOutOfBand)
        );
    }

    #[test]
    fn test_accepted_score_monotonic_in_trend() {
        let s = scorer();
        let rsi_value = dec!(55);
        let vol = dec!(0.005);

        let low = s.accepted_score(dec!(0.003), rsi_value, vol);
        let mid = s.accepted_score(dec!(0.004), rsi_value, vol);
        let high = s.accepted_score(dec!(0.010), rsi_value, vol);
        assert!(low < mid && mid < high);
    }

    #[test]
    fn test_accepted_always_beats_rejected() {
        // Even a barely-accepted score with edge-of-band indicators wins.
        let s = scorer();
        let tiny = Score::Accepted(s.accepted_score(dec!(0.0021), dec!(40), dec!(0.03)));
        let rejected = Score::Rejected(RejectReason::WeakTrend);

        assert!(tiny.beats(&rejected));
        assert!(!rejected.beats(&tiny));
        assert!(!rejected.beats(&rejected));
    }

    #[test]
    fn test_ties_do_not_beat() {
        let a = Score::Accepted(dec!(3));
        assert!(!a.beats(&Score::Accepted(dec!(3))));
        assert!(a.beats(&Score::Accepted(dec!(2.9))));
    }

    #[test]
    fn test_centering_bonus_peaks_mid_band() {
        let mid = centering_bonus(dec!(52.5), dec!(40), dec!(65));
        let edge = centering_bonus(dec!(40), dec!(40), dec!(65));
        assert_eq!(mid, CENTERING_WEIGHT);
        assert_eq!(edge, Decimal::ZERO);
    }
}
