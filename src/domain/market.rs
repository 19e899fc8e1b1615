use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum number of closes required before a series may be scored.
pub const MIN_SCORING_LEN: usize = 30;

/// Spot market identifier (e.g. "BTC-USD")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(String);

impl MarketId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MarketId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Chronological close prices for one market, oldest first.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    closes: Vec<Decimal>,
}

impl PriceSeries {
    pub fn new(closes: Vec<Decimal>) -> Self {
        Self { closes }
    }

    pub fn closes(&self) -> &[Decimal] {
        &self.closes
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Most recent close, i.e. the current price as of the series.
    pub fn last(&self) -> Option<Decimal> {
        self.closes.last().copied()
    }

    /// Whether the series is long enough for any scoring decision.
    pub fn has_scoring_history(&self) -> bool {
        self.closes.len() >= MIN_SCORING_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_scoring_history_threshold() {
        let short = PriceSeries::new(vec![dec!(1); MIN_SCORING_LEN - 1]);
        assert!(!short.has_scoring_history());

        let enough = PriceSeries::new(vec![dec!(1); MIN_SCORING_LEN]);
        assert!(enough.has_scoring_history());
    }

    #[test]
    fn test_last_close() {
        let series = PriceSeries::new(vec![dec!(1), dec!(2), dec!(3)]);
        assert_eq!(series.last(), Some(dec!(3)));
        assert_eq!(PriceSeries::new(vec![]).last(), None);
    }
}
