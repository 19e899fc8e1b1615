use crate::domain::MarketId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open simulated position. Created on entry, removed on exit.
///
/// Invariants: `amount > 0` and `entry_price > 0` for every live position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub market: MarketId,
    pub amount: Decimal,
    pub entry_price: Decimal,
    pub entry_time: DateTime<Utc>,
}

impl Position {
    pub fn new(
        market: MarketId,
        amount: Decimal,
        entry_price: Decimal,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            market,
            amount,
            entry_price,
            entry_time,
        }
    }

    /// Fractional price change of `price` against the entry price.
    pub fn change_pct(&self, price: Decimal) -> Decimal {
        (price - self.entry_price) / self.entry_price
    }

    /// Position value at the given price.
    pub fn value_at(&self, price: Decimal) -> Decimal {
        self.amount * price
    }
}
