use crate::domain::{MarketId, Position};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// Simulated account: cash plus the set of open positions.
///
/// Cash decreases by exactly the spend amount on entry and increases by
/// exactly the sale proceeds on exit; entries are sized as a fraction of
/// current cash so the balance can never go negative.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub cash_balance: Decimal,
    pub positions: Vec<Position>,
    pub trade_count: u64,
}

impl AccountState {
    pub fn new(starting_balance: Decimal) -> Self {
        Self {
            cash_balance: starting_balance,
            positions: Vec::new(),
            trade_count: 0,
        }
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_holding(&self, market: &MarketId) -> bool {
        self.positions.iter().any(|p| &p.market == market)
    }

    pub fn held_markets(&self) -> HashSet<MarketId> {
        self.positions.iter().map(|p| p.market.clone()).collect()
    }

    /// Cash plus the value of all open positions at the last known prices.
    ///
    /// A position whose market has no fresh price is valued at its entry
    /// price so equity stays defined rather than silently shrinking.
    pub fn equity(&self, prices: &HashMap<MarketId, Decimal>) -> Decimal {
        let mut total = self.cash_balance;
        for pos in &self.positions {
            let price = prices.get(&pos.market).copied().unwrap_or(pos.entry_price);
            total += pos.value_at(price);
        }
        total
    }
}
