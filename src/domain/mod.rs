//! Core domain types: markets, price history, positions, account state.

mod account;
mod market;
mod position;

pub use account::AccountState;
pub use market::{MarketId, PriceSeries, MIN_SCORING_LEN};
pub use position::Position;
