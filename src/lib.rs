pub mod collector;
pub mod config;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod strategy;

pub use collector::{CoinbaseClient, MarketData};
pub use config::{AppConfig, RiskMode, StrategyParams};
pub use domain::{AccountState, MarketId, Position, PriceSeries};
pub use error::{GambitError, Result};
pub use strategy::{
    Engine, MarketScorer, MarketSelector, PositionManager, RandomSampler, RiskController, Sampler,
    Score, TradeJournal,
};
