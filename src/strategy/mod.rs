//! Strategy and risk-control engine.
//!
//! Scoring and selection decide *what* to buy, the risk controller decides
//! *whether* buying is allowed, the position manager performs the simulated
//! entries/exits, and the engine ties it all together in a polling loop.

mod engine;
mod journal;
mod positions;
mod risk;
mod sampler;
mod scorer;
mod selector;

pub use engine::Engine;
pub use journal::{TradeEvent, TradeJournal};
pub use positions::{ClosedTrade, EntryRefusal, ExitReason, PositionManager};
pub use risk::{EntryBlock, RiskController};
pub use sampler::{RandomSampler, Sampler};
pub use scorer::{MarketScorer, RejectReason, Score};
pub use selector::{MarketSelector, Selected};
