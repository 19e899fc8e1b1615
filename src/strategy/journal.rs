//! Trade journaling.
//!
//! Append-only JSON-lines record of simulated trading events. The journal
//! is an observability sink: `record` never fails the caller, write errors
//! are logged and swallowed.

use crate::domain::MarketId;
use crate::strategy::positions::ExitReason;
use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

const PRICE_DP: u32 = 8;
const AMOUNT_DP: u32 = 8;
const CASH_DP: u32 = 2;

/// One journal record
#[derive(Debug, Clone, Serialize)]
pub struct TradeEvent {
    /// UTC timestamp, second precision
    pub timestamp: DateTime<Utc>,
    /// Event kind: BUY, SELL_TAKE_PROFIT, SELL_STOP_LOSS, SELL_MANUAL,
    /// HOLD, DRAWDOWN_LOCK
    pub kind: String,
    /// Market the event refers to, if any
    pub market: Option<MarketId>,
    pub price: Decimal,
    pub amount: Decimal,
    pub cash_balance: Decimal,
    pub position_count: usize,
    pub equity: Decimal,
    pub realized_pnl: Decimal,
    pub comment: String,
}

impl TradeEvent {
    #[allow(clippy::too_many_arguments)]
    fn new(
        kind: impl Into<String>,
        market: Option<MarketId>,
        price: Decimal,
        amount: Decimal,
        cash_balance: Decimal,
        position_count: usize,
        equity: Decimal,
        realized_pnl: Decimal,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now().trunc_subsecs(0),
            kind: kind.into(),
            market,
            price: price.round_dp(PRICE_DP),
            amount: amount.round_dp(AMOUNT_DP),
            cash_balance: cash_balance.round_dp(CASH_DP),
            position_count,
            equity: equity.round_dp(CASH_DP),
            realized_pnl: realized_pnl.round_dp(CASH_DP),
            comment: comment.into(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn buy(
        market: MarketId,
        price: Decimal,
        amount: Decimal,
        cash_balance: Decimal,
        position_count: usize,
        equity: Decimal,
        comment: impl Into<String>,
    ) -> Self {
        Self::new(
            "BUY",
            Some(market),
            price,
            amount,
            cash_balance,
            position_count,
            equity,
            Decimal::ZERO,
            comment,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn sell(
        market: MarketId,
        reason: ExitReason,
        price: Decimal,
        amount: Decimal,
        cash_balance: Decimal,
        position_count: usize,
        equity: Decimal,
        realized_pnl: Decimal,
    ) -> Self {
        Self::new(
            format!("SELL_{}", reason),
            Some(market),
            price,
            amount,
            cash_balance,
            position_count,
            equity,
            realized_pnl,
            format!("closed on {}", reason),
        )
    }

    pub fn hold(
        cash_balance: Decimal,
        position_count: usize,
        equity: Decimal,
        comment: impl Into<String>,
    ) -> Self {
        Self::new(
            "HOLD",
            None,
            Decimal::ZERO,
            Decimal::ZERO,
            cash_balance,
            position_count,
            equity,
            Decimal::ZERO,
            comment,
        )
    }

    pub fn drawdown_lock(
        cash_balance: Decimal,
        position_count: usize,
        equity: Decimal,
        drawdown: Decimal,
    ) -> Self {
        Self::new(
            "DRAWDOWN_LOCK",
            None,
            Decimal::ZERO,
            Decimal::ZERO,
            cash_balance,
            position_count,
            equity,
            Decimal::ZERO,
            format!("daily drawdown {:.2}%", drawdown * Decimal::from(100)),
        )
    }
}

/// JSON-lines event sink
#[derive(Debug, Clone)]
pub struct TradeJournal {
    path: Option<PathBuf>,
}

impl TradeJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A journal that drops every record; used when journaling is
    /// disabled and in tests.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// Append one record. Failures are logged, never propagated.
    pub fn record(&self, event: &TradeEvent) {
        let Some(path) = &self.path else {
            return;
        };

        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize trade event: {}", e);
                return;
            }
        };

        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{}", line));
        if let Err(e) = result {
            warn!("Failed to append trade event to {}: {}", path.display(), e);
        }
    }
}
