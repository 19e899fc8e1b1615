//! Position lifecycle: simulated entries and exits.
//!
//! Owns the sizing rules and the take-profit/stop-loss exit checks. Cash
//! amounts are kept at 2 decimal places, asset amounts at 8.

use crate::config::StrategyParams;
use crate::domain::{AccountState, MarketId, Position};
use crate::strategy::journal::{TradeEvent, TradeJournal};
use crate::strategy::risk::RiskController;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

const CASH_DP: u32 = 2;
const AMOUNT_DP: u32 = 8;

/// Why an exit happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    Manual,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TakeProfit => "TAKE_PROFIT",
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::Manual => "MANUAL",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an entry was declined. Refusals are recovered locally: the cycle
/// just continues without a trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRefusal {
    /// Sized spend fell below the minimum trade floor
    SpendBelowMinimum { spend: Decimal, floor: Decimal },
    /// Amount rounded to zero at asset precision
    ZeroAmount,
}

impl fmt::Display for EntryRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryRefusal::SpendBelowMinimum { spend, floor } => {
                write!(f, "spend {:.2} below minimum {:.2}", spend, floor)
            }
            EntryRefusal::ZeroAmount => write!(f, "amount rounds to zero"),
        }
    }
}

/// A completed exit within one cycle
#[derive(Debug, Clone)]
pub struct ClosedTrade {
    pub market: MarketId,
    pub exit_price: Decimal,
    pub reason: ExitReason,
    pub realized_pnl: Decimal,
}

/// Performs entry and exit transitions on the account
pub struct PositionManager {
    params: StrategyParams,
    journal: TradeJournal,
}

impl PositionManager {
    pub fn new(params: StrategyParams, journal: TradeJournal) -> Self {
        Self { params, journal }
    }

    /// Open a new position: spend a fixed fraction of current cash.
    ///
    /// The spend is rounded to cash precision before the floor check, the
    /// amount to asset precision. On success the account is debited and
    /// a BUY event emitted.
    pub fn enter(
        &self,
        account: &mut AccountState,
        market: MarketId,
        price: Decimal,
        now: DateTime<Utc>,
        prices: &HashMap<MarketId, Decimal>,
    ) -> Result<Position, EntryRefusal> {
        let spend = (account.cash_balance * self.params.position_size_fraction).round_dp(CASH_DP);
        if spend < self.params.min_trade_usd {
            return Err(EntryRefusal::SpendBelowMinimum {
                spend,
                floor: self.params.min_trade_usd,
            });
        }

        if price <= Decimal::ZERO {
            return Err(EntryRefusal::ZeroAmount);
        }
        let amount = (spend / price).round_dp(AMOUNT_DP);
        if amount <= Decimal::ZERO {
            return Err(EntryRefusal::ZeroAmount);
        }

        account.cash_balance -= spend;
        let position = Position::new(market.clone(), amount, price, now);
        account.positions.push(position.clone());

        let equity = account.equity(prices);
        info!(
            "OPEN {} @ {} | spend={:.2}, amount={:.8}, positions now={}",
            market,
            price,
            spend,
            amount,
            account.open_count()
        );
        self.journal.record(&TradeEvent::buy(
            market,
            price,
            amount,
            account.cash_balance,
            account.open_count(),
            equity,
            format!("spend {:.2}", spend),
        ));

        Ok(position)
    }

    /// Close the position at `index` at the given price. Credits the
    /// proceeds, updates the risk streak and emits a SELL event.
    pub fn exit_at(
        &self,
        account: &mut AccountState,
        index: usize,
        exit_price: Decimal,
        reason: ExitReason,
        risk: &mut RiskController,
        prices: &HashMap<MarketId, Decimal>,
    ) -> ClosedTrade {
        let position = account.positions.remove(index);

        let proceeds = (position.amount * exit_price).round_dp(CASH_DP);
        let cost = (position.amount * position.entry_price).round_dp(CASH_DP);
        let realized_pnl = proceeds - cost;

        account.cash_balance += proceeds;
        account.trade_count += 1;
        risk.record_exit(realized_pnl);

        let equity = account.equity(prices);
        info!(
            "CLOSE {} @ {} ({}) | P/L: {:+.2} | equity ~ {:.2}",
            position.market, exit_price, reason, realized_pnl, equity
        );
        self.journal.record(&TradeEvent::sell(
            position.market.clone(),
            reason,
            exit_price,
            position.amount,
            account.cash_balance,
            account.open_count(),
            equity,
            realized_pnl,
        ));

        ClosedTrade {
            market: position.market,
            exit_price,
            reason,
            realized_pnl,
        }
    }

    /// Check every open position against the exit thresholds.
    ///
    /// A position without a fresh price is left open untouched; stop-loss
    /// magnitude is stored positive and compared as
    /// `change_pct <= -stop_loss_pct`.
    pub fn check_exits(
        &self,
        account: &mut AccountState,
        prices: &HashMap<MarketId, Decimal>,
        risk: &mut RiskController,
    ) -> Vec<ClosedTrade> {
        let mut closed = Vec::new();

        let mut i = 0;
        while i < account.positions.len() {
            let position = &account.positions[i];
            let Some(price) = prices.get(&position.market).copied() else {
                debug!(
                    "No fresh price for {}, leaving position open",
                    position.market
                );
                i += 1;
                continue;
            };

            let change_pct = position.change_pct(price);
            if change_pct >= self.params.take_profit_pct {
                closed.push(self.exit_at(account, i, price, ExitReason::TakeProfit, risk, prices));
            } else if change_pct <= -self.params.stop_loss_pct {
                closed.push(self.exit_at(account, i, price, ExitReason::StopLoss, risk, prices));
            } else {
                i += 1;
            }
        }

        closed
    }
}
