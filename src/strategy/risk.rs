//! Risk state machine: daily drawdown lock, losing-streak pause, day reset.
//!
//! All risk counters are owned here and mutated only through this type.
//! The drawdown pause is a one-way latch: once tripped it holds until the
//! next UTC day rollover.

use crate::config::StrategyParams;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use tracing::{info, warn};

/// Why a new entry is currently blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryBlock {
    /// Daily drawdown limit hit; paused until the next day
    DrawdownPause,
    /// Too many consecutive losing exits
    LosingStreak(u32),
    /// Open positions already at the configured cap
    AtCapacity(usize),
}

impl fmt::Display for EntryBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryBlock::DrawdownPause => write!(f, "paused for daily drawdown"),
            EntryBlock::LosingStreak(n) => write!(f, "losing streak at {}", n),
            EntryBlock::AtCapacity(n) => write!(f, "at max open positions ({})", n),
        }
    }
}

/// Tracks intraday equity peak, drawdown pause and losing streak
#[derive(Debug)]
pub struct RiskController {
    max_daily_drawdown: Decimal,
    max_losing_streak: u32,
    max_open_positions: usize,

    equity_peak_today: Decimal,
    current_day: NaiveDate,
    paused_for_drawdown: bool,
    losing_streak: u32,
}

impl RiskController {
    pub fn new(params: &StrategyParams, today: NaiveDate, starting_equity: Decimal) -> Self {
        Self {
            max_daily_drawdown: params.max_daily_drawdown,
            max_losing_streak: params.max_losing_streak,
            max_open_positions: params.max_open_positions,
            equity_peak_today: starting_equity,
            current_day: today,
            paused_for_drawdown: false,
            losing_streak: 0,
        }
    }

    /// Run the day-rollover check, then peak tracking and the drawdown
    /// latch for the current equity. Returns true when the latch newly
    /// tripped this call.
    pub fn begin_cycle(&mut self, today: NaiveDate, equity: Decimal) -> bool {
        if today != self.current_day {
            info!(
                "New day {}: resetting equity peak to {:.2}, clearing pause and streak",
                today, equity
            );
            self.current_day = today;
            self.equity_peak_today = equity;
            self.paused_for_drawdown = false;
            self.losing_streak = 0;
        }
        self.observe_equity(equity)
    }

    /// Peak tracking plus the drawdown latch; called once per cycle and
    /// again after exits changed equity. Returns true when the latch newly
    /// tripped.
    pub fn observe_equity(&mut self, equity: Decimal) -> bool {
        if equity > self.equity_peak_today {
            self.equity_peak_today = equity;
        }

        let drawdown = self.drawdown(equity);
        if drawdown >= self.max_daily_drawdown && !self.paused_for_drawdown {
            warn!(
                "Daily drawdown {:.2}% >= {:.2}%: pausing new entries for the rest of the day",
                drawdown * Decimal::from(100),
                self.max_daily_drawdown * Decimal::from(100)
            );
            self.paused_for_drawdown = true;
            return true;
        }
        false
    }

    /// Fractional decline from today's equity peak; a non-positive peak
    /// counts as no drawdown.
    pub fn drawdown(&self, equity: Decimal) -> Decimal {
        if self.equity_peak_today <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        ((self.equity_peak_today - equity) / self.equity_peak_today).max(Decimal::ZERO)
    }

    /// Whether a new position may be opened right now
    pub fn check_entry(&self, open_positions: usize) -> Result<(), EntryBlock> {
        if self.paused_for_drawdown {
            return Err(EntryBlock::DrawdownPause);
        }
        if self.losing_streak >= self.max_losing_streak {
            return Err(EntryBlock::LosingStreak(self.losing_streak));
        }
        if open_positions >= self.max_open_positions {
            return Err(EntryBlock::AtCapacity(self.max_open_positions));
        }
        Ok(())
    }

    /// Streak update after every exit: losses extend the streak, any
    /// non-negative result clears it.
    pub fn record_exit(&mut self, realized_pnl: Decimal) {
        if realized_pnl < Decimal::ZERO {
            self.losing_streak += 1;
        } else {
            self.losing_streak = 0;
        }
    }

    pub fn losing_streak(&self) -> u32 {
        self.losing_streak
    }

    pub fn is_paused_for_drawdown(&self) -> bool {
        self.paused_for_drawdown
    }

    pub fn equity_peak_today(&self) -> Decimal {
        self.equity_peak_today
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn controller() -> RiskController {
        RiskController::new(
            &StrategyParams::conservative(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            dec!(1000),
        )
    }

    #[test]
    fn test_drawdown_latch_trips_at_limit() {
        let mut risk = controller();

        // 4% drawdown: below the 5% limit, no pause.
        assert!(!risk.observe_equity(dec!(960)));
        assert!(!risk.is_paused_for_drawdown());
        assert_eq!(risk.check_entry(0), Ok(()));

        // 6% drawdown: latch trips, exactly once.
        assert!(risk.observe_equity(dec!(940)));
        assert!(risk.is_paused_for_drawdown());
        assert!(!risk.observe_equity(dec!(930)));
        assert_eq!(risk.check_entry(0), Err(EntryBlock::DrawdownPause));
    }

    #[test]
    fn test_latch_holds_until_rollover() {
        let mut risk = controller();
        risk.observe_equity(dec!(940));
        assert!(risk.is_paused_for_drawdown());

        // Recovery within the same day does not clear the pause.
        risk.observe_equity(dec!(1000));
        assert!(risk.is_paused_for_drawdown());

        // Next day clears it and resets the peak to current equity.
        risk.begin_cycle(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(), dec!(940));
        assert!(!risk.is_paused_for_drawdown());
        assert_eq!(risk.equity_peak_today(), dec!(940));
        assert_eq!(risk.check_entry(0), Ok(()));
    }

    #[test]
    fn test_peak_is_monotonic_within_day() {
        let mut risk = controller();
        risk.observe_equity(dec!(1100));
        assert_eq!(risk.equity_peak_today(), dec!(1100));
        risk.observe_equity(dec!(1050));
        assert_eq!(risk.equity_peak_today(), dec!(1100));
    }

    #[test]
    fn test_losing_streak_blocks_and_resets() {
        let mut risk = controller();

        for i in 1..=3 {
            risk.record_exit(dec!(-1));
            assert_eq!(risk.losing_streak(), i);
        }
        assert_eq!(risk.check_entry(0), Err(EntryBlock::LosingStreak(3)));

        // A winning (or flat) exit clears the streak.
        risk.record_exit(dec!(0.5));
        assert_eq!(risk.losing_streak(), 0);
        assert_eq!(risk.check_entry(0), Ok(()));
    }

    #[test]
    fn test_rollover_clears_streak() {
        let mut risk = controller();
        for _ in 0..5 {
            risk.record_exit(dec!(-1));
        }
        risk.begin_cycle(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(), dec!(900));
        assert_eq!(risk.losing_streak(), 0);
    }

    #[test]
    fn test_capacity_block() {
        let risk = controller(); // conservative: max 1 open position
        assert_eq!(risk.check_entry(1), Err(EntryBlock::AtCapacity(1)));
    }

    #[test]
    fn test_zero_peak_is_no_drawdown() {
        let mut risk = RiskController::new(
            &StrategyParams::conservative(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            dec!(0),
        );
        assert_eq!(risk.drawdown(dec!(0)), dec!(0));
        assert!(!risk.observe_equity(dec!(0)));
    }
}
