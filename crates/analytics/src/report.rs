use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::calendar::CalendarHeatmap;
use crate::equity::EquityPoint;
use crate::sparkline::Sparkline;

/// Profit factor reported when there are winners but no losers.
pub const UNBOUNDED_PROFIT_FACTOR: Decimal = Decimal::MAX;

/// The headline statistics of a trade log.
///
/// Recomputed wholesale from the trades every time; never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedTradeStats {
    // I. Trade counts
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub long_trades: usize,
    pub short_trades: usize,

    // II. Profitability
    /// Percentage of trades with positive pnl, 0 to 100.
    pub win_rate: Decimal,
    /// Gross profit over gross loss. `UNBOUNDED_PROFIT_FACTOR` when nothing was lost.
    pub profit_factor: Decimal,
    pub avg_win: Decimal,
    /// Mean pnl of the losing trades, so zero or negative.
    pub avg_loss: Decimal,
    pub avg_payout: Decimal,
    pub expectancy: Decimal,
    pub total_pnl: Decimal,
    pub gross_profit: Decimal,
    /// Magnitude of the summed losses.
    pub gross_loss: Decimal,
    pub best_trade: Decimal,
    pub worst_trade: Decimal,
    pub avg_risk_reward: Decimal,

    // III. Sequencing and time
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    #[serde(with = "humantime_serde")]
    pub average_holding_period: Duration,
}

impl EnhancedTradeStats {
    /// Creates a new, zeroed-out stats object. This is also the result for
    /// a log without closed trades.
    pub fn new() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            breakeven_trades: 0,
            long_trades: 0,
            short_trades: 0,
            win_rate: Decimal::ZERO,
            profit_factor: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            avg_payout: Decimal::ZERO,
            expectancy: Decimal::ZERO,
            total_pnl: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            best_trade: Decimal::ZERO,
            worst_trade: Decimal::ZERO,
            avg_risk_reward: Decimal::ZERO,
            max_consecutive_wins: 0,
            max_consecutive_losses: 0,
            average_holding_period: Duration::ZERO,
        }
    }

    pub fn has_unbounded_profit_factor(&self) -> bool {
        self.profit_factor == UNBOUNDED_PROFIT_FACTOR
    }
}

impl Default for EnhancedTradeStats {
    fn default() -> Self {
        Self::new()
    }
}

/// The trend lines shown next to the headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sparklines {
    pub equity: Sparkline,
    pub win_rate: Sparkline,
    pub daily_pnl: Sparkline,
}

/// Everything the dashboard renders, derived from one trade log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub anchor: NaiveDate,
    pub stats: EnhancedTradeStats,
    pub equity_curve: Vec<EquityPoint>,
    pub max_drawdown: Decimal,
    pub calendar: CalendarHeatmap,
    pub sparklines: Sparklines,
}
