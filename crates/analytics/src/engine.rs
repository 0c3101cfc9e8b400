use std::time::Duration;

use chrono::NaiveDate;
use configuration::{Config, SparklineSettings};
use core_types::{Direction, Trade};
use rust_decimal::Decimal;

use crate::calendar::{CalendarHeatmap, CalendarWindow, bucket_by_day};
use crate::equity::{Settled, equity_curve, equity_values, max_drawdown, settled_in_order};
use crate::error::AnalyticsError;
use crate::report::{DashboardSnapshot, EnhancedTradeStats, Sparklines, UNBOUNDED_PROFIT_FACTOR};
use crate::sparkline::{sparkline, win_rate_trend};

/// A stateless calculator that derives every dashboard figure from a trade log.
///
/// It holds only its parameters; trades are passed in on every call and
/// nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    calendar: CalendarWindow,
    sparkline: SparklineSettings,
}

impl AnalyticsEngine {
    /// Creates an engine from validated application settings.
    pub fn new(config: &Config) -> Result<Self, AnalyticsError> {
        let calendar = CalendarWindow::from_settings(&config.calendar)?;
        config.sparkline.validate()?;
        Ok(Self {
            calendar,
            sparkline: config.sparkline.clone(),
        })
    }

    pub fn calendar_window(&self) -> &CalendarWindow {
        &self.calendar
    }

    pub fn compute_stats(&self, trades: &[Trade]) -> EnhancedTradeStats {
        compute_stats(trades)
    }

    /// The calendar grid for the window whose last week contains `anchor`.
    pub fn calendar(&self, trades: &[Trade], anchor: NaiveDate) -> CalendarHeatmap {
        bucket_by_day(trades, &self.calendar, anchor)
    }

    /// Computes the full set of dashboard data in one pass over the log.
    #[tracing::instrument(name = "dashboard_snapshot", skip(self, trades), fields(trades = trades.len()))]
    pub fn snapshot(&self, trades: &[Trade], anchor: NaiveDate) -> DashboardSnapshot {
        let stats = compute_stats(trades);
        let curve = equity_curve(trades);
        let calendar = self.calendar(trades, anchor);
        let points = self.sparkline.points;

        let sparklines = Sparklines {
            equity: sparkline(&equity_values(&curve), points),
            win_rate: sparkline(&win_rate_trend(trades, self.sparkline.win_rate_window), points),
            daily_pnl: sparkline(&calendar.daily_pnl(), points),
        };

        DashboardSnapshot {
            anchor,
            max_drawdown: max_drawdown(&curve),
            stats,
            equity_curve: curve,
            calendar,
            sparklines,
        }
    }
}

/// Computes the headline statistics over the closed trades in `trades`.
///
/// Works for any input, including an empty one, and returns the same result
/// for every ordering of the same trades.
pub fn compute_stats(trades: &[Trade]) -> EnhancedTradeStats {
    let settled = settled_in_order(trades);
    let skipped = trades.len() - settled.len();
    if skipped > 0 {
        tracing::debug!(skipped, "Ignoring trades that are still open.");
    }

    let mut stats = EnhancedTradeStats::new();
    if settled.is_empty() {
        // No closed trades: every metric stays at zero.
        return stats;
    }

    calculate_profitability(&settled, &mut stats);
    calculate_streaks(&settled, &mut stats);
    calculate_risk_reward(&settled, &mut stats);
    calculate_time_metrics(&settled, &mut stats);
    stats
}

/// Counts, sums, extremes and the ratios built on them.
fn calculate_profitability(settled: &[Settled<'_>], stats: &mut EnhancedTradeStats) {
    stats.total_trades = settled.len();
    stats.best_trade = settled[0].trade.pnl;
    stats.worst_trade = settled[0].trade.pnl;

    for entry in settled {
        let pnl = entry.trade.pnl;
        stats.total_pnl = stats.total_pnl.saturating_add(pnl);
        stats.best_trade = stats.best_trade.max(pnl);
        stats.worst_trade = stats.worst_trade.min(pnl);

        match entry.trade.direction {
            Direction::Long => stats.long_trades += 1,
            Direction::Short => stats.short_trades += 1,
        }

        if pnl > Decimal::ZERO {
            stats.gross_profit = stats.gross_profit.saturating_add(pnl);
            stats.winning_trades += 1;
        } else if pnl < Decimal::ZERO {
            stats.gross_loss = stats.gross_loss.saturating_add(pnl.abs());
            stats.losing_trades += 1;
        } else {
            stats.breakeven_trades += 1;
        }
    }

    let total = Decimal::from(stats.total_trades);
    let win_fraction = Decimal::from(stats.winning_trades) / total;
    stats.win_rate = win_fraction * Decimal::ONE_HUNDRED;

    if stats.winning_trades > 0 {
        stats.avg_win = stats.gross_profit / Decimal::from(stats.winning_trades);
        stats.avg_payout = stats.avg_win;
    }
    if stats.losing_trades > 0 {
        stats.avg_loss = -(stats.gross_loss / Decimal::from(stats.losing_trades));
    }

    // A ratio too large to represent is reported like a loss-free log.
    stats.profit_factor = if stats.gross_loss > Decimal::ZERO {
        stats
            .gross_profit
            .checked_div(stats.gross_loss)
            .unwrap_or(UNBOUNDED_PROFIT_FACTOR)
    } else if stats.winning_trades > 0 {
        UNBOUNDED_PROFIT_FACTOR
    } else {
        Decimal::ZERO
    };

    stats.expectancy =
        win_fraction * stats.avg_win - (Decimal::ONE - win_fraction) * stats.avg_loss.abs();
}

/// Longest runs of wins and losses in close order. Breakeven trades end both runs.
fn calculate_streaks(settled: &[Settled<'_>], stats: &mut EnhancedTradeStats) {
    let (mut wins, mut losses) = (0usize, 0usize);
    for entry in settled {
        if entry.trade.is_win() {
            wins += 1;
            losses = 0;
        } else if entry.trade.is_loss() {
            losses += 1;
            wins = 0;
        } else {
            wins = 0;
            losses = 0;
        }
        stats.max_consecutive_wins = stats.max_consecutive_wins.max(wins);
        stats.max_consecutive_losses = stats.max_consecutive_losses.max(losses);
    }
}

/// Mean reward/risk over the trades that carry one.
fn calculate_risk_reward(settled: &[Settled<'_>], stats: &mut EnhancedTradeStats) {
    let ratios: Vec<Decimal> = settled
        .iter()
        .filter_map(|entry| entry.trade.risk_reward_ratio)
        .collect();

    if !ratios.is_empty() {
        let sum = ratios
            .iter()
            .fold(Decimal::ZERO, |sum, ratio| sum.saturating_add(*ratio));
        stats.avg_risk_reward = sum / Decimal::from(ratios.len());
    }
}

fn calculate_time_metrics(settled: &[Settled<'_>], stats: &mut EnhancedTradeStats) {
    let total_secs: i64 = settled
        .iter()
        .filter_map(|entry| entry.trade.holding_period())
        .map(|held| held.num_seconds().max(0))
        .sum();

    let avg_secs = total_secs / settled.len() as i64;
    stats.average_holding_period = Duration::from_secs(avg_secs.unsigned_abs());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn trade(pnl: Decimal, day: u32) -> Trade {
        let opened = Utc.with_ymd_and_hms(2024, 4, day, 9, 0, 0).unwrap();
        let closed = Utc.with_ymd_and_hms(2024, 4, day, 10, 30, 0).unwrap();
        Trade::closed("GBPUSD", Direction::Long, dec!(1.25), dec!(1.26), pnl, opened, closed)
    }

    #[test]
    fn mixed_log_matches_reference_figures() {
        let trades = vec![trade(dec!(100), 1), trade(dec!(-50), 2), trade(dec!(200), 3)];
        let stats = compute_stats(&trades);

        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.win_rate.round_dp(2), dec!(66.67));
        assert_eq!(stats.profit_factor, dec!(6));
        assert_eq!(stats.avg_win, dec!(150));
        assert_eq!(stats.avg_loss, dec!(-50));
        assert_eq!(stats.avg_payout, dec!(150));
        assert_eq!(stats.best_trade, dec!(200));
        assert_eq!(stats.worst_trade, dec!(-50));
        assert_eq!(stats.total_pnl, dec!(250));
        assert_eq!(stats.gross_profit, dec!(300));
        assert_eq!(stats.gross_loss, dec!(50));
        // 2/3 * 150 - 1/3 * 50
        assert_eq!(stats.expectancy.round_dp(2), dec!(83.33));
    }

    #[test]
    fn empty_log_is_all_zero() {
        let stats = compute_stats(&[]);
        assert_eq!(stats, EnhancedTradeStats::new());
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.win_rate, Decimal::ZERO);
        assert_eq!(stats.profit_factor, Decimal::ZERO);
        assert_eq!(stats.best_trade, Decimal::ZERO);
        assert_eq!(stats.worst_trade, Decimal::ZERO);
    }

    #[test]
    fn winners_only_reports_unbounded_profit_factor() {
        let stats = compute_stats(&[trade(dec!(10), 1), trade(dec!(30), 2)]);
        assert!(stats.has_unbounded_profit_factor());
        assert_eq!(stats.win_rate, dec!(100));
        assert_eq!(stats.avg_loss, Decimal::ZERO);
        assert_eq!(stats.expectancy, dec!(20));
    }

    #[test]
    fn losers_only_has_zero_profit_factor_and_negative_expectancy() {
        let stats = compute_stats(&[trade(dec!(-10), 1), trade(dec!(-30), 2)]);
        assert_eq!(stats.profit_factor, Decimal::ZERO);
        assert_eq!(stats.win_rate, Decimal::ZERO);
        assert_eq!(stats.avg_loss, dec!(-20));
        assert_eq!(stats.expectancy, dec!(-20));
        assert_eq!(stats.best_trade, dec!(-10));
        assert_eq!(stats.max_consecutive_losses, 2);
    }

    #[test]
    fn oversized_profit_factor_is_unbounded() {
        let stats = compute_stats(&[
            trade(dec!(1000000), 1),
            trade(dec!(-0.000000000000000000000001), 2),
        ]);
        assert!(stats.has_unbounded_profit_factor());
        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.win_rate, dec!(50));
    }

    #[test]
    fn sums_saturate_instead_of_overflowing() {
        let stats = compute_stats(&[trade(Decimal::MAX, 1), trade(Decimal::MAX, 2)]);
        assert_eq!(stats.total_pnl, Decimal::MAX);
        assert_eq!(stats.gross_profit, Decimal::MAX);
        assert_eq!(stats.best_trade, Decimal::MAX);
    }

    #[test]
    fn breakeven_trades_count_but_stay_out_of_averages() {
        let stats = compute_stats(&[trade(dec!(0), 1), trade(dec!(0), 2), trade(dec!(40), 3)]);
        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.breakeven_trades, 2);
        assert_eq!(stats.avg_win, dec!(40));
        assert_eq!(stats.avg_loss, Decimal::ZERO);
        assert!(stats.has_unbounded_profit_factor());
    }

    #[test]
    fn all_breakeven_has_zero_profit_factor() {
        let stats = compute_stats(&[trade(dec!(0), 1)]);
        assert_eq!(stats.profit_factor, Decimal::ZERO);
        assert_eq!(stats.win_rate, Decimal::ZERO);
    }

    #[test]
    fn open_trades_are_ignored() {
        let mut open = trade(dec!(1000), 4);
        open.closed_at = None;
        let stats = compute_stats(&[open, trade(dec!(-5), 1)]);
        assert_eq!(stats.total_trades, 1);
        assert_eq!(stats.total_pnl, dec!(-5));
    }

    #[test]
    fn risk_reward_averages_only_defined_ratios() {
        let trades = vec![
            trade(dec!(10), 1).with_risk_reward(dec!(2)),
            trade(dec!(-5), 2),
            trade(dec!(20), 3).with_risk_reward(dec!(3)),
        ];
        assert_eq!(compute_stats(&trades).avg_risk_reward, dec!(2.5));
        assert_eq!(compute_stats(&trades[1..2]).avg_risk_reward, Decimal::ZERO);
    }

    #[test]
    fn streaks_follow_close_order() {
        // Close order: W W L W W W 0 L L
        let pnls = [10, 10, -1, 5, 5, 5, 0, -2, -2];
        let mut trades: Vec<Trade> = pnls
            .iter()
            .enumerate()
            .map(|(i, pnl)| trade(Decimal::from(*pnl), i as u32 + 1))
            .collect();
        trades.reverse();

        let stats = compute_stats(&trades);
        assert_eq!(stats.max_consecutive_wins, 3);
        assert_eq!(stats.max_consecutive_losses, 2);
    }

    #[test]
    fn holding_period_is_mean_duration() {
        let stats = compute_stats(&[trade(dec!(1), 1), trade(dec!(2), 2)]);
        assert_eq!(stats.average_holding_period, Duration::from_secs(90 * 60));
    }

    #[test]
    fn direction_split_is_counted() {
        let mut short = trade(dec!(3), 2);
        short.direction = Direction::Short;
        let stats = compute_stats(&[trade(dec!(1), 1), short]);
        assert_eq!((stats.long_trades, stats.short_trades), (1, 1));
    }

    #[test]
    fn snapshot_bundles_every_series() {
        let engine = AnalyticsEngine::new(&Config::default()).unwrap();
        let trades = vec![trade(dec!(100), 1), trade(dec!(-50), 2), trade(dec!(200), 3)];
        let anchor = NaiveDate::from_ymd_opt(2024, 4, 3).unwrap();

        let snapshot = engine.snapshot(&trades, anchor);
        assert_eq!(snapshot.stats.total_trades, 3);
        assert_eq!(snapshot.equity_curve.len(), 4);
        assert_eq!(snapshot.max_drawdown, dec!(50));
        assert_eq!(snapshot.calendar.days.len(), 35);
        assert_eq!(snapshot.calendar.net_pnl(), dec!(250));
        assert_eq!(snapshot.sparklines.equity.values.len(), 20);
        assert_eq!(snapshot.sparklines.win_rate.values.len(), 20);
        assert_eq!(snapshot.sparklines.daily_pnl.values.len(), 20);
    }

    #[test]
    fn engine_rejects_invalid_settings() {
        let mut config = Config::default();
        config.calendar.weeks = 0;
        assert!(AnalyticsEngine::new(&config).is_err());

        let mut config = Config::default();
        config.sparkline.points = 0;
        assert!(AnalyticsEngine::new(&config).is_err());
    }
}
