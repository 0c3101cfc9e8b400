use chrono::{DateTime, Utc};
use core_types::Trade;
use rust_decimal::Decimal;
use serde::Serialize;

/// One point of the cumulative pnl curve.
///
/// The origin point has no timestamp; `None` orders before every real time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EquityPoint {
    pub timestamp: Option<DateTime<Utc>>,
    pub cumulative_pnl: Decimal,
}

impl EquityPoint {
    pub fn origin() -> Self {
        Self {
            timestamp: None,
            cumulative_pnl: Decimal::ZERO,
        }
    }
}

/// A closed trade paired with its close time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Settled<'a> {
    pub trade: &'a Trade,
    pub closed_at: DateTime<Utc>,
}

/// Closed trades in a canonical order: close time, then id, then pnl.
/// Open trades are dropped.
pub(crate) fn settled_in_order(trades: &[Trade]) -> Vec<Settled<'_>> {
    let mut settled: Vec<Settled<'_>> = trades
        .iter()
        .filter_map(|trade| trade.closed_at.map(|closed_at| Settled { trade, closed_at }))
        .collect();

    settled.sort_by(|a, b| {
        a.closed_at
            .cmp(&b.closed_at)
            .then_with(|| a.trade.id.cmp(&b.trade.id))
            .then_with(|| a.trade.pnl.cmp(&b.trade.pnl))
    });
    settled
}

/// Builds the running pnl total, one point per closed trade after the origin.
pub fn equity_curve(trades: &[Trade]) -> Vec<EquityPoint> {
    let settled = settled_in_order(trades);
    let mut curve = Vec::with_capacity(settled.len() + 1);
    curve.push(EquityPoint::origin());

    let mut running = Decimal::ZERO;
    for entry in settled {
        running = running.saturating_add(entry.trade.pnl);
        curve.push(EquityPoint {
            timestamp: Some(entry.closed_at),
            cumulative_pnl: running,
        });
    }
    curve
}

/// Largest peak-to-trough decline along the curve, as a non-negative amount.
pub fn max_drawdown(curve: &[EquityPoint]) -> Decimal {
    let Some(first) = curve.first() else {
        return Decimal::ZERO;
    };

    let mut peak = first.cumulative_pnl;
    let mut max_drawdown = Decimal::ZERO;
    for point in curve {
        if point.cumulative_pnl > peak {
            peak = point.cumulative_pnl;
        }
        let drawdown = peak.saturating_sub(point.cumulative_pnl);
        if drawdown > max_drawdown {
            max_drawdown = drawdown;
        }
    }
    max_drawdown
}

pub fn equity_values(curve: &[EquityPoint]) -> Vec<Decimal> {
    curve.iter().map(|point| point.cumulative_pnl).collect()
}
