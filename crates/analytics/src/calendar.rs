use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use configuration::CalendarSettings;
use core_types::Trade;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::AnalyticsError;

/// Net result and number of trades closed on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub net_pnl: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IntensityLevel {
    Low,
    Medium,
    High,
}

/// Heat-map class of a day, relative to the strongest day in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "level")]
pub enum DayIntensity {
    /// No trades closed.
    Empty,
    /// Trades closed but they netted to zero.
    Flat,
    Profit(IntensityLevel),
    Loss(IntensityLevel),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub net_pnl: Decimal,
    pub count: usize,
    pub intensity: DayIntensity,
}

/// A dense calendar window: one bucket per day from `start` to `end`
/// inclusive, Monday first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarHeatmap {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Largest |net pnl| of any day in the window.
    pub max_abs_pnl: Decimal,
    pub days: Vec<DayBucket>,
}

impl CalendarHeatmap {
    /// The grid rows, Monday to Sunday.
    pub fn weeks(&self) -> std::slice::Chunks<'_, DayBucket> {
        self.days.chunks(7)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DayBucket> {
        let offset = (date - self.start).num_days();
        usize::try_from(offset).ok().and_then(|i| self.days.get(i))
    }

    pub fn net_pnl(&self) -> Decimal {
        self.days
            .iter()
            .fold(Decimal::ZERO, |sum, day| sum.saturating_add(day.net_pnl))
    }

    /// Number of days with at least one closed trade.
    pub fn trading_days(&self) -> usize {
        self.days.iter().filter(|day| day.count > 0).count()
    }

    /// Net pnl per day in calendar order, including empty days.
    pub fn daily_pnl(&self) -> Vec<Decimal> {
        self.days.iter().map(|day| day.net_pnl).collect()
    }
}

/// Shape and classification rules of the calendar heat map.
#[derive(Debug, Clone)]
pub struct CalendarWindow {
    settings: CalendarSettings,
    offset: FixedOffset,
}

impl CalendarWindow {
    pub fn new(
        weeks: u32,
        utc_offset_minutes: i32,
        low_threshold: Decimal,
        high_threshold: Decimal,
    ) -> Result<Self, AnalyticsError> {
        Self::from_settings(&CalendarSettings {
            weeks,
            utc_offset_minutes,
            low_threshold,
            high_threshold,
        })
    }

    pub fn from_settings(settings: &CalendarSettings) -> Result<Self, AnalyticsError> {
        settings.validate()?;
        Ok(Self {
            offset: settings.utc_offset()?,
            settings: settings.clone(),
        })
    }

    pub fn days(&self) -> usize {
        self.settings.window_days()
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// First and last day of the window whose final week contains `anchor`.
    ///
    /// Windows that would run past the representable date range are shifted
    /// to the nearest whole weeks inside it, so the span is always `days()`.
    pub fn bounds(&self, anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
        let span = Duration::days(self.days() as i64 - 1);
        let back = i64::from(anchor.weekday().num_days_from_monday())
            + 7 * (i64::from(self.settings.weeks) - 1);

        let start = anchor
            .checked_sub_signed(Duration::days(back))
            .unwrap_or_else(earliest_monday);
        match start.checked_add_signed(span) {
            Some(end) => (start, end),
            None => {
                let end = latest_sunday();
                let start = end.checked_sub_signed(span).unwrap_or_else(earliest_monday);
                (start, end)
            }
        }
    }

    /// Classifies a day against the window's largest absolute net result.
    pub fn classify(&self, total: DailyTotal, max_abs_pnl: Decimal) -> DayIntensity {
        if total.count == 0 {
            return DayIntensity::Empty;
        }
        if total.net_pnl.is_zero() || max_abs_pnl.is_zero() {
            return DayIntensity::Flat;
        }

        let ratio = total.net_pnl.abs() / max_abs_pnl;
        let level = if ratio <= self.settings.low_threshold {
            IntensityLevel::Low
        } else if ratio > self.settings.high_threshold {
            IntensityLevel::High
        } else {
            IntensityLevel::Medium
        };

        if total.net_pnl > Decimal::ZERO {
            DayIntensity::Profit(level)
        } else {
            DayIntensity::Loss(level)
        }
    }
}

fn earliest_monday() -> NaiveDate {
    let skip = (7 - NaiveDate::MIN.weekday().num_days_from_monday()) % 7;
    NaiveDate::MIN
        .checked_add_signed(Duration::days(i64::from(skip)))
        .unwrap_or(NaiveDate::MIN)
}

fn latest_sunday() -> NaiveDate {
    let back = (NaiveDate::MAX.weekday().num_days_from_monday() + 1) % 7;
    NaiveDate::MAX
        .checked_sub_signed(Duration::days(i64::from(back)))
        .unwrap_or(NaiveDate::MAX)
}

/// The calendar day a trade closing at `closed_at` belongs to.
pub fn trading_day(closed_at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    closed_at.with_timezone(&offset).date_naive()
}

/// Groups closed trades by the day they closed on. Only days with trades appear.
pub fn daily_totals(trades: &[Trade], offset: FixedOffset) -> BTreeMap<NaiveDate, DailyTotal> {
    let mut totals: BTreeMap<NaiveDate, DailyTotal> = BTreeMap::new();
    for (trade, closed_at) in trades
        .iter()
        .filter_map(|trade| trade.closed_at.map(|closed_at| (trade, closed_at)))
    {
        let total = totals.entry(trading_day(closed_at, offset)).or_default();
        total.net_pnl = total.net_pnl.saturating_add(trade.pnl);
        total.count += 1;
    }
    totals
}

/// Builds the dense heat map for the window whose last week contains `anchor`.
///
/// Every day of the window is present, so the grid always has
/// `window.days()` cells regardless of how trades are distributed.
pub fn bucket_by_day(trades: &[Trade], window: &CalendarWindow, anchor: NaiveDate) -> CalendarHeatmap {
    let (start, end) = window.bounds(anchor);
    let totals = daily_totals(trades, window.offset());

    let future = match end.succ_opt() {
        Some(next) => totals.range(next..).count(),
        None => 0,
    };
    if future > 0 {
        tracing::warn!(days = future, %end, "Trades closed after the calendar window end.");
    }

    let max_abs_pnl = totals
        .range(start..=end)
        .map(|(_, total)| total.net_pnl.abs())
        .max()
        .unwrap_or(Decimal::ZERO);

    let days = (0..window.days() as i64)
        .filter_map(|offset| start.checked_add_signed(Duration::days(offset)))
        .map(|date| {
            let total = totals.get(&date).copied().unwrap_or_default();
            DayBucket {
                date,
                net_pnl: total.net_pnl,
                count: total.count,
                intensity: window.classify(total, max_abs_pnl),
            }
        })
        .collect();

    CalendarHeatmap {
        start,
        end,
        max_abs_pnl,
        days,
    }
}
