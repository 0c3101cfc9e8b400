use std::collections::VecDeque;

use core_types::Trade;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::equity::settled_in_order;

/// A series resampled to a fixed number of points.
///
/// `normalized` holds the same points scaled into [0, 1] by the min and max of
/// `values`; a flat series sits at 0.5.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sparkline {
    pub values: Vec<Decimal>,
    pub normalized: Vec<Decimal>,
    pub min: Decimal,
    pub max: Decimal,
}

/// Resamples `series` to exactly `length` points.
///
/// Longer series are averaged over uniform buckets, shorter ones repeat their
/// points, and an empty series becomes a flat line at zero.
pub fn sparkline(series: &[Decimal], length: usize) -> Sparkline {
    let values = resample(series, length);
    let min = values.iter().copied().min().unwrap_or(Decimal::ZERO);
    let max = values.iter().copied().max().unwrap_or(Decimal::ZERO);
    // A span too wide to represent is drawn as a flat line.
    let span = max.checked_sub(min).filter(|span| !span.is_zero());

    let half = Decimal::new(5, 1);
    let normalized = values
        .iter()
        .map(|value| match span {
            Some(span) => (*value - min) / span,
            None => half,
        })
        .collect();

    Sparkline {
        values,
        normalized,
        min,
        max,
    }
}

fn resample(series: &[Decimal], length: usize) -> Vec<Decimal> {
    let n = series.len();
    if n == 0 {
        return vec![Decimal::ZERO; length];
    }

    (0..length)
        .map(|i| {
            if n >= length {
                mean(&series[i * n / length..(i + 1) * n / length])
            } else {
                series[i * n / length]
            }
        })
        .collect()
}

fn mean(bucket: &[Decimal]) -> Decimal {
    let count = Decimal::from(bucket.len());
    bucket
        .iter()
        .try_fold(Decimal::ZERO, |sum, value| sum.checked_add(*value))
        .map(|sum| sum / count)
        // Summing first overflowed, so average the scaled-down parts instead.
        .unwrap_or_else(|| {
            bucket
                .iter()
                .fold(Decimal::ZERO, |sum, value| sum.saturating_add(*value / count))
        })
}

/// Win rate over the trailing `window` closed trades, one value per trade in
/// close order.
pub fn win_rate_trend(trades: &[Trade], window: usize) -> Vec<Decimal> {
    let window = window.max(1);
    let mut recent: VecDeque<bool> = VecDeque::with_capacity(window);
    let mut wins = 0usize;

    settled_in_order(trades)
        .into_iter()
        .map(|entry| {
            if recent.len() == window && recent.pop_front() == Some(true) {
                wins -= 1;
            }
            let won = entry.trade.is_win();
            if won {
                wins += 1;
            }
            recent.push_back(won);
            Decimal::from(wins) / Decimal::from(recent.len()) * Decimal::ONE_HUNDRED
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use core_types::Direction;
    use rust_decimal_macros::dec;

    fn series(values: &[i64]) -> Vec<Decimal> {
        values.iter().copied().map(Decimal::from).collect()
    }

    #[test]
    fn longer_series_is_bucket_averaged() {
        let line = sparkline(&series(&[1, 3, 5, 7, 9, 11]), 3);
        assert_eq!(line.values, series(&[2, 6, 10]));
        assert_eq!(line.normalized, vec![dec!(0), dec!(0.5), dec!(1)]);
        assert_eq!((line.min, line.max), (dec!(2), dec!(10)));
    }

    #[test]
    fn uneven_buckets_cover_every_point() {
        // 5 points into 2 buckets: [0..2) and [2..5)
        let line = sparkline(&series(&[2, 4, 6, 8, 10]), 2);
        assert_eq!(line.values, series(&[3, 8]));
    }

    #[test]
    fn shorter_series_repeats_points() {
        let line = sparkline(&series(&[1, 2]), 5);
        assert_eq!(line.values, series(&[1, 1, 1, 2, 2]));
    }

    #[test]
    fn empty_and_flat_series_sit_mid_range() {
        let empty = sparkline(&[], 4);
        assert_eq!(empty.values, vec![Decimal::ZERO; 4]);
        assert_eq!(empty.normalized, vec![dec!(0.5); 4]);

        let flat = sparkline(&series(&[7, 7, 7]), 6);
        assert!(flat.normalized.iter().all(|v| *v == dec!(0.5)));
    }

    #[test]
    fn extreme_values_do_not_overflow() {
        let wide = sparkline(&[Decimal::MIN / dec!(2), Decimal::MAX * dec!(0.75)], 2);
        assert_eq!(wide.values.len(), 2);
        assert_eq!(wide.normalized, vec![dec!(0.5); 2]);

        let huge = sparkline(&[Decimal::MAX, Decimal::MAX, Decimal::MAX], 1);
        assert_eq!(huge.values.len(), 1);
        assert!(huge.values[0] > Decimal::MAX / dec!(2));
    }

    #[test]
    fn length_is_always_honoured() {
        let source = series(&(0..37).collect::<Vec<_>>());
        for length in [0, 1, 2, 5, 36, 37, 38, 100] {
            let line = sparkline(&source, length);
            assert_eq!(line.values.len(), length);
            assert_eq!(line.normalized.len(), length);
        }
    }

    #[test]
    fn win_rate_trend_rolls_over_window() {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 14, 0, 0).unwrap();
        let trades: Vec<Trade> = [10, -10, 10, 10, -10]
            .iter()
            .enumerate()
            .map(|(i, pnl)| {
                let at = start + Duration::hours(i as i64);
                Trade::closed("SOLUSDT", Direction::Long, dec!(100), dec!(101), Decimal::from(*pnl), at, at)
            })
            .collect();

        let trend = win_rate_trend(&trades, 2);
        assert_eq!(trend, series(&[100, 50, 50, 100, 50]));
        assert!(win_rate_trend(&[], 3).is_empty());
    }
}
