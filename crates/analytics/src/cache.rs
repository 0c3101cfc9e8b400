use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use chrono::NaiveDate;
use core_types::Trade;

use crate::report::DashboardSnapshot;

/// Identifies one state of the trade log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKey {
    /// The version counter of a `TradeLog`.
    Version(u64),
    /// A content hash from `fingerprint`.
    Fingerprint(u64),
}

/// What a cached snapshot was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub log: LogKey,
    pub anchor: NaiveDate,
}

/// Hashes the full contents of `trades`, in order.
pub fn fingerprint(trades: &[Trade]) -> u64 {
    let mut hasher = DefaultHasher::new();
    trades.hash(&mut hasher);
    hasher.finish()
}

/// Holds the most recent dashboard snapshot and recomputes it only when the
/// key changes.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entry: Option<(CacheKey, Arc<DashboardSnapshot>)>,
    hits: u64,
    misses: u64,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached snapshot for `key`, or runs `compute` and caches its result.
    pub fn get_or_compute<F>(&mut self, key: CacheKey, compute: F) -> Arc<DashboardSnapshot>
    where
        F: FnOnce() -> DashboardSnapshot,
    {
        if let Some((cached_key, snapshot)) = &self.entry {
            if *cached_key == key {
                self.hits += 1;
                tracing::debug!(?key, "Snapshot cache hit.");
                return Arc::clone(snapshot);
            }
        }

        self.misses += 1;
        tracing::debug!(?key, "Snapshot cache miss, recomputing.");
        let snapshot = Arc::new(compute());
        self.entry = Some((key, Arc::clone(&snapshot)));
        snapshot
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AnalyticsEngine;
    use chrono::{TimeZone, Utc};
    use configuration::Config;
    use core_types::{Direction, TradeLog};
    use rust_decimal_macros::dec;

    fn trade(pnl: rust_decimal::Decimal) -> Trade {
        let at = Utc.with_ymd_and_hms(2024, 7, 1, 15, 0, 0).unwrap();
        Trade::closed("AAPL", Direction::Long, dec!(210), dec!(212), pnl, at, at)
    }

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()
    }

    #[test]
    fn version_key_recomputes_only_after_mutation() {
        let engine = AnalyticsEngine::new(&Config::default()).unwrap();
        let mut log = TradeLog::from(vec![trade(dec!(10))]);
        let mut cache = SnapshotCache::new();

        let key = |log: &TradeLog| CacheKey { log: LogKey::Version(log.version()), anchor: anchor() };

        let first = cache.get_or_compute(key(&log), || engine.snapshot(log.trades(), anchor()));
        let again = cache.get_or_compute(key(&log), || engine.snapshot(log.trades(), anchor()));
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));

        log.push(trade(dec!(-4)));
        let updated = cache.get_or_compute(key(&log), || engine.snapshot(log.trades(), anchor()));
        assert_eq!(updated.stats.total_pnl, dec!(6));
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let engine = AnalyticsEngine::new(&Config::default()).unwrap();
        let trades = vec![trade(dec!(3))];
        let key = CacheKey { log: LogKey::Fingerprint(fingerprint(&trades)), anchor: anchor() };
        let mut cache = SnapshotCache::new();

        cache.get_or_compute(key, || engine.snapshot(&trades, anchor()));
        cache.invalidate();
        cache.get_or_compute(key, || engine.snapshot(&trades, anchor()));
        assert_eq!((cache.hits(), cache.misses()), (0, 2));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = vec![trade(dec!(1)), trade(dec!(2))];
        let b = a.clone();
        assert_eq!(fingerprint(&a), fingerprint(&b));

        let mut c = a.clone();
        c[1].pnl = dec!(2.5);
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }
}
