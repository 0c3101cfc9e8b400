//! # Tradelens Analytics Engine
//!
//! This crate turns a log of settled trades into everything a performance
//! dashboard displays: headline statistics, the equity curve, the daily
//! intensity calendar and fixed-length sparklines.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` and `configuration` (Layer 0).
//! - **Stateless Calculation:** Every function takes the trades as an argument and
//!   returns fresh values. Open trades are ignored, degenerate input yields
//!   zeroed results rather than errors, and input order never changes the output.
//! - **Explicit Caching:** Memoization lives in `SnapshotCache`, keyed by the
//!   trade log's version or content fingerprint. The engine never caches.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: Bundles the configured calculations into a `DashboardSnapshot`.
//! - `compute_stats`, `equity_curve`, `bucket_by_day`, `sparkline`: The individual calculations.
//! - `EnhancedTradeStats`: The headline statistics.
//! - `AnalyticsError`: Returned only when engine parameters are invalid.

// Declare the modules that constitute this crate.
pub mod cache;
pub mod calendar;
pub mod engine;
pub mod equity;
pub mod error;
pub mod report;
pub mod sparkline;

// Re-export the key components to create a clean, public-facing API.
pub use cache::{CacheKey, LogKey, SnapshotCache, fingerprint};
pub use calendar::{
    CalendarHeatmap, CalendarWindow, DailyTotal, DayBucket, DayIntensity, IntensityLevel,
    bucket_by_day, daily_totals, trading_day,
};
pub use engine::{AnalyticsEngine, compute_stats};
pub use equity::{EquityPoint, equity_curve, equity_values, max_drawdown};
pub use error::AnalyticsError;
pub use report::{DashboardSnapshot, EnhancedTradeStats, Sparklines, UNBOUNDED_PROFIT_FACTOR};
pub use sparkline::{Sparkline, sparkline, win_rate_trend};
