use chrono::FixedOffset;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::error::ConfigError;

/// Largest UTC offset accepted for calendar bucketing, in minutes.
pub const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

/// Longest calendar window accepted, in weeks.
pub const MAX_CALENDAR_WEEKS: u32 = 520;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub calendar: CalendarSettings,
    pub sparkline: SparklineSettings,
    pub logging: LoggingSettings,
}

/// Parameters for the daily-intensity calendar.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Number of Monday-first weeks shown in the grid.
    pub weeks: u32,
    /// Fixed offset from UTC, in minutes, used to decide which day a trade closed on.
    pub utc_offset_minutes: i32,
    /// Days whose |net pnl| is at most this fraction of the window maximum are "low".
    pub low_threshold: Decimal,
    /// Days whose |net pnl| exceeds this fraction of the window maximum are "high".
    pub high_threshold: Decimal,
}

/// Parameters for the trend sparklines.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SparklineSettings {
    /// Number of points every sparkline is resampled to.
    pub points: usize,
    /// Number of trailing trades used for the rolling win rate.
    pub win_rate_window: usize,
}

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

/// Parameters for the tracing subscriber installed by the binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive when `RUST_LOG` is not set.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<String>,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            weeks: 5,
            utc_offset_minutes: 0,
            low_threshold: dec!(0.33),
            high_threshold: dec!(0.66),
        }
    }
}

impl Default for SparklineSettings {
    fn default() -> Self {
        Self {
            points: 20,
            win_rate_window: 10,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            directory: None,
        }
    }
}

impl CalendarSettings {
    /// Total number of day cells in the calendar window.
    pub fn window_days(&self) -> usize {
        self.weeks as usize * 7
    }

    /// The fixed offset trades are bucketed in.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        let minutes = self.utc_offset_minutes;
        if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::ValidationError(format!(
                "calendar.utc_offset_minutes must be within +/-{} minutes, got {}",
                MAX_UTC_OFFSET_MINUTES, minutes
            )));
        }
        FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
            ConfigError::ValidationError(format!("calendar.utc_offset_minutes {} is invalid", minutes))
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.weeks == 0 || self.weeks > MAX_CALENDAR_WEEKS {
            return Err(ConfigError::ValidationError(format!(
                "calendar.weeks must be between 1 and {}",
                MAX_CALENDAR_WEEKS
            )));
        }
        self.utc_offset()?;
        if self.low_threshold <= Decimal::ZERO
            || self.low_threshold >= self.high_threshold
            || self.high_threshold > Decimal::ONE
        {
            return Err(ConfigError::ValidationError(format!(
                "calendar thresholds must satisfy 0 < low_threshold < high_threshold <= 1, got {} and {}",
                self.low_threshold, self.high_threshold
            )));
        }
        Ok(())
    }
}

impl SparklineSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.points == 0 {
            return Err(ConfigError::ValidationError(
                "sparkline.points must be at least 1".to_string(),
            ));
        }
        if self.win_rate_window == 0 {
            return Err(ConfigError::ValidationError(
                "sparkline.win_rate_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Rejects settings the analytics engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.calendar.validate()?;
        self.sparkline.validate()
    }
}
