use crate::enums::Direction;
use crate::error::CoreError;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single executed trade as recorded by the trade store.
///
/// `pnl` is the realized profit or loss and is authoritative for every
/// profit-based statistic; the price fields are informational. A trade without
/// `closed_at` is still open and is ignored by the analytics engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub instrument: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub pnl: Decimal,
    pub opened_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub risk_reward_ratio: Option<Decimal>,
}

impl Trade {
    /// Creates a settled trade with a fresh id and no risk/reward ratio.
    pub fn closed(
        instrument: impl Into<String>,
        direction: Direction,
        entry_price: Decimal,
        exit_price: Decimal,
        pnl: Decimal,
        opened_at: DateTime<Utc>,
        closed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument: instrument.into(),
            direction,
            entry_price,
            exit_price,
            pnl,
            opened_at,
            closed_at: Some(closed_at),
            risk_reward_ratio: None,
        }
    }

    /// Attaches a pre-computed reward/risk ratio.
    pub fn with_risk_reward(mut self, ratio: Decimal) -> Self {
        self.risk_reward_ratio = Some(ratio);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    pub fn is_loss(&self) -> bool {
        self.pnl < Decimal::ZERO
    }

    /// Time between opening and closing, `None` while the trade is open.
    pub fn holding_period(&self) -> Option<Duration> {
        self.closed_at.map(|closed| closed - self.opened_at)
    }

    /// Checks the record against the invariants every trade must satisfy
    /// before it is handed to the analytics engine.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.instrument.trim().is_empty() {
            return Err(invalid(self, "instrument", "must not be empty"));
        }
        if self.entry_price <= Decimal::ZERO {
            return Err(invalid(self, "entry_price", "must be positive"));
        }
        if self.exit_price <= Decimal::ZERO {
            return Err(invalid(self, "exit_price", "must be positive"));
        }
        if let Some(closed_at) = self.closed_at {
            if closed_at < self.opened_at {
                return Err(invalid(self, "closed_at", "precedes opened_at"));
            }
        }
        if let Some(ratio) = self.risk_reward_ratio {
            if ratio <= Decimal::ZERO {
                return Err(invalid(self, "risk_reward_ratio", "must be positive"));
            }
        }
        Ok(())
    }
}

fn invalid(trade: &Trade, field: &str, reason: &str) -> CoreError {
    CoreError::InvalidInput(
        format!("trade {} {}", trade.id, field),
        reason.to_string(),
    )
}
