use super::money::Hours;
use super::review::ReviewDecision;
use crate::error::EngineError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeEntryStatus {
    Pending,
    Approved,
    Rejected,
}

/// Input for logging hourly work.
#[derive(Debug, Clone)]
pub struct NewTimeEntry {
    pub date: NaiveDate,
    /// Validated into [`Hours`] when the entry is created.
    pub hours: Decimal,
    pub description: String,
    pub milestone_id: Option<Uuid>,
}

/// A logged unit of hourly work, reviewed exactly once by the business.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TimeEntry {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub milestone_id: Option<Uuid>,
    pub date: NaiveDate,
    pub hours: Hours,
    pub description: String,
    pub status: TimeEntryStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TimeEntry {
    pub fn new(contract_id: Uuid, input: NewTimeEntry) -> Result<Self, EngineError> {
        Ok(Self {
            id: Uuid::new_v4(),
            contract_id,
            milestone_id: input.milestone_id,
            date: input.date,
            hours: Hours::new(input.hours)?,
            description: input.description,
            status: TimeEntryStatus::Pending,
            approved_at: None,
            rejected_at: None,
            rejection_reason: None,
            created_at: Utc::now(),
        })
    }

    pub fn review(&mut self, decision: &ReviewDecision, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.status != TimeEntryStatus::Pending {
            return Err(EngineError::invalid_state(
                "Time entry has already been reviewed",
            ));
        }
        match decision {
            ReviewDecision::Approve => {
                self.status = TimeEntryStatus::Approved;
                self.approved_at = Some(now);
            }
            ReviewDecision::Reject { .. } => {
                self.status = TimeEntryStatus::Rejected;
                self.rejected_at = Some(now);
                self.rejection_reason = decision.rejection_reason();
            }
        }
        Ok(())
    }

    /// Inclusive on both ends.
    pub fn falls_within(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.date >= start && self.date <= end
    }
}
