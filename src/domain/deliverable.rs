use super::review::ReviewDecision;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliverableStatus {
    Pending,
    Submitted,
    Approved,
    Rejected,
}

/// Input for creating a deliverable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDeliverable {
    pub title: String,
    pub description: Option<String>,
    pub file_url: Option<String>,
}

/// A work artifact submitted against a milestone.
///
/// Moves PENDING -> SUBMITTED -> APPROVED | REJECTED. Both review outcomes
/// are terminal.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Deliverable {
    pub id: Uuid,
    pub milestone_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub status: DeliverableStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Deliverable {
    pub fn new(milestone_id: Uuid, input: NewDeliverable) -> Result<Self, EngineError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(EngineError::validation("Deliverable title is required"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            milestone_id,
            title: title.to_string(),
            description: input.description,
            file_url: input.file_url,
            status: DeliverableStatus::Pending,
            submitted_at: None,
            approved_at: None,
            rejected_at: None,
            rejection_reason: None,
            created_at: Utc::now(),
        })
    }

    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.status != DeliverableStatus::Pending {
            return Err(EngineError::invalid_state(
                "Deliverable has already been submitted or reviewed",
            ));
        }
        self.status = DeliverableStatus::Submitted;
        self.submitted_at = Some(now);
        Ok(())
    }

    pub fn review(&mut self, decision: &ReviewDecision, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.status != DeliverableStatus::Submitted {
            return Err(EngineError::invalid_state(
                "Deliverable must be submitted before it can be reviewed",
            ));
        }
        match decision {
            ReviewDecision::Approve => {
                self.status = DeliverableStatus::Approved;
                self.approved_at = Some(now);
            }
            ReviewDecision::Reject { .. } => {
                self.status = DeliverableStatus::Rejected;
                self.rejected_at = Some(now);
                self.rejection_reason = decision.rejection_reason();
            }
        }
        Ok(())
    }
}
