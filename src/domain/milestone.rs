use super::contract::Role;
use super::deliverable::{Deliverable, DeliverableStatus};
use super::money::Money;
use super::review::ReviewDecision;
use super::time_entry::TimeEntry;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneStatus {
    Pending,
    InProgress,
    Submitted,
    Approved,
    Rejected,
}

impl MilestoneStatus {
    pub const ALL: [MilestoneStatus; 5] = [
        Self::Pending,
        Self::InProgress,
        Self::Submitted,
        Self::Approved,
        Self::Rejected,
    ];

    pub fn is_submittable(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

/// A payable unit of work within a contract.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Milestone {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub title: String,
    pub amount: Money,
    /// Position within the contract. Informational only.
    pub order: u32,
    pub status: MilestoneStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

/// Whether `role` may submit a milestone currently in `status`.
pub fn can_submit(role: Role, status: MilestoneStatus) -> bool {
    role == Role::Talent && status.is_submittable()
}

/// Whether `role` may approve a milestone currently in `status`.
pub fn can_approve(role: Role, status: MilestoneStatus) -> bool {
    role == Role::Business && status == MilestoneStatus::Submitted
}

impl Milestone {
    pub fn new(contract_id: Uuid, title: impl Into<String>, amount: Money, order: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_id,
            title: title.into(),
            amount,
            order,
            status: MilestoneStatus::Pending,
            submitted_at: None,
            approved_at: None,
            rejected_at: None,
            rejection_reason: None,
        }
    }

    /// Moves the milestone to SUBMITTED.
    ///
    /// `pending_deliverables` only gates fixed-price work; pass zero for
    /// hourly contracts.
    pub fn submit(&mut self, pending_deliverables: usize, now: DateTime<Utc>) -> Result<(), EngineError> {
        if !self.status.is_submittable() {
            return Err(EngineError::invalid_state(
                "Milestone cannot be submitted in its current state",
            ));
        }
        if pending_deliverables > 0 {
            return Err(EngineError::invalid_state(format!(
                "Milestone has {} deliverable(s) that have not been submitted",
                pending_deliverables
            )));
        }
        self.status = MilestoneStatus::Submitted;
        self.submitted_at = Some(now);
        Ok(())
    }

    pub fn review(&mut self, decision: &ReviewDecision, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.status != MilestoneStatus::Submitted {
            return Err(EngineError::invalid_state(
                "Milestone must be submitted before it can be reviewed",
            ));
        }
        match decision {
            ReviewDecision::Approve => {
                self.status = MilestoneStatus::Approved;
                self.approved_at = Some(now);
            }
            ReviewDecision::Reject { .. } => {
                self.status = MilestoneStatus::Rejected;
                self.rejected_at = Some(now);
                self.rejection_reason = decision.rejection_reason();
            }
        }
        Ok(())
    }
}

/// Counts deliverables that still block a fixed-price submission.
pub fn pending_count(deliverables: &[Deliverable]) -> usize {
    deliverables
        .iter()
        .filter(|d| d.status == DeliverableStatus::Pending)
        .count()
}

/// A milestone enriched for display to one of the contract parties.
#[derive(Debug, Serialize, Clone)]
pub struct MilestoneView {
    #[serde(flatten)]
    pub milestone: Milestone,
    pub deliverables: Vec<Deliverable>,
    /// Ordered by date, most recent first.
    pub time_entries: Vec<TimeEntry>,
    pub total_hours: Decimal,
    pub can_submit: bool,
    pub can_approve: bool,
}

impl MilestoneView {
    pub fn new(
        milestone: Milestone,
        deliverables: Vec<Deliverable>,
        mut time_entries: Vec<TimeEntry>,
        role: Role,
    ) -> Result<Self, EngineError> {
        time_entries.sort_by(|a, b| b.date.cmp(&a.date));
        let total_hours = super::money::total_hours(time_entries.iter().map(|e| &e.hours))?;
        let status = milestone.status;
        Ok(Self {
            milestone,
            deliverables,
            time_entries,
            total_hours,
            can_submit: can_submit(role, status),
            can_approve: can_approve(role, status),
        })
    }
}
