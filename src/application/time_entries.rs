use super::engine::FulfillmentEngine;
use crate::domain::contract::Actor;
use crate::domain::review::ReviewDecision;
use crate::domain::time_entry::{NewTimeEntry, TimeEntry, TimeEntryStatus};
use crate::error::{EngineError, Result};
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

impl FulfillmentEngine {
    /// Logs hours against an hourly contract.
    #[instrument(skip(self, input), fields(date = %input.date, hours = %input.hours))]
    pub async fn add_time_entry(
        &self,
        contract_id: Uuid,
        talent_id: Uuid,
        input: NewTimeEntry,
    ) -> Result<TimeEntry> {
        let contract = self
            .scoped_contract(contract_id, &Actor::talent(talent_id))
            .await?;
        if !contract.is_hourly() {
            return Err(EngineError::invalid_operation(
                "Time entries can only be added to hourly contracts",
            ));
        }
        if let Some(milestone_id) = input.milestone_id {
            self.stores
                .milestones
                .get(milestone_id)
                .await?
                .filter(|m| m.contract_id == contract.id)
                .ok_or(EngineError::NotFound("Milestone"))?;
        }

        let entry = TimeEntry::new(contract.id, input)?;
        self.stores.time_entries.store(entry.clone()).await?;
        info!(time_entry_id = %entry.id, "time entry added");
        Ok(entry)
    }

    #[instrument(skip(self))]
    pub async fn review_time_entry(
        &self,
        time_entry_id: Uuid,
        business_id: Uuid,
        decision: ReviewDecision,
    ) -> Result<TimeEntry> {
        let mut entry = self
            .stores
            .time_entries
            .get(time_entry_id)
            .await?
            .ok_or(EngineError::NotFound("Time entry"))?;
        self.scoped_contract(entry.contract_id, &Actor::business(business_id))
            .await
            .map_err(|e| match e {
                EngineError::NotFound(_) => EngineError::NotFound("Time entry"),
                other => other,
            })?;

        entry.review(&decision, Utc::now())?;
        if !self
            .stores
            .time_entries
            .update_if_status(entry.clone(), TimeEntryStatus::Pending)
            .await?
        {
            return Err(EngineError::invalid_state(
                "Time entry was modified concurrently; reload and retry",
            ));
        }
        info!(status = ?entry.status, "time entry reviewed");
        Ok(entry)
    }
}
