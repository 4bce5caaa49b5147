use super::engine::FulfillmentEngine;
use crate::domain::contract::{Actor, Contract};
use crate::domain::deliverable::{Deliverable, DeliverableStatus, NewDeliverable};
use crate::domain::ports::Notification;
use crate::domain::review::ReviewDecision;
use crate::error::{EngineError, Result};
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

impl FulfillmentEngine {
    /// Adds a PENDING deliverable to a milestone on the talent's contract.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_deliverable(
        &self,
        milestone_id: Uuid,
        talent_id: Uuid,
        input: NewDeliverable,
    ) -> Result<Deliverable> {
        let (milestone, _) = self
            .scoped_milestone(milestone_id, &Actor::talent(talent_id))
            .await?;
        let deliverable = Deliverable::new(milestone.id, input)?;
        self.stores.deliverables.store(deliverable.clone()).await?;
        info!(deliverable_id = %deliverable.id, "deliverable created");
        Ok(deliverable)
    }

    #[instrument(skip(self))]
    pub async fn submit_deliverable(&self, deliverable_id: Uuid, talent_id: Uuid) -> Result<Deliverable> {
        let (mut deliverable, contract) = self
            .scoped_deliverable(deliverable_id, &Actor::talent(talent_id))
            .await?;
        deliverable.submit(Utc::now())?;
        self.write_deliverable(&deliverable, DeliverableStatus::Pending)
            .await?;
        info!("deliverable submitted");
        self.dispatch(Notification::DeliverableSubmitted {
            deliverable_id: deliverable.id,
            business_id: contract.business_id,
        });
        Ok(deliverable)
    }

    #[instrument(skip(self))]
    pub async fn review_deliverable(
        &self,
        deliverable_id: Uuid,
        business_id: Uuid,
        decision: ReviewDecision,
    ) -> Result<Deliverable> {
        let (mut deliverable, _) = self
            .scoped_deliverable(deliverable_id, &Actor::business(business_id))
            .await?;
        deliverable.review(&decision, Utc::now())?;
        self.write_deliverable(&deliverable, DeliverableStatus::Submitted)
            .await?;
        info!(status = ?deliverable.status, "deliverable reviewed");
        Ok(deliverable)
    }

    async fn scoped_deliverable(
        &self,
        deliverable_id: Uuid,
        actor: &Actor,
    ) -> Result<(Deliverable, Contract)> {
        let deliverable = self
            .stores
            .deliverables
            .get(deliverable_id)
            .await?
            .ok_or(EngineError::NotFound("Deliverable"))?;
        let (_, contract) = self
            .scoped_milestone(deliverable.milestone_id, actor)
            .await
            .map_err(|e| match e {
                EngineError::NotFound(_) => EngineError::NotFound("Deliverable"),
                other => other,
            })?;
        Ok((deliverable, contract))
    }

    async fn write_deliverable(&self, deliverable: &Deliverable, expected: DeliverableStatus) -> Result<()> {
        if self
            .stores
            .deliverables
            .update_if_status(deliverable.clone(), expected)
            .await?
        {
            Ok(())
        } else {
            Err(EngineError::invalid_state(
                "Deliverable was modified concurrently; reload and retry",
            ))
        }
    }
}
