use super::engine::FulfillmentEngine;
use super::payments::PaymentRequest;
use crate::domain::contract::{Actor, Contract, ProjectType};
use crate::domain::milestone::{Milestone, MilestoneStatus, MilestoneView, pending_count};
use crate::domain::payment::Payment;
use crate::domain::ports::{Notification, TransferContext};
use crate::domain::review::ReviewDecision;
use crate::error::{EngineError, Result};
use chrono::Utc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// What happened to the payment side of a milestone review.
#[derive(Debug)]
pub enum MilestoneSettlement {
    /// The milestone was rejected; no payment is due.
    NotApplicable,
    Paid(Payment),
    /// The approval stands but paying it out did not succeed. A FAILED
    /// payment row exists when the transfer itself was attempted.
    Failed(EngineError),
}

/// Result of reviewing a milestone.
#[derive(Debug)]
pub struct MilestoneReview {
    pub milestone: Milestone,
    pub settlement: MilestoneSettlement,
}

impl MilestoneReview {
    /// `true` unless an approval was recorded but its payment failed.
    pub fn is_fully_settled(&self) -> bool {
        !matches!(self.settlement, MilestoneSettlement::Failed(_))
    }

    pub fn payment(&self) -> Option<&Payment> {
        match &self.settlement {
            MilestoneSettlement::Paid(payment) => Some(payment),
            _ => None,
        }
    }
}

impl FulfillmentEngine {
    /// Lists a contract's milestones, ordered by position, as seen by `actor`.
    #[instrument(skip(self))]
    pub async fn list_milestones(&self, contract_id: Uuid, actor: Actor) -> Result<Vec<MilestoneView>> {
        let contract = self.scoped_contract(contract_id, &actor).await?;
        let mut milestones = self.stores.milestones.list_by_contract(contract.id).await?;
        milestones.sort_by_key(|m| m.order);
        let entries = self.stores.time_entries.list_by_contract(contract.id).await?;

        let mut views = Vec::with_capacity(milestones.len());
        for milestone in milestones {
            let deliverables = self
                .stores
                .deliverables
                .list_by_milestone(milestone.id)
                .await?;
            let tagged = entries
                .iter()
                .filter(|e| e.milestone_id == Some(milestone.id))
                .cloned()
                .collect();
            views.push(MilestoneView::new(milestone, deliverables, tagged, actor.role)?);
        }
        Ok(views)
    }

    #[instrument(skip(self))]
    pub async fn submit_milestone(&self, milestone_id: Uuid, talent_id: Uuid) -> Result<Milestone> {
        let (mut milestone, contract) = self
            .scoped_milestone(milestone_id, &Actor::talent(talent_id))
            .await?;
        let pending = match contract.project_type {
            ProjectType::FixedPrice => {
                let deliverables = self
                    .stores
                    .deliverables
                    .list_by_milestone(milestone.id)
                    .await?;
                pending_count(&deliverables)
            }
            ProjectType::Hourly => 0,
        };

        let expected = milestone.status;
        milestone.submit(pending, Utc::now())?;
        self.write_milestone(&milestone, expected).await?;
        info!("milestone submitted");
        self.dispatch(Notification::MilestoneSubmitted {
            milestone_id: milestone.id,
            business_id: contract.business_id,
        });
        Ok(milestone)
    }

    /// Approves or rejects a submitted milestone.
    ///
    /// An approval is written first and then paid unconditionally; a payment
    /// failure is reported in the returned [`MilestoneSettlement`] and does
    /// not undo the approval.
    #[instrument(skip(self))]
    pub async fn review_milestone(
        &self,
        milestone_id: Uuid,
        business_id: Uuid,
        decision: ReviewDecision,
    ) -> Result<MilestoneReview> {
        let (mut milestone, contract) = self
            .scoped_milestone(milestone_id, &Actor::business(business_id))
            .await?;
        milestone.review(&decision, Utc::now())?;
        self.write_milestone(&milestone, MilestoneStatus::Submitted)
            .await?;
        info!(status = ?milestone.status, "milestone reviewed");

        if !decision.is_approval() {
            self.dispatch(Notification::MilestoneRejected {
                milestone_id: milestone.id,
                talent_id: contract.talent_id,
            });
            return Ok(MilestoneReview {
                milestone,
                settlement: MilestoneSettlement::NotApplicable,
            });
        }

        self.dispatch(Notification::MilestoneApproved {
            milestone_id: milestone.id,
            talent_id: contract.talent_id,
        });
        let settlement = match self.pay_milestone(&contract, &milestone).await {
            Ok(payment) => MilestoneSettlement::Paid(payment),
            Err(e) => {
                error!(error = %e, "approved milestone could not be paid");
                MilestoneSettlement::Failed(e)
            }
        };
        Ok(MilestoneReview {
            milestone,
            settlement,
        })
    }

    async fn pay_milestone(&self, contract: &Contract, milestone: &Milestone) -> Result<Payment> {
        let talent = self.talent_profile(contract.talent_id).await?;
        let fees = self.fee_breakdown(milestone.amount, &talent)?;
        self.payments
            .settle(
                contract,
                &talent,
                PaymentRequest {
                    amount: milestone.amount,
                    fee: fees.total_fee,
                    context: TransferContext::Milestone {
                        milestone_id: milestone.id,
                        title: milestone.title.clone(),
                    },
                },
            )
            .await
    }

    async fn write_milestone(&self, milestone: &Milestone, expected: MilestoneStatus) -> Result<()> {
        if self
            .stores
            .milestones
            .update_if_status(milestone.clone(), expected)
            .await?
        {
            Ok(())
        } else {
            Err(EngineError::invalid_state(
                "Milestone was modified concurrently; reload and retry",
            ))
        }
    }
}
