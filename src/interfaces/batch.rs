use super::csv::command_reader::Command;
use super::seed::Labels;
use crate::application::engine::FulfillmentEngine;
use crate::application::milestones::MilestoneSettlement;
use crate::domain::contract::Actor;
use crate::domain::deliverable::NewDeliverable;
use crate::domain::payment::Payment;
use crate::domain::time_entry::NewTimeEntry;
use crate::error::{EngineError, Result};
use tracing::{debug, warn};

/// Replays label-addressed commands against a [`FulfillmentEngine`].
pub struct BatchRunner {
    engine: FulfillmentEngine,
    labels: Labels,
}

impl BatchRunner {
    pub fn new(engine: FulfillmentEngine, labels: Labels) -> Self {
        Self { engine, labels }
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Runs one command.
    ///
    /// A milestone approval whose payment fails still counts as applied: the
    /// failure is logged and the FAILED payment shows up in the output.
    pub async fn apply(&mut self, command: Command) -> Result<()> {
        debug!(?command, "applying command");
        match command {
            Command::CreateDeliverable {
                talent,
                milestone,
                label,
                title,
            } => {
                let deliverable = self
                    .engine
                    .create_deliverable(
                        self.labels.resolve(&milestone),
                        self.labels.resolve(&talent),
                        NewDeliverable {
                            title,
                            ..NewDeliverable::default()
                        },
                    )
                    .await?;
                self.labels.bind(&label, deliverable.id);
            }
            Command::SubmitDeliverable {
                talent,
                deliverable,
            } => {
                self.engine
                    .submit_deliverable(
                        self.labels.resolve(&deliverable),
                        self.labels.resolve(&talent),
                    )
                    .await?;
            }
            Command::ReviewDeliverable {
                business,
                deliverable,
                decision,
            } => {
                self.engine
                    .review_deliverable(
                        self.labels.resolve(&deliverable),
                        self.labels.resolve(&business),
                        decision,
                    )
                    .await?;
            }
            Command::AddTimeEntry {
                talent,
                contract,
                label,
                date,
                hours,
                milestone,
                description,
            } => {
                let entry = self
                    .engine
                    .add_time_entry(
                        self.labels.resolve(&contract),
                        self.labels.resolve(&talent),
                        NewTimeEntry {
                            date,
                            hours,
                            description,
                            milestone_id: milestone.map(|m| self.labels.resolve(&m)),
                        },
                    )
                    .await?;
                self.labels.bind(&label, entry.id);
            }
            Command::ReviewTimeEntry {
                business,
                entry,
                decision,
            } => {
                self.engine
                    .review_time_entry(
                        self.labels.resolve(&entry),
                        self.labels.resolve(&business),
                        decision,
                    )
                    .await?;
            }
            Command::SubmitMilestone { talent, milestone } => {
                self.engine
                    .submit_milestone(
                        self.labels.resolve(&milestone),
                        self.labels.resolve(&talent),
                    )
                    .await?;
            }
            Command::ReviewMilestone {
                business,
                milestone,
                decision,
            } => {
                let review = self
                    .engine
                    .review_milestone(
                        self.labels.resolve(&milestone),
                        self.labels.resolve(&business),
                        decision,
                    )
                    .await?;
                if let MilestoneSettlement::Failed(e) = review.settlement {
                    warn!(milestone = %milestone, error = %e, "milestone approved but unpaid");
                }
            }
            Command::ProcessPeriod {
                business,
                contract,
                start,
                end,
            } => {
                self.engine
                    .process_period(
                        self.labels.resolve(&contract),
                        self.labels.resolve(&business),
                        start,
                        end,
                    )
                    .await?;
            }
        }
        Ok(())
    }

    /// Every payment on the given contracts, oldest first within each
    /// contract.
    pub async fn payments<'a>(
        &self,
        contracts: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<Payment>> {
        let mut all = Vec::new();
        for label in contracts {
            let contract_id = self.labels.resolve(label);
            let contract = self
                .engine
                .stores()
                .contracts
                .get_contract(contract_id)
                .await?
                .ok_or(EngineError::NotFound("Contract"))?;
            let mut payments = self
                .engine
                .payments(contract.id, Actor::business(contract.business_id))
                .await?;
            payments.reverse();
            all.extend(payments);
        }
        Ok(all)
    }
}
