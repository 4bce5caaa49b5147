use super::payments::PaymentProcessor;
use crate::config::EngineConfig;
use crate::domain::contract::{Actor, Contract, TalentProfile};
use crate::domain::milestone::Milestone;
use crate::domain::money::Money;
use crate::domain::payment::Payment;
use crate::domain::ports::{
    FeeBreakdown, FeeCalculator, Notification, Notifier, Stores, TransferService,
};
use crate::error::{EngineError, Result};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Entry point for every contract fulfillment operation.
///
/// Holds no mutable state of its own: each operation re-reads the entities
/// it gates on and writes back through status-conditional updates, so one
/// engine can be shared by any number of concurrent request handlers.
/// Lifecycle operations live in the sibling modules, one `impl` block per
/// entity.
pub struct FulfillmentEngine {
    pub(crate) stores: Stores,
    pub(crate) fees: Arc<dyn FeeCalculator>,
    pub(crate) payments: PaymentProcessor,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) config: EngineConfig,
}

impl FulfillmentEngine {
    /// Creates a new `FulfillmentEngine`.
    ///
    /// # Arguments
    ///
    /// * `stores` - Persistence ports for every entity.
    /// * `fees` - Fee calculator consulted before each payment.
    /// * `transfers` - Payout service invoked by the payment processor.
    /// * `notifier` - Fire-and-forget dispatcher for lifecycle events.
    /// * `config` - Timeouts and defaults.
    pub fn new(
        stores: Stores,
        fees: Arc<dyn FeeCalculator>,
        transfers: Arc<dyn TransferService>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        let payments = PaymentProcessor::new(
            Arc::clone(&stores.payments),
            transfers,
            Arc::clone(&notifier),
            config.transfer_timeout,
        );
        Self {
            stores,
            fees,
            payments,
            notifier,
            config,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Loads a contract only if `actor` is the party matching its role.
    pub(crate) async fn scoped_contract(&self, contract_id: Uuid, actor: &Actor) -> Result<Contract> {
        self.stores
            .contracts
            .get_contract(contract_id)
            .await?
            .filter(|c| c.is_party(actor))
            .ok_or(EngineError::NotFound("Contract"))
    }

    /// Loads a milestone together with its contract, scoped to `actor`.
    pub(crate) async fn scoped_milestone(
        &self,
        milestone_id: Uuid,
        actor: &Actor,
    ) -> Result<(Milestone, Contract)> {
        let milestone = self
            .stores
            .milestones
            .get(milestone_id)
            .await?
            .ok_or(EngineError::NotFound("Milestone"))?;
        let contract = self
            .stores
            .contracts
            .get_contract(milestone.contract_id)
            .await?
            .filter(|c| c.is_party(actor))
            .ok_or(EngineError::NotFound("Milestone"))?;
        Ok((milestone, contract))
    }

    /// A talent without a stored profile is treated as having no location,
    /// no exemption and no payout account.
    pub(crate) async fn talent_profile(&self, talent_id: Uuid) -> Result<TalentProfile> {
        Ok(self
            .stores
            .contracts
            .get_profile(talent_id)
            .await?
            .unwrap_or_else(|| TalentProfile {
                user_id: talent_id,
                ..Default::default()
            }))
    }

    pub(crate) fn fee_breakdown(&self, gross: Money, profile: &TalentProfile) -> Result<FeeBreakdown> {
        self.fees.calculate_talent_platform_fee(
            gross,
            profile.province_or(&self.config.default_province),
            profile.has_tax_exemption(),
        )
    }

    pub(crate) fn dispatch(&self, notification: Notification) {
        spawn_notification(&self.notifier, notification);
    }

    /// Lists every payment made on a contract, newest first.
    #[instrument(skip(self))]
    pub async fn payments(&self, contract_id: Uuid, actor: Actor) -> Result<Vec<Payment>> {
        let contract = self.scoped_contract(contract_id, &actor).await?;
        let mut payments = self.stores.payments.list_by_contract(contract.id).await?;
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }
}

/// Sends a notification without waiting for it. Dispatch failures are
/// logged and dropped.
pub(crate) fn spawn_notification(notifier: &Arc<dyn Notifier>, notification: Notification) {
    let notifier = Arc::clone(notifier);
    tokio::spawn(async move {
        let event = notification.event_type();
        if let Err(e) = notifier.notify(notification).await {
            warn!(event, error = %e, "notification dropped");
        }
    });
}
