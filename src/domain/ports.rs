use super::contract::{Contract, TalentProfile};
use super::deliverable::{Deliverable, DeliverableStatus};
use super::milestone::{Milestone, MilestoneStatus};
use super::money::Money;
use super::payment::{Payment, PaymentStatus};
use super::time_entry::{TimeEntry, TimeEntryStatus};
use crate::error::{EngineError, NotifyError, StoreResult, TransferError};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// An entity whose writes are guarded by its current status.
pub trait Record: Clone + Send + Sync + 'static {
    type Status: PartialEq + Copy + Send + Sync + std::fmt::Debug;

    fn id(&self) -> Uuid;
    fn status(&self) -> Self::Status;
}

macro_rules! impl_record {
    ($entity:ty, $status:ty) => {
        impl Record for $entity {
            type Status = $status;

            fn id(&self) -> Uuid {
                self.id
            }

            fn status(&self) -> Self::Status {
                self.status
            }
        }
    };
}

impl_record!(Milestone, MilestoneStatus);
impl_record!(Deliverable, DeliverableStatus);
impl_record!(TimeEntry, TimeEntryStatus);
impl_record!(Payment, PaymentStatus);

#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn store_contract(&self, contract: Contract) -> StoreResult<()>;
    async fn get_contract(&self, contract_id: Uuid) -> StoreResult<Option<Contract>>;
    async fn store_profile(&self, profile: TalentProfile) -> StoreResult<()>;
    async fn get_profile(&self, talent_id: Uuid) -> StoreResult<Option<TalentProfile>>;
}

// `update_if_status` writes only when the stored copy is still in
// `expected`; `false` means another request got there first.

#[async_trait]
pub trait MilestoneStore: Send + Sync {
    async fn store(&self, milestone: Milestone) -> StoreResult<()>;
    async fn get(&self, milestone_id: Uuid) -> StoreResult<Option<Milestone>>;
    async fn list_by_contract(&self, contract_id: Uuid) -> StoreResult<Vec<Milestone>>;
    async fn update_if_status(
        &self,
        milestone: Milestone,
        expected: MilestoneStatus,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait DeliverableStore: Send + Sync {
    async fn store(&self, deliverable: Deliverable) -> StoreResult<()>;
    async fn get(&self, deliverable_id: Uuid) -> StoreResult<Option<Deliverable>>;
    async fn list_by_milestone(&self, milestone_id: Uuid) -> StoreResult<Vec<Deliverable>>;
    async fn update_if_status(
        &self,
        deliverable: Deliverable,
        expected: DeliverableStatus,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait TimeEntryStore: Send + Sync {
    async fn store(&self, entry: TimeEntry) -> StoreResult<()>;
    async fn get(&self, entry_id: Uuid) -> StoreResult<Option<TimeEntry>>;
    async fn list_by_contract(&self, contract_id: Uuid) -> StoreResult<Vec<TimeEntry>>;
    async fn update_if_status(
        &self,
        entry: TimeEntry,
        expected: TimeEntryStatus,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a new payment. Fails with `StoreError::Conflict` when the
    /// payment settles a period that already has a non-failed payment.
    async fn insert(&self, payment: Payment) -> StoreResult<()>;
    async fn get(&self, payment_id: Uuid) -> StoreResult<Option<Payment>>;
    async fn list_by_contract(&self, contract_id: Uuid) -> StoreResult<Vec<Payment>>;
    async fn update_if_status(&self, payment: Payment, expected: PaymentStatus)
    -> StoreResult<bool>;
}

/// The full set of persistence ports the engine depends on.
#[derive(Clone)]
pub struct Stores {
    pub contracts: Arc<dyn ContractStore>,
    pub milestones: Arc<dyn MilestoneStore>,
    pub deliverables: Arc<dyn DeliverableStore>,
    pub time_entries: Arc<dyn TimeEntryStore>,
    pub payments: Arc<dyn PaymentStore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub platform_fee: Money,
    /// Platform fee plus any bundled processing or tax component.
    pub total_fee: Money,
}

pub trait FeeCalculator: Send + Sync {
    fn calculate_talent_platform_fee(
        &self,
        gross_amount: Money,
        province_code: &str,
        has_tax_exemption: bool,
    ) -> Result<FeeBreakdown, EngineError>;
}

/// What a transfer pays for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferContext {
    Milestone {
        milestone_id: Uuid,
        title: String,
    },
    Period {
        start: NaiveDate,
        end: NaiveDate,
        total_hours: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferMetadata {
    pub contract_id: Uuid,
    pub payment_id: Uuid,
    pub context: TransferContext,
}

impl TransferMetadata {
    pub fn description(&self) -> String {
        match &self.context {
            TransferContext::Milestone { title, .. } => {
                format!("Payment for milestone \"{}\" on contract {}", title, self.contract_id)
            }
            TransferContext::Period {
                start,
                end,
                total_hours,
            } => format!(
                "Hourly payment for {} to {} ({} hours) on contract {}",
                start,
                end,
                total_hours.normalize(),
                self.contract_id
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub transfer_id: String,
}

#[async_trait]
pub trait TransferService: Send + Sync {
    async fn transfer_to_payee(
        &self,
        amount: Money,
        destination_account_id: &str,
        metadata: &TransferMetadata,
    ) -> Result<TransferReceipt, TransferError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    DeliverableSubmitted {
        deliverable_id: Uuid,
        business_id: Uuid,
    },
    MilestoneSubmitted {
        milestone_id: Uuid,
        business_id: Uuid,
    },
    MilestoneApproved {
        milestone_id: Uuid,
        talent_id: Uuid,
    },
    MilestoneRejected {
        milestone_id: Uuid,
        talent_id: Uuid,
    },
    PaymentReceived {
        payment_id: Uuid,
        talent_id: Uuid,
        net_amount: Money,
    },
}

impl Notification {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::DeliverableSubmitted { .. } => "deliverable_submitted",
            Self::MilestoneSubmitted { .. } => "milestone_submitted",
            Self::MilestoneApproved { .. } => "milestone_approved",
            Self::MilestoneRejected { .. } => "milestone_rejected",
            Self::PaymentReceived { .. } => "payment_received",
        }
    }
}

/// Email/notification dispatcher. Callers never wait on delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}
