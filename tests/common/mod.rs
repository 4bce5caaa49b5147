#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use contractpay::application::engine::FulfillmentEngine;
use contractpay::config::EngineConfig;
use contractpay::domain::contract::{Contract, ProjectType, TalentProfile};
use contractpay::domain::milestone::{Milestone, MilestoneStatus};
use contractpay::domain::money::Money;
use contractpay::domain::ports::{Notification, Notifier, Stores};
use contractpay::domain::review::ReviewDecision;
use contractpay::domain::time_entry::{NewTimeEntry, TimeEntry};
use contractpay::error::NotifyError;
use contractpay::infrastructure::fees::FlatRateFeeCalculator;
use contractpay::infrastructure::in_memory::in_memory_stores;
use contractpay::infrastructure::notify::TracingNotifier;
use contractpay::infrastructure::transfer::SimulatedTransferService;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;
use uuid::Uuid;

pub const PAYOUT_ACCOUNT: &str = "acct_talent";

/// An engine over fresh in-memory stores with one seeded contract.
pub struct Harness {
    pub engine: FulfillmentEngine,
    pub transfers: SimulatedTransferService,
    pub contract: Contract,
}

pub fn contract(project_type: ProjectType, hourly_rate: Option<Decimal>) -> Contract {
    Contract {
        id: Uuid::new_v4(),
        business_id: Uuid::new_v4(),
        talent_id: Uuid::new_v4(),
        project_type,
        hourly_rate: hourly_rate.map(Money::new),
    }
}

pub fn profile(talent_id: Uuid) -> TalentProfile {
    TalentProfile {
        user_id: talent_id,
        province: Some("ON".to_string()),
        payout_account: Some(PAYOUT_ACCOUNT.to_string()),
        ..TalentProfile::default()
    }
}

pub fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

pub fn engine(stores: Stores, transfers: SimulatedTransferService) -> FulfillmentEngine {
    engine_with_notifier(stores, transfers, Arc::new(TracingNotifier))
}

pub fn engine_with_notifier(
    stores: Stores,
    transfers: SimulatedTransferService,
    notifier: Arc<dyn Notifier>,
) -> FulfillmentEngine {
    FulfillmentEngine::new(
        stores,
        Arc::new(FlatRateFeeCalculator::new(dec!(0.10))),
        Arc::new(transfers),
        notifier,
        EngineConfig::default(),
    )
}

/// Notifier whose every dispatch fails. Counts the attempts.
#[derive(Default)]
pub struct FailingNotifier {
    attempts: AtomicUsize,
}

impl FailingNotifier {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError("mail relay unreachable".to_string()))
    }
}

impl Harness {
    pub async fn fixed_price() -> Self {
        Self::build(contract(ProjectType::FixedPrice, None), true, SimulatedTransferService::new()).await
    }

    pub async fn hourly(rate: Decimal) -> Self {
        Self::build(contract(ProjectType::Hourly, Some(rate)), true, SimulatedTransferService::new()).await
    }

    /// Seeds `contract` and, when `with_payout` is set, a talent profile with
    /// a payout account.
    pub async fn build(contract: Contract, with_payout: bool, transfers: SimulatedTransferService) -> Self {
        Self::build_with_notifier(contract, with_payout, transfers, Arc::new(TracingNotifier)).await
    }

    pub async fn build_with_notifier(
        contract: Contract,
        with_payout: bool,
        transfers: SimulatedTransferService,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let stores = in_memory_stores();
        stores.contracts.store_contract(contract.clone()).await.unwrap();
        let mut talent = profile(contract.talent_id);
        if !with_payout {
            talent.payout_account = None;
        }
        stores.contracts.store_profile(talent).await.unwrap();
        Self {
            engine: engine_with_notifier(stores, transfers.clone(), notifier),
            transfers,
            contract,
        }
    }

    pub fn business(&self) -> Uuid {
        self.contract.business_id
    }

    pub fn talent(&self) -> Uuid {
        self.contract.talent_id
    }

    pub async fn milestone(&self, title: &str, amount: Decimal, order: u32) -> Milestone {
        self.milestone_in(title, amount, order, MilestoneStatus::Pending).await
    }

    pub async fn milestone_in(
        &self,
        title: &str,
        amount: Decimal,
        order: u32,
        status: MilestoneStatus,
    ) -> Milestone {
        let mut milestone = Milestone::new(self.contract.id, title, Money::new(amount), order);
        milestone.status = status;
        self.engine
            .stores()
            .milestones
            .store(milestone.clone())
            .await
            .unwrap();
        milestone
    }

    pub async fn log_hours(&self, date: NaiveDate, hours: Decimal) -> TimeEntry {
        self.engine
            .add_time_entry(
                self.contract.id,
                self.talent(),
                NewTimeEntry {
                    date,
                    hours,
                    description: "work".to_string(),
                    milestone_id: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn approved_hours(&self, date: NaiveDate, hours: Decimal) -> TimeEntry {
        let entry = self.log_hours(date, hours).await;
        self.engine
            .review_time_entry(entry.id, self.business(), ReviewDecision::Approve)
            .await
            .unwrap()
    }
}

pub fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}
