use crate::domain::contract::{Contract, TalentProfile};
use crate::domain::deliverable::{Deliverable, DeliverableStatus};
use crate::domain::milestone::{Milestone, MilestoneStatus};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::ports::{
    ContractStore, DeliverableStore, MilestoneStore, PaymentStore, Record, Stores, TimeEntryStore,
};
use crate::domain::time_entry::{TimeEntry, TimeEntryStatus};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A shared map of records keyed by id.
///
/// Conditional updates run entirely under the write lock, which makes the
/// status check and the write a single step.
struct Table<T> {
    rows: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T: Record> Table<T> {
    async fn put(&self, row: T) {
        self.rows.write().await.insert(row.id(), row);
    }

    async fn get(&self, id: Uuid) -> Option<T> {
        self.rows.read().await.get(&id).cloned()
    }

    async fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows
            .read()
            .await
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }

    async fn update_if_status(&self, row: T, expected: T::Status) -> bool {
        let mut rows = self.rows.write().await;
        match rows.get(&row.id()) {
            Some(current) if current.status() == expected => {
                rows.insert(row.id(), row);
                true
            }
            _ => false,
        }
    }
}

/// In-memory store for contracts and talent profiles.
#[derive(Default, Clone)]
pub struct InMemoryContractStore {
    contracts: Arc<RwLock<HashMap<Uuid, Contract>>>,
    profiles: Arc<RwLock<HashMap<Uuid, TalentProfile>>>,
}

impl InMemoryContractStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContractStore for InMemoryContractStore {
    async fn store_contract(&self, contract: Contract) -> StoreResult<()> {
        self.contracts.write().await.insert(contract.id, contract);
        Ok(())
    }

    async fn get_contract(&self, contract_id: Uuid) -> StoreResult<Option<Contract>> {
        Ok(self.contracts.read().await.get(&contract_id).cloned())
    }

    async fn store_profile(&self, profile: TalentProfile) -> StoreResult<()> {
        self.profiles.write().await.insert(profile.user_id, profile);
        Ok(())
    }

    async fn get_profile(&self, talent_id: Uuid) -> StoreResult<Option<TalentProfile>> {
        Ok(self.profiles.read().await.get(&talent_id).cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryMilestoneStore {
    table: Table<Milestone>,
}

impl InMemoryMilestoneStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MilestoneStore for InMemoryMilestoneStore {
    async fn store(&self, milestone: Milestone) -> StoreResult<()> {
        self.table.put(milestone).await;
        Ok(())
    }

    async fn get(&self, milestone_id: Uuid) -> StoreResult<Option<Milestone>> {
        Ok(self.table.get(milestone_id).await)
    }

    async fn list_by_contract(&self, contract_id: Uuid) -> StoreResult<Vec<Milestone>> {
        Ok(self.table.filter(|m| m.contract_id == contract_id).await)
    }

    async fn update_if_status(
        &self,
        milestone: Milestone,
        expected: MilestoneStatus,
    ) -> StoreResult<bool> {
        Ok(self.table.update_if_status(milestone, expected).await)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryDeliverableStore {
    table: Table<Deliverable>,
}

impl InMemoryDeliverableStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeliverableStore for InMemoryDeliverableStore {
    async fn store(&self, deliverable: Deliverable) -> StoreResult<()> {
        self.table.put(deliverable).await;
        Ok(())
    }

    async fn get(&self, deliverable_id: Uuid) -> StoreResult<Option<Deliverable>> {
        Ok(self.table.get(deliverable_id).await)
    }

    async fn list_by_milestone(&self, milestone_id: Uuid) -> StoreResult<Vec<Deliverable>> {
        Ok(self.table.filter(|d| d.milestone_id == milestone_id).await)
    }

    async fn update_if_status(
        &self,
        deliverable: Deliverable,
        expected: DeliverableStatus,
    ) -> StoreResult<bool> {
        Ok(self.table.update_if_status(deliverable, expected).await)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryTimeEntryStore {
    table: Table<TimeEntry>,
}

impl InMemoryTimeEntryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TimeEntryStore for InMemoryTimeEntryStore {
    async fn store(&self, entry: TimeEntry) -> StoreResult<()> {
        self.table.put(entry).await;
        Ok(())
    }

    async fn get(&self, entry_id: Uuid) -> StoreResult<Option<TimeEntry>> {
        Ok(self.table.get(entry_id).await)
    }

    async fn list_by_contract(&self, contract_id: Uuid) -> StoreResult<Vec<TimeEntry>> {
        Ok(self.table.filter(|e| e.contract_id == contract_id).await)
    }

    async fn update_if_status(
        &self,
        entry: TimeEntry,
        expected: TimeEntryStatus,
    ) -> StoreResult<bool> {
        Ok(self.table.update_if_status(entry, expected).await)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    table: Table<Payment>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: Payment) -> StoreResult<()> {
        let mut rows = self.table.rows.write().await;
        if let Some(existing) = rows.values().find(|p| payment.duplicates_period_of(p)) {
            return Err(StoreError::Conflict(format!(
                "period already settled by payment {}",
                existing.id
            )));
        }
        rows.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, payment_id: Uuid) -> StoreResult<Option<Payment>> {
        Ok(self.table.get(payment_id).await)
    }

    async fn list_by_contract(&self, contract_id: Uuid) -> StoreResult<Vec<Payment>> {
        Ok(self.table.filter(|p| p.contract_id == contract_id).await)
    }

    async fn update_if_status(
        &self,
        payment: Payment,
        expected: PaymentStatus,
    ) -> StoreResult<bool> {
        Ok(self.table.update_if_status(payment, expected).await)
    }
}

/// Builds a complete set of fresh in-memory stores.
pub fn in_memory_stores() -> Stores {
    Stores {
        contracts: Arc::new(InMemoryContractStore::new()),
        milestones: Arc::new(InMemoryMilestoneStore::new()),
        deliverables: Arc::new(InMemoryDeliverableStore::new()),
        time_entries: Arc::new(InMemoryTimeEntryStore::new()),
        payments: Arc::new(InMemoryPaymentStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::ProjectType;
    use crate::domain::money::Money;
    use crate::domain::payment::SettlementPeriod;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn contract() -> Contract {
        Contract {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            talent_id: Uuid::new_v4(),
            project_type: ProjectType::Hourly,
            hourly_rate: Some(Money::new(dec!(40))),
        }
    }

    #[tokio::test]
    async fn test_in_memory_contract_store() {
        let store = InMemoryContractStore::new();
        let c = contract();
        store.store_contract(c.clone()).await.unwrap();
        assert_eq!(store.get_contract(c.id).await.unwrap(), Some(c));
        assert!(store.get_contract(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_if_status_rejects_stale_writes() {
        let store = InMemoryMilestoneStore::new();
        let m = Milestone::new(Uuid::new_v4(), "Build", Money::new(dec!(100)), 1);
        store.store(m.clone()).await.unwrap();

        let mut first = m.clone();
        first.submit(0, Utc::now()).unwrap();
        let mut second = m.clone();
        second.submit(0, Utc::now()).unwrap();

        assert!(store
            .update_if_status(first, MilestoneStatus::Pending)
            .await
            .unwrap());
        // The second writer still believes the milestone is pending.
        assert!(!store
            .update_if_status(second, MilestoneStatus::Pending)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_update_if_status_on_missing_row() {
        let store = InMemoryMilestoneStore::new();
        let m = Milestone::new(Uuid::new_v4(), "Build", Money::new(dec!(100)), 1);
        assert!(!store
            .update_if_status(m, MilestoneStatus::Pending)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_payment_period_uniqueness() {
        let store = InMemoryPaymentStore::new();
        let c = contract();
        let period = SettlementPeriod {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
            total_hours: dec!(8),
        };
        let mut first =
            Payment::processing(&c, Money::new(dec!(320)), Money::new(dec!(32)), None, Some(period))
                .unwrap();
        store.insert(first.clone()).await.unwrap();

        let second =
            Payment::processing(&c, Money::new(dec!(320)), Money::new(dec!(32)), None, Some(period))
                .unwrap();
        assert!(matches!(
            store.insert(second.clone()).await,
            Err(StoreError::Conflict(_))
        ));

        // A failed attempt frees the period for a retry.
        first.fail("declined", Utc::now()).unwrap();
        assert!(store
            .update_if_status(first, PaymentStatus::Processing)
            .await
            .unwrap());
        store.insert(second).await.unwrap();
        assert_eq!(store.list_by_contract(c.id).await.unwrap().len(), 2);
    }
}
