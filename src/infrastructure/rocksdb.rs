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
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const CF_CONTRACTS: &str = "contracts";
pub const CF_PROFILES: &str = "profiles";
pub const CF_MILESTONES: &str = "milestones";
pub const CF_DELIVERABLES: &str = "deliverables";
pub const CF_TIME_ENTRIES: &str = "time_entries";
pub const CF_PAYMENTS: &str = "payments";

const COLUMN_FAMILIES: [&str; 6] = [
    CF_CONTRACTS,
    CF_PROFILES,
    CF_MILESTONES,
    CF_DELIVERABLES,
    CF_TIME_ENTRIES,
    CF_PAYMENTS,
];

/// A persistent store implementation using RocksDB.
///
/// Every entity lives in its own column family, keyed by the UUID bytes and
/// stored as JSON. Read-check-write sequences (conditional updates and the
/// period-unique payment insert) are serialized through `write_lock`.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path`, creating any missing
    /// column families.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Exposes this database as every persistence port at once.
    pub fn stores(&self) -> Stores {
        Stores {
            contracts: Arc::new(self.clone()),
            milestones: Arc::new(self.clone()),
            deliverables: Arc::new(self.clone()),
            time_entries: Arc::new(self.clone()),
            payments: Arc::new(self.clone()),
        }
    }

    fn cf(&self, name: &str) -> StoreResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("{} column family not found", name)))
    }

    fn put<T: Serialize>(&self, cf: &str, key: Uuid, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(self.cf(cf)?, key.as_bytes(), bytes)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf: &str, key: Uuid) -> StoreResult<Option<T>> {
        match self.db.get_pinned_cf(self.cf(cf)?, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Full scan of one column family; fine for per-contract lists, which
    /// stay small.
    fn scan<T: DeserializeOwned>(&self, cf: &str, predicate: impl Fn(&T) -> bool) -> StoreResult<Vec<T>> {
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_key, value) = item?;
            let row: T = serde_json::from_slice(&value)?;
            if predicate(&row) {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    async fn replace_if_status<T>(&self, cf: &str, row: T, expected: T::Status) -> StoreResult<bool>
    where
        T: Record + Serialize + DeserializeOwned,
    {
        let _guard = self.write_lock.lock().await;
        match self.fetch::<T>(cf, row.id())? {
            Some(current) if current.status() == expected => {
                self.put(cf, row.id(), &row)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ContractStore for RocksDBStore {
    async fn store_contract(&self, contract: Contract) -> StoreResult<()> {
        self.put(CF_CONTRACTS, contract.id, &contract)
    }

    async fn get_contract(&self, contract_id: Uuid) -> StoreResult<Option<Contract>> {
        self.fetch(CF_CONTRACTS, contract_id)
    }

    async fn store_profile(&self, profile: TalentProfile) -> StoreResult<()> {
        self.put(CF_PROFILES, profile.user_id, &profile)
    }

    async fn get_profile(&self, talent_id: Uuid) -> StoreResult<Option<TalentProfile>> {
        self.fetch(CF_PROFILES, talent_id)
    }
}

#[async_trait]
impl MilestoneStore for RocksDBStore {
    async fn store(&self, milestone: Milestone) -> StoreResult<()> {
        self.put(CF_MILESTONES, milestone.id, &milestone)
    }

    async fn get(&self, milestone_id: Uuid) -> StoreResult<Option<Milestone>> {
        self.fetch(CF_MILESTONES, milestone_id)
    }

    async fn list_by_contract(&self, contract_id: Uuid) -> StoreResult<Vec<Milestone>> {
        self.scan(CF_MILESTONES, |m: &Milestone| m.contract_id == contract_id)
    }

    async fn update_if_status(
        &self,
        milestone: Milestone,
        expected: MilestoneStatus,
    ) -> StoreResult<bool> {
        self.replace_if_status(CF_MILESTONES, milestone, expected).await
    }
}

#[async_trait]
impl DeliverableStore for RocksDBStore {
    async fn store(&self, deliverable: Deliverable) -> StoreResult<()> {
        self.put(CF_DELIVERABLES, deliverable.id, &deliverable)
    }

    async fn get(&self, deliverable_id: Uuid) -> StoreResult<Option<Deliverable>> {
        self.fetch(CF_DELIVERABLES, deliverable_id)
    }

    async fn list_by_milestone(&self, milestone_id: Uuid) -> StoreResult<Vec<Deliverable>> {
        self.scan(CF_DELIVERABLES, |d: &Deliverable| d.milestone_id == milestone_id)
    }

    async fn update_if_status(
        &self,
        deliverable: Deliverable,
        expected: DeliverableStatus,
    ) -> StoreResult<bool> {
        self.replace_if_status(CF_DELIVERABLES, deliverable, expected).await
    }
}

#[async_trait]
impl TimeEntryStore for RocksDBStore {
    async fn store(&self, entry: TimeEntry) -> StoreResult<()> {
        self.put(CF_TIME_ENTRIES, entry.id, &entry)
    }

    async fn get(&self, entry_id: Uuid) -> StoreResult<Option<TimeEntry>> {
        self.fetch(CF_TIME_ENTRIES, entry_id)
    }

    async fn list_by_contract(&self, contract_id: Uuid) -> StoreResult<Vec<TimeEntry>> {
        self.scan(CF_TIME_ENTRIES, |e: &TimeEntry| e.contract_id == contract_id)
    }

    async fn update_if_status(
        &self,
        entry: TimeEntry,
        expected: TimeEntryStatus,
    ) -> StoreResult<bool> {
        self.replace_if_status(CF_TIME_ENTRIES, entry, expected).await
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn insert(&self, payment: Payment) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let existing = self.scan(CF_PAYMENTS, |p: &Payment| payment.duplicates_period_of(p))?;
        if let Some(existing) = existing.first() {
            return Err(StoreError::Conflict(format!(
                "period already settled by payment {}",
                existing.id
            )));
        }
        self.put(CF_PAYMENTS, payment.id, &payment)
    }

    async fn get(&self, payment_id: Uuid) -> StoreResult<Option<Payment>> {
        self.fetch(CF_PAYMENTS, payment_id)
    }

    async fn list_by_contract(&self, contract_id: Uuid) -> StoreResult<Vec<Payment>> {
        self.scan(CF_PAYMENTS, |p: &Payment| p.contract_id == contract_id)
    }

    async fn update_if_status(
        &self,
        payment: Payment,
        expected: PaymentStatus,
    ) -> StoreResult<bool> {
        self.replace_if_status(CF_PAYMENTS, payment, expected).await
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
    use tempfile::tempdir;

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
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        for name in COLUMN_FAMILIES {
            assert!(store.db.cf_handle(name).is_some(), "missing {}", name);
        }
    }

    #[tokio::test]
    async fn test_rocksdb_contract_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let c = contract();

        store.store_contract(c.clone()).await.unwrap();
        assert_eq!(store.get_contract(c.id).await.unwrap(), Some(c.clone()));
        assert!(store.get_contract(Uuid::new_v4()).await.unwrap().is_none());

        let profile = TalentProfile {
            user_id: c.talent_id,
            province: Some("QC".to_string()),
            payout_account: Some("acct_1".to_string()),
            ..TalentProfile::default()
        };
        store.store_profile(profile.clone()).await.unwrap();
        assert_eq!(store.get_profile(c.talent_id).await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn test_rocksdb_conditional_update() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let c = contract();
        let m = Milestone::new(c.id, "Design", Money::new(dec!(250)), 1);
        MilestoneStore::store(&store, m.clone()).await.unwrap();

        let mut submitted = m.clone();
        submitted.submit(0, Utc::now()).unwrap();
        assert!(MilestoneStore::update_if_status(&store, submitted.clone(), MilestoneStatus::Pending)
            .await
            .unwrap());
        assert!(!MilestoneStore::update_if_status(&store, submitted, MilestoneStatus::Pending)
            .await
            .unwrap());

        let listed = MilestoneStore::list_by_contract(&store, c.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, MilestoneStatus::Submitted);
    }

    #[tokio::test]
    async fn test_rocksdb_payment_period_conflict() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let c = contract();
        let period = SettlementPeriod {
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            total_hours: dec!(5),
        };
        let first =
            Payment::processing(&c, Money::new(dec!(200)), Money::new(dec!(20)), None, Some(period))
                .unwrap();
        store.insert(first).await.unwrap();

        let second =
            Payment::processing(&c, Money::new(dec!(200)), Money::new(dec!(20)), None, Some(period))
                .unwrap();
        assert!(matches!(
            store.insert(second).await,
            Err(StoreError::Conflict(_))
        ));
    }
}
