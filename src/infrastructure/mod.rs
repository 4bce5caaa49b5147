//! Adapters for the domain ports: storage, fees, payouts and notifications.

pub mod fees;
pub mod in_memory;
pub mod notify;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod transfer;
