use crate::domain::money::Money;
use crate::domain::ports::{TransferMetadata, TransferReceipt, TransferService};
use crate::error::TransferError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// A transfer accepted by [`SimulatedTransferService`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTransfer {
    pub transfer_id: String,
    pub amount: Money,
    pub destination: String,
    pub metadata: TransferMetadata,
}

/// Payout service that moves no money.
///
/// Accepts every transfer except those to a declined destination, and keeps
/// a log of what it accepted. An optional latency lets callers exercise the
/// engine's transfer timeout.
#[derive(Clone, Default)]
pub struct SimulatedTransferService {
    declined: Arc<HashSet<String>>,
    latency: Option<Duration>,
    log: Arc<Mutex<Vec<RecordedTransfer>>>,
}

impl SimulatedTransferService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declining<I, S>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declined = Arc::new(accounts.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn transfers(&self) -> Vec<RecordedTransfer> {
        self.log.lock().await.clone()
    }
}

#[async_trait]
impl TransferService for SimulatedTransferService {
    async fn transfer_to_payee(
        &self,
        amount: Money,
        destination_account_id: &str,
        metadata: &TransferMetadata,
    ) -> Result<TransferReceipt, TransferError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.declined.contains(destination_account_id) {
            return Err(TransferError::new(format!(
                "Destination account {} declined the transfer",
                destination_account_id
            )));
        }
        let transfer_id = format!("tr_{}", Uuid::new_v4().simple());
        self.log.lock().await.push(RecordedTransfer {
            transfer_id: transfer_id.clone(),
            amount,
            destination: destination_account_id.to_string(),
            metadata: metadata.clone(),
        });
        Ok(TransferReceipt { transfer_id })
    }
}
