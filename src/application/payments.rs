use super::engine::spawn_notification;
use crate::domain::contract::{Contract, TalentProfile};
use crate::domain::money::Money;
use crate::domain::payment::{Payment, PaymentStatus, SettlementPeriod};
use crate::domain::ports::{
    Notification, Notifier, PaymentStore, TransferContext, TransferMetadata, TransferReceipt,
    TransferService,
};
use crate::error::{EngineError, Result, StoreError, TransferError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Attempts made to record a payment's final status before giving up.
const FINALIZE_ATTEMPTS: u32 = 3;
const FINALIZE_BACKOFF: Duration = Duration::from_millis(50);

/// Amounts and purpose of a payment about to be made.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Gross amount owed by the business.
    pub amount: Money,
    /// Fee withheld from the talent.
    pub fee: Money,
    pub context: TransferContext,
}

/// Turns approved work into a transfer and records the outcome.
///
/// The payment row is written as PROCESSING before the transfer is
/// attempted and always ends COMPLETED or FAILED afterwards. Nothing here
/// retries a failed transfer.
pub struct PaymentProcessor {
    store: Arc<dyn PaymentStore>,
    transfers: Arc<dyn TransferService>,
    notifier: Arc<dyn Notifier>,
    transfer_timeout: Duration,
}

impl PaymentProcessor {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        transfers: Arc<dyn TransferService>,
        notifier: Arc<dyn Notifier>,
        transfer_timeout: Duration,
    ) -> Self {
        Self {
            store,
            transfers,
            notifier,
            transfer_timeout,
        }
    }

    pub async fn settle(
        &self,
        contract: &Contract,
        talent: &TalentProfile,
        request: PaymentRequest,
    ) -> Result<Payment> {
        let destination = talent
            .payout_destination()
            .ok_or_else(|| EngineError::invalid_operation("Talent payout account not set up"))?
            .to_string();

        let (milestone_id, period) = match &request.context {
            TransferContext::Milestone { milestone_id, .. } => (Some(*milestone_id), None),
            TransferContext::Period {
                start,
                end,
                total_hours,
            } => (
                None,
                Some(SettlementPeriod {
                    start: *start,
                    end: *end,
                    total_hours: *total_hours,
                }),
            ),
        };

        let mut payment =
            Payment::processing(contract, request.amount, request.fee, milestone_id, period)?;
        self.store
            .insert(payment.clone())
            .await
            .map_err(|e| match e {
                StoreError::Conflict(msg) => EngineError::InvalidOperation(msg),
                other => EngineError::Persistence(other),
            })?;
        info!(
            payment_id = %payment.id,
            contract_id = %contract.id,
            amount = %payment.amount,
            fee = %payment.platform_fee,
            net = %payment.net_amount,
            "payment created"
        );

        let metadata = TransferMetadata {
            contract_id: contract.id,
            payment_id: payment.id,
            context: request.context,
        };

        match self.transfer(payment.net_amount, &destination, &metadata).await {
            Ok(receipt) => {
                payment.complete(receipt.transfer_id, Utc::now())?;
                self.finalize(&payment).await?;
                info!(
                    payment_id = %payment.id,
                    transfer_id = payment.stripe_transfer_id.as_deref().unwrap_or_default(),
                    "payment completed"
                );
                spawn_notification(
                    &self.notifier,
                    Notification::PaymentReceived {
                        payment_id: payment.id,
                        talent_id: payment.payee_id,
                        net_amount: payment.net_amount,
                    },
                );
                Ok(payment)
            }
            Err(transfer_error) => {
                payment.fail(transfer_error.message.clone(), Utc::now())?;
                self.finalize(&payment).await?;
                warn!(
                    payment_id = %payment.id,
                    reason = %transfer_error,
                    "payment failed"
                );
                Err(EngineError::TransferFailure {
                    payment_id: payment.id,
                    message: transfer_error.message,
                })
            }
        }
    }

    async fn transfer(
        &self,
        amount: Money,
        destination: &str,
        metadata: &TransferMetadata,
    ) -> std::result::Result<TransferReceipt, TransferError> {
        match tokio::time::timeout(
            self.transfer_timeout,
            self.transfers
                .transfer_to_payee(amount, destination, metadata),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(TransferError::new(format!(
                "Transfer timed out after {} ms",
                self.transfer_timeout.as_millis()
            ))),
        }
    }

    /// Records a COMPLETED or FAILED payment, retrying transient storage
    /// errors: after a transfer attempt this write must not be skipped.
    async fn finalize(&self, payment: &Payment) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self
                .store
                .update_if_status(payment.clone(), PaymentStatus::Processing)
                .await
            {
                Ok(true) => return Ok(()),
                Ok(false) => {
                    return Err(EngineError::invalid_state(format!(
                        "Payment {} was finalized concurrently",
                        payment.id
                    )));
                }
                Err(e) if attempt < FINALIZE_ATTEMPTS => {
                    warn!(payment_id = %payment.id, attempt, error = %e, "retrying payment status write");
                    tokio::time::sleep(FINALIZE_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        payment_id = %payment.id,
                        status = ?payment.status,
                        transfer_id = payment.stripe_transfer_id.as_deref().unwrap_or_default(),
                        error = %e,
                        "could not record payment outcome"
                    );
                    return Err(e.into());
                }
            }
        }
    }
}
