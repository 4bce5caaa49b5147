use super::engine::FulfillmentEngine;
use super::payments::PaymentRequest;
use crate::domain::contract::{Actor, Contract, TalentProfile};
use crate::domain::money::{Money, total_hours};
use crate::domain::payment::Payment;
use crate::domain::ports::TransferContext;
use crate::domain::time_entry::{TimeEntry, TimeEntryStatus};
use crate::error::{EngineError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

/// Payable totals for the approved hours of one billing period.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementSummary {
    pub contract_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Approved entries in the period, oldest first.
    pub time_entries: Vec<TimeEntry>,
    pub total_hours: Decimal,
    pub hourly_rate: Money,
    pub gross_amount: Money,
    pub platform_fee: Money,
    pub total_fee: Money,
    pub net_amount: Money,
    pub province: String,
    pub has_tax_exemption: bool,
    pub can_process: bool,
}

impl FulfillmentEngine {
    #[instrument(skip(self))]
    pub async fn summarize_period(
        &self,
        contract_id: Uuid,
        business_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<SettlementSummary> {
        let (summary, _, _) = self
            .build_summary(contract_id, business_id, period_start, period_end)
            .await?;
        Ok(summary)
    }

    /// Pays out the approved hours of a period.
    ///
    /// A period that already has a processing or completed payment is
    /// refused; a period whose earlier payment FAILED may be processed again.
    #[instrument(skip(self))]
    pub async fn process_period(
        &self,
        contract_id: Uuid,
        business_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Payment> {
        let (summary, contract, talent) = self
            .build_summary(contract_id, business_id, period_start, period_end)
            .await?;
        if !summary.can_process {
            return Err(EngineError::invalid_operation(
                "No approved hours to process for this period",
            ));
        }
        if talent.payout_destination().is_none() {
            return Err(EngineError::invalid_operation(
                "Talent payout account not set up",
            ));
        }

        let payment = self
            .payments
            .settle(
                &contract,
                &talent,
                PaymentRequest {
                    amount: summary.gross_amount,
                    fee: summary.total_fee,
                    context: TransferContext::Period {
                        start: summary.period_start,
                        end: summary.period_end,
                        total_hours: summary.total_hours,
                    },
                },
            )
            .await?;
        info!(payment_id = %payment.id, hours = %summary.total_hours, "period settled");
        Ok(payment)
    }

    async fn build_summary(
        &self,
        contract_id: Uuid,
        business_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<(SettlementSummary, Contract, TalentProfile)> {
        if period_start > period_end {
            return Err(EngineError::validation(
                "Period start must not be after period end",
            ));
        }
        let contract = self
            .scoped_contract(contract_id, &Actor::business(business_id))
            .await?;
        if !contract.is_hourly() {
            return Err(EngineError::invalid_operation(
                "Biweekly settlement is only available for hourly contracts",
            ));
        }

        let mut entries: Vec<TimeEntry> = self
            .stores
            .time_entries
            .list_by_contract(contract.id)
            .await?
            .into_iter()
            .filter(|e| e.status == TimeEntryStatus::Approved)
            .filter(|e| e.falls_within(period_start, period_end))
            .collect();
        entries.sort_by_key(|e| e.date);

        let hours = total_hours(entries.iter().map(|e| &e.hours))?;
        let rate = contract.rate();
        let gross_amount = rate.times(hours)?.round_cents();

        let talent = self.talent_profile(contract.talent_id).await?;
        let province = talent
            .province_or(&self.config.default_province)
            .to_string();
        let has_tax_exemption = talent.has_tax_exemption();
        let fees = self.fee_breakdown(gross_amount, &talent)?;

        let summary = SettlementSummary {
            contract_id: contract.id,
            period_start,
            period_end,
            time_entries: entries,
            total_hours: hours,
            hourly_rate: rate,
            gross_amount,
            platform_fee: fees.platform_fee,
            total_fee: fees.total_fee,
            net_amount: gross_amount.checked_sub(fees.total_fee)?,
            province,
            has_tax_exemption,
            can_process: hours > Decimal::ZERO,
        };
        Ok((summary, contract, talent))
    }
}
