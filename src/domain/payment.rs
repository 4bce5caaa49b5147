use super::contract::Contract;
use super::money::Money;
use crate::error::EngineError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Processing,
    Completed,
    Failed,
}

/// Billing window of an hourly settlement, inclusive on both ends.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct SettlementPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_hours: Decimal,
}

impl SettlementPeriod {
    pub fn same_window(&self, other: &SettlementPeriod) -> bool {
        self.start == other.start && self.end == other.end
    }
}

/// A transfer of funds from the business to the talent.
///
/// Only the engine creates payments. `net_amount` is derived from
/// `amount` and `platform_fee` at construction and never set directly.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub milestone_id: Option<Uuid>,
    pub period: Option<SettlementPeriod>,
    pub payer_id: Uuid,
    pub payee_id: Uuid,
    pub amount: Money,
    pub platform_fee: Money,
    pub net_amount: Money,
    pub status: PaymentStatus,
    pub stripe_transfer_id: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn processing(
        contract: &Contract,
        amount: Money,
        platform_fee: Money,
        milestone_id: Option<Uuid>,
        period: Option<SettlementPeriod>,
    ) -> Result<Self, EngineError> {
        if platform_fee > amount {
            return Err(EngineError::validation(format!(
                "Fee {} exceeds gross amount {}",
                platform_fee, amount
            )));
        }
        let net_amount = amount.checked_sub(platform_fee)?;
        Ok(Self {
            id: Uuid::new_v4(),
            contract_id: contract.id,
            milestone_id,
            period,
            payer_id: contract.business_id,
            payee_id: contract.talent_id,
            amount,
            platform_fee,
            net_amount,
            status: PaymentStatus::Processing,
            stripe_transfer_id: None,
            failure_reason: None,
            created_at: Utc::now(),
            processed_at: None,
        })
    }

    pub fn complete(&mut self, transfer_id: String, now: DateTime<Utc>) -> Result<(), EngineError> {
        self.ensure_processing()?;
        self.status = PaymentStatus::Completed;
        self.stripe_transfer_id = Some(transfer_id);
        self.processed_at = Some(now);
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> Result<(), EngineError> {
        self.ensure_processing()?;
        self.status = PaymentStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.processed_at = Some(now);
        Ok(())
    }

    /// Whether `self` would settle the same period as `other`, which still
    /// counts as live unless it FAILED.
    pub fn duplicates_period_of(&self, other: &Payment) -> bool {
        other.contract_id == self.contract_id
            && other.status != PaymentStatus::Failed
            && match (&self.period, &other.period) {
                (Some(mine), Some(theirs)) => mine.same_window(theirs),
                _ => false,
            }
    }

    fn ensure_processing(&self) -> Result<(), EngineError> {
        if self.status == PaymentStatus::Processing {
            Ok(())
        } else {
            Err(EngineError::invalid_state(format!(
                "Payment {} has already been finalized",
                self.id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::ProjectType;
    use rust_decimal_macros::dec;

    fn contract() -> Contract {
        Contract {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            talent_id: Uuid::new_v4(),
            project_type: ProjectType::FixedPrice,
            hourly_rate: None,
        }
    }

    #[test]
    fn test_processing_payment_parties_and_net() {
        let c = contract();
        let p = Payment::processing(&c, Money::new(dec!(500.00)), Money::new(dec!(50.00)), None, None)
            .unwrap();
        assert_eq!(p.payer_id, c.business_id);
        assert_eq!(p.payee_id, c.talent_id);
        assert_eq!(p.net_amount, Money::new(dec!(450.00)));
        assert_eq!(p.status, PaymentStatus::Processing);
    }

    #[test]
    fn test_fee_above_gross_rejected() {
        let result = Payment::processing(&contract(), Money::new(dec!(1)), Money::new(dec!(2)), None, None);
        assert!(matches!(result, Err(EngineError::ValidationError(_))));
    }

    #[test]
    fn test_finalized_exactly_once() {
        let mut p = Payment::processing(&contract(), Money::new(dec!(10)), Money::ZERO, None, None)
            .unwrap();
        p.fail("declined", Utc::now()).unwrap();
        assert_eq!(p.status, PaymentStatus::Failed);
        assert!(p.processed_at.is_some());

        assert!(p.complete("tr_1".to_string(), Utc::now()).is_err());
        assert!(p.fail("again", Utc::now()).is_err());
        assert_eq!(p.status, PaymentStatus::Failed);
        assert!(p.stripe_transfer_id.is_none());
    }

    #[test]
    fn test_duplicate_period_detection() {
        let c = contract();
        let period = SettlementPeriod {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 2, 14).unwrap(),
            total_hours: dec!(10),
        };
        let pay = |period| {
            Payment::processing(&c, Money::new(dec!(100)), Money::ZERO, None, period).unwrap()
        };
        let mut earlier = pay(Some(period));
        assert!(pay(Some(period)).duplicates_period_of(&earlier));
        // Milestone payments never collide on periods.
        assert!(!pay(None).duplicates_period_of(&earlier));

        earlier.fail("declined", Utc::now()).unwrap();
        assert!(!pay(Some(period)).duplicates_period_of(&earlier));
    }

    #[test]
    fn test_complete_stores_transfer() {
        let mut p = Payment::processing(&contract(), Money::new(dec!(10)), Money::ZERO, None, None)
            .unwrap();
        p.complete("tr_123".to_string(), Utc::now()).unwrap();
        assert_eq!(p.status, PaymentStatus::Completed);
        assert_eq!(p.stripe_transfer_id.as_deref(), Some("tr_123"));
    }
}
