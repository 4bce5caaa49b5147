mod common;

use chrono::NaiveDate;
use common::{Harness, PAYOUT_ACCOUNT, contract, day};
use contractpay::domain::contract::{Actor, ProjectType};
use contractpay::domain::money::Money;
use contractpay::domain::payment::PaymentStatus;
use contractpay::domain::ports::TransferContext;
use contractpay::domain::review::ReviewDecision;
use contractpay::error::EngineError;
use contractpay::infrastructure::transfer::SimulatedTransferService;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_summary_counts_only_approved_hours_in_range() {
    let h = Harness::hourly(dec!(40)).await;
    h.approved_hours(day(1, 2), dec!(5)).await;
    h.approved_hours(day(1, 14), dec!(3)).await;
    // Excluded: outside the window, still pending, or rejected.
    h.approved_hours(day(1, 15), dec!(10)).await;
    h.approved_hours(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(), dec!(10)).await;
    h.log_hours(day(1, 5), dec!(7)).await;
    let rejected = h.log_hours(day(1, 6), dec!(2)).await;
    h.engine
        .review_time_entry(rejected.id, h.business(), ReviewDecision::reject("no"))
        .await
        .unwrap();

    let summary = h
        .engine
        .summarize_period(h.contract.id, h.business(), day(1, 1), day(1, 14))
        .await
        .unwrap();
    assert_eq!(summary.total_hours, dec!(8));
    assert_eq!(summary.gross_amount, Money::new(dec!(320.00)));
    assert_eq!(summary.platform_fee, Money::new(dec!(32.00)));
    assert_eq!(summary.net_amount, Money::new(dec!(288.00)));
    assert_eq!(summary.hourly_rate, Money::new(dec!(40)));
    assert_eq!(summary.province, "ON");
    assert!(summary.can_process);
    assert_eq!(summary.time_entries.len(), 2);
    assert_eq!(summary.time_entries[0].date, day(1, 2));
}

#[tokio::test]
async fn test_empty_period_cannot_process() {
    let h = Harness::hourly(dec!(40)).await;
    h.log_hours(day(1, 5), dec!(7)).await;

    let summary = h
        .engine
        .summarize_period(h.contract.id, h.business(), day(1, 1), day(1, 14))
        .await
        .unwrap();
    assert_eq!(summary.total_hours, Decimal::ZERO);
    assert!(!summary.can_process);

    let result = h
        .engine
        .process_period(h.contract.id, h.business(), day(1, 1), day(1, 14))
        .await;
    assert!(matches!(result, Err(EngineError::InvalidOperation(_))));
}

#[tokio::test]
async fn test_process_without_payout_account_creates_nothing() {
    let h = Harness::build(
        contract(ProjectType::Hourly, Some(dec!(40))),
        false,
        SimulatedTransferService::new(),
    )
    .await;
    h.approved_hours(day(1, 2), dec!(5)).await;
    h.approved_hours(day(1, 9), dec!(3)).await;

    let summary = h
        .engine
        .summarize_period(h.contract.id, h.business(), day(1, 1), day(1, 14))
        .await
        .unwrap();
    assert_eq!(summary.total_hours, dec!(8));
    assert_eq!(summary.gross_amount, Money::new(dec!(320.00)));

    let result = h
        .engine
        .process_period(h.contract.id, h.business(), day(1, 1), day(1, 14))
        .await;
    assert!(matches!(result, Err(EngineError::InvalidOperation(_))));

    let payments = h
        .engine
        .payments(h.contract.id, Actor::business(h.business()))
        .await
        .unwrap();
    assert!(payments.is_empty());
    assert!(h.transfers.transfers().await.is_empty());
}

#[tokio::test]
async fn test_process_pays_net_with_period_metadata() {
    let h = Harness::hourly(dec!(40)).await;
    h.approved_hours(day(1, 2), dec!(5)).await;
    h.approved_hours(day(1, 9), dec!(3)).await;

    let payment = h
        .engine
        .process_period(h.contract.id, h.business(), day(1, 1), day(1, 14))
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.amount, Money::new(dec!(320.00)));
    assert_eq!(payment.net_amount, Money::new(dec!(288.00)));
    assert!(payment.milestone_id.is_none());
    let period = payment.period.unwrap();
    assert_eq!((period.start, period.end), (day(1, 1), day(1, 14)));

    let transfers = h.transfers.transfers().await;
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].destination, PAYOUT_ACCOUNT);
    assert!(matches!(
        transfers[0].metadata.context,
        TransferContext::Period { total_hours, .. } if total_hours == dec!(8)
    ));
    assert!(transfers[0].metadata.description().contains("2024-01-01"));
}

#[tokio::test]
async fn test_period_cannot_be_paid_twice() {
    let h = Harness::hourly(dec!(40)).await;
    h.approved_hours(day(1, 2), dec!(5)).await;

    h.engine
        .process_period(h.contract.id, h.business(), day(1, 1), day(1, 14))
        .await
        .unwrap();
    let again = h
        .engine
        .process_period(h.contract.id, h.business(), day(1, 1), day(1, 14))
        .await;
    assert!(matches!(again, Err(EngineError::InvalidOperation(_))));
    assert_eq!(h.transfers.transfers().await.len(), 1);
}

#[tokio::test]
async fn test_failed_period_can_be_retried() {
    let transfers = SimulatedTransferService::new().declining([PAYOUT_ACCOUNT]);
    let h = Harness::build(
        contract(ProjectType::Hourly, Some(dec!(40))),
        true,
        transfers,
    )
    .await;
    h.approved_hours(day(1, 2), dec!(5)).await;

    let failed = h
        .engine
        .process_period(h.contract.id, h.business(), day(1, 1), day(1, 14))
        .await;
    assert!(matches!(failed, Err(EngineError::TransferFailure { .. })));

    // Same period, fixed payout account.
    let mut fixed = common::profile(h.talent());
    fixed.payout_account = Some("acct_fixed".to_string());
    h.engine.stores().contracts.store_profile(fixed).await.unwrap();

    let retried = h
        .engine
        .process_period(h.contract.id, h.business(), day(1, 1), day(1, 14))
        .await
        .unwrap();
    assert_eq!(retried.status, PaymentStatus::Completed);

    let history = h
        .engine
        .payments(h.contract.id, Actor::talent(h.talent()))
        .await
        .unwrap();
    let statuses: Vec<_> = history.iter().map(|p| p.status).collect();
    assert_eq!(statuses.len(), 2);
    assert!(statuses.contains(&PaymentStatus::Failed));
    assert!(statuses.contains(&PaymentStatus::Completed));
}

#[tokio::test]
async fn test_settlement_rules() {
    let fixed = Harness::fixed_price().await;
    let result = fixed
        .engine
        .summarize_period(fixed.contract.id, fixed.business(), day(1, 1), day(1, 14))
        .await;
    assert!(matches!(result, Err(EngineError::InvalidOperation(_))));

    let h = Harness::hourly(dec!(40)).await;
    let backwards = h
        .engine
        .summarize_period(h.contract.id, h.business(), day(1, 14), day(1, 1))
        .await;
    assert!(matches!(backwards, Err(EngineError::ValidationError(_))));

    let talent = h
        .engine
        .summarize_period(h.contract.id, h.talent(), day(1, 1), day(1, 14))
        .await;
    assert!(matches!(talent, Err(EngineError::NotFound("Contract"))));
}

#[tokio::test]
async fn test_fractional_hours_round_to_cents() {
    let h = Harness::hourly(dec!(33.33)).await;
    h.approved_hours(day(1, 2), dec!(1.333)).await;

    let summary = h
        .engine
        .summarize_period(h.contract.id, h.business(), day(1, 1), day(1, 14))
        .await
        .unwrap();
    // 33.33 * 1.333 = 44.42889
    assert_eq!(summary.gross_amount, Money::new(dec!(44.43)));
    assert_eq!(
        summary.net_amount,
        summary.gross_amount.checked_sub(summary.total_fee).unwrap()
    );
}

#[tokio::test]
async fn test_oversized_gross_is_a_validation_error() {
    let h = Harness::hourly(Decimal::MAX).await;
    h.approved_hours(day(1, 2), dec!(24)).await;
    h.approved_hours(day(1, 3), dec!(24)).await;

    let summary = h
        .engine
        .summarize_period(h.contract.id, h.business(), day(1, 1), day(1, 14))
        .await;
    assert!(matches!(summary, Err(EngineError::ValidationError(_))));

    let processed = h
        .engine
        .process_period(h.contract.id, h.business(), day(1, 1), day(1, 14))
        .await;
    assert!(matches!(processed, Err(EngineError::ValidationError(_))));
    assert!(h.transfers.transfers().await.is_empty());
}
