//! Application layer containing the contract fulfillment orchestration.
//!
//! `FulfillmentEngine` is the single entry point; each lifecycle lives in its
//! own module as an `impl` block on the engine, and `PaymentProcessor` turns
//! approvals and settlements into transfers.

pub mod deliverables;
pub mod engine;
pub mod milestones;
pub mod payments;
pub mod settlement;
pub mod time_entries;
