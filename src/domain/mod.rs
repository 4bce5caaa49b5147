//! Domain layer: entities, their state machines, and the ports the
//! application layer talks to.

pub mod contract;
pub mod deliverable;
pub mod milestone;
pub mod money;
pub mod payment;
pub mod ports;
pub mod review;
pub mod time_entry;
