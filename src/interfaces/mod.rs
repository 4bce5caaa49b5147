//! Batch front end: JSON seed data in, CSV commands in, CSV payments out.

pub mod batch;
pub mod csv;
pub mod seed;
