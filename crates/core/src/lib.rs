//! Pure domain logic for the booking database operator tool.
//!
//! Nothing in this crate performs I/O. The database-facing crates feed rows
//! into these functions and render the results.

pub mod catalog;
pub mod error;
pub mod migrations;
pub mod pricing;
pub mod reminders;
pub mod schema_validator;
pub mod types;
