//! Row models for the tables and catalog views the operator commands read.
//!
//! Numeric columns are selected with explicit casts (`::BIGINT`, `::FLOAT8`)
//! so the structs decode the same way whatever the live column types are.

pub mod booking;
pub mod catalog;
pub mod discount;
pub mod email;
pub mod reminder;
pub mod settings;
