//! One module per command family. Every command prints its findings to a
//! [`Report`](crate::report::Report) and returns an error when it found a
//! problem.

pub mod check;
pub mod cleanup;
pub mod debug;
pub mod fix;
pub mod migrate;
pub mod notify;
pub mod schema;
pub mod verify;
