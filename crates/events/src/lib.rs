//! Real-time change notifications over PostgreSQL `LISTEN`/`NOTIFY`.
//!
//! - [`ChangeEvent`]: the JSON envelope the `notify_table_change()` trigger
//!   function emits for every row change.
//! - [`channels`]: routing of table names to notification channels and the
//!   canonical trigger function body.
//! - [`publish`]: sends a change event with `pg_notify`.
//! - [`ChangeListener`]: receives change events on one or more channels.

pub mod change;
pub mod channels;
pub mod error;
pub mod listener;
pub mod publisher;

pub use change::{ChangeAction, ChangeEvent};
pub use channels::{channel_for_table, CHANNELS, NOTIFY_TABLE_CHANGE_FUNCTION};
pub use error::EventsError;
pub use listener::{ChangeListener, ReceivedChange};
pub use publisher::publish;
