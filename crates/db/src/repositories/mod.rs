//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept any `PgExecutor` as the first argument: a pool, a single
//! connection, or an open transaction.

pub mod booking_repo;
pub mod catalog_repo;
pub mod discount_repo;
pub mod email_repo;
pub mod reminder_repo;
pub mod settings_repo;

pub use booking_repo::BookingRepo;
pub use catalog_repo::CatalogRepo;
pub use discount_repo::DiscountRepo;
pub use email_repo::{EmailTemplateRepo, ScheduledEmailRepo};
pub use reminder_repo::ReminderRepo;
pub use settings_repo::NotificationSettingsRepo;

/// Quote an identifier for interpolation into SQL text.
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
