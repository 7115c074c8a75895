//! Reminder rows and aggregates.

use bookops_core::reminders::ReminderStatus;
use bookops_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A reminder that points at a booking id with no matching booking, or at
/// no booking at all.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrphanedReminder {
    pub id: DbId,
    pub booking_id: Option<DbId>,
    pub reminder_type: String,
    pub title: String,
}

/// Summary row for the reminder status listing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReminderSummary {
    pub id: DbId,
    pub title: String,
    pub is_completed: bool,
    pub is_snoozed: bool,
    pub created_on: Option<NaiveDate>,
}

impl ReminderSummary {
    pub fn status(&self) -> ReminderStatus {
        ReminderStatus::classify(self.is_completed, self.is_snoozed)
    }
}

/// Reminder totals as the application's badge counts them.
#[derive(Debug, Clone, Copy, Default, FromRow, Serialize, PartialEq, Eq)]
pub struct ReminderCounts {
    pub total: i64,
    /// Neither completed nor snoozed.
    pub active: i64,
    pub completed: i64,
}

/// Open reminders of one booking grouped by type and due date.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OpenReminderGroup {
    pub count: i64,
    pub reminder_type: String,
    pub due_date: Option<NaiveDate>,
}

/// An open reminder of a given type, with its last update.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OpenReminder {
    pub id: DbId,
    pub reminder_type: String,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub updated_at: Option<Timestamp>,
}
