//! Reminder status and booking-status constants.

use std::fmt;

/// Reminder type created by the payment auto-reminder trigger.
pub const REMINDER_TYPE_AUTO_PAYMENT: &str = "auto_payment";

/// Booking statuses that mean the booking was cancelled.
pub const CANCELLED_BOOKING_STATUSES: &[&str] = &["storniert", "cancelled"];

/// Display status of a reminder, as the application's badge counts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderStatus {
    Active,
    Snoozed,
    Completed,
}

impl ReminderStatus {
    /// Completed wins over snoozed.
    pub fn classify(is_completed: bool, is_snoozed: bool) -> Self {
        if is_completed {
            Self::Completed
        } else if is_snoozed {
            Self::Snoozed
        } else {
            Self::Active
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "ACTIVE",
            Self::Snoozed => "SNOOZED",
            Self::Completed => "COMPLETED",
        })
    }
}
