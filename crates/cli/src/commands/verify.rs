use std::io::Write;
use std::time::Duration;

use bookops_core::migrations::find_plan;
use bookops_core::reminders::REMINDER_TYPE_AUTO_PAYMENT;
use bookops_core::types::DbId;
use bookops_db::repositories::{BookingRepo, CatalogRepo, ReminderRepo};
use bookops_db::{DbPool, MigrationRunner};
use bookops_events::channels::{NOTIFY_FUNCTION_NAME, REMINDER_CHANNEL};
use bookops_events::{ChangeListener, EventsError, ReceivedChange};
use chrono::Days;

use crate::commands::migrate::print_report;
use crate::error::OpsError;
use crate::report::Report;

const REMINDER_TRIGGER_PATTERN: &str = "trg_notify_reminder%";
/// How long `verify triggers --fire` waits for the notification.
pub const FIRE_WAIT: Duration = Duration::from_secs(5);
/// Days the test booking's check-in is moved by.
const CHECKIN_SHIFT_DAYS: u64 = 7;

// ---------------------------------------------------------------------------
// verify migration
// ---------------------------------------------------------------------------

pub async fn migration<W: Write>(
    pool: &DbPool,
    number: u32,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    let plan = find_plan(number)?;
    report.title(&format!("Verify migration {}: {}", plan.label(), plan.title))?;

    let result = MigrationRunner::verify(pool, plan).await?;
    print_report(&result, report)?;
    result.ensure_passed()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// verify reminder-updates
// ---------------------------------------------------------------------------

/// Move the first active booking's check-in by a week and show whether its
/// open payment reminder follows. Everything is rolled back.
pub async fn reminder_updates<W: Write>(
    pool: &DbPool,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    report.title("Verify reminder updates")?;
    let mut tx = pool.begin().await?;

    report.section("[1/4] Finding test booking...")?;
    let Some(booking) = BookingRepo::first_active(&mut *tx).await? else {
        report.info("No active bookings found, nothing to test")?;
        tx.rollback().await?;
        return Ok(());
    };
    report.ok(&format!("Test booking: #{}", booking.id))?;
    report.detail(&format!("Check-in: {}", booking.checkin_date))?;
    report.detail(&format!(
        "Guest: {} {}",
        booking.vorname.as_deref().unwrap_or_default(),
        booking.nachname.as_deref().unwrap_or_default()
    ))?;

    report.section("[2/4] Checking open reminders...")?;
    let groups = ReminderRepo::open_groups_for_booking(&mut *tx, booking.id).await?;
    report.ok(&format!("Found {} open reminder group(s)", groups.len()))?;
    for group in &groups {
        let due = group
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "no due date".to_string());
        report.detail(&format!("- {}: due {due} ({}x)", group.reminder_type, group.count))?;
    }

    report.section("[3/4] Moving check-in date...")?;
    let new_checkin = booking
        .checkin_date
        .checked_add_days(Days::new(CHECKIN_SHIFT_DAYS))
        .ok_or_else(|| OpsError::CheckFailed("check-in date out of range".to_string()))?;
    report.info(&format!("Changing check-in: {} -> {new_checkin}", booking.checkin_date))?;
    BookingRepo::set_checkin_date(&mut *tx, booking.id, new_checkin).await?;

    match ReminderRepo::open_of_type(&mut *tx, booking.id, REMINDER_TYPE_AUTO_PAYMENT).await? {
        Some(reminder) => {
            report.ok("Payment reminder found after the update")?;
            if let Some(due) = reminder.due_date {
                report.detail(&format!("Due date: {due}"))?;
            }
            if let Some(updated_at) = reminder.updated_at {
                report.detail(&format!("Updated at: {updated_at}"))?;
            }
        }
        None => report.info("No open payment reminder (booking may be paid)")?,
    }

    report.section("[4/4] Rolling back test changes...")?;
    tx.rollback().await?;
    tracing::info!(booking_id = booking.id, "Reminder update test rolled back");
    report.ok("Test changes rolled back, database unchanged")?;
    report.rule()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// verify triggers
// ---------------------------------------------------------------------------

/// Check the change function and the reminder triggers. With `fire`, also
/// update a throwaway reminder and wait for its notification.
pub async fn triggers<W: Write>(
    pool: &DbPool,
    fire: bool,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    report.title("Verify reminder notify triggers")?;
    let mut failures = Vec::new();

    report.section(&format!("[1] Checking {NOTIFY_FUNCTION_NAME}()..."))?;
    match CatalogRepo::function_definition(pool, NOTIFY_FUNCTION_NAME).await? {
        Some(definition)
            if definition.contains("reminders") && definition.contains(REMINDER_CHANNEL) =>
        {
            report.ok(&format!("Function routes 'reminders' to '{REMINDER_CHANNEL}'"))?;
        }
        Some(definition) => {
            report.error("Function exists but does not route 'reminders'")?;
            for line in definition.lines().take(30) {
                report.detail(line)?;
            }
            failures.push(format!("{NOTIFY_FUNCTION_NAME}() does not route reminders"));
        }
        None => {
            report.error(&format!("Function {NOTIFY_FUNCTION_NAME}() does not exist"))?;
            failures.push(format!("{NOTIFY_FUNCTION_NAME}() missing"));
        }
    }

    report.section("[2] Checking reminder notify triggers...")?;
    let triggers = CatalogRepo::triggers_like(pool, REMINDER_TRIGGER_PATTERN).await?;
    if triggers.is_empty() {
        report.error("No reminder notify triggers found; migration 018 is not applied")?;
        failures.push("no reminder notify triggers".to_string());
    } else {
        report.ok(&format!("Found {} reminder notify trigger(s)", triggers.len()))?;
    }
    for trigger in &triggers {
        let state = trigger
            .state
            .map(|s| s.to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        report.detail(&format!("Trigger: {}", trigger.name))?;
        report.detail(&format!("   Table: {}", trigger.table))?;
        report.detail(&format!("   Status: {state}"))?;
        report.detail(&format!("   Timing: {} {}", trigger.timing, trigger.events))?;
        if !trigger.is_enabled() {
            report.warn(&format!("Trigger {} is disabled", trigger.name))?;
            failures.push(format!("trigger {} disabled", trigger.name));
        }
    }

    if fire {
        report.section("[3] Testing whether the triggers fire...")?;
        if let Some(failure) = fire_test_notification(pool, report).await? {
            failures.push(failure);
        }
    }

    report.rule()?;
    if failures.is_empty() {
        Ok(())
    } else {
        Err(OpsError::CheckFailed(failures.join("; ")))
    }
}

/// Returns a failure description when no notification arrived.
async fn fire_test_notification<W: Write>(
    pool: &DbPool,
    report: &mut Report<W>,
) -> Result<Option<String>, OpsError> {
    let Some(booking_id) = BookingRepo::first_id(pool).await? else {
        report.warn("No bookings found, cannot create a test reminder")?;
        return Ok(None);
    };

    let reminder_id = ReminderRepo::insert_test(pool, booking_id).await?;
    report.ok(&format!("Test reminder created: #{reminder_id}"))?;

    let received = update_and_wait(pool, reminder_id).await;

    // Clean up before reporting, whatever happened while waiting.
    ReminderRepo::delete(pool, reminder_id).await?;
    report.info(&format!("Test reminder #{reminder_id} deleted"))?;

    match received? {
        Some(change) => {
            report.ok(&format!("NOTIFY received on channel: {}", change.channel))?;
            report.detail(&format!("Payload: {}", change.payload))?;
            Ok(None)
        }
        None => {
            report.error(&format!(
                "No NOTIFY received within {}s; triggers are not firing",
                FIRE_WAIT.as_secs()
            ))?;
            Ok(Some("no notification received".to_string()))
        }
    }
}

/// Listen on the reminder channel, touch the reminder, and wait.
async fn update_and_wait(
    pool: &DbPool,
    reminder_id: DbId,
) -> Result<Option<ReceivedChange>, EventsError> {
    let mut listener = ChangeListener::connect(pool, &[REMINDER_CHANNEL]).await?;
    ReminderRepo::set_title(pool, reminder_id, "Test Updated").await?;
    listener.next(FIRE_WAIT).await
}
