use std::io::Write;

use bookops_db::repositories::ReminderRepo;
use bookops_db::DbPool;

use crate::error::OpsError;
use crate::report::Report;

/// Delete reminders whose booking no longer exists.
///
/// Runs in one transaction that only commits once no orphan is left.
pub async fn orphaned_reminders<W: Write>(
    pool: &DbPool,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    report.title("Cleanup: orphaned reminders")?;
    let mut tx = pool.begin().await?;

    report.section("[1/3] Finding orphaned reminders...")?;
    let orphaned = ReminderRepo::orphaned(&mut *tx).await?;
    if orphaned.is_empty() {
        report.ok("No orphaned reminders found")?;
        tx.rollback().await?;
        return Ok(());
    }
    report.warn(&format!("Found {} orphaned reminder(s):", orphaned.len()))?;
    for reminder in &orphaned {
        let booking_id = reminder
            .booking_id
            .map_or_else(|| "NULL".to_string(), |id| id.to_string());
        report.detail(&format!(
            "- Reminder #{}: booking_id={booking_id}, type={}",
            reminder.id, reminder.reminder_type
        ))?;
        report.detail(&format!("  Title: {}", reminder.title))?;
    }

    report.section(&format!(
        "[2/3] Deleting {} orphaned reminder(s)...",
        orphaned.len()
    ))?;
    let deleted = ReminderRepo::delete_orphaned(&mut *tx).await?;
    report.ok(&format!("Deleted {deleted} orphaned reminder(s)"))?;

    report.section("[3/3] Verifying cleanup...")?;
    let remaining = ReminderRepo::count_orphaned(&mut *tx).await?;
    if remaining > 0 {
        tx.rollback().await?;
        report.error(&format!("{remaining} orphaned reminders still exist, rolled back"))?;
        return Err(OpsError::CheckFailed(format!(
            "cleanup failed, {remaining} orphaned reminders remain"
        )));
    }
    tx.commit().await?;
    tracing::info!(deleted, "Orphaned reminders removed");

    report.ok("No orphaned reminders remaining")?;
    report.blank()?;
    report.line("Migration 017 can now be applied: bookops migrate 17")?;
    report.rule()?;
    Ok(())
}
