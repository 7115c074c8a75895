use std::io::{BufRead, Write};

use bookops_db::repositories::{CatalogRepo, DiscountRepo};
use bookops_db::DbPool;
use bookops_events::channels::{NOTIFY_FUNCTION_NAME, REMINDER_CHANNEL};
use bookops_events::NOTIFY_TABLE_CHANGE_FUNCTION;

use crate::error::OpsError;
use crate::report::Report;

// ---------------------------------------------------------------------------
// fix calculated-amounts
// ---------------------------------------------------------------------------

/// Rewrite every stale `calculated_amount` with its recomputed value.
///
/// Asks for confirmation on `input` unless `assume_yes`; any answer other
/// than `yes` cancels without changing anything.
pub async fn calculated_amounts<W: Write, R: BufRead>(
    pool: &DbPool,
    assume_yes: bool,
    input: &mut R,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    report.title("Fix stale discount calculated_amount values")?;

    let outdated = DiscountRepo::outdated(pool).await?;
    if outdated.is_empty() {
        report.ok("No stale calculated_amount values found, database is consistent")?;
        return Ok(());
    }

    report.warn(&format!(
        "Found {} discounts with stale calculated_amount values:",
        outdated.len()
    ))?;
    for d in &outdated {
        report.blank()?;
        report.detail(&format!("Booking {}: '{}'", d.booking_id, d.discount_name))?;
        report.detail(&format!("   Type: {}, Value: {}", d.discount_type, d.discount_value))?;
        report.detail(&format!("   Old calculated_amount: {:.2} EUR", d.old_calculated))?;
        report.detail(&format!(
            "   New calculated_amount: {:.2} EUR (grundpreis {:.2} + services {:.2})",
            d.new_calculated, d.grundpreis, d.services_preis
        ))?;
        report.detail(&format!("   Difference: {:.2} EUR", d.difference()))?;
    }
    report.blank()?;

    if !assume_yes {
        report.prompt(&format!("Fix {} discounts? (yes/no): ", outdated.len()))?;
        let mut answer = String::new();
        input.read_line(&mut answer)?;
        if answer.trim().to_lowercase() != "yes" {
            report.warn("Cancelled, nothing changed")?;
            return Ok(());
        }
    }

    let mut tx = pool.begin().await?;
    for d in &outdated {
        let updated = DiscountRepo::update_calculated_amount(&mut *tx, d.id, d.new_calculated).await?;
        if updated != 1 {
            return Err(OpsError::CheckFailed(format!(
                "discount {} vanished while updating",
                d.id
            )));
        }
        report.ok(&format!(
            "Updated discount {} ('{}' for booking {}): {:.2} -> {:.2} EUR",
            d.id, d.discount_name, d.booking_id, d.old_calculated, d.new_calculated
        ))?;
    }

    let remaining = DiscountRepo::outdated(&mut *tx).await?;
    if !remaining.is_empty() {
        tx.rollback().await?;
        return Err(OpsError::CheckFailed(format!(
            "{} discounts still stale after the update, rolled back",
            remaining.len()
        )));
    }
    tx.commit().await?;
    tracing::info!(updated = outdated.len(), "Stale discount amounts fixed");

    report.blank()?;
    report.ok(&format!("Updated {} calculated_amount values", outdated.len()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// fix notify-function
// ---------------------------------------------------------------------------

/// Replace `notify_table_change()` with the version that routes reminders.
pub async fn notify_function<W: Write>(
    pool: &DbPool,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    report.line(&format!("Updating {NOTIFY_FUNCTION_NAME}()..."))?;

    let mut tx = pool.begin().await?;
    sqlx::raw_sql(NOTIFY_TABLE_CHANGE_FUNCTION)
        .execute(&mut *tx)
        .await?;

    let routed = CatalogRepo::function_definition(&mut *tx, NOTIFY_FUNCTION_NAME)
        .await?
        .is_some_and(|def| def.contains(REMINDER_CHANNEL));
    if !routed {
        tx.rollback().await?;
        report.error("Function does not route reminders after the update")?;
        return Err(OpsError::CheckFailed(format!(
            "{NOTIFY_FUNCTION_NAME}() update did not take effect"
        )));
    }
    tx.commit().await?;
    tracing::info!(function = NOTIFY_FUNCTION_NAME, "Notify function replaced");

    report.ok(&format!("{NOTIFY_FUNCTION_NAME}() updated"))?;
    report.detail("Reminder changes are now sent on the reminder_changes channel.")?;
    Ok(())
}
