use std::io::Write;

use bookops_db::repositories::{CatalogRepo, EmailTemplateRepo};
use bookops_db::DbPool;
use bookops_events::channels::NOTIFY_FUNCTION_NAME;

use crate::error::OpsError;
use crate::report::{truncate, Report};

const PAYMENT_REMINDER_TEMPLATE: &str = "payment_reminder";

/// Print `notify_table_change()` and fail unless it has a `reminders` branch.
pub async fn notify_function<W: Write>(
    pool: &DbPool,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    let Some(definition) = CatalogRepo::function_definition(pool, NOTIFY_FUNCTION_NAME).await?
    else {
        report.error(&format!("Function {NOTIFY_FUNCTION_NAME}() not found"))?;
        return Err(OpsError::CheckFailed(format!(
            "{NOTIFY_FUNCTION_NAME}() does not exist"
        )));
    };

    report.line(&format!("{NOTIFY_FUNCTION_NAME}() found:"))?;
    report.rule()?;
    report.line(definition.trim_end())?;
    report.rule()?;

    if definition.contains("reminders") {
        report.ok("Function has a reminders branch")?;
        Ok(())
    } else {
        report.error("Function has no reminders branch")?;
        report.detail("Run `bookops fix notify-function` to update it.")?;
        Err(OpsError::CheckFailed(format!(
            "{NOTIFY_FUNCTION_NAME}() does not route reminders"
        )))
    }
}

/// List all e-mail templates and report whether `payment_reminder` exists.
pub async fn email_templates<W: Write>(
    pool: &DbPool,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    report.title("E-mail templates")?;

    let templates = EmailTemplateRepo::list(pool).await?;
    report.line(&format!("Found {} e-mail templates:", templates.len()))?;
    for template in &templates {
        let state = if template.is_active { "[ACTIVE]" } else { "[INACTIVE]" };
        report.detail(&format!(
            "{state} {}: {}",
            template.template_name,
            truncate(&template.subject, 60)
        ))?;
    }

    report.blank()?;
    if EmailTemplateRepo::exists(pool, PAYMENT_REMINDER_TEMPLATE).await? {
        report.ok(&format!("Template '{PAYMENT_REMINDER_TEMPLATE}' exists"))?;
    } else {
        report.warn(&format!("Template '{PAYMENT_REMINDER_TEMPLATE}' does not exist"))?;
    }
    Ok(())
}
