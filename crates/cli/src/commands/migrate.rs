use std::io::Write;

use bookops_core::migrations::{find_plan, TxMode};
use bookops_db::{DbPool, MigrationOutcome, MigrationReport, MigrationRunner};

use crate::error::OpsError;
use crate::report::Report;

/// Apply migration `number` from the runner's directory.
pub async fn run<W: Write>(
    pool: &DbPool,
    runner: &MigrationRunner,
    number: u32,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    let plan = find_plan(number)?;

    report.title(&format!("Migration {}: {}", plan.label(), plan.title))?;
    report.info(&format!("File: {}", runner.file_path(plan).display()))?;
    report.info(match plan.tx_mode {
        TxMode::Autocommit => "Mode: autocommit",
        TxMode::Transaction => "Mode: single transaction",
    })?;

    let result = runner.run(pool, plan).await?;
    print_report(&result, report)?;
    result.ensure_passed()?;
    Ok(())
}

/// Print pre-checks, post-checks and the outcome of a migration run.
pub(crate) fn print_report<W: Write>(
    result: &MigrationReport,
    report: &mut Report<W>,
) -> std::io::Result<()> {
    if !result.pre_checks.is_empty() {
        report.section("Before executing:")?;
        for outcome in &result.pre_checks {
            report.check(outcome)?;
        }
    }

    report.section("Verification:")?;
    for outcome in &result.post_checks {
        report.check(outcome)?;
    }

    report.blank()?;
    match result.outcome {
        MigrationOutcome::Applied => report.ok("Migration applied and verified")?,
        MigrationOutcome::AppliedUnverified => {
            report.error("Migration executed but verification failed; changes stay applied")?
        }
        MigrationOutcome::RolledBack => {
            report.error("Verification failed; all changes rolled back")?
        }
        MigrationOutcome::VerifiedOnly if result.passed() => {
            report.ok(&format!("Migration {} is in place", result.plan.label()))?
        }
        MigrationOutcome::VerifiedOnly => {
            report.error(&format!("Migration {} is not fully applied", result.plan.label()))?
        }
    }
    report.rule()
}
