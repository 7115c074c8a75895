//! Integration tests for the migration runner.
//!
//! Migration files are written to a temporary directory so each test
//! controls exactly what SQL the runner executes.

use std::path::Path;

use assert_matches::assert_matches;
use bookops_core::migrations::find_plan;
use bookops_db::repositories::CatalogRepo;
use bookops_db::{MigrationError, MigrationOutcome, MigrationRunner};
use sqlx::PgPool;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_migration(dir: &Path, number: u32, sql: &str) {
    let plan = find_plan(number).unwrap();
    std::fs::write(dir.join(plan.file), sql).unwrap();
}

async fn has_column(pool: &PgPool, table: &str, column: &str) -> bool {
    CatalogRepo::columns(pool, table)
        .await
        .unwrap()
        .iter()
        .any(|c| c.column_name == column)
}

const SCHEDULED_EMAIL_FIX: &str = r#"
DELETE FROM scheduled_emails a
USING scheduled_emails b
WHERE a.id > b.id
  AND a.booking_id = b.booking_id
  AND a.template_name = b.template_name
  AND a.status = b.status;

UPDATE scheduled_emails SET template_name = 'reminder' WHERE template_name = 'booking_reminder';

ALTER TABLE scheduled_emails
    ADD CONSTRAINT unique_scheduled_email UNIQUE (booking_id, template_name, status);

CREATE OR REPLACE FUNCTION schedule_reminder_emails_for_booking(p_booking_id BIGINT)
RETURNS VOID AS $$
BEGIN
    INSERT INTO scheduled_emails (booking_id, template_name, status)
    VALUES (p_booking_id, 'reminder', 'pending')
    ON CONFLICT (booking_id, template_name, status)
    DO UPDATE SET scheduled_for = NOW();
END;
$$ LANGUAGE plpgsql;
"#;

// ---------------------------------------------------------------------------
// Transaction mode
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/baseline")]
async fn verified_migration_is_committed(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    write_migration(
        dir.path(),
        14,
        "ALTER TABLE notification_settings \
         ADD COLUMN checkin_reminder_before_days INTEGER NOT NULL DEFAULT 3;",
    );
    let plan = find_plan(14).unwrap();

    let report = MigrationRunner::new(dir.path()).run(&pool, plan).await.unwrap();
    assert_eq!(report.outcome, MigrationOutcome::Applied);
    assert!(report.passed());
    report.ensure_passed().unwrap();
    assert!(report.post_checks[1]
        .details
        .contains(&"checkin_reminder_before_days = 3".to_string()));

    assert!(has_column(&pool, "notification_settings", "checkin_reminder_before_days").await);

    let verified = MigrationRunner::verify(&pool, plan).await.unwrap();
    assert_eq!(verified.outcome, MigrationOutcome::VerifiedOnly);
    assert!(verified.passed());
}

#[sqlx::test(migrations = "../../db/baseline")]
async fn failed_verification_rolls_back(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    write_migration(
        dir.path(),
        14,
        "ALTER TABLE notification_settings ADD COLUMN wrong_column INTEGER;",
    );
    let plan = find_plan(14).unwrap();

    let report = MigrationRunner::new(dir.path()).run(&pool, plan).await.unwrap();
    assert_eq!(report.outcome, MigrationOutcome::RolledBack);
    assert_matches!(
        report.ensure_passed(),
        Err(MigrationError::Verification { number: 14, failures }) if failures.len() == 1
    );

    assert!(!has_column(&pool, "notification_settings", "wrong_column").await);
}

#[sqlx::test(migrations = "../../db/baseline")]
async fn sql_error_leaves_nothing_behind(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    write_migration(
        dir.path(),
        15,
        "ALTER TABLE notification_settings ADD COLUMN auto_reminder_payment BOOLEAN; \
         ALTER TABLE no_such_table ADD COLUMN x INTEGER;",
    );
    let plan = find_plan(15).unwrap();

    let err = MigrationRunner::new(dir.path())
        .run(&pool, plan)
        .await
        .unwrap_err();
    assert_matches!(err, MigrationError::Database(_));
    assert!(!has_column(&pool, "notification_settings", "auto_reminder_payment").await);
}

#[sqlx::test(migrations = "../../db/baseline")]
async fn pre_checks_report_the_state_before_executing(pool: PgPool) {
    sqlx::raw_sql(
        "INSERT INTO guests (vorname, nachname) VALUES ('Max', 'Muster'); \
         INSERT INTO rooms (name) VALUES ('Zimmer 3'); \
         INSERT INTO bookings (reservierungsnummer, room_id, guest_id, checkin_date, checkout_date) \
         SELECT 'R-13', r.id, g.id, DATE '2025-08-01', DATE '2025-08-02' FROM rooms r, guests g; \
         INSERT INTO scheduled_emails (booking_id, template_name, status) \
         SELECT id, 'reminder', 'pending' FROM bookings; \
         INSERT INTO scheduled_emails (booking_id, template_name, status) \
         SELECT id, 'reminder', 'pending' FROM bookings; \
         INSERT INTO scheduled_emails (booking_id, template_name, status) \
         SELECT id, 'booking_reminder', 'sent' FROM bookings;",
    )
    .execute(&pool)
    .await
    .unwrap();

    let dir = TempDir::new().unwrap();
    write_migration(dir.path(), 13, SCHEDULED_EMAIL_FIX);
    let plan = find_plan(13).unwrap();

    let report = MigrationRunner::new(dir.path()).run(&pool, plan).await.unwrap();

    assert_eq!(report.pre_checks.len(), plan.pre_checks.len());
    assert!(!report.pre_checks[0].passed, "duplicates exist before 013");
    assert_eq!(report.outcome, MigrationOutcome::Applied, "{:?}", report.failures());

    let rows = CatalogRepo::row_count(&pool, "scheduled_emails").await.unwrap();
    assert_eq!(rows, 2);
}

// ---------------------------------------------------------------------------
// Autocommit mode
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/baseline")]
async fn autocommit_migration_stays_applied_when_unverified(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    write_migration(
        dir.path(),
        10,
        "ALTER TABLE bookings ADD COLUMN created_by TEXT, ADD COLUMN updated_by TEXT;",
    );
    let plan = find_plan(10).unwrap();

    let report = MigrationRunner::new(dir.path()).run(&pool, plan).await.unwrap();
    assert_eq!(report.outcome, MigrationOutcome::AppliedUnverified);
    assert!(report.post_checks[0].passed);
    assert!(!report.post_checks[1].passed);
    assert_matches!(
        report.ensure_passed(),
        Err(MigrationError::Verification { number: 10, .. })
    );

    assert!(has_column(&pool, "bookings", "created_by").await);
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/baseline")]
async fn missing_file_is_an_io_error(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    let plan = find_plan(18).unwrap();

    let err = MigrationRunner::new(dir.path())
        .run(&pool, plan)
        .await
        .unwrap_err();
    assert_matches!(err, MigrationError::Io { ref path, .. } if path.ends_with(plan.file));
}
