//! Repository for the `reminders` table.

use bookops_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::reminder::{
    OpenReminder, OpenReminderGroup, OrphanedReminder, ReminderCounts, ReminderSummary,
};

/// Reminders whose `booking_id` matches no booking. A NULL `booking_id`
/// counts as orphaned.
const ORPHANED_FROM: &str = "\
    FROM reminders r \
    LEFT JOIN bookings b ON r.booking_id = b.id \
    WHERE b.id IS NULL";

pub struct ReminderRepo;

impl ReminderRepo {
    // -- Orphans ------------------------------------------------------------

    pub async fn orphaned<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<Vec<OrphanedReminder>, sqlx::Error> {
        let query = format!(
            "SELECT r.id::BIGINT AS id, \
                    r.booking_id::BIGINT AS booking_id, \
                    COALESCE(r.reminder_type, '')::TEXT AS reminder_type, \
                    COALESCE(r.title, '')::TEXT AS title \
             {ORPHANED_FROM} \
             ORDER BY r.id"
        );
        sqlx::query_as::<_, OrphanedReminder>(&query)
            .fetch_all(executor)
            .await
    }

    pub async fn count_orphaned<'e, E: PgExecutor<'e>>(executor: E) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) {ORPHANED_FROM}");
        sqlx::query_scalar(&query).fetch_one(executor).await
    }

    /// Delete every orphaned reminder. Returns the number of rows deleted.
    pub async fn delete_orphaned<'e, E: PgExecutor<'e>>(executor: E) -> Result<u64, sqlx::Error> {
        let query = format!("DELETE FROM reminders WHERE id IN (SELECT r.id {ORPHANED_FROM})");
        let result = sqlx::query(&query).execute(executor).await?;
        Ok(result.rows_affected())
    }

    // -- Status -------------------------------------------------------------

    pub async fn counts<'e, E: PgExecutor<'e>>(executor: E) -> Result<ReminderCounts, sqlx::Error> {
        sqlx::query_as::<_, ReminderCounts>(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE NOT COALESCE(is_completed, FALSE) \
                                       AND NOT COALESCE(is_snoozed, FALSE)) AS active, \
                    COUNT(*) FILTER (WHERE COALESCE(is_completed, FALSE)) AS completed \
             FROM reminders",
        )
        .fetch_one(executor)
        .await
    }

    /// The most recently created reminders, newest id first.
    pub async fn latest<'e, E: PgExecutor<'e>>(
        executor: E,
        limit: i64,
    ) -> Result<Vec<ReminderSummary>, sqlx::Error> {
        sqlx::query_as::<_, ReminderSummary>(
            "SELECT id::BIGINT AS id, \
                    COALESCE(title, '')::TEXT AS title, \
                    COALESCE(is_completed, FALSE) AS is_completed, \
                    COALESCE(is_snoozed, FALSE) AS is_snoozed, \
                    created_at::DATE AS created_on \
             FROM reminders \
             ORDER BY id DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(executor)
        .await
    }

    /// Open (not completed) reminders of a booking grouped by type and due
    /// date.
    pub async fn open_groups_for_booking<'e, E: PgExecutor<'e>>(
        executor: E,
        booking_id: DbId,
    ) -> Result<Vec<OpenReminderGroup>, sqlx::Error> {
        sqlx::query_as::<_, OpenReminderGroup>(
            "SELECT COUNT(*) AS count, \
                    reminder_type::TEXT AS reminder_type, \
                    due_date::DATE AS due_date \
             FROM reminders \
             WHERE booking_id = $1 AND NOT COALESCE(is_completed, FALSE) \
             GROUP BY reminder_type, due_date \
             ORDER BY reminder_type, due_date",
        )
        .bind(booking_id)
        .fetch_all(executor)
        .await
    }

    /// The open reminder of one type on a booking, if any.
    pub async fn open_of_type<'e, E: PgExecutor<'e>>(
        executor: E,
        booking_id: DbId,
        reminder_type: &str,
    ) -> Result<Option<OpenReminder>, sqlx::Error> {
        sqlx::query_as::<_, OpenReminder>(
            "SELECT id::BIGINT AS id, \
                    reminder_type::TEXT AS reminder_type, \
                    due_date::DATE AS due_date, \
                    description::TEXT AS description, \
                    updated_at::TIMESTAMPTZ AS updated_at \
             FROM reminders \
             WHERE booking_id = $1 \
               AND NOT COALESCE(is_completed, FALSE) \
               AND reminder_type = $2 \
             ORDER BY id \
             LIMIT 1",
        )
        .bind(booking_id)
        .bind(reminder_type)
        .fetch_optional(executor)
        .await
    }

    // -- Test rows ----------------------------------------------------------

    /// Insert a low-priority `test` reminder due tomorrow. Returns its id.
    pub async fn insert_test<'e, E: PgExecutor<'e>>(
        executor: E,
        booking_id: DbId,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO reminders (booking_id, reminder_type, title, description, due_date, priority) \
             VALUES ($1, 'test', 'Test Reminder', 'Test', CURRENT_DATE + 1, 'low') \
             RETURNING id::BIGINT",
        )
        .bind(booking_id)
        .fetch_one(executor)
        .await
    }

    pub async fn set_title<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        title: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE reminders SET title = $2 WHERE id = $1")
            .bind(id)
            .bind(title)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reminders WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
