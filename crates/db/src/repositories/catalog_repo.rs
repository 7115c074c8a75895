//! Introspection of `information_schema` and `pg_catalog`.
//!
//! Functions, indexes and triggers are looked up in the `public` schema,
//! where the booking migrations create them.

use bookops_core::catalog::DeleteRule;
use sqlx::PgExecutor;

use crate::models::catalog::{ColumnInfo, ForeignKeyInfo, IndexInfo, TriggerInfo, TriggerRow};
use crate::repositories::quote_ident;

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const TRIGGER_COLUMNS: &str = "\
    t.tgname::TEXT AS trigger_name, \
    t.tgrelid::regclass::TEXT AS table_name, \
    t.tgenabled::TEXT AS enabled, \
    t.tgtype::INT2 AS tgtype, \
    pg_get_triggerdef(t.oid) AS definition";

const INDEX_COLUMNS: &str = "\
    indexname::TEXT AS indexname, \
    tablename::TEXT AS tablename, \
    indexdef";

// ---------------------------------------------------------------------------
// CatalogRepo
// ---------------------------------------------------------------------------

/// Read-only queries against the system catalogs.
pub struct CatalogRepo;

impl CatalogRepo {
    /// Columns of a table in ordinal order. Empty when the table is missing.
    pub async fn columns<'e, E: PgExecutor<'e>>(
        executor: E,
        table: &str,
    ) -> Result<Vec<ColumnInfo>, sqlx::Error> {
        sqlx::query_as::<_, ColumnInfo>(
            "SELECT column_name::TEXT AS column_name, \
                    data_type::TEXT AS data_type, \
                    is_nullable::TEXT AS is_nullable, \
                    column_default::TEXT AS column_default \
             FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 \
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(executor)
        .await
    }

    /// Indexes defined on a table, by name.
    pub async fn indexes<'e, E: PgExecutor<'e>>(
        executor: E,
        table: &str,
    ) -> Result<Vec<IndexInfo>, sqlx::Error> {
        let query = format!(
            "SELECT {INDEX_COLUMNS} FROM pg_indexes \
             WHERE schemaname = 'public' AND tablename = $1 \
             ORDER BY indexname"
        );
        sqlx::query_as::<_, IndexInfo>(&query)
            .bind(table)
            .fetch_all(executor)
            .await
    }

    /// Indexes whose name matches any of the `LIKE` patterns.
    pub async fn indexes_like<'e, E: PgExecutor<'e>>(
        executor: E,
        patterns: &[&str],
    ) -> Result<Vec<IndexInfo>, sqlx::Error> {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        let query = format!(
            "SELECT {INDEX_COLUMNS} FROM pg_indexes \
             WHERE schemaname = 'public' AND indexname LIKE ANY($1) \
             ORDER BY indexname"
        );
        sqlx::query_as::<_, IndexInfo>(&query)
            .bind(patterns)
            .fetch_all(executor)
            .await
    }

    pub async fn index_exists<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pg_indexes \
             WHERE schemaname = 'public' AND indexname = $1)",
        )
        .bind(name)
        .fetch_one(executor)
        .await
    }

    /// Which of the given function names exist in `public`.
    pub async fn existing_functions<'e, E: PgExecutor<'e>>(
        executor: E,
        names: &[&str],
    ) -> Result<Vec<String>, sqlx::Error> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        sqlx::query_scalar(
            "SELECT DISTINCT p.proname::TEXT \
             FROM pg_proc p \
             JOIN pg_namespace n ON n.oid = p.pronamespace \
             WHERE n.nspname = 'public' AND p.proname = ANY($1) \
             ORDER BY 1",
        )
        .bind(names)
        .fetch_all(executor)
        .await
    }

    /// Full `CREATE OR REPLACE FUNCTION` text, `None` when the function is
    /// missing.
    pub async fn function_definition<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT pg_get_functiondef(p.oid) \
             FROM pg_proc p \
             JOIN pg_namespace n ON n.oid = p.pronamespace \
             WHERE n.nspname = 'public' AND p.proname = $1 \
             ORDER BY p.oid \
             LIMIT 1",
        )
        .bind(name)
        .fetch_optional(executor)
        .await
    }

    /// User triggers with one of the given names.
    pub async fn triggers_named<'e, E: PgExecutor<'e>>(
        executor: E,
        names: &[&str],
    ) -> Result<Vec<TriggerInfo>, sqlx::Error> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let query = format!(
            "SELECT {TRIGGER_COLUMNS} FROM pg_trigger t \
             WHERE NOT t.tgisinternal AND t.tgname = ANY($1) \
             ORDER BY t.tgname"
        );
        let rows = sqlx::query_as::<_, TriggerRow>(&query)
            .bind(names)
            .fetch_all(executor)
            .await?;
        Ok(rows.into_iter().map(TriggerInfo::from).collect())
    }

    /// User triggers whose name matches the `LIKE` pattern.
    pub async fn triggers_like<'e, E: PgExecutor<'e>>(
        executor: E,
        pattern: &str,
    ) -> Result<Vec<TriggerInfo>, sqlx::Error> {
        let query = format!(
            "SELECT {TRIGGER_COLUMNS} FROM pg_trigger t \
             WHERE NOT t.tgisinternal AND t.tgname LIKE $1 \
             ORDER BY t.tgname"
        );
        let rows = sqlx::query_as::<_, TriggerRow>(&query)
            .bind(pattern)
            .fetch_all(executor)
            .await?;
        Ok(rows.into_iter().map(TriggerInfo::from).collect())
    }

    /// A foreign key on `table` by constraint name.
    pub async fn foreign_key<'e, E: PgExecutor<'e>>(
        executor: E,
        table: &str,
        constraint: &str,
    ) -> Result<Option<ForeignKeyInfo>, sqlx::Error> {
        let row: Option<(String, String, String, String)> = sqlx::query_as(
            "SELECT c.conname::TEXT, \
                    c.conrelid::regclass::TEXT, \
                    c.confdeltype::TEXT, \
                    pg_get_constraintdef(c.oid) \
             FROM pg_constraint c \
             WHERE c.contype = 'f' \
               AND c.conrelid = to_regclass($1) \
               AND c.conname = $2",
        )
        .bind(table)
        .bind(constraint)
        .fetch_optional(executor)
        .await?;

        Ok(row.map(
            |(constraint_name, table_name, confdeltype, definition)| ForeignKeyInfo {
                constraint_name,
                table_name,
                delete_rule: DeleteRule::from_confdeltype(&confdeltype),
                definition,
            },
        ))
    }

    pub async fn constraint_exists<'e, E: PgExecutor<'e>>(
        executor: E,
        table: &str,
        constraint: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.table_constraints \
             WHERE table_schema = 'public' AND table_name = $1 AND constraint_name = $2)",
        )
        .bind(table)
        .bind(constraint)
        .fetch_one(executor)
        .await
    }

    pub async fn row_count<'e, E: PgExecutor<'e>>(
        executor: E,
        table: &str,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        sqlx::query_scalar(&query).fetch_one(executor).await
    }
}
