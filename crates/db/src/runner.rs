//! Applies a numbered migration file and verifies its post-checks.
//!
//! The SQL text is executed verbatim as a multi-statement script. In
//! [`TxMode::Transaction`] the script and the post-checks share one
//! transaction that is rolled back when any check fails; in
//! [`TxMode::Autocommit`] the script commits as soon as it has run and a
//! failed check can only be reported.

use std::path::PathBuf;

use bookops_core::migrations::{MigrationPlan, TxMode};

use crate::checks::{evaluate, evaluate_all, CheckOutcome};
use crate::DbPool;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Cannot read migration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration {number:03} verification failed: {}", failures.join("; "))]
    Verification { number: u32, failures: Vec<String> },
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What happened to the migration's changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Executed and committed (or autocommitted) with all checks passing.
    Applied,
    /// Executed in autocommit mode but a post-check failed.
    AppliedUnverified,
    /// A post-check failed and the transaction was rolled back.
    RolledBack,
    /// Nothing was executed; only the checks ran.
    VerifiedOnly,
}

#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub plan: &'static MigrationPlan,
    pub pre_checks: Vec<CheckOutcome>,
    pub post_checks: Vec<CheckOutcome>,
    pub outcome: MigrationOutcome,
}

impl MigrationReport {
    /// Summaries of the failed, non-informational post-checks.
    pub fn failures(&self) -> Vec<String> {
        self.post_checks
            .iter()
            .filter(|o| o.is_failure())
            .map(CheckOutcome::summary)
            .collect()
    }

    pub fn passed(&self) -> bool {
        self.post_checks.iter().all(|o| !o.is_failure())
    }

    /// Turn failed post-checks into [`MigrationError::Verification`].
    pub fn ensure_passed(&self) -> Result<(), MigrationError> {
        let failures = self.failures();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(MigrationError::Verification {
                number: self.plan.number,
                failures,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Runs migration files from one directory.
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    migrations_dir: PathBuf,
}

impl MigrationRunner {
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
        }
    }

    /// Path of the plan's SQL file.
    pub fn file_path(&self, plan: &MigrationPlan) -> PathBuf {
        self.migrations_dir.join(plan.file)
    }

    /// Execute the plan's SQL file and evaluate its post-checks.
    ///
    /// The file is read before any statement is sent, so a missing file
    /// leaves the database untouched. Pre-check failures are reported but
    /// never abort the run. Failed post-checks are returned in the report
    /// (see [`MigrationReport::ensure_passed`]); in transaction mode they
    /// have already been rolled back.
    pub async fn run(
        &self,
        pool: &DbPool,
        plan: &'static MigrationPlan,
    ) -> Result<MigrationReport, MigrationError> {
        let path = self.file_path(plan);
        let sql = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| MigrationError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!(
            migration = %plan.label(),
            file = %path.display(),
            bytes = sql.len(),
            "Loaded migration file"
        );

        let pre_checks = Self::pre_checks(pool, plan).await?;

        let (post_checks, outcome) = match plan.tx_mode {
            TxMode::Autocommit => {
                let mut conn = pool.acquire().await?;
                sqlx::raw_sql(&sql).execute(&mut *conn).await?;
                tracing::info!(migration = %plan.label(), "Migration executed (autocommit)");

                let post = evaluate_all(&mut conn, plan.post_checks).await?;
                let outcome = if post.iter().any(CheckOutcome::is_failure) {
                    MigrationOutcome::AppliedUnverified
                } else {
                    MigrationOutcome::Applied
                };
                (post, outcome)
            }
            TxMode::Transaction => {
                let mut tx = pool.begin().await?;
                sqlx::raw_sql(&sql).execute(&mut *tx).await?;
                tracing::info!(migration = %plan.label(), "Migration executed in transaction");

                let post = evaluate_all(&mut tx, plan.post_checks).await?;
                if post.iter().any(CheckOutcome::is_failure) {
                    tx.rollback().await?;
                    tracing::warn!(migration = %plan.label(), "Verification failed, rolled back");
                    (post, MigrationOutcome::RolledBack)
                } else {
                    tx.commit().await?;
                    tracing::info!(migration = %plan.label(), "Migration committed");
                    (post, MigrationOutcome::Applied)
                }
            }
        };

        Ok(MigrationReport {
            plan,
            pre_checks,
            post_checks,
            outcome,
        })
    }

    /// Evaluate only the plan's post-checks. Read-only.
    pub async fn verify(
        pool: &DbPool,
        plan: &'static MigrationPlan,
    ) -> Result<MigrationReport, MigrationError> {
        let mut conn = pool.acquire().await?;
        let post_checks = evaluate_all(&mut conn, plan.post_checks).await?;
        Ok(MigrationReport {
            plan,
            pre_checks: Vec::new(),
            post_checks,
            outcome: MigrationOutcome::VerifiedOnly,
        })
    }

    /// Pre-checks run on their own connection; a query error becomes a
    /// failed outcome instead of aborting the run.
    async fn pre_checks(
        pool: &DbPool,
        plan: &MigrationPlan,
    ) -> Result<Vec<CheckOutcome>, MigrationError> {
        if plan.pre_checks.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = pool.acquire().await?;
        let mut outcomes = Vec::with_capacity(plan.pre_checks.len());
        for check in plan.pre_checks {
            let outcome = match evaluate(&mut conn, check).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(migration = %plan.label(), error = %e, "Pre-check query failed");
                    CheckOutcome {
                        description: check.describe(),
                        informational: check.is_informational(),
                        passed: false,
                        details: vec![format!("query failed: {e}")],
                    }
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}
