//! Evaluation of [`Check`]s against a live connection.
//!
//! Every check runs on the caller's connection so that post-migration checks
//! see the uncommitted state of an open transaction.

use bookops_core::migrations::{
    contains_ignore_case, definition_problems, missing_names, unexpected_names, Check,
};
use sqlx::PgConnection;

use crate::models::catalog::TriggerInfo;
use crate::repositories::{CatalogRepo, NotificationSettingsRepo, ScheduledEmailRepo};

const SETTINGS_TABLE: &str = "notification_settings";
const SCHEDULED_EMAILS_TABLE: &str = "scheduled_emails";

/// Result of evaluating one check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub description: String,
    pub informational: bool,
    pub passed: bool,
    /// Findings, one line each.
    pub details: Vec<String>,
}

impl CheckOutcome {
    fn new(check: &Check, passed: bool, details: Vec<String>) -> Self {
        Self {
            description: check.describe(),
            informational: check.is_informational(),
            passed: passed || check.is_informational(),
            details,
        }
    }

    /// A failed check that counts against the migration.
    pub fn is_failure(&self) -> bool {
        !self.passed && !self.informational
    }

    /// One-line summary used in verification errors.
    pub fn summary(&self) -> String {
        if self.details.is_empty() {
            self.description.clone()
        } else {
            format!("{} ({})", self.description, self.details.join("; "))
        }
    }
}

fn describe_trigger(trigger: &TriggerInfo) -> String {
    let state = trigger
        .state
        .map(|s| s.to_string())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    format!(
        "{} on {}: {} {} [{}]",
        trigger.name, trigger.table, trigger.timing, trigger.events, state
    )
}

/// Evaluate a single check.
pub async fn evaluate(conn: &mut PgConnection, check: &Check) -> Result<CheckOutcome, sqlx::Error> {
    let outcome = match check {
        Check::Columns { table, columns } => {
            let found = CatalogRepo::columns(&mut *conn, table).await?;
            let names: Vec<String> = found.iter().map(|c| c.column_name.clone()).collect();
            let missing = missing_names(columns, &names);
            let mut details: Vec<String> = found
                .iter()
                .filter(|c| columns.contains(&c.column_name.as_str()))
                .map(|c| format!("{} ({})", c.column_name, c.data_type))
                .collect();
            details.extend(missing.iter().map(|m| format!("missing column {m}")));
            CheckOutcome::new(check, missing.is_empty(), details)
        }

        Check::TableExists(table) => {
            let found = CatalogRepo::columns(&mut *conn, table).await?;
            let details = if found.is_empty() {
                vec![format!("table {table} not found")]
            } else {
                found
                    .iter()
                    .map(|c| format!("{}: {}", c.column_name, c.data_type))
                    .collect()
            };
            CheckOutcome::new(check, !found.is_empty(), details)
        }

        Check::TableIndexes(table) => {
            let indexes = CatalogRepo::indexes(&mut *conn, table).await?;
            let details = indexes.into_iter().map(|i| i.indexdef).collect();
            CheckOutcome::new(check, true, details)
        }

        Check::IndexNamed(name) => {
            let exists = CatalogRepo::index_exists(&mut *conn, name).await?;
            let details = if exists {
                Vec::new()
            } else {
                vec![format!("index {name} not found")]
            };
            CheckOutcome::new(check, exists, details)
        }

        Check::IndexesLike(patterns) => {
            let indexes = CatalogRepo::indexes_like(&mut *conn, patterns).await?;
            let passed = !indexes.is_empty();
            let details = if passed {
                indexes
                    .into_iter()
                    .map(|i| format!("{} on {}", i.indexname, i.tablename))
                    .collect()
            } else {
                vec!["no matching indexes".to_string()]
            };
            CheckOutcome::new(check, passed, details)
        }

        Check::Functions(names) => {
            let found = CatalogRepo::existing_functions(&mut *conn, names).await?;
            let missing = missing_names(names, &found);
            let details = missing
                .iter()
                .map(|m| format!("missing function {m}()"))
                .collect();
            CheckOutcome::new(check, missing.is_empty(), details)
        }

        Check::FunctionBody {
            function,
            contains,
            excludes,
        } => match CatalogRepo::function_definition(&mut *conn, function).await? {
            None => CheckOutcome::new(check, false, vec![format!("function {function}() not found")]),
            Some(definition) => {
                let problems = definition_problems(&definition, contains, excludes);
                CheckOutcome::new(check, problems.is_empty(), problems)
            }
        },

        Check::Triggers(names) => {
            let found = CatalogRepo::triggers_named(&mut *conn, names).await?;
            let found_names: Vec<String> = found.iter().map(|t| t.name.clone()).collect();
            let missing = missing_names(names, &found_names);
            let mut details: Vec<String> = found.iter().map(describe_trigger).collect();
            details.extend(missing.iter().map(|m| format!("missing trigger {m}")));
            CheckOutcome::new(check, missing.is_empty(), details)
        }

        Check::TriggerDefinition { trigger, contains } => {
            let found = CatalogRepo::triggers_named(&mut *conn, &[*trigger]).await?;
            match found.first() {
                None => CheckOutcome::new(check, false, vec![format!("trigger {trigger} not found")]),
                Some(t) => {
                    let passed = contains_ignore_case(&t.definition, contains);
                    CheckOutcome::new(check, passed, vec![t.definition.clone()])
                }
            }
        }

        Check::TriggerFamily { pattern, expected } => {
            let found = CatalogRepo::triggers_like(&mut *conn, pattern).await?;
            let names: Vec<String> = found.iter().map(|t| t.name.clone()).collect();
            let missing = missing_names(expected, &names);
            let unexpected = unexpected_names(expected, &names);
            let disabled: Vec<&TriggerInfo> = found.iter().filter(|t| !t.is_enabled()).collect();

            let mut details: Vec<String> = found.iter().map(describe_trigger).collect();
            details.extend(missing.iter().map(|m| format!("missing trigger {m}")));
            details.extend(unexpected.iter().map(|u| format!("unexpected trigger {u}")));
            details.extend(disabled.iter().map(|t| format!("trigger {} is disabled", t.name)));

            let passed = missing.is_empty() && unexpected.is_empty() && disabled.is_empty();
            CheckOutcome::new(check, passed, details)
        }

        Check::ForeignKeyDeleteRule {
            table,
            constraint,
            rule,
        } => match CatalogRepo::foreign_key(&mut *conn, table, constraint).await? {
            None => CheckOutcome::new(
                check,
                false,
                vec![format!("foreign key {constraint} not found on {table}")],
            ),
            Some(fk) => {
                let actual = fk
                    .delete_rule
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "UNKNOWN".to_string());
                CheckOutcome::new(
                    check,
                    fk.delete_rule == Some(*rule),
                    vec![format!("delete rule: {actual}"), fk.definition],
                )
            }
        },

        Check::Constraint { table, constraint } => {
            let exists = CatalogRepo::constraint_exists(&mut *conn, table, constraint).await?;
            let details = if exists {
                Vec::new()
            } else {
                vec![format!("constraint {constraint} not found on {table}")]
            };
            CheckOutcome::new(check, exists, details)
        }

        Check::NoDuplicateScheduledEmails => {
            if !table_exists(conn, SCHEDULED_EMAILS_TABLE).await? {
                return Ok(missing_table(check, SCHEDULED_EMAILS_TABLE));
            }
            let groups = ScheduledEmailRepo::duplicate_groups(&mut *conn).await?;
            let details = groups
                .iter()
                .map(|g| {
                    format!(
                        "booking {} / {} / {}: {} rows",
                        g.booking_id, g.template_name, g.status, g.count
                    )
                })
                .collect();
            CheckOutcome::new(check, groups.is_empty(), details)
        }

        Check::NoScheduledEmailsWithTemplate(template) => {
            if !table_exists(conn, SCHEDULED_EMAILS_TABLE).await? {
                return Ok(missing_table(check, SCHEDULED_EMAILS_TABLE));
            }
            let count = ScheduledEmailRepo::count_with_template(&mut *conn, template).await?;
            CheckOutcome::new(check, count == 0, vec![format!("{count} rows")])
        }

        Check::RowCount(table) => {
            if !table_exists(conn, table).await? {
                return Ok(missing_table(check, table));
            }
            let count = CatalogRepo::row_count(&mut *conn, table).await?;
            CheckOutcome::new(check, true, vec![format!("{count} rows")])
        }

        Check::SettingsValues(columns) => {
            // Only existing columns are selected; a missing one would abort
            // the surrounding transaction.
            let present: Vec<String> = CatalogRepo::columns(&mut *conn, SETTINGS_TABLE)
                .await?
                .into_iter()
                .map(|c| c.column_name)
                .collect();
            let missing = missing_names(columns, &present);
            let selectable: Vec<&str> = columns
                .iter()
                .copied()
                .filter(|c| !missing.contains(c))
                .collect();

            let mut details = Vec::new();
            match NotificationSettingsRepo::values(&mut *conn, &selectable).await? {
                None if !present.is_empty() => details.push("no settings row".to_string()),
                None => {}
                Some(values) => details.extend(values.into_iter().map(|v| {
                    format!("{} = {}", v.column, v.value.as_deref().unwrap_or("NULL"))
                })),
            }
            details.extend(missing.iter().map(|m| format!("{m} = (missing)")));
            CheckOutcome::new(check, true, details)
        }
    };

    Ok(outcome)
}

/// Evaluate checks in order on one connection.
pub async fn evaluate_all(
    conn: &mut PgConnection,
    checks: &[Check],
) -> Result<Vec<CheckOutcome>, sqlx::Error> {
    let mut outcomes = Vec::with_capacity(checks.len());
    for check in checks {
        outcomes.push(evaluate(&mut *conn, check).await?);
    }
    Ok(outcomes)
}

async fn table_exists(conn: &mut PgConnection, table: &str) -> Result<bool, sqlx::Error> {
    Ok(!CatalogRepo::columns(&mut *conn, table).await?.is_empty())
}

fn missing_table(check: &Check, table: &str) -> CheckOutcome {
    CheckOutcome::new(check, false, vec![format!("table {table} not found")])
}
