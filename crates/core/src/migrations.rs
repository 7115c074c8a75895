//! Catalogue of the numbered booking-schema migrations.
//!
//! Each [`MigrationPlan`] names the SQL file to execute, whether it runs in
//! autocommit mode or inside one transaction, and the catalog checks that
//! must hold once it has run. The checks are plain data; `bookops-db`
//! evaluates them against a live connection.

use crate::catalog::DeleteRule;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// A single assertion (or informational probe) against the database.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    /// Every listed column exists on `table`.
    Columns {
        table: &'static str,
        columns: &'static [&'static str],
    },
    /// The table exists (has at least one column); its columns are listed.
    TableExists(&'static str),
    /// Lists the indexes on a table. Informational.
    TableIndexes(&'static str),
    /// An index with exactly this name exists.
    IndexNamed(&'static str),
    /// At least one index name matches one of the `LIKE` patterns.
    IndexesLike(&'static [&'static str]),
    /// Every listed function exists.
    Functions(&'static [&'static str]),
    /// The function exists in `public` and its definition contains every
    /// `contains` needle and none of the `excludes` needles.
    FunctionBody {
        function: &'static str,
        contains: &'static [&'static str],
        excludes: &'static [&'static str],
    },
    /// Every listed trigger exists.
    Triggers(&'static [&'static str]),
    /// The trigger's definition contains `contains`, compared
    /// case-insensitively.
    TriggerDefinition {
        trigger: &'static str,
        contains: &'static str,
    },
    /// Triggers whose names match the `LIKE` pattern are exactly `expected`.
    TriggerFamily {
        pattern: &'static str,
        expected: &'static [&'static str],
    },
    /// The named foreign key on `table` has the given delete rule.
    ForeignKeyDeleteRule {
        table: &'static str,
        constraint: &'static str,
        rule: DeleteRule,
    },
    /// The named table constraint exists.
    Constraint {
        table: &'static str,
        constraint: &'static str,
    },
    /// No `(booking_id, template_name, status)` group in `scheduled_emails`
    /// has more than one row.
    NoDuplicateScheduledEmails,
    /// No `scheduled_emails` row uses the template name.
    NoScheduledEmailsWithTemplate(&'static str),
    /// Reports the row count of a table. Informational.
    RowCount(&'static str),
    /// Reports the current values of `notification_settings` columns.
    /// Informational.
    SettingsValues(&'static [&'static str]),
}

impl Check {
    /// Informational checks report findings but never fail.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            Check::TableIndexes(_) | Check::RowCount(_) | Check::SettingsValues(_)
        )
    }

    /// Human-readable description used as the check's heading.
    pub fn describe(&self) -> String {
        match self {
            Check::Columns { table, columns } => {
                format!("Columns on {table}: {}", columns.join(", "))
            }
            Check::TableExists(table) => format!("Table {table} exists"),
            Check::TableIndexes(table) => format!("Indexes on {table}"),
            Check::IndexNamed(name) => format!("Index {name} exists"),
            Check::IndexesLike(patterns) => {
                format!("Indexes matching {}", patterns.join(" or "))
            }
            Check::Functions(names) => format!("Functions {}", call_list(names)),
            Check::FunctionBody { function, .. } => format!("Definition of {function}()"),
            Check::Triggers(names) => format!("Triggers {}", names.join(", ")),
            Check::TriggerDefinition { trigger, contains } => {
                format!("Trigger {trigger} contains '{contains}'")
            }
            Check::TriggerFamily { pattern, .. } => format!("Triggers matching {pattern}"),
            Check::ForeignKeyDeleteRule {
                table,
                constraint,
                rule,
            } => format!("FK {constraint} on {table} is ON DELETE {rule}"),
            Check::Constraint { table, constraint } => {
                format!("Constraint {constraint} on {table} exists")
            }
            Check::NoDuplicateScheduledEmails => {
                "No duplicate scheduled_emails per (booking_id, template_name, status)".to_string()
            }
            Check::NoScheduledEmailsWithTemplate(template) => {
                format!("No scheduled_emails with template '{template}'")
            }
            Check::RowCount(table) => format!("Row count of {table}"),
            Check::SettingsValues(_) => "Current notification_settings values".to_string(),
        }
    }
}

fn call_list(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!("{n}()"))
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Check helpers
// ---------------------------------------------------------------------------

/// Names from `expected` that do not appear in `found`.
pub fn missing_names<'a>(expected: &[&'a str], found: &[String]) -> Vec<&'a str> {
    expected
        .iter()
        .copied()
        .filter(|e| !found.iter().any(|f| f.as_str() == *e))
        .collect()
}

/// Names in `found` that are not in `expected`.
pub fn unexpected_names(expected: &[&str], found: &[String]) -> Vec<String> {
    found
        .iter()
        .filter(|f| !expected.contains(&f.as_str()))
        .cloned()
        .collect()
}

/// Problems with a function definition: required needles that are absent
/// and forbidden needles that are present.
pub fn definition_problems(definition: &str, contains: &[&str], excludes: &[&str]) -> Vec<String> {
    let mut problems: Vec<String> = contains
        .iter()
        .filter(|needle| !definition.contains(**needle))
        .map(|needle| format!("missing {needle}"))
        .collect();
    problems.extend(
        excludes
            .iter()
            .filter(|needle| definition.contains(**needle))
            .map(|needle| format!("still contains {needle}")),
    );
    problems
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

// ---------------------------------------------------------------------------
// Migration plans
// ---------------------------------------------------------------------------

/// How the migration SQL is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// The script commits as soon as it has run; failed checks cannot undo it.
    Autocommit,
    /// The SQL and the post-checks run in one transaction that is rolled back
    /// if any check fails.
    Transaction,
}

/// A known migration file and what must be true after it has run.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationPlan {
    pub number: u32,
    pub file: &'static str,
    pub title: &'static str,
    pub tx_mode: TxMode,
    /// Reported before executing; never fatal.
    pub pre_checks: &'static [Check],
    pub post_checks: &'static [Check],
}

impl MigrationPlan {
    /// Zero-padded number as used in the file names, e.g. `013`.
    pub fn label(&self) -> String {
        format!("{:03}", self.number)
    }
}

const AUTO_REMINDER_FLAGS: &[&str] = &[
    "auto_reminder_incomplete_data",
    "auto_reminder_payment",
    "auto_reminder_checkin",
    "auto_reminder_invoice",
];

const SCHEDULED_EMAIL_CHECKS: &[Check] = &[
    Check::NoDuplicateScheduledEmails,
    Check::NoScheduledEmailsWithTemplate("booking_reminder"),
    Check::Constraint {
        table: "scheduled_emails",
        constraint: "unique_scheduled_email",
    },
    Check::RowCount("scheduled_emails"),
];

/// Every migration the tool knows how to apply and verify, in order.
pub const PLANS: &[MigrationPlan] = &[
    MigrationPlan {
        number: 10,
        file: "010_audit_trail_columns.sql",
        title: "Audit trail columns",
        tx_mode: TxMode::Autocommit,
        pre_checks: &[],
        post_checks: &[
            Check::Columns {
                table: "bookings",
                columns: &["created_by", "updated_by"],
            },
            Check::Columns {
                table: "guests",
                columns: &["created_by", "updated_by"],
            },
            Check::Columns {
                table: "rooms",
                columns: &["created_by", "updated_by"],
            },
            Check::IndexesLike(&["idx_%_created_by", "idx_%_updated_by"]),
        ],
    },
    MigrationPlan {
        number: 11,
        file: "011_active_locks_table.sql",
        title: "Active locks table (presence system)",
        tx_mode: TxMode::Autocommit,
        pre_checks: &[],
        post_checks: &[
            Check::TableExists("active_locks"),
            Check::TableIndexes("active_locks"),
            Check::Functions(&["cleanup_stale_locks", "notify_lock_change"]),
            Check::Triggers(&["trigger_lock_changes"]),
        ],
    },
    MigrationPlan {
        number: 12,
        file: "012_audit_log_table.sql",
        title: "Audit log table (change history)",
        tx_mode: TxMode::Autocommit,
        pre_checks: &[],
        post_checks: &[
            Check::TableExists("audit_log"),
            Check::TableIndexes("audit_log"),
            Check::Functions(&[
                "log_booking_changes",
                "log_guest_changes",
                "log_room_changes",
            ]),
            Check::Triggers(&[
                "trigger_audit_bookings",
                "trigger_audit_guests",
                "trigger_audit_rooms",
            ]),
            Check::RowCount("audit_log"),
        ],
    },
    MigrationPlan {
        number: 13,
        file: "013_fix_email_duplicates.sql",
        title: "Fix e-mail duplicates",
        tx_mode: TxMode::Transaction,
        pre_checks: SCHEDULED_EMAIL_CHECKS,
        post_checks: &[
            Check::NoDuplicateScheduledEmails,
            Check::Constraint {
                table: "scheduled_emails",
                constraint: "unique_scheduled_email",
            },
            Check::NoScheduledEmailsWithTemplate("booking_reminder"),
            Check::FunctionBody {
                function: "schedule_reminder_emails_for_booking",
                contains: &["'reminder'", "ON CONFLICT", "DO UPDATE"],
                excludes: &["'booking_reminder'"],
            },
            Check::RowCount("scheduled_emails"),
        ],
    },
    MigrationPlan {
        number: 14,
        file: "014_add_checkin_reminder_days.sql",
        title: "Check-in reminder lead time",
        tx_mode: TxMode::Transaction,
        pre_checks: &[],
        post_checks: &[
            Check::Columns {
                table: "notification_settings",
                columns: &["checkin_reminder_before_days"],
            },
            Check::SettingsValues(&["checkin_reminder_before_days"]),
        ],
    },
    MigrationPlan {
        number: 15,
        file: "015_add_auto_reminder_flags.sql",
        title: "Auto-reminder flags",
        tx_mode: TxMode::Transaction,
        pre_checks: &[],
        post_checks: &[
            Check::Columns {
                table: "notification_settings",
                columns: AUTO_REMINDER_FLAGS,
            },
            Check::SettingsValues(AUTO_REMINDER_FLAGS),
        ],
    },
    MigrationPlan {
        number: 16,
        file: "016_auto_create_reminders.sql",
        title: "Auto-create reminders for bookings",
        tx_mode: TxMode::Transaction,
        pre_checks: &[],
        post_checks: &[
            Check::Columns {
                table: "notification_settings",
                columns: &["payment_reminder_before_days"],
            },
            Check::SettingsValues(&["payment_reminder_before_days"]),
            Check::Functions(&["auto_create_reminders_for_booking"]),
            Check::Triggers(&["trg_auto_create_reminders"]),
            Check::Functions(&["auto_complete_reminders_on_booking_update"]),
            Check::Triggers(&["trg_auto_complete_reminders"]),
        ],
    },
    MigrationPlan {
        number: 17,
        file: "017_reminder_update_system.sql",
        title: "Reminder update system",
        tx_mode: TxMode::Transaction,
        pre_checks: &[],
        post_checks: &[
            Check::IndexNamed("unique_active_reminder_per_booking_type"),
            Check::ForeignKeyDeleteRule {
                table: "reminders",
                constraint: "reminders_booking_id_fkey",
                rule: DeleteRule::Cascade,
            },
            Check::FunctionBody {
                function: "auto_create_reminders_for_booking",
                contains: &["ON CONFLICT"],
                excludes: &[],
            },
            Check::TriggerDefinition {
                trigger: "trg_auto_create_reminders",
                contains: "UPDATE OF",
            },
            Check::FunctionBody {
                function: "auto_complete_reminders_on_booking_update",
                contains: &["storniert", "[Buchung storniert]"],
                excludes: &[],
            },
        ],
    },
    MigrationPlan {
        number: 18,
        file: "018_reminder_notify_triggers.sql",
        title: "Real-time NOTIFY triggers for reminders",
        tx_mode: TxMode::Transaction,
        pre_checks: &[],
        post_checks: &[
            Check::FunctionBody {
                function: "notify_table_change",
                contains: &["reminder_changes"],
                excludes: &[],
            },
            Check::TriggerFamily {
                pattern: "trg_notify_reminder%",
                expected: &[
                    "trg_notify_reminder_delete",
                    "trg_notify_reminder_insert",
                    "trg_notify_reminder_update",
                ],
            },
        ],
    },
];

/// Look up a migration by number.
pub fn find_plan(number: u32) -> Result<&'static MigrationPlan, CoreError> {
    PLANS
        .iter()
        .find(|p| p.number == number)
        .ok_or(CoreError::NotFound {
            entity: "migration",
            id: i64::from(number),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plans_are_ordered_and_unique() {
        let numbers: Vec<u32> = PLANS.iter().map(|p| p.number).collect();
        let mut sorted = numbers.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(numbers, sorted);
    }

    #[test]
    fn file_names_carry_the_plan_number() {
        for plan in PLANS {
            assert!(
                plan.file.starts_with(&plan.label()),
                "{} does not start with {}",
                plan.file,
                plan.label()
            );
            assert!(plan.file.ends_with(".sql"));
        }
    }

    #[test]
    fn early_migrations_run_in_autocommit() {
        for number in [10, 11, 12] {
            assert_eq!(find_plan(number).unwrap().tx_mode, TxMode::Autocommit);
        }
        for number in 13..=18 {
            assert_eq!(find_plan(number).unwrap().tx_mode, TxMode::Transaction);
        }
    }

    #[test]
    fn unknown_migration_is_not_found() {
        let err = find_plan(9).unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotFound {
                entity: "migration",
                id: 9
            }
        ));
    }

    #[test]
    fn every_plan_asserts_something() {
        for plan in PLANS {
            assert!(
                plan.post_checks.iter().any(|c| !c.is_informational()),
                "migration {} has only informational checks",
                plan.label()
            );
        }
    }

    #[test]
    fn migration_017_requires_cascade() {
        let plan = find_plan(17).unwrap();
        assert!(plan.post_checks.contains(&Check::ForeignKeyDeleteRule {
            table: "reminders",
            constraint: "reminders_booking_id_fkey",
            rule: DeleteRule::Cascade,
        }));
    }

    #[test]
    fn label_is_zero_padded() {
        assert_eq!(find_plan(13).unwrap().label(), "013");
    }

    #[test]
    fn missing_and_unexpected_names() {
        let found = vec!["a".to_string(), "c".to_string()];
        assert_eq!(missing_names(&["a", "b", "c"], &found), vec!["b"]);
        assert_eq!(unexpected_names(&["a"], &found), vec!["c".to_string()]);
    }

    #[test]
    fn definition_problems_reports_both_directions() {
        let body = "INSERT ... ON CONFLICT (x) DO UPDATE SET template_name = 'booking_reminder'";
        let problems = definition_problems(body, &["ON CONFLICT", "'reminder'"], &["'booking_reminder'"]);
        assert_eq!(
            problems,
            vec![
                "missing 'reminder'".to_string(),
                "still contains 'booking_reminder'".to_string()
            ]
        );
    }

    #[test]
    fn definition_without_problems() {
        let body = "... template_name = 'reminder' ON CONFLICT DO UPDATE ...";
        assert!(definition_problems(body, &["'reminder'"], &["'booking_reminder'"]).is_empty());
    }

    #[test]
    fn case_insensitive_contains() {
        assert!(contains_ignore_case(
            "CREATE TRIGGER t AFTER INSERT OR update of checkin_date ON bookings",
            "UPDATE OF"
        ));
        assert!(!contains_ignore_case("AFTER INSERT", "UPDATE OF"));
    }

    #[test]
    fn informational_checks() {
        assert!(Check::RowCount("audit_log").is_informational());
        assert!(Check::TableIndexes("audit_log").is_informational());
        assert!(!Check::TableExists("audit_log").is_informational());
        assert!(!Check::NoDuplicateScheduledEmails.is_informational());
    }
}
