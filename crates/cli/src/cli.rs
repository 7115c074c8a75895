//! Command-line interface definition.

use std::path::PathBuf;

use bookops_core::types::DbId;
use bookops_events::ChangeAction;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "bookops",
    author,
    version,
    about = "Operator commands for the booking database"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply a numbered migration file and verify the result.
    Migrate(MigrateArgs),
    /// Verify the state of the database without changing it.
    #[command(subcommand)]
    Verify(VerifyCommand),
    /// Inspect a single database object.
    #[command(subcommand)]
    Check(CheckCommand),
    /// Print diagnostic details.
    #[command(subcommand)]
    Debug(DebugCommand),
    /// Repair inconsistent rows or objects.
    #[command(subcommand)]
    Fix(FixCommand),
    /// Delete rows that should not exist.
    #[command(subcommand)]
    Cleanup(CleanupCommand),
    /// Send or receive change notifications.
    #[command(subcommand)]
    Notify(NotifyCommand),
    /// Offline schema tools (no database connection).
    #[command(subcommand)]
    Schema(SchemaCommand),
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration number, e.g. `17` for `017_*.sql`.
    pub number: u32,
    /// Directory holding the migration files (overrides `MIGRATIONS_DIR`).
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum VerifyCommand {
    /// Re-run a migration's post-checks.
    Migration {
        number: u32,
    },
    /// Shift a booking's check-in and watch its reminders follow (always rolled back).
    ReminderUpdates,
    /// Check the reminder notification triggers.
    Triggers {
        /// Also fire a test update and wait for the notification.
        #[arg(long)]
        fire: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum CheckCommand {
    /// Show `notify_table_change()` and whether it routes reminders.
    NotifyFunction,
    /// List e-mail templates and look for `payment_reminder`.
    EmailTemplates,
}

#[derive(Debug, Subcommand)]
pub enum DebugCommand {
    /// Price and discount breakdown of one booking.
    Booking {
        id: DbId,
    },
    /// Reminder counts and the latest reminders.
    Reminders {
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
}

#[derive(Debug, Subcommand)]
pub enum FixCommand {
    /// Recompute stale `discounts.calculated_amount` values.
    CalculatedAmounts {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Replace `notify_table_change()` with the version that routes reminders.
    NotifyFunction,
}

#[derive(Debug, Subcommand)]
pub enum CleanupCommand {
    /// Delete reminders whose booking no longer exists.
    OrphanedReminders,
}

#[derive(Debug, Subcommand)]
pub enum NotifyCommand {
    /// Publish one change event.
    Send {
        #[arg(long, default_value = "reminders")]
        table: String,
        #[arg(long, default_value = "UPDATE")]
        action: ChangeAction,
        #[arg(long, default_value_t = 999)]
        id: DbId,
    },
    /// Print change events until interrupted.
    Watch {
        /// Channel to listen on; repeatable. Defaults to every change channel.
        #[arg(long = "channel")]
        channels: Vec<String>,
        /// Stop after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[derive(Debug, Subcommand)]
pub enum SchemaCommand {
    /// Compare a schema export with the columns repository code reads.
    Validate {
        #[arg(long, default_value = "docs/pg_schema_full.txt")]
        schema: PathBuf,
        #[arg(long, default_value = "docs/rust_column_access.txt")]
        columns: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bookops").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn migrate_takes_a_number_and_optional_dir() {
        let cli = parse(&["migrate", "17", "--dir", "sql"]);
        match cli.command {
            Command::Migrate(args) => {
                assert_eq!(args.number, 17);
                assert_eq!(args.dir, Some(PathBuf::from("sql")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn notify_send_defaults() {
        let cli = parse(&["notify", "send"]);
        match cli.command {
            Command::Notify(NotifyCommand::Send { table, action, id }) => {
                assert_eq!(table, "reminders");
                assert_eq!(action, ChangeAction::Update);
                assert_eq!(id, 999);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn notify_send_accepts_lowercase_action() {
        let cli = parse(&["notify", "send", "--table", "bookings", "--action", "delete", "--id", "5"]);
        assert!(matches!(
            cli.command,
            Command::Notify(NotifyCommand::Send { action: ChangeAction::Delete, id: 5, .. })
        ));
    }

    #[test]
    fn notify_watch_collects_channels() {
        let cli = parse(&[
            "notify", "watch", "--channel", "booking_changes", "--channel", "reminder_changes",
            "--timeout-secs", "30",
        ]);
        match cli.command {
            Command::Notify(NotifyCommand::Watch { channels, timeout_secs }) => {
                assert_eq!(channels, vec!["booking_changes", "reminder_changes"]);
                assert_eq!(timeout_secs, Some(30));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn schema_validate_defaults_to_docs() {
        let cli = parse(&["schema", "validate"]);
        match cli.command {
            Command::Schema(SchemaCommand::Validate { schema, columns }) => {
                assert_eq!(schema, PathBuf::from("docs/pg_schema_full.txt"));
                assert_eq!(columns, PathBuf::from("docs/rust_column_access.txt"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn kebab_case_subcommands() {
        assert!(matches!(
            parse(&["fix", "calculated-amounts", "--yes"]).command,
            Command::Fix(FixCommand::CalculatedAmounts { yes: true })
        ));
        assert!(matches!(
            parse(&["cleanup", "orphaned-reminders"]).command,
            Command::Cleanup(CleanupCommand::OrphanedReminders)
        ));
        assert!(matches!(
            parse(&["verify", "triggers", "--fire"]).command,
            Command::Verify(VerifyCommand::Triggers { fire: true })
        ));
        assert!(matches!(
            parse(&["debug", "reminders"]).command,
            Command::Debug(DebugCommand::Reminders { limit: 5 })
        ));
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(Cli::try_parse_from(["bookops", "notify", "send", "--action", "UPSERT"]).is_err());
    }

    #[test]
    fn negative_reminder_limit_is_rejected() {
        assert!(Cli::try_parse_from(["bookops", "debug", "reminders", "--limit", "-1"]).is_err());
        assert!(matches!(
            parse(&["debug", "reminders", "--limit", "20"]).command,
            Command::Debug(DebugCommand::Reminders { limit: 20 })
        ));
    }
}
