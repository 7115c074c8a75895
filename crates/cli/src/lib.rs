//! The `bookops` operator commands.
//!
//! [`run`] connects to the database (unless the command works offline) and
//! dispatches to the command modules. [`execute`] does the same against an
//! existing pool.

use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

use bookops_db::{DbConfig, DbPool, MigrationRunner};

pub mod cli;
pub mod commands;
pub mod error;
pub mod report;

use cli::{
    CheckCommand, CleanupCommand, Command, DebugCommand, FixCommand, NotifyCommand,
    SchemaCommand, VerifyCommand,
};
use error::OpsError;
use report::Report;

/// Default `RUST_LOG` filter.
pub const DEFAULT_LOG_FILTER: &str = "bookops_cli=info,bookops_db=info,bookops_events=info";

/// Run one command. Reads confirmations from `input`, writes findings to `report`.
pub async fn run<W: Write, R: BufRead>(
    command: Command,
    input: &mut R,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    if let Command::Schema(SchemaCommand::Validate { schema, columns }) = &command {
        return commands::schema::validate(schema, columns, report);
    }

    let config = DbConfig::from_env()?;
    let pool = connect(&config).await?;
    execute(&pool, &config.migrations_dir, command, input, report).await
}

async fn connect(config: &DbConfig) -> Result<DbPool, OpsError> {
    tracing::info!(target_db = %config.target(), "Connecting to database");
    let pool = bookops_db::create_pool(config).await?;
    bookops_db::health_check(&pool).await?;
    let version = bookops_db::server_version(&pool).await?;
    tracing::debug!(%version, "Connected");
    Ok(pool)
}

/// Run one command against `pool`.
pub async fn execute<W: Write, R: BufRead>(
    pool: &DbPool,
    migrations_dir: &Path,
    command: Command,
    input: &mut R,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    match command {
        Command::Migrate(args) => {
            let dir = args.dir.as_deref().unwrap_or(migrations_dir);
            commands::migrate::run(pool, &MigrationRunner::new(dir), args.number, report).await
        }
        Command::Verify(VerifyCommand::Migration { number }) => {
            commands::verify::migration(pool, number, report).await
        }
        Command::Verify(VerifyCommand::ReminderUpdates) => {
            commands::verify::reminder_updates(pool, report).await
        }
        Command::Verify(VerifyCommand::Triggers { fire }) => {
            commands::verify::triggers(pool, fire, report).await
        }
        Command::Check(CheckCommand::NotifyFunction) => {
            commands::check::notify_function(pool, report).await
        }
        Command::Check(CheckCommand::EmailTemplates) => {
            commands::check::email_templates(pool, report).await
        }
        Command::Debug(DebugCommand::Booking { id }) => {
            commands::debug::booking(pool, id, report).await
        }
        Command::Debug(DebugCommand::Reminders { limit }) => {
            commands::debug::reminders(pool, limit, report).await
        }
        Command::Fix(FixCommand::CalculatedAmounts { yes }) => {
            commands::fix::calculated_amounts(pool, yes, input, report).await
        }
        Command::Fix(FixCommand::NotifyFunction) => {
            commands::fix::notify_function(pool, report).await
        }
        Command::Cleanup(CleanupCommand::OrphanedReminders) => {
            commands::cleanup::orphaned_reminders(pool, report).await
        }
        Command::Notify(NotifyCommand::Send { table, action, id }) => {
            commands::notify::send(pool, &table, action, id, report).await
        }
        Command::Notify(NotifyCommand::Watch {
            channels,
            timeout_secs,
        }) => {
            commands::notify::watch(pool, &channels, timeout_secs.map(Duration::from_secs), report)
                .await
        }
        Command::Schema(SchemaCommand::Validate { schema, columns }) => {
            commands::schema::validate(&schema, &columns, report)
        }
    }
}
