use std::path::PathBuf;

use bookops_core::error::CoreError;
use bookops_db::{ConfigError, MigrationError};
use bookops_events::EventsError;

/// Everything a command can fail with. Any variant exits the process with `1`.
#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("Notification error: {0}")]
    Events(#[from] EventsError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cannot read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The command ran to completion but found a problem.
    #[error("{0}")]
    CheckFailed(String),
}
