//! `bookops` -- operator commands for the booking database.
//!
//! # Environment variables
//!
//! | Variable                  | Default         | Description                        |
//! |---------------------------|-----------------|------------------------------------|
//! | `DATABASE_URL`            | --              | Full connection URL, wins if set   |
//! | `DB_HOST`                 | `localhost`     | Server host                        |
//! | `DB_PORT`                 | `5432`          | Server port                        |
//! | `DB_NAME`                 | `dpolg_booking` | Database name                      |
//! | `DB_USER`                 | `postgres`      | User name                          |
//! | `DB_PASSWORD`             | (empty)         | Password                           |
//! | `DB_CONNECT_TIMEOUT_SECS` | `10`            | Connect / acquire timeout          |
//! | `MIGRATIONS_DIR`          | `migrations`    | Directory of numbered SQL files    |
//! | `RUST_LOG`                | see below       | Log filter (logs go to stderr)     |

use std::process::ExitCode;

use bookops_cli::cli::Cli;
use bookops_cli::report::Report;
use bookops_cli::DEFAULT_LOG_FILTER;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut report = Report::stdout();
    let mut input = std::io::stdin().lock();

    match bookops_cli::run(cli.command, &mut input, &mut report).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            // Best effort; stdout may already be gone.
            let _ = report.line(&format!("[ERROR] {e}"));
            ExitCode::FAILURE
        }
    }
}
