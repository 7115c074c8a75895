use std::io::Write;
use std::time::Duration;

use bookops_core::types::DbId;
use bookops_db::DbPool;
use bookops_events::{
    publish, ChangeAction, ChangeEvent, ChangeListener, EventsError, ReceivedChange, CHANNELS,
};
use tokio::time::Instant;

use crate::error::OpsError;
use crate::report::Report;

/// Publish one change event on the channel its table routes to.
pub async fn send<W: Write>(
    pool: &DbPool,
    table: &str,
    action: ChangeAction,
    id: DbId,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    let event = ChangeEvent::new(table, action, id);
    let payload = event.to_payload().map_err(EventsError::from)?;
    report.line(&format!("Payload: {payload}"))?;

    let channel = publish(pool, &event).await?;
    report.ok(&format!("NOTIFY sent on {channel}"))?;
    report.detail(&format!("A listener should now see {action} {table} #{id}."))?;
    Ok(())
}

/// Print change events until Ctrl-C or until `timeout` elapses.
///
/// Listens on every change channel when `channels` is empty.
pub async fn watch<W: Write>(
    pool: &DbPool,
    channels: &[String],
    timeout: Option<Duration>,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    let channels: Vec<&str> = if channels.is_empty() {
        CHANNELS.to_vec()
    } else {
        channels.iter().map(String::as_str).collect()
    };

    let mut listener = ChangeListener::connect(pool, &channels).await?;
    report.info(&format!("Listening on {}", channels.join(", ")))?;

    let deadline = timeout.map(|t| Instant::now() + t);
    let mut received = 0usize;

    loop {
        let expired = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                report.info("Interrupted")?;
                break;
            }
            _ = expired => {
                report.info("Timeout reached")?;
                break;
            }
            change = listener.recv() => {
                print_change(&change?, report)?;
                received += 1;
            }
        }
    }

    report.info(&format!("{received} notification(s) received"))?;
    Ok(())
}

fn print_change<W: Write>(change: &ReceivedChange, report: &mut Report<W>) -> std::io::Result<()> {
    match change.event() {
        Ok(event) => report.ok(&format!(
            "{}: {} {} #{} at {}",
            change.channel,
            event.action,
            event.table,
            event.id,
            event.timestamp.to_rfc3339()
        )),
        Err(e) => {
            report.warn(&format!("{}: unparseable payload ({e})", change.channel))?;
            report.detail(&change.payload)
        }
    }
}
