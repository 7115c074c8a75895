//! Publishing change events with `pg_notify`.

use sqlx::PgExecutor;

use crate::change::ChangeEvent;
use crate::channels::channel_for_table;
use crate::error::EventsError;

/// Send `event` on the channel its table routes to. Returns the channel.
///
/// Inside a transaction the notification is delivered on commit.
pub async fn publish<'e, E: PgExecutor<'e>>(
    executor: E,
    event: &ChangeEvent,
) -> Result<&'static str, EventsError> {
    let channel = channel_for_table(&event.table);
    let payload = event.to_payload()?;

    sqlx::query("SELECT pg_notify($1, $2)")
        .bind(channel)
        .bind(&payload)
        .execute(executor)
        .await?;

    tracing::info!(
        channel,
        table = %event.table,
        action = %event.action,
        id = event.id,
        "Published change notification"
    );
    Ok(channel)
}
