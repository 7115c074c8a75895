//! Receiving change notifications.

use std::time::Duration;

use sqlx::postgres::PgListener;
use sqlx::PgPool;

use crate::change::ChangeEvent;
use crate::error::EventsError;

/// A raw notification as delivered by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedChange {
    pub channel: String,
    pub payload: String,
}

impl ReceivedChange {
    /// Parse the payload as a [`ChangeEvent`].
    pub fn event(&self) -> Result<ChangeEvent, EventsError> {
        Ok(ChangeEvent::from_payload(&self.payload)?)
    }
}

/// A `LISTEN` session on one or more channels.
///
/// Holds its own connection from the pool for as long as it lives.
pub struct ChangeListener {
    inner: PgListener,
}

impl ChangeListener {
    pub async fn connect(pool: &PgPool, channels: &[&str]) -> Result<Self, EventsError> {
        let mut inner = PgListener::connect_with(pool).await?;
        inner.listen_all(channels.iter().copied()).await?;
        tracing::debug!(channels = ?channels, "Listening for change notifications");
        Ok(Self { inner })
    }

    /// Wait for the next notification.
    pub async fn recv(&mut self) -> Result<ReceivedChange, EventsError> {
        let notification = self.inner.recv().await?;
        Ok(ReceivedChange {
            channel: notification.channel().to_string(),
            payload: notification.payload().to_string(),
        })
    }

    /// Wait for the next notification for at most `timeout`.
    ///
    /// Returns `None` when nothing arrived in time.
    pub async fn next(&mut self, timeout: Duration) -> Result<Option<ReceivedChange>, EventsError> {
        match tokio::time::timeout(timeout, self.recv()).await {
            Ok(received) => received.map(Some),
            Err(_) => Ok(None),
        }
    }
}
