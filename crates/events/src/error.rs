#[derive(Debug, thiserror::Error)]
pub enum EventsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid notification payload: {0}")]
    Payload(#[from] serde_json::Error),
}
