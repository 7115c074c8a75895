//! The change-event envelope carried in notification payloads.

use std::fmt;

use bookops_core::types::{DbId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The row operation that fired the trigger (`TG_OP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INSERT" => Ok(Self::Insert),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("unknown change action '{other}'")),
        }
    }
}

/// A row change on a watched table.
///
/// Serialises to the same JSON object the trigger function builds with
/// `json_build_object('table', ..., 'action', ..., 'id', ..., 'timestamp', ...)`.
/// Row snapshots are optional and omitted when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub action: ChangeAction,
    pub id: DbId,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_data: Option<serde_json::Value>,
}

impl ChangeEvent {
    /// A change stamped with the current time.
    pub fn new(table: impl Into<String>, action: ChangeAction, id: DbId) -> Self {
        Self {
            table: table.into(),
            action,
            id,
            timestamp: Utc::now(),
            old_data: None,
            new_data: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_new_data(mut self, new_data: serde_json::Value) -> Self {
        self.new_data = Some(new_data);
        self
    }

    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn serialises_like_the_trigger_payload() {
        let ts = Utc.with_ymd_and_hms(2026, 2, 12, 19, 0, 0).unwrap();
        let event = ChangeEvent::new("reminders", ChangeAction::Update, 999).with_timestamp(ts);

        let value: serde_json::Value = serde_json::from_str(&event.to_payload().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "table": "reminders",
                "action": "UPDATE",
                "id": 999,
                "timestamp": "2026-02-12T19:00:00Z",
            })
        );
    }

    #[test]
    fn parses_trigger_payload_with_offset_timestamp() {
        let payload = r#"{"table" : "reminders", "action" : "DELETE", "id" : 42, "timestamp" : "2026-02-12T20:00:00.123456+01:00"}"#;
        let event = ChangeEvent::from_payload(payload).unwrap();
        assert_eq!(event.action, ChangeAction::Delete);
        assert_eq!(event.id, 42);
        assert_eq!(
            event.timestamp,
            Utc.with_ymd_and_hms(2026, 2, 12, 19, 0, 0).unwrap()
                + chrono::Duration::microseconds(123_456)
        );
        assert!(event.old_data.is_none());
    }

    #[test]
    fn row_snapshots_round_trip_when_present() {
        let event = ChangeEvent::new("bookings", ChangeAction::Insert, 1)
            .with_new_data(serde_json::json!({"status": "bestaetigt"}));
        let parsed = ChangeEvent::from_payload(&event.to_payload().unwrap()).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn unknown_action_is_rejected() {
        let payload = r#"{"table":"x","action":"TRUNCATE","id":1,"timestamp":"2026-02-12T19:00:00Z"}"#;
        assert!(ChangeEvent::from_payload(payload).is_err());
    }

    #[test]
    fn action_parses_case_insensitively() {
        assert_eq!("update".parse::<ChangeAction>(), Ok(ChangeAction::Update));
        assert!("upsert".parse::<ChangeAction>().is_err());
    }
}
