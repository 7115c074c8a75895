//! Values from the single `notification_settings` row.

use serde::Serialize;

/// One setting column rendered as text, `None` when NULL.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SettingValue {
    pub column: String,
    pub value: Option<String>,
}
