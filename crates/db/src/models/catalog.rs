//! Rows read from `information_schema` and the `pg_catalog` tables.

use bookops_core::catalog::{DeleteRule, TriggerEvents, TriggerState, TriggerTiming};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: String,
    pub column_default: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct IndexInfo {
    pub indexname: String,
    pub tablename: String,
    pub indexdef: String,
}

/// Raw `pg_trigger` row, before decoding.
#[derive(Debug, Clone, FromRow)]
pub struct TriggerRow {
    pub trigger_name: String,
    pub table_name: String,
    pub enabled: String,
    pub tgtype: i16,
    pub definition: String,
}

/// A trigger with its timing, events and enabled state decoded.
#[derive(Debug, Clone)]
pub struct TriggerInfo {
    pub name: String,
    pub table: String,
    pub timing: TriggerTiming,
    pub events: TriggerEvents,
    pub state: Option<TriggerState>,
    pub definition: String,
}

impl From<TriggerRow> for TriggerInfo {
    fn from(row: TriggerRow) -> Self {
        Self {
            timing: TriggerTiming::from_tgtype(row.tgtype),
            events: TriggerEvents::from_tgtype(row.tgtype),
            state: TriggerState::from_tgenabled(&row.enabled),
            name: row.trigger_name,
            table: row.table_name,
            definition: row.definition,
        }
    }
}

impl TriggerInfo {
    pub fn is_enabled(&self) -> bool {
        self.state.is_some_and(|s| s.fires_normally())
    }
}

/// A foreign key and its decoded delete rule.
#[derive(Debug, Clone)]
pub struct ForeignKeyInfo {
    pub constraint_name: String,
    pub table_name: String,
    pub delete_rule: Option<DeleteRule>,
    pub definition: String,
}
