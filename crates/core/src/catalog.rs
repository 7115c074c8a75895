//! Decoding of PostgreSQL system catalog encodings.
//!
//! `pg_trigger.tgtype` packs timing and event flags into a bitmask,
//! `pg_trigger.tgenabled` and `pg_constraint.confdeltype` are single-letter
//! codes. These helpers turn them into readable values.

use std::fmt;

// ---------------------------------------------------------------------------
// Foreign key delete rule
// ---------------------------------------------------------------------------

/// Referential action taken when the referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteRule {
    Cascade,
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
}

impl DeleteRule {
    /// Decode `pg_constraint.confdeltype`.
    pub fn from_confdeltype(code: &str) -> Option<Self> {
        match code {
            "c" => Some(Self::Cascade),
            "a" => Some(Self::NoAction),
            "r" => Some(Self::Restrict),
            "n" => Some(Self::SetNull),
            "d" => Some(Self::SetDefault),
            _ => None,
        }
    }

    /// Decode `information_schema.referential_constraints.delete_rule`.
    pub fn from_information_schema(rule: &str) -> Option<Self> {
        match rule {
            "CASCADE" => Some(Self::Cascade),
            "NO ACTION" => Some(Self::NoAction),
            "RESTRICT" => Some(Self::Restrict),
            "SET NULL" => Some(Self::SetNull),
            "SET DEFAULT" => Some(Self::SetDefault),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for DeleteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

// ---------------------------------------------------------------------------
// Trigger type bits
// ---------------------------------------------------------------------------

const TRIGGER_TYPE_BEFORE: i16 = 1 << 1;
const TRIGGER_TYPE_INSERT: i16 = 1 << 2;
const TRIGGER_TYPE_DELETE: i16 = 1 << 3;
const TRIGGER_TYPE_UPDATE: i16 = 1 << 4;
const TRIGGER_TYPE_TRUNCATE: i16 = 1 << 5;
const TRIGGER_TYPE_INSTEAD: i16 = 1 << 6;

/// When a trigger fires relative to the row operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

impl TriggerTiming {
    pub fn from_tgtype(tgtype: i16) -> Self {
        match tgtype & (TRIGGER_TYPE_BEFORE | TRIGGER_TYPE_INSTEAD) {
            TRIGGER_TYPE_BEFORE => Self::Before,
            TRIGGER_TYPE_INSTEAD => Self::InsteadOf,
            _ => Self::After,
        }
    }
}

impl fmt::Display for TriggerTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Before => "BEFORE",
            Self::After => "AFTER",
            Self::InsteadOf => "INSTEAD OF",
        })
    }
}

/// The set of operations a trigger fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerEvents {
    pub insert: bool,
    pub update: bool,
    pub delete: bool,
    pub truncate: bool,
}

impl TriggerEvents {
    pub fn from_tgtype(tgtype: i16) -> Self {
        Self {
            insert: tgtype & TRIGGER_TYPE_INSERT != 0,
            update: tgtype & TRIGGER_TYPE_UPDATE != 0,
            delete: tgtype & TRIGGER_TYPE_DELETE != 0,
            truncate: tgtype & TRIGGER_TYPE_TRUNCATE != 0,
        }
    }
}

impl fmt::Display for TriggerEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (self.insert, "INSERT"),
            (self.update, "UPDATE"),
            (self.delete, "DELETE"),
            (self.truncate, "TRUNCATE"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();

        if names.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&names.join(" OR "))
        }
    }
}

// ---------------------------------------------------------------------------
// Trigger enabled state
// ---------------------------------------------------------------------------

/// Decoded `pg_trigger.tgenabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Enabled,
    Disabled,
    Replica,
    Always,
}

impl TriggerState {
    pub fn from_tgenabled(code: &str) -> Option<Self> {
        match code {
            "O" => Some(Self::Enabled),
            "D" => Some(Self::Disabled),
            "R" => Some(Self::Replica),
            "A" => Some(Self::Always),
            _ => None,
        }
    }

    /// Fires in normal (origin) sessions.
    pub fn fires_normally(&self) -> bool {
        matches!(self, Self::Enabled | Self::Always)
    }
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
            Self::Replica => "REPLICA ONLY",
            Self::Always => "ALWAYS",
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
