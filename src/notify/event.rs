//! Change-notification payloads from the row store's change capture.
//!
//! Modeled as a discriminated union over insert/update/delete with
//! explicit before/after snapshots, instead of sniffing field presence.
//! Parsing is lenient by contract: a payload that does not match the
//! union is "no action taken", never an error.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

/// A row change reported by the change-capture source.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ChangeEvent {
    #[serde(rename = "INSERT")]
    Insert {
        #[serde(default)]
        table: Option<String>,
        record: Value,
    },
    #[serde(rename = "UPDATE")]
    Update {
        #[serde(default)]
        table: Option<String>,
        record: Value,
        #[serde(default)]
        old_record: Option<Value>,
    },
    #[serde(rename = "DELETE")]
    Delete {
        #[serde(default)]
        table: Option<String>,
        old_record: Value,
    },
}

impl ChangeEvent {
    /// Lenient parse. `None` means "not a change event we understand".
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            ChangeEvent::Insert { table, .. }
            | ChangeEvent::Update { table, .. }
            | ChangeEvent::Delete { table, .. } => table.as_deref(),
        }
    }

    /// The after-snapshot when this event is a transition *into*
    /// "completed": new status is "completed" and the old status (absent
    /// counts as "was not completed") is anything else. All other events
    /// return `None`.
    pub fn completion(&self) -> Option<&Value> {
        match self {
            ChangeEvent::Insert { record, .. } => {
                (status_of(record) == Some("completed")).then_some(record)
            }
            ChangeEvent::Update {
                record, old_record, ..
            } => {
                let became_completed = status_of(record) == Some("completed");
                let was_completed = old_record
                    .as_ref()
                    .map(|old| status_of(old) == Some("completed"))
                    .unwrap_or(false);
                (became_completed && !was_completed).then_some(record)
            }
            ChangeEvent::Delete { .. } => None,
        }
    }
}

fn status_of(record: &Value) -> Option<&str> {
    record.get("status").and_then(Value::as_str)
}

/// Typed view of a visits-table record, for the row-aware notifier.
/// Extracted from the event's after-snapshot; records that don't fit
/// this shape are skipped, not rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct VisitRecord {
    pub id: Uuid,
    pub elder_id: Uuid,
    pub provider_id: Uuid,
    pub status: String,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl VisitRecord {
    pub fn from_record(record: &Value) -> Option<Self> {
        serde_json::from_value(record.clone()).ok()
    }
}
