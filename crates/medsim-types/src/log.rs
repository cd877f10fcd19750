//! Structured log entries produced by agents.
//!
//! Every notable agent decision produces one [`LogEntry`]: a human-readable
//! message plus [`LogMeta`] metadata. Entries are buffered for the query
//! surface and pushed unmodified to live observers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::AgentKind;

/// One human-readable log line with structured metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LogEntry {
    /// Simulation time at which the entry was produced.
    pub timestamp: DateTime<Utc>,
    /// Human-readable message.
    pub message: String,
    /// Structured metadata for filtering.
    pub meta: LogMeta,
}

/// Structured metadata attached to a [`LogEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct LogMeta {
    /// Role of the producer.
    pub agent: AgentKind,
    /// Upper-case decision type, e.g. `OVERLOAD_RISK`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Seed id of the entity the producer acts for, if any.
    pub entity_id: Option<String>,
    /// Free-form structured fields.
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    /// Create an entry with no entity id and no extra fields.
    pub fn new(
        timestamp: DateTime<Utc>,
        agent: AgentKind,
        event_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            message: message.into(),
            meta: LogMeta {
                agent,
                event_type: event_type.into(),
                entity_id: None,
                fields: BTreeMap::new(),
            },
        }
    }

    /// Attach the producing entity's id.
    #[must_use]
    pub fn entity(mut self, id: impl Into<String>) -> Self {
        self.meta.entity_id = Some(id.into());
        self
    }

    /// Attach one structured field.
    #[must_use]
    pub fn field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.meta.fields.insert(key.to_owned(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_metadata() {
        let entry = LogEntry::new(Utc::now(), AgentKind::Hospital, "OVERLOAD_RISK", "busy")
            .entity("H1")
            .field("zone", "Zone-1")
            .field("predicted", 91);
        assert_eq!(entry.meta.entity_id.as_deref(), Some("H1"));
        assert_eq!(entry.meta.fields.len(), 2);
    }

    #[test]
    fn meta_serializes_in_dashboard_shape() {
        let entry = LogEntry::new(Utc::now(), AgentKind::Pharmacy, "MED_SHORTAGE", "low")
            .entity("P1");
        let json = serde_json::to_value(&entry).unwrap_or_default();
        assert_eq!(json["meta"]["agent"], "Pharmacy");
        assert_eq!(json["meta"]["type"], "MED_SHORTAGE");
        assert_eq!(json["meta"]["entityId"], "P1");
    }
}
