//! Logging sinks.
//!
//! Every agent decision becomes a [`LogEntry`] handed to a [`LogSink`].
//! The engine fans each entry out to `tracing`, the in-memory ring served
//! by `GET /api/logs`, and the broadcast channel behind `/ws/logs`.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use medsim_types::LogEntry;
use tokio::sync::broadcast;

/// Default number of entries the in-memory ring keeps.
pub const DEFAULT_BUFFER_CAPACITY: usize = 200;

/// Destination for log entries. Implementations must not block.
pub trait LogSink: Send + Sync {
    /// Record one entry.
    fn log(&self, entry: LogEntry);
}

/// Hand `entry` to `sink`, swallowing a panicking sink.
pub fn log_guarded(sink: &dyn LogSink, entry: LogEntry) {
    if catch_unwind(AssertUnwindSafe(|| sink.log(entry))).is_err() {
        tracing::warn!("log sink panicked; entry dropped");
    }
}

/// Emits each entry as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, entry: LogEntry) {
        let fields = serde_json::to_string(&entry.meta.fields).unwrap_or_default();
        tracing::info!(
            agent = %entry.meta.agent,
            event_type = %entry.meta.event_type,
            entity = entry.meta.entity_id.as_deref().unwrap_or("-"),
            fields = %fields,
            "{}",
            entry.message
        );
    }
}

/// Bounded ring of recent entries, read newest first.
#[derive(Debug)]
pub struct LogBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl LogBuffer {
    /// Create a ring holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Up to `limit` entries, newest first.
    pub fn tail(&self, limit: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().take(limit).cloned().collect()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any entry has the given `meta.type`.
    pub fn contains_type(&self, event_type: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|entry| entry.meta.event_type == event_type)
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl LogSink for LogBuffer {
    fn log(&self, entry: LogEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }
}

/// Pushes entries onto a broadcast channel for live subscribers.
///
/// Sending with no receivers is not an error.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<LogEntry>,
}

impl BroadcastSink {
    /// Wrap an existing sender.
    pub const fn new(tx: broadcast::Sender<LogEntry>) -> Self {
        Self { tx }
    }
}

impl LogSink for BroadcastSink {
    fn log(&self, entry: LogEntry) {
        let _ = self.tx.send(entry);
    }
}

/// Forwards each entry to every inner sink, in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl FanoutSink {
    /// Create an empty fan-out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl core::fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl LogSink for FanoutSink {
    fn log(&self, entry: LogEntry) {
        for sink in &self.sinks {
            sink.log(entry.clone());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use medsim_types::AgentKind;

    use super::*;

    fn entry(event_type: &str) -> LogEntry {
        LogEntry::new(Utc::now(), AgentKind::System, event_type, event_type)
    }

    #[test]
    fn buffer_keeps_newest_first_and_drops_oldest() {
        let buffer = LogBuffer::new(3);
        for kind in ["A", "B", "C", "D"] {
            buffer.log(entry(kind));
        }
        let tail: Vec<String> = buffer
            .tail(10)
            .into_iter()
            .map(|e| e.meta.event_type)
            .collect();
        assert_eq!(tail, vec!["D", "C", "B"]);
        assert_eq!(buffer.tail(1).len(), 1);
        assert!(!buffer.contains_type("A"));
    }

    #[test]
    fn broadcast_sink_tolerates_no_receivers() {
        let (tx, _) = broadcast::channel(4);
        let sink = BroadcastSink::new(tx.clone());
        sink.log(entry("LONELY"));

        let mut rx = tx.subscribe();
        sink.log(entry("HEARD"));
        assert_eq!(rx.try_recv().unwrap().meta.event_type, "HEARD");
    }

    #[test]
    fn fanout_reaches_every_sink() {
        let first = Arc::new(LogBuffer::new(4));
        let second = Arc::new(LogBuffer::new(4));
        let fanout = FanoutSink::new()
            .with(Arc::clone(&first) as Arc<dyn LogSink>)
            .with(Arc::clone(&second) as Arc<dyn LogSink>)
            .with(Arc::new(TracingSink));
        fanout.log(entry("BOTH"));
        assert!(first.contains_type("BOTH"));
        assert!(second.contains_type("BOTH"));
    }
}
