//! Webhook event ingestion
//!
//! Routes each event to the store: terminal events remove their entity,
//! non-terminal events upsert it, and everything else is skipped.

use crate::events::{EntityKey, EventRecord, WebhookEvent};
use crate::metrics;
use crate::store::EventStore;
use chrono::{DateTime, Utc};

/// What happened to an incoming event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Non-terminal event stored under this key
    Tracked(EntityKey),
    /// Terminal event; the key is no longer tracked
    Removed(EntityKey),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Body did not deserialize into a webhook event
    Malformed,
    /// `object_kind` is neither pipeline nor job
    UnknownKind,
}

impl IngestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tracked(_) => "tracked",
            Self::Removed(_) => "removed",
            Self::Skipped(SkipReason::Malformed) => "malformed",
            Self::Skipped(SkipReason::UnknownKind) => "skipped",
        }
    }
}

/// Apply one deserialized event to the store
pub fn ingest(store: &EventStore, event: WebhookEvent, now: DateTime<Utc>) -> IngestOutcome {
    let kind = event.kind_name();

    let record = match event {
        WebhookEvent::Pipeline(pipeline) => EventRecord::Pipeline(pipeline),
        WebhookEvent::Job(job) => EventRecord::Job(job),
        WebhookEvent::Unknown => {
            tracing::debug!("Ignoring webhook with unsupported object_kind");
            return finish(kind, IngestOutcome::Skipped(SkipReason::UnknownKind));
        }
    };

    let key = record.key();
    let outcome = if record.is_terminal() {
        let was_tracked = store.remove(&key);
        tracing::info!(key = %key, was_tracked, "Entity finished, no longer tracked");
        IngestOutcome::Removed(key)
    } else {
        store.upsert(key, record, now);
        IngestOutcome::Tracked(key)
    };

    finish(kind, outcome)
}

/// Deserialize a raw webhook body and apply it
///
/// Malformed bodies are skipped rather than reported; the sender always gets
/// an acknowledgment.
pub fn ingest_body(store: &EventStore, body: &[u8], now: DateTime<Utc>) -> IngestOutcome {
    match serde_json::from_slice::<WebhookEvent>(body) {
        Ok(event) => ingest(store, event, now),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping malformed webhook body");
            finish("unknown", IngestOutcome::Skipped(SkipReason::Malformed))
        }
    }
}

fn finish(kind: &'static str, outcome: IngestOutcome) -> IngestOutcome {
    metrics::record_event(kind, outcome.as_str());
    outcome
}
