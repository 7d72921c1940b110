//! Lifecycle events emitted during agent execution.
//!
//! Event payloads are a sealed tagged union rather than string-keyed
//! dynamic shapes, so subscribers can match exhaustively and producers
//! cannot silently change a payload out from under them. Each variant has
//! a stable wire name used for pattern matching and logging.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// One lifecycle notification from an agent run.
///
/// Events are ephemeral: delivered to every currently-registered
/// subscriber, never persisted, never replayed to late subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExecutionEvent {
    /// Something went wrong; the run is about to transition to `Errored`.
    Error {
        /// Human-readable failure description.
        message: String,
    },
    /// A transient model failure is being retried.
    Retry,
    /// The agent produced its final parsed value.
    Update {
        /// The agent's name.
        key: String,
        /// The fully parsed final value.
        value: Value,
    },
    /// An incremental fragment of the final answer.
    NewToken {
        /// The text fragment.
        fragment: String,
    },
    /// An auxiliary notification outside the core lifecycle.
    Other {
        /// Application-defined event name.
        name: String,
        /// Arbitrary structured payload.
        payload: Value,
    },
}

impl ExecutionEvent {
    /// Stable wire name of this event's tag.
    pub fn name(&self) -> &str {
        match self {
            ExecutionEvent::Error { .. } => "error",
            ExecutionEvent::Retry => "retry",
            ExecutionEvent::Update { .. } => "update",
            ExecutionEvent::NewToken { .. } => "newToken",
            ExecutionEvent::Other { name, .. } => name,
        }
    }

    /// Text fragment accessor for streaming display of `NewToken` events.
    pub fn token_text(&self) -> Option<&str> {
        match self {
            ExecutionEvent::NewToken { fragment } => Some(fragment),
            _ => None,
        }
    }
}

/// Delivery metadata attached to every emitted event.
#[derive(Debug, Clone)]
pub struct EventMeta {
    /// Scope of the emitter the event was emitted on.
    pub scope: String,
    /// Wire name of the event tag.
    pub name: String,
    /// When the event was emitted.
    pub created_at: DateTime<Utc>,
}
