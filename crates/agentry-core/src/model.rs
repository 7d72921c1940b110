//! The model seam: an opaque asynchronous completion backend.
//!
//! The language model is an external collaborator. This module pins down
//! the interface the executor depends on: given instructions, a transcript
//! and a tool list, one call yields either a streamed final answer, a tool
//! invocation request, or a failure that is transient (worth retrying) or
//! fatal.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use thiserror::Error;

use crate::message::Message;
use crate::tool::Tool;

/// Opaque `"backend:model-name"` identifier resolved by the model backend.
///
/// This runtime only validates the shape, stores it, and displays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBinding {
    backend: String,
    model: String,
}

impl ModelBinding {
    /// Parse a `"backend:model-name"` identifier.
    ///
    /// Both segments must be non-empty. The model segment may itself
    /// contain `:` (e.g. `"ollama:granite3.1-dense:8b"`).
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let (backend, model) = input
            .split_once(':')
            .ok_or_else(|| ModelError::InvalidBinding {
                input: input.to_string(),
                reason: "expected 'backend:model-name'".to_string(),
            })?;
        if backend.is_empty() || model.is_empty() {
            return Err(ModelError::InvalidBinding {
                input: input.to_string(),
                reason: "backend and model segments must be non-empty".to_string(),
            });
        }
        Ok(Self {
            backend: backend.to_string(),
            model: model.to_string(),
        })
    }

    /// The hosting backend segment.
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// The model name segment.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Display for ModelBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.backend, self.model)
    }
}

/// Errors a model backend can report.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// Recoverable failure; the executor retries within its iteration bound.
    #[error("Transient model failure: {reason}")]
    Transient { reason: String },

    /// Unrecoverable backend failure; terminal for the run.
    #[error("Model backend failure: {reason}")]
    Backend { reason: String },

    /// A model binding identifier failed validation.
    #[error("Invalid model binding '{input}': {reason}")]
    InvalidBinding { input: String, reason: String },
}

impl ModelError {
    /// Whether the executor should retry this failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, ModelError::Transient { .. })
    }
}

/// Everything a model needs for one completion turn.
pub struct ChatRequest<'a> {
    /// Static agent instructions (system prompt).
    pub instructions: &'a str,
    /// The working transcript, oldest first.
    pub messages: &'a [Message],
    /// Tools the model may request.
    pub tools: &'a [Arc<dyn Tool>],
}

/// Incremental text fragments of a final answer.
pub type AnswerStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Outcome of one completion turn.
pub enum ModelTurn {
    /// The model produced a final answer as a stream of text fragments.
    Answer(AnswerStream),
    /// The model wants a tool invoked before it can answer.
    ToolRequest {
        /// Name of the requested tool.
        name: String,
        /// JSON arguments object for the call.
        arguments: Value,
    },
}

impl std::fmt::Debug for ModelTurn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelTurn::Answer(_) => f.debug_tuple("Answer").finish_non_exhaustive(),
            ModelTurn::ToolRequest { name, arguments } => f
                .debug_struct("ToolRequest")
                .field("name", name)
                .field("arguments", arguments)
                .finish(),
        }
    }
}

impl ModelTurn {
    /// Build an answer turn from pre-split fragments.
    pub fn answer_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: Send + 'static,
        S: Into<String> + 'static,
    {
        ModelTurn::Answer(Box::pin(futures::stream::iter(
            fragments.into_iter().map(Into::into),
        )))
    }
}

/// An opaque asynchronous completion backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The binding identifier this backend was resolved from.
    fn binding(&self) -> &ModelBinding;

    /// Run one completion turn over the request.
    async fn chat(&self, request: ChatRequest<'_>) -> Result<ModelTurn, ModelError>;
}
