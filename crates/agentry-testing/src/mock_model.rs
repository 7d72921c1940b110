//! # Mock Chat Model
//!
//! A scripted [`ChatModel`] implementation that plays back a predefined
//! sequence of turns, allowing deterministic testing of the executor's
//! retry, tool-call, and answer paths.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use agentry_core::{ChatModel, ChatRequest, ModelBinding, ModelError, ModelTurn};

/// One scripted model turn.
#[derive(Debug, Clone)]
pub enum ScriptedTurn {
    /// Report a transient failure (the executor retries).
    Transient(String),
    /// Report a fatal backend failure.
    Fatal(String),
    /// Produce a final answer from the given fragments.
    Answer(Vec<String>),
    /// Request a tool invocation.
    ToolRequest { name: String, arguments: Value },
}

/// A chat model that returns predefined turns in order.
///
/// Once the script is exhausted the model reports a fatal failure, unless
/// [`MockModel::always_transient`] was used, in which case every call
/// reports a transient failure.
pub struct MockModel {
    binding: ModelBinding,
    script: Mutex<VecDeque<ScriptedTurn>>,
    always_transient: bool,
    call_count: Arc<Mutex<usize>>,
}

impl MockModel {
    /// Create an empty-script mock bound to `"mock:scripted"`.
    pub fn new() -> Self {
        Self {
            binding: ModelBinding::parse("mock:scripted").expect("static binding is valid"),
            script: Mutex::new(VecDeque::new()),
            always_transient: false,
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// A model that reports a transient failure on every call.
    pub fn always_transient() -> Self {
        Self {
            always_transient: true,
            ..Self::new()
        }
    }

    /// Append a transient failure turn.
    pub fn then_transient(self, reason: impl Into<String>) -> Self {
        self.push(ScriptedTurn::Transient(reason.into()))
    }

    /// Append a fatal failure turn.
    pub fn then_fatal(self, reason: impl Into<String>) -> Self {
        self.push(ScriptedTurn::Fatal(reason.into()))
    }

    /// Append a final-answer turn built from fragments.
    pub fn then_answer<I, S>(self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ScriptedTurn::Answer(
            fragments.into_iter().map(Into::into).collect(),
        ))
    }

    /// Append a tool-request turn.
    pub fn then_tool_request(self, name: impl Into<String>, arguments: Value) -> Self {
        self.push(ScriptedTurn::ToolRequest {
            name: name.into(),
            arguments,
        })
    }

    /// Number of completed `chat` calls.
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    fn push(self, turn: ScriptedTurn) -> Self {
        self.script.lock().unwrap().push_back(turn);
        self
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for MockModel {
    fn binding(&self) -> &ModelBinding {
        &self.binding
    }

    async fn chat(&self, _request: ChatRequest<'_>) -> Result<ModelTurn, ModelError> {
        *self.call_count.lock().unwrap() += 1;

        if self.always_transient {
            return Err(ModelError::Transient {
                reason: "scripted transient failure".to_string(),
            });
        }

        let turn = self.script.lock().unwrap().pop_front();
        match turn {
            Some(ScriptedTurn::Transient(reason)) => Err(ModelError::Transient { reason }),
            Some(ScriptedTurn::Fatal(reason)) => Err(ModelError::Backend { reason }),
            Some(ScriptedTurn::Answer(fragments)) => Ok(ModelTurn::answer_fragments(fragments)),
            Some(ScriptedTurn::ToolRequest { name, arguments }) => {
                Ok(ModelTurn::ToolRequest { name, arguments })
            }
            None => Err(ModelError::Backend {
                reason: "mock script exhausted".to_string(),
            }),
        }
    }
}
