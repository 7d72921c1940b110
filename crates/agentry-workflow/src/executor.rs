//! The bounded think/act loop driving a single agent to a final answer.
//!
//! State machine per run:
//! `Idle → Thinking → (ToolCall → Observing → Thinking)* → Responding → Done`,
//! with `Errored` reachable from any non-terminal state. Every `Thinking`
//! cycle counts toward the configured iteration limit, retries caused by
//! transient model failures included; tool round-trips do not count on
//! their own. Tool failures are terminal rather than retried: the original
//! system evidenced no retry path for them, and an unbounded tool-retry
//! loop would defeat the iteration bound.

use std::num::NonZeroUsize;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, warn};

use agentry_core::{
    ChatModel, ChatRequest, Emitter, ExecutionEvent, Message, ModelTurn, Tool, ToolError,
    tool::find_tool,
};

use crate::error::{ExecutorError, ValidationError};

/// Default bound on think/act iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Execution limits for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Maximum number of `Thinking` cycles, retries included.
    pub max_iterations: NonZeroUsize,
}

impl ExecutionConfig {
    /// Create a config with an explicit iteration bound.
    pub fn new(max_iterations: NonZeroUsize) -> Self {
        Self { max_iterations }
    }

    /// Create a config from a plain count; `None` if zero.
    pub fn with_max_iterations(max_iterations: usize) -> Option<Self> {
        NonZeroUsize::new(max_iterations).map(Self::new)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_iterations: NonZeroUsize::new(DEFAULT_MAX_ITERATIONS)
                .expect("default iteration bound is non-zero"),
        }
    }
}

/// Immutable configuration of one agent within a workflow.
pub struct AgentConfig {
    name: String,
    instructions: String,
    tools: Vec<Arc<dyn Tool>>,
    model: Arc<dyn ChatModel>,
    execution: ExecutionConfig,
}

impl AgentConfig {
    /// Create a config with no tools and default execution limits.
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            tools: Vec::new(),
            model,
            execution: ExecutionConfig::default(),
        }
    }

    /// Bind a tool list (typically the discovered shared list).
    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools = tools;
        self
    }

    /// Override execution limits.
    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    /// The agent's unique name within its workflow.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The agent's static instructions.
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// The bound tool list.
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// The execution limits.
    pub fn execution(&self) -> ExecutionConfig {
        self.execution
    }
}

/// Lifecycle phase of an executor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Thinking,
    ToolCall,
    Observing,
    Responding,
    Done,
    Errored,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Thinking => "thinking",
            Phase::ToolCall => "tool_call",
            Phase::Observing => "observing",
            Phase::Responding => "responding",
            Phase::Done => "done",
            Phase::Errored => "errored",
        };
        write!(f, "{name}")
    }
}

/// Final answer of one agent execution.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutput {
    /// Name of the agent that produced the answer.
    pub agent: String,
    /// The fully parsed final value.
    pub value: Value,
    /// The raw answer text the value was parsed from.
    pub text: String,
}

/// Drives one agent over a working transcript to `Done` or `Errored`.
pub struct AgentExecutor<'a> {
    config: &'a AgentConfig,
    emitter: Emitter,
    phase: Phase,
}

impl<'a> AgentExecutor<'a> {
    /// Create an executor emitting on the given (agent-scoped) emitter.
    pub fn new(config: &'a AgentConfig, emitter: Emitter) -> Self {
        Self {
            config,
            emitter,
            phase: Phase::Idle,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run the think/act loop to completion.
    ///
    /// Successful tool calls append their result to `transcript`; the
    /// final answer is not appended (the orchestrator decides how to
    /// thread it onward).
    pub async fn run(&mut self, transcript: &mut Vec<Message>) -> Result<AgentOutput, ExecutorError> {
        let limit = self.config.execution.max_iterations.get();
        let mut iterations = 0;

        loop {
            if iterations == limit {
                self.phase = Phase::Errored;
                warn!(
                    agent = %self.config.name,
                    limit,
                    "Iteration limit exhausted without a final answer"
                );
                return Err(ExecutorError::IterationLimitExceeded { limit });
            }
            iterations += 1;
            self.phase = Phase::Thinking;

            debug!(
                agent = %self.config.name,
                iteration = iterations,
                messages = transcript.len(),
                "Thinking"
            );

            let request = ChatRequest {
                instructions: &self.config.instructions,
                messages: transcript,
                tools: &self.config.tools,
            };

            match self.config.model.chat(request).await {
                Err(err) if err.is_transient() => {
                    debug!(agent = %self.config.name, error = %err, "Transient model failure, retrying");
                    self.emitter.emit(ExecutionEvent::Retry);
                }
                Err(err) => {
                    self.phase = Phase::Errored;
                    self.emitter.emit(ExecutionEvent::Error {
                        message: err.to_string(),
                    });
                    return Err(ExecutorError::Model(err));
                }
                Ok(ModelTurn::ToolRequest { name, arguments }) => {
                    self.tool_call(transcript, &name, arguments).await?;
                }
                Ok(ModelTurn::Answer(stream)) => {
                    return self.respond(stream).await;
                }
            }
        }
    }

    /// `ToolCall → Observing`: invoke the requested tool on a nested
    /// emitter scope and append its result to the transcript.
    async fn tool_call(
        &mut self,
        transcript: &mut Vec<Message>,
        name: &str,
        arguments: Value,
    ) -> Result<(), ExecutorError> {
        self.phase = Phase::ToolCall;

        let Some(tool) = find_tool(&self.config.tools, name) else {
            let err = ToolError::NotFound {
                name: name.to_string(),
            };
            self.phase = Phase::Errored;
            self.emitter.emit(ExecutionEvent::Error {
                message: err.to_string(),
            });
            return Err(err.into());
        };

        let step = self.emitter.child(name);
        step.emit(ExecutionEvent::Other {
            name: "toolStart".to_string(),
            payload: serde_json::json!({ "tool": name, "arguments": arguments }),
        });

        match tool.call(arguments).await {
            Ok(result) => {
                step.emit(ExecutionEvent::Other {
                    name: "toolSuccess".to_string(),
                    payload: result.clone(),
                });
                self.phase = Phase::Observing;
                transcript.push(Message::tool(result.to_string()));
                Ok(())
            }
            Err(err) => {
                self.phase = Phase::Errored;
                self.emitter.emit(ExecutionEvent::Error {
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// `Responding → Done`: stream the answer as `newToken` events, parse
    /// the full text, and emit the final `update`.
    async fn respond(
        &mut self,
        mut stream: agentry_core::AnswerStream,
    ) -> Result<AgentOutput, ExecutorError> {
        self.phase = Phase::Responding;

        let mut text = String::new();
        while let Some(fragment) = stream.next().await {
            self.emitter.emit(ExecutionEvent::NewToken {
                fragment: fragment.clone(),
            });
            text.push_str(&fragment);
        }

        let value = match parse_output(&self.config.name, &text) {
            Ok(value) => value,
            Err(err) => {
                self.phase = Phase::Errored;
                self.emitter.emit(ExecutionEvent::Error {
                    message: err.to_string(),
                });
                return Err(err.into());
            }
        };

        self.emitter.emit(ExecutionEvent::Update {
            key: self.config.name.clone(),
            value: value.clone(),
        });
        self.phase = Phase::Done;

        Ok(AgentOutput {
            agent: self.config.name.clone(),
            value,
            text,
        })
    }
}

/// Parse an agent's final answer text into a structured value.
///
/// Text that looks like JSON must parse as JSON; anything else is taken
/// verbatim as a string value.
fn parse_output(agent: &str, text: &str) -> Result<Value, ValidationError> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(|e| ValidationError::MalformedOutput {
            agent: agent.to_string(),
            reason: e.to_string(),
        })
    } else {
        Ok(Value::String(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_plain_text() {
        let value = parse_output("agent", "the employee will not churn").unwrap();
        assert_eq!(value, Value::String("the employee will not churn".to_string()));
    }

    #[test]
    fn test_parse_output_json_object() {
        let value = parse_output("agent", r#" {"churn": true} "#).unwrap();
        assert_eq!(value["churn"], true);
    }

    #[test]
    fn test_parse_output_malformed_json_fails_validation() {
        let err = parse_output("agent", "{not json").unwrap_err();
        assert!(matches!(err, ValidationError::MalformedOutput { .. }));
    }

    #[test]
    fn test_execution_config_bounds() {
        assert!(ExecutionConfig::with_max_iterations(0).is_none());
        let config = ExecutionConfig::with_max_iterations(3).unwrap();
        assert_eq!(config.max_iterations.get(), 3);
        assert_eq!(
            ExecutionConfig::default().max_iterations.get(),
            DEFAULT_MAX_ITERATIONS
        );
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Thinking.to_string(), "thinking");
        assert_eq!(Phase::Errored.to_string(), "errored");
    }
}
