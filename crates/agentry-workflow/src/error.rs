//! Error types for agent execution and workflow orchestration.
//!
//! Transient model failures are handled locally inside the executor's
//! thinking loop; every other failure propagates unmasked:
//! `ExecutorError → WorkflowError → caller`, where the caller logs it and
//! keeps the process alive.

use thiserror::Error;

use agentry_core::{ModelError, ToolError};

/// Malformed agent output that fails structured validation.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// The agent's final answer looked structured but did not parse.
    #[error("Agent '{agent}' produced malformed structured output: {reason}")]
    MalformedOutput { agent: String, reason: String },
}

/// Terminal failures of a single agent execution.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The think/act loop exhausted its bound without a final answer.
    #[error("Iteration limit of {limit} exceeded without a final answer")]
    IterationLimitExceeded { limit: usize },

    /// A tool invocation failed; tool failures are terminal, not retried.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The model reported a non-transient failure.
    #[error(transparent)]
    Model(ModelError),

    /// The agent's output failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failures surfaced by the workflow orchestrator.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A second agent was registered under an existing name.
    #[error("Agent '{name}' is already registered in this workflow")]
    DuplicateAgentName { name: String },

    /// The workflow was run with no agents registered.
    #[error("Workflow '{workflow}' has no agents registered")]
    NoAgents { workflow: String },

    /// An agent execution ended in a terminal error.
    #[error("Agent '{agent}' failed: {source}")]
    Execution {
        agent: String,
        #[source]
        source: ExecutorError,
    },
}

impl WorkflowError {
    /// The validation failure behind this error, if that is what it is.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            WorkflowError::Execution {
                source: ExecutorError::Validation(validation),
                ..
            } => Some(validation),
            _ => None,
        }
    }
}

/// Result type alias for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_agent_display() {
        let err = WorkflowError::DuplicateAgentName {
            name: "EmployeeChurn".to_string(),
        };
        assert!(err.to_string().contains("EmployeeChurn"));
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_execution_error_chains_source() {
        let err = WorkflowError::Execution {
            agent: "EmployeeChurn".to_string(),
            source: ExecutorError::IterationLimitExceeded { limit: 3 },
        };
        assert!(err.to_string().contains("EmployeeChurn"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_as_validation() {
        let err = WorkflowError::Execution {
            agent: "a".to_string(),
            source: ExecutorError::Validation(ValidationError::MalformedOutput {
                agent: "a".to_string(),
                reason: "expected value".to_string(),
            }),
        };
        assert!(err.as_validation().is_some());

        let err = WorkflowError::NoAgents {
            workflow: "w".to_string(),
        };
        assert!(err.as_validation().is_none());
    }
}
