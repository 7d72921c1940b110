//! Error types for core operations.
//!
//! Domain-specific failures are structured so callers can react to the
//! kind of failure, not parse strings. Higher layers (`agentry-mcp`,
//! `agentry-workflow`) define their own taxonomies and convert these
//! upward with `#[from]`.

use thiserror::Error;

/// Errors that can occur when invoking a tool.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// No tool with this name is bound to the agent.
    #[error("Tool '{name}' not found")]
    NotFound { name: String },

    /// The tool's discovery channel was closed before the call.
    #[error("Tool '{name}' invoked after channel close")]
    ChannelClosed { name: String },

    /// The host accepted the call but reported a failure.
    #[error("Tool '{name}' execution failed: {reason}")]
    ExecutionFailed { name: String, reason: String },

    /// The arguments did not match what the tool expects.
    #[error("Tool '{name}' received invalid arguments: {reason}")]
    InvalidArguments { name: String, reason: String },
}

impl ToolError {
    /// Name of the tool the error refers to.
    pub fn tool_name(&self) -> &str {
        match self {
            ToolError::NotFound { name }
            | ToolError::ChannelClosed { name }
            | ToolError::ExecutionFailed { name, .. }
            | ToolError::InvalidArguments { name, .. } => name,
        }
    }
}

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors raised when parsing an event subscription pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern did not contain exactly two `.`-separated segments.
    #[error("Pattern '{input}' must have exactly two '.'-separated segments")]
    SegmentCount { input: String },

    /// One of the segments was empty.
    #[error("Pattern '{input}' contains an empty segment")]
    EmptySegment { input: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::ChannelClosed {
            name: "predict_churn".to_string(),
        };
        assert_eq!(err.tool_name(), "predict_churn");
        assert!(err.to_string().contains("after channel close"));

        let err = ToolError::ExecutionFailed {
            name: "predict_churn".to_string(),
            reason: "bad feature vector".to_string(),
        };
        assert!(err.to_string().contains("bad feature vector"));
    }

    #[test]
    fn test_pattern_error_display() {
        let err = PatternError::SegmentCount {
            input: "a.b.c".to_string(),
        };
        assert!(err.to_string().contains("a.b.c"));
    }
}
