//! Conversation messages exchanged between the caller, the model, and tools.

use serde::{Deserialize, Serialize};

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user/caller
    User,
    /// Message produced by the model
    Assistant,
    /// Result of a tool invocation
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A single immutable entry in a conversation transcript.
///
/// Messages are created once and never mutated; agent executors read them
/// from memory and append new ones, they never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored this message.
    pub role: Role,
    /// Plain text content.
    pub content: String,
}

impl Message {
    /// Create a message with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user-authored message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a model-authored message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a tool-result message.
    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(Role::Tool, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::Tool.to_string(), "tool");
    }

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("Will this employee churn?");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Will this employee churn?");

        assert_eq!(Message::assistant("yes").role, Role::Assistant);
        assert_eq!(Message::tool("{}").role, Role::Tool);
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&Message::tool("done")).unwrap();
        assert!(json.contains("\"tool\""));
    }
}
