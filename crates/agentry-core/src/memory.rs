//! Append-only conversation memory.
//!
//! Memory holds the ordered message sequence a workflow run is seeded with.
//! Insertion order is significant and nothing is ever deleted; callers that
//! retain a memory instance across runs get accumulation for free.

use crate::message::Message;

/// Ordered, append-only storage for conversation messages.
pub trait ConversationMemory {
    /// Append a single message.
    fn add(&mut self, message: Message);

    /// Append a batch of messages, preserving their order.
    fn extend(&mut self, messages: impl IntoIterator<Item = Message>)
    where
        Self: Sized,
    {
        for message in messages {
            self.add(message);
        }
    }

    /// All stored messages in insertion order.
    fn messages(&self) -> &[Message];

    /// Number of stored messages.
    fn len(&self) -> usize {
        self.messages().len()
    }

    /// Whether the memory holds no messages.
    fn is_empty(&self) -> bool {
        self.messages().is_empty()
    }
}

/// Unbounded in-process memory backed by a `Vec`.
///
/// Suitable wherever persistence across process restarts is not required,
/// which is the only configuration this runtime supports.
///
/// # Example
///
/// ```rust
/// use agentry_core::{ConversationMemory, Message, UnconstrainedMemory};
///
/// let mut memory = UnconstrainedMemory::new();
/// memory.add(Message::user("Will this employee churn?"));
/// assert_eq!(memory.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct UnconstrainedMemory {
    messages: Vec<Message>,
}

impl UnconstrainedMemory {
    /// Create a new empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the memory, yielding its messages.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl ConversationMemory for UnconstrainedMemory {
    fn add(&mut self, message: Message) {
        self.messages.push(message);
    }

    fn messages(&self) -> &[Message] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn test_append_preserves_order() {
        let mut memory = UnconstrainedMemory::new();
        memory.add(Message::user("first"));
        memory.add(Message::assistant("second"));
        memory.add(Message::tool("third"));

        let contents: Vec<&str> = memory
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_extend_batch() {
        let mut memory = UnconstrainedMemory::new();
        memory.extend([Message::user("a"), Message::user("b")]);
        assert_eq!(memory.len(), 2);
        assert!(!memory.is_empty());
    }

    #[test]
    fn test_into_messages() {
        let mut memory = UnconstrainedMemory::new();
        memory.add(Message::user("hello"));
        let messages = memory.into_messages();
        assert_eq!(messages[0].role, Role::User);
    }
}
