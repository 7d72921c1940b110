//! # Mock Tools
//!
//! Predictable [`Tool`] implementations with call tracking, so agent
//! tests can assert on what was invoked and with which arguments.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use agentry_core::{Tool, ToolError, ToolResult};

/// Behavior of a [`MockTool`] invocation.
#[derive(Debug, Clone)]
enum MockBehavior {
    Respond(Value),
    Fail(String),
    ChannelClosed,
}

/// A mock tool that returns a predefined response and records its calls.
#[derive(Clone)]
pub struct MockTool {
    name: String,
    schema: Value,
    behavior: MockBehavior,
    call_history: Arc<Mutex<Vec<Value>>>,
}

impl MockTool {
    /// Create a mock tool that echoes `null` until given a response.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: serde_json::json!({ "type": "object" }),
            behavior: MockBehavior::Respond(Value::Null),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Respond to every call with the given value.
    pub fn with_response(mut self, response: Value) -> Self {
        self.behavior = MockBehavior::Respond(response);
        self
    }

    /// Fail every call with `ExecutionFailed`.
    pub fn with_failure(mut self, reason: impl Into<String>) -> Self {
        self.behavior = MockBehavior::Fail(reason.into());
        self
    }

    /// Fail every call with `ChannelClosed`, simulating a torn-down host.
    pub fn with_closed_channel(mut self) -> Self {
        self.behavior = MockBehavior::ChannelClosed;
        self
    }

    /// Use a specific input schema.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }

    /// Number of times this tool has been called.
    pub fn call_count(&self) -> usize {
        self.call_history.lock().unwrap().len()
    }

    /// Arguments of every call, in order.
    pub fn call_history(&self) -> Vec<Value> {
        self.call_history.lock().unwrap().clone()
    }

    /// Whether the tool was called with these exact arguments.
    pub fn was_called_with(&self, arguments: &Value) -> bool {
        self.call_history.lock().unwrap().contains(arguments)
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn call(&self, arguments: Value) -> ToolResult<Value> {
        self.call_history.lock().unwrap().push(arguments);

        match &self.behavior {
            MockBehavior::Respond(value) => Ok(value.clone()),
            MockBehavior::Fail(reason) => Err(ToolError::ExecutionFailed {
                name: self.name.clone(),
                reason: reason.clone(),
            }),
            MockBehavior::ChannelClosed => Err(ToolError::ChannelClosed {
                name: self.name.clone(),
            }),
        }
    }
}
