//! The tool seam: named, remotely-invokable capabilities.
//!
//! Tools are discovered once at startup from an external host and shared
//! read-only across every agent in the process. The trait is async because
//! every real invocation is a round-trip over the discovery channel.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolResult;

/// A named capability an agent may invoke during its think/act loop.
///
/// Implementations carry their own invocation handle (for remote tools,
/// a clone of the channel peer), so a `ToolResult` failure is the only
/// way a broken channel surfaces to the executor.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name as advertised by the host.
    fn name(&self) -> &str;

    /// Human-readable description, if the host provided one.
    fn description(&self) -> Option<&str> {
        None
    }

    /// JSON schema describing the expected arguments object.
    fn input_schema(&self) -> &Value;

    /// Invoke the tool with a JSON arguments object.
    async fn call(&self, arguments: Value) -> ToolResult<Value>;
}

/// Find a tool by name in a shared tool list.
pub fn find_tool<'a>(
    tools: &'a [std::sync::Arc<dyn Tool>],
    name: &str,
) -> Option<&'a std::sync::Arc<dyn Tool>> {
    tools.iter().find(|tool| tool.name() == name)
}
