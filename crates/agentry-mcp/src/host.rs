//! Connection to an external MCP tool host and discovered tool adapters.
//!
//! The host owns the channel: it is established once at process start and
//! only [`ToolHost::close`] may tear it down. Discovered tools hold a clone
//! of the channel peer plus a shared closed flag, so an invocation after
//! teardown fails with [`ToolError::ChannelClosed`] deterministically
//! instead of depending on transport timing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rmcp::{
    ServiceExt,
    model::{CallToolRequestParam, ClientInfo, Content, Implementation, RawContent},
    service::{RoleClient, RunningService, ServerSink},
    transport::{IntoTransport, TokioChildProcess},
};
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

use agentry_core::{Tool, ToolError, ToolResult};

use crate::error::{DiscoveryError, McpResult};

/// Launch specification for a tool host process.
///
/// Environment entries may set a variable or explicitly unset one
/// inherited from the parent process.
#[derive(Debug, Clone)]
pub struct ServerSpec {
    command: String,
    args: Vec<String>,
    env: Vec<(String, Option<String>)>,
}

impl ServerSpec {
    /// Create a spec for the given executable.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child process.
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), Some(value.into())));
        self
    }

    /// Unset an inherited environment variable for the child process.
    pub fn env_remove(mut self, name: impl Into<String>) -> Self {
        self.env.push((name.into(), None));
        self
    }

    /// The executable this spec launches.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The configured arguments.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.command);
        command.args(&self.args);
        for (name, value) in &self.env {
            match value {
                Some(value) => {
                    command.env(name, value);
                }
                None => {
                    command.env_remove(name);
                }
            }
        }
        command
    }
}

/// Client side of the channel to an external MCP tool host.
pub struct ToolHost {
    service: RunningService<RoleClient, ClientInfo>,
    closed: Arc<AtomicBool>,
}

impl std::fmt::Debug for ToolHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolHost")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl ToolHost {
    /// Spawn the tool host process and perform the initialize handshake.
    pub async fn connect(spec: &ServerSpec) -> McpResult<Self> {
        debug!(command = %spec.command(), "Spawning tool host");
        let transport =
            TokioChildProcess::new(spec.to_command()).map_err(|source| DiscoveryError::Spawn {
                command: spec.command().to_string(),
                source,
            })?;
        Self::connect_transport(transport).await
    }

    /// Perform the handshake over an already-built transport.
    ///
    /// Used by tests to connect over in-process duplex pipes instead of a
    /// child process.
    pub async fn connect_transport<T, E, A>(transport: T) -> McpResult<Self>
    where
        T: IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| DiscoveryError::Handshake {
                reason: e.to_string(),
            })?;
        Ok(Self {
            service,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Fetch the tool catalog and adapt each entry to [`Tool`].
    ///
    /// The returned list is stable for the lifetime of the channel and is
    /// meant to be shared read-only across every agent in the process.
    pub async fn discover(&self) -> McpResult<Vec<Arc<dyn Tool>>> {
        let listed = self
            .service
            .peer()
            .list_all_tools()
            .await
            .map_err(|e| DiscoveryError::Discovery {
                reason: e.to_string(),
            })?;

        info!(tools = listed.len(), "Discovered tools from host");

        Ok(listed
            .into_iter()
            .map(|tool| {
                Arc::new(McpTool::from_remote(
                    tool,
                    self.service.peer().clone(),
                    Arc::clone(&self.closed),
                )) as Arc<dyn Tool>
            })
            .collect())
    }

    /// Close the channel. Every outstanding tool descriptor fails with
    /// `ChannelClosed` from this point on.
    pub async fn close(self) -> McpResult<()> {
        self.closed.store(true, Ordering::Release);
        self.service
            .cancel()
            .await
            .map_err(|e| DiscoveryError::Shutdown {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

fn client_info() -> ClientInfo {
    ClientInfo {
        protocol_version: Default::default(),
        capabilities: Default::default(),
        client_info: Implementation {
            name: "agentry".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A tool advertised by the host, adapted to the [`Tool`] trait.
///
/// Calls forward over the discovery channel; the descriptor itself is
/// immutable after discovery.
pub struct McpTool {
    name: String,
    description: Option<String>,
    input_schema: Value,
    peer: ServerSink,
    closed: Arc<AtomicBool>,
}

impl McpTool {
    fn from_remote(tool: rmcp::model::Tool, peer: ServerSink, closed: Arc<AtomicBool>) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.as_ref().map(|d| d.to_string()),
            input_schema: Value::Object(tool.input_schema.as_ref().clone()),
            peer,
            closed,
        }
    }
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    async fn call(&self, arguments: Value) -> ToolResult<Value> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ToolError::ChannelClosed {
                name: self.name.clone(),
            });
        }

        let arguments = match arguments {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                return Err(ToolError::InvalidArguments {
                    name: self.name.clone(),
                    reason: format!("expected a JSON object, got {other}"),
                });
            }
        };

        debug!(tool = %self.name, "Forwarding tool call to host");

        let result = self
            .peer
            .call_tool(CallToolRequestParam {
                name: self.name.clone().into(),
                arguments,
                meta: None,
                task: None,
            })
            .await
            .map_err(|e| {
                if self.closed.load(Ordering::Acquire) {
                    ToolError::ChannelClosed {
                        name: self.name.clone(),
                    }
                } else {
                    ToolError::ExecutionFailed {
                        name: self.name.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let contents = result.content;

        if result.is_error.unwrap_or(false) {
            return Err(ToolError::ExecutionFailed {
                name: self.name.clone(),
                reason: extract_text(&contents),
            });
        }

        // Structured output takes precedence over the content blocks.
        if let Some(structured) = result.structured_content {
            return Ok(structured);
        }

        Ok(contents_to_json(&contents))
    }
}

fn extract_text(contents: &[Content]) -> String {
    contents
        .iter()
        .filter_map(|content| match &content.raw {
            RawContent::Text(text) => Some(text.text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert host content to JSON: a single text content parses as JSON when
/// possible and falls back to a string; multiple contents become an array.
fn contents_to_json(contents: &[Content]) -> Value {
    if contents.is_empty() {
        return Value::Null;
    }
    if contents.len() == 1 {
        return content_to_json(&contents[0]);
    }
    Value::Array(contents.iter().map(content_to_json).collect())
}

fn content_to_json(content: &Content) -> Value {
    match &content.raw {
        RawContent::Text(text) => {
            serde_json::from_str(&text.text).unwrap_or_else(|_| Value::String(text.text.clone()))
        }
        RawContent::Image(image) => serde_json::json!({
            "type": "image",
            "data": image.data,
            "mime_type": image.mime_type,
        }),
        other => serde_json::json!({
            "type": "content",
            "content": format!("{other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_spec_builder() {
        let spec = ServerSpec::new("uv")
            .args(["--directory", "/srv/tools", "run", "server.py"])
            .env("PYTHONUNBUFFERED", "1")
            .env_remove("VIRTUAL_ENV");

        assert_eq!(spec.command(), "uv");
        assert_eq!(
            spec.arguments(),
            ["--directory", "/srv/tools", "run", "server.py"]
        );
        assert_eq!(spec.env.len(), 2);
    }

    #[test]
    fn test_single_text_content_parses_json() {
        let contents = vec![Content::text(r#"{"churn": true, "confidence": 0.92}"#)];
        let value = contents_to_json(&contents);
        assert_eq!(value["churn"], true);
        assert_eq!(value["confidence"], 0.92);
    }

    #[test]
    fn test_plain_text_content_stays_string() {
        let contents = vec![Content::text("not json")];
        assert_eq!(contents_to_json(&contents), Value::String("not json".to_string()));
    }

    #[test]
    fn test_multiple_contents_become_array() {
        let contents = vec![Content::text("first"), Content::text("second")];
        let value = contents_to_json(&contents);
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_contents_are_null() {
        assert_eq!(contents_to_json(&[]), Value::Null);
    }

    #[test]
    fn test_extract_text_joins_lines() {
        let contents = vec![Content::text("line 1"), Content::text("line 2")];
        assert_eq!(extract_text(&contents), "line 1\nline 2");
    }
}
