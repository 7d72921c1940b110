//! # Agentry MCP
//!
//! Tool discovery over the Model Context Protocol for the Agentry runtime.
//!
//! An external tool host is a long-lived MCP server reached over
//! child-process stdio. [`ToolHost::connect`] spawns the process and runs
//! the initialize handshake; [`ToolHost::discover`] fetches the tool
//! catalog and adapts every entry into an [`agentry_core::Tool`] whose
//! invocation handle stays bound to the same channel.
//!
//! ## Example
//!
//! ```rust,ignore
//! use agentry_mcp::{ServerSpec, ToolHost};
//!
//! let spec = ServerSpec::new("uv")
//!     .args(["--directory", "/path/to/server", "run", "server.py"]);
//! let host = ToolHost::connect(&spec).await?;
//! let tools = host.discover().await?;
//! ```

pub mod error;
pub mod host;

pub use error::{DiscoveryError, McpResult};
pub use host::{McpTool, ServerSpec, ToolHost};
