//! Error types for MCP tool discovery.

use thiserror::Error;

/// Result type for discovery operations.
pub type McpResult<T> = Result<T, DiscoveryError>;

/// Errors that can occur while establishing or using the tool host channel.
///
/// All variants are fatal to process startup; retries, if any, belong to
/// the caller.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The tool host process could not be spawned.
    #[error("Failed to spawn tool host '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The MCP initialize handshake failed.
    #[error("MCP handshake failed: {reason}")]
    Handshake { reason: String },

    /// The tool catalog request failed.
    #[error("Tool discovery failed: {reason}")]
    Discovery { reason: String },

    /// The channel did not shut down cleanly.
    #[error("Tool host shutdown failed: {reason}")]
    Shutdown { reason: String },
}
