//! # Agentry Core
//!
//! Core traits and types for the Agentry workflow runtime.
//! This crate provides the fundamental building blocks for running
//! tool-using agents: conversation messages and memory, the [`Tool`]
//! and [`ChatModel`] seams to external collaborators, and the
//! [`Emitter`] publish/subscribe hub for lifecycle events.

pub mod emitter;
pub mod error;
pub mod event;
pub mod memory;
pub mod message;
pub mod model;
pub mod tool;

pub use emitter::{Emitter, EmitterOptions, EventPattern, Subscription};
pub use error::{PatternError, ToolError, ToolResult};
pub use event::{EventMeta, ExecutionEvent};
pub use memory::{ConversationMemory, UnconstrainedMemory};
pub use message::{Message, Role};
pub use model::{AnswerStream, ChatModel, ChatRequest, ModelBinding, ModelError, ModelTurn};
pub use tool::Tool;
