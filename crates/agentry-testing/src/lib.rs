//! # Agentry Testing
//!
//! Mock implementations for reliable and controlled workflow testing:
//! scripted chat models, predictable tools, and an event-capturing
//! subscriber for asserting on emitted lifecycle events.

pub mod events;
pub mod mock_model;
pub mod mock_tools;

pub use events::EventCollector;
pub use mock_model::{MockModel, ScriptedTurn};
pub use mock_tools::MockTool;
