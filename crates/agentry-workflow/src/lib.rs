//! # Agentry Workflow
//!
//! Bounded agent execution and workflow orchestration.
//!
//! A workflow holds a registry of named agent configurations and drives
//! each one through a bounded think/act loop over a shared transcript,
//! emitting lifecycle events to observers as it goes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use agentry_core::{Message, UnconstrainedMemory, ConversationMemory};
//! use agentry_workflow::{AgentConfig, AgentWorkflow};
//!
//! let mut workflow = AgentWorkflow::new("Smart assistant");
//! workflow.add_agent(
//!     AgentConfig::new("EmployeeChurn", instructions, model).with_tools(tools),
//! )?;
//!
//! let mut memory = UnconstrainedMemory::new();
//! memory.add(Message::user("Will this employee churn?"));
//!
//! let result = workflow
//!     .run(memory.messages().to_vec())
//!     .observe(|event, meta| async move {
//!         println!("{}: {:?}", meta.name, event);
//!     })
//!     .await?;
//! ```

pub mod error;
pub mod executor;
pub mod workflow;

pub use error::{ExecutorError, ValidationError, WorkflowError, WorkflowResult};
pub use executor::{
    AgentConfig, AgentExecutor, AgentOutput, DEFAULT_MAX_ITERATIONS, ExecutionConfig, Phase,
};
pub use workflow::{AgentWorkflow, RunResult, WorkflowRun};
