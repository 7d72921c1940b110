//! Workflow orchestration: a named registry of agents driven to completion.
//!
//! `run` resolves exactly once, with a [`RunResult`] or the first error,
//! and closes the run's event emitter on every path, so no subscription
//! stays active after resolution.

use std::future::{Future, IntoFuture};
use std::pin::Pin;

use tracing::{debug, info};
use uuid::Uuid;

use agentry_core::{Emitter, EmitterOptions, EventMeta, EventPattern, ExecutionEvent, Message};

use crate::error::{WorkflowError, WorkflowResult};
use crate::executor::{AgentConfig, AgentExecutor, AgentOutput};

/// A named collection of agent configurations plus the logic to run them.
///
/// Agents execute in declaration order; each agent's final answer is
/// appended to the working transcript as an assistant message before the
/// next agent runs.
pub struct AgentWorkflow {
    name: String,
    agents: Vec<AgentConfig>,
}

impl std::fmt::Debug for AgentWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentWorkflow")
            .field("name", &self.name)
            .field("agents", &self.agent_names())
            .finish()
    }
}

impl AgentWorkflow {
    /// Create an empty workflow.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agents: Vec::new(),
        }
    }

    /// The workflow's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the registered agents, in declaration order.
    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    /// Register an agent configuration under its name.
    ///
    /// Fails with [`WorkflowError::DuplicateAgentName`] before any run can
    /// start if the name is already taken.
    pub fn add_agent(&mut self, config: AgentConfig) -> WorkflowResult<&mut Self> {
        if self.agents.iter().any(|a| a.name() == config.name()) {
            return Err(WorkflowError::DuplicateAgentName {
                name: config.name().to_string(),
            });
        }
        debug!(workflow = %self.name, agent = %config.name(), "Registered agent");
        self.agents.push(config);
        Ok(self)
    }

    /// Build a run over the given initial messages.
    ///
    /// The run starts executing when awaited, so observers can attach
    /// first: `workflow.run(messages).observe(handler).await`.
    pub fn run(&self, initial_messages: Vec<Message>) -> WorkflowRun<'_> {
        WorkflowRun {
            workflow: self,
            inputs: initial_messages,
            emitter: Emitter::new(self.name.clone()),
        }
    }
}

/// Aggregated result of one workflow run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// One output per executed agent, in execution order.
    pub outputs: Vec<AgentOutput>,
}

impl RunResult {
    /// The last agent's parsed value.
    pub fn final_value(&self) -> Option<&serde_json::Value> {
        self.outputs.last().map(|output| &output.value)
    }

    /// The last agent's raw answer text.
    pub fn answer_text(&self) -> Option<&str> {
        self.outputs.last().map(|output| output.text.as_str())
    }
}

/// A pending workflow run; await it to execute.
pub struct WorkflowRun<'w> {
    workflow: &'w AgentWorkflow,
    inputs: Vec<Message>,
    emitter: Emitter,
}

impl<'w> WorkflowRun<'w> {
    /// Attach a `*.*` nested-matching observer to the run's emitter.
    ///
    /// Observers stream progress without altering control flow; their
    /// handlers run on their own tasks and never block execution.
    pub fn observe<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(ExecutionEvent, EventMeta) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.emitter
            .subscribe(EventPattern::any(), handler, EmitterOptions::nested());
        self
    }

    /// The run-scoped emitter, for custom subscriptions.
    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    async fn execute(self) -> WorkflowResult<RunResult> {
        let outcome = self.drive().await;
        match &outcome.0 {
            Ok(result) => info!(
                run = %result.run_id,
                agents = result.outputs.len(),
                "Workflow run completed"
            ),
            Err(err) => debug!(error = %err, "Workflow run failed"),
        }
        // Invalidate subscriptions on every path; queued events still drain.
        outcome.1.close();
        outcome.0
    }

    async fn drive(self) -> (WorkflowResult<RunResult>, Emitter) {
        let emitter = self.emitter;
        let workflow = self.workflow;

        if workflow.agents.is_empty() {
            return (
                Err(WorkflowError::NoAgents {
                    workflow: workflow.name.clone(),
                }),
                emitter,
            );
        }

        let run_id = Uuid::new_v4();
        info!(
            workflow = %workflow.name,
            run = %run_id,
            agents = workflow.agents.len(),
            "Starting workflow run"
        );

        let mut transcript = self.inputs;
        let mut outputs = Vec::with_capacity(workflow.agents.len());

        for config in &workflow.agents {
            let agent_emitter = emitter.child(config.name());
            let mut executor = AgentExecutor::new(config, agent_emitter);

            match executor.run(&mut transcript).await {
                Ok(output) => {
                    transcript.push(Message::assistant(output.text.clone()));
                    outputs.push(output);
                }
                Err(source) => {
                    return (
                        Err(WorkflowError::Execution {
                            agent: config.name().to_string(),
                            source,
                        }),
                        emitter,
                    );
                }
            }
        }

        (Ok(RunResult { run_id, outputs }), emitter)
    }
}

impl<'w> IntoFuture for WorkflowRun<'w> {
    type Output = WorkflowResult<RunResult>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'w>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.execute())
    }
}
