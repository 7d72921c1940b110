//! Single-agent churn assistant.
//!
//! Builds a workflow with one churn-prediction agent, streams its
//! lifecycle events to stdout, and prints the final answer. With
//! `CHURN_MCP_COMMAND` set (for example to an MCP server wrapping a
//! trained model), the agent's tool list is discovered from that server
//! over stdio; otherwise the agent runs tool-less against a scripted
//! model so the example works offline.

use std::sync::Arc;

use agentry_core::{ExecutionEvent, Message, Tool};
use agentry_mcp::{ServerSpec, ToolHost};
use agentry_testing::MockModel;
use agentry_workflow::{AgentConfig, AgentWorkflow};

const INSTRUCTIONS: &str = "You are an expert on employee churn. \
    Given employee attributes such as years at the company and \
    satisfaction, predict whether the employee will churn and explain \
    the prediction in one short paragraph.";

const EMPLOYEE_SAMPLE: &str = r#"Will this employee churn? {"YearsAtCompany": 1, "EmployeeSatisfaction": 0.01, "Position": "Non-Manager", "Salary": 4.0}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let (tools, host) = discover_tools().await?;

    let model = Arc::new(
        MockModel::new()
            .then_transient("model warming up")
            .then_answer([
                "The employee is very likely to churn: ",
                "one year of tenure, a satisfaction score near zero, ",
                "and a below-market salary are all strong attrition signals.",
            ]),
    );

    let mut workflow = AgentWorkflow::new("Smart assistant");
    workflow.add_agent(
        AgentConfig::new("EmployeeChurn", INSTRUCTIONS, model).with_tools(tools),
    )?;

    let outcome = workflow
        .run(vec![Message::user(EMPLOYEE_SAMPLE)])
        .observe(|event, meta| {
            report(&event, &meta.scope);
            futures::future::ready(())
        })
        .await;

    match outcome {
        Ok(result) => {
            println!();
            println!("final answer: {}", result.answer_text().unwrap_or(""));
        }
        // Run failures are values; log them and keep the process alive
        // for teardown.
        Err(err) => match std::error::Error::source(&err) {
            Some(source) => tracing::error!(error = %err, %source, "Workflow run failed"),
            None => tracing::error!(error = %err, "Workflow run failed"),
        },
    }

    if let Some(host) = host {
        host.close().await?;
    }

    Ok(())
}

fn report(event: &ExecutionEvent, scope: &str) {
    match event {
        ExecutionEvent::NewToken { fragment } => print!("{fragment}"),
        ExecutionEvent::Retry => println!("[{scope}] retrying after transient failure"),
        ExecutionEvent::Update { key, value } => {
            println!();
            println!("[{scope}] update {key} = {value}");
        }
        ExecutionEvent::Error { message } => println!("[{scope}] error: {message}"),
        ExecutionEvent::Other { name, payload } => println!("[{scope}] {name}: {payload}"),
    }
}

async fn discover_tools()
-> Result<(Vec<Arc<dyn Tool>>, Option<ToolHost>), Box<dyn std::error::Error>> {
    let Ok(command) = std::env::var("CHURN_MCP_COMMAND") else {
        return Ok((Vec::new(), None));
    };

    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return Ok((Vec::new(), None));
    };

    let spec = ServerSpec::new(program).args(parts.map(str::to_string));
    let host = ToolHost::connect(&spec).await?;
    let tools = host.discover().await?;
    println!(
        "discovered {} tool(s): {:?}",
        tools.len(),
        tools.iter().map(|t| t.name().to_string()).collect::<Vec<_>>()
    );
    Ok((tools, Some(host)))
}
