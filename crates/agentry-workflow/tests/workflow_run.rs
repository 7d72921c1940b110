//! End-to-end workflow tests with scripted models and mock tools.

use std::num::NonZeroUsize;
use std::sync::Arc;

use agentry_core::{EmitterOptions, EventPattern, Message, Tool, ToolError};
use agentry_testing::{EventCollector, MockModel, MockTool};
use agentry_workflow::{
    AgentConfig, AgentWorkflow, ExecutionConfig, ExecutorError, WorkflowError,
};

fn limit(n: usize) -> ExecutionConfig {
    ExecutionConfig::new(NonZeroUsize::new(n).expect("non-zero test limit"))
}

#[test]
fn test_duplicate_agent_name_rejected_before_any_run() {
    let mut workflow = AgentWorkflow::new("Smart assistant");
    workflow
        .add_agent(AgentConfig::new(
            "EmployeeChurn",
            "You predict churn.",
            Arc::new(MockModel::new()),
        ))
        .expect("first registration succeeds");

    let err = workflow
        .add_agent(AgentConfig::new(
            "EmployeeChurn",
            "Different instructions.",
            Arc::new(MockModel::new()),
        ))
        .unwrap_err();

    assert!(matches!(err, WorkflowError::DuplicateAgentName { name } if name == "EmployeeChurn"));
    assert_eq!(workflow.agent_names(), vec!["EmployeeChurn"]);
}

#[tokio::test]
async fn test_run_with_no_agents_is_structural_error() {
    let workflow = AgentWorkflow::new("empty");
    let err = workflow.run(vec![]).await.unwrap_err();
    assert!(matches!(err, WorkflowError::NoAgents { .. }));
}

#[tokio::test]
async fn test_always_transient_model_hits_iteration_limit_with_exact_retries() {
    let mut workflow = AgentWorkflow::new("Smart assistant");
    workflow
        .add_agent(
            AgentConfig::new(
                "EmployeeChurn",
                "You predict churn.",
                Arc::new(MockModel::always_transient()),
            )
            .with_execution(limit(3)),
        )
        .unwrap();

    let collector = EventCollector::new();
    let err = workflow
        .run(vec![Message::user("Will this employee churn?")])
        .observe(collector.handler())
        .await
        .unwrap_err();

    match err {
        WorkflowError::Execution { agent, source } => {
            assert_eq!(agent, "EmployeeChurn");
            assert!(matches!(
                source,
                ExecutorError::IterationLimitExceeded { limit: 3 }
            ));
        }
        other => panic!("unexpected error: {other}"),
    }

    collector.wait_for(3).await;
    collector.settle().await;
    assert_eq!(collector.count_of("retry"), 3);
    assert_eq!(collector.len(), 3);
}

#[tokio::test]
async fn test_tokens_observed_in_emission_order() {
    let mut workflow = AgentWorkflow::new("Smart assistant");
    workflow
        .add_agent(AgentConfig::new(
            "EmployeeChurn",
            "You predict churn.",
            Arc::new(MockModel::new().then_answer(["Will", " this", " employee", " churn"])),
        ))
        .unwrap();

    let collector = EventCollector::new();
    let result = workflow
        .run(vec![Message::user("hi")])
        .observe(collector.handler())
        .await
        .unwrap();

    assert_eq!(result.answer_text(), Some("Will this employee churn"));

    collector.wait_for(5).await;
    assert_eq!(
        collector.tokens(),
        vec!["Will", " this", " employee", " churn"]
    );
}

#[tokio::test]
async fn test_end_to_end_answer_on_second_thinking_cycle() {
    let model = Arc::new(
        MockModel::new()
            .then_transient("model warming up")
            .then_answer(["The employee ", "will not churn."]),
    );

    let mut workflow = AgentWorkflow::new("Smart assistant");
    workflow
        .add_agent(
            AgentConfig::new("EmployeeChurn", "You predict churn.", model.clone())
                .with_execution(limit(3)),
        )
        .unwrap();

    let prompt = r#"Will this employee churn {"YearsAtCompany": 10, "EmployeeSatisfaction": 0.9}?"#;
    let collector = EventCollector::new();
    let result = workflow
        .run(vec![Message::user(prompt)])
        .observe(collector.handler())
        .await
        .unwrap();

    assert_eq!(model.call_count(), 2);
    assert_eq!(result.answer_text(), Some("The employee will not churn."));
    assert_eq!(result.outputs.len(), 1);

    // retry + 2 tokens + update
    collector.wait_for(4).await;
    collector.settle().await;
    assert_eq!(collector.count_of("error"), 0);
    assert_eq!(collector.count_of("update"), 1);

    let events = collector.events();
    let (update_meta, update_event) = events
        .iter()
        .find(|(meta, _)| meta.name == "update")
        .expect("update event emitted");
    assert_eq!(update_meta.scope, "EmployeeChurn");
    if let agentry_core::ExecutionEvent::Update { key, value } = update_event {
        assert_eq!(key, "EmployeeChurn");
        assert_eq!(value, &serde_json::json!("The employee will not churn."));
    } else {
        panic!("expected update payload");
    }

    // update is the last event of the run
    assert_eq!(events.last().unwrap().0.name, "update");
}

#[tokio::test]
async fn test_tool_round_trip_appends_tool_message() {
    let tool = MockTool::new("predict_churn")
        .with_response(serde_json::json!({ "churn": false, "confidence": 0.92 }));
    let args = serde_json::json!({ "satisfaction": 0.9 });

    let model = Arc::new(
        MockModel::new()
            .then_tool_request("predict_churn", args.clone())
            .then_answer([r#"{"churn": false}"#]),
    );

    let mut workflow = AgentWorkflow::new("Smart assistant");
    workflow
        .add_agent(
            AgentConfig::new("EmployeeChurn", "You predict churn.", model)
                .with_tools(vec![Arc::new(tool.clone()) as Arc<dyn Tool>])
                .with_execution(limit(3)),
        )
        .unwrap();

    let result = workflow
        .run(vec![Message::user("Will this employee churn?")])
        .await
        .unwrap();

    assert_eq!(tool.call_count(), 1);
    assert!(tool.was_called_with(&args));
    assert_eq!(result.final_value(), Some(&serde_json::json!({"churn": false})));
}

#[tokio::test]
async fn test_nested_subscriber_sees_tool_call_substeps() {
    let tool = MockTool::new("predict_churn").with_response(serde_json::json!("ok"));
    let model = Arc::new(
        MockModel::new()
            .then_tool_request("predict_churn", serde_json::json!({}))
            .then_answer(["done"]),
    );

    let mut workflow = AgentWorkflow::new("Smart assistant");
    workflow
        .add_agent(
            AgentConfig::new("EmployeeChurn", "You predict churn.", model)
                .with_tools(vec![Arc::new(tool) as Arc<dyn Tool>]),
        )
        .unwrap();

    let nested = EventCollector::new();
    let exact_miss = EventCollector::new();

    let run = workflow.run(vec![Message::user("hi")]);
    run.emitter().subscribe(
        EventPattern::parse("some_other_scope.update").expect("valid pattern"),
        exact_miss.handler(),
        EmitterOptions::nested(),
    );
    let run = run.observe(nested.handler());
    run.await.unwrap();

    // toolStart + toolSuccess from the nested scope, token + update from the agent
    nested.wait_for(4).await;
    assert_eq!(nested.count_of("toolStart"), 1);
    assert_eq!(nested.count_of("toolSuccess"), 1);
    let tool_event = nested
        .events()
        .into_iter()
        .find(|(meta, _)| meta.name == "toolStart")
        .unwrap();
    assert_eq!(tool_event.0.scope, "predict_churn");

    exact_miss.settle().await;
    assert!(exact_miss.is_empty());
}

#[tokio::test]
async fn test_tool_failure_is_terminal_and_emits_error() {
    let tool = MockTool::new("predict_churn").with_failure("model file missing");
    let model = Arc::new(
        MockModel::new().then_tool_request("predict_churn", serde_json::json!({})),
    );

    let mut workflow = AgentWorkflow::new("Smart assistant");
    workflow
        .add_agent(
            AgentConfig::new("EmployeeChurn", "You predict churn.", model)
                .with_tools(vec![Arc::new(tool) as Arc<dyn Tool>]),
        )
        .unwrap();

    let collector = EventCollector::new();
    let err = workflow
        .run(vec![Message::user("hi")])
        .observe(collector.handler())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Execution {
            source: ExecutorError::Tool(ToolError::ExecutionFailed { .. }),
            ..
        }
    ));

    collector.wait_for(1).await;
    assert_eq!(collector.count_of("error"), 1);
}

#[tokio::test]
async fn test_closed_channel_tool_fails_run_without_crashing() {
    let tool = MockTool::new("predict_churn").with_closed_channel();
    let model = Arc::new(
        MockModel::new().then_tool_request("predict_churn", serde_json::json!({})),
    );

    let mut workflow = AgentWorkflow::new("Smart assistant");
    workflow
        .add_agent(
            AgentConfig::new("EmployeeChurn", "You predict churn.", model)
                .with_tools(vec![Arc::new(tool) as Arc<dyn Tool>]),
        )
        .unwrap();

    // The caller boundary: the error is a value, the process keeps going.
    let err = workflow
        .run(vec![Message::user("hi")])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Execution {
            source: ExecutorError::Tool(ToolError::ChannelClosed { .. }),
            ..
        }
    ));

    // A subsequent run on the same workflow still works after a fix.
    let mut retry_workflow = AgentWorkflow::new("Smart assistant");
    retry_workflow
        .add_agent(AgentConfig::new(
            "EmployeeChurn",
            "You predict churn.",
            Arc::new(MockModel::new().then_answer(["recovered"])),
        ))
        .unwrap();
    let result = retry_workflow
        .run(vec![Message::user("hi")])
        .await
        .unwrap();
    assert_eq!(result.answer_text(), Some("recovered"));
}

#[tokio::test]
async fn test_unknown_tool_request_is_terminal() {
    let model = Arc::new(
        MockModel::new().then_tool_request("no_such_tool", serde_json::json!({})),
    );

    let mut workflow = AgentWorkflow::new("Smart assistant");
    workflow
        .add_agent(AgentConfig::new("EmployeeChurn", "You predict churn.", model))
        .unwrap();

    let err = workflow.run(vec![Message::user("hi")]).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Execution {
            source: ExecutorError::Tool(ToolError::NotFound { .. }),
            ..
        }
    ));
}

#[tokio::test]
async fn test_malformed_structured_output_is_validation_error() {
    let model = Arc::new(MockModel::new().then_answer(["{\"churn\": tru"]));

    let mut workflow = AgentWorkflow::new("Smart assistant");
    workflow
        .add_agent(AgentConfig::new("EmployeeChurn", "You predict churn.", model))
        .unwrap();

    let err = workflow.run(vec![Message::user("hi")]).await.unwrap_err();
    assert!(err.as_validation().is_some());
}

#[tokio::test]
async fn test_emitter_has_no_subscriptions_after_resolution() {
    let mut workflow = AgentWorkflow::new("Smart assistant");
    workflow
        .add_agent(AgentConfig::new(
            "EmployeeChurn",
            "You predict churn.",
            Arc::new(MockModel::new().then_answer(["done"])),
        ))
        .unwrap();

    let collector = EventCollector::new();
    let run = workflow
        .run(vec![Message::user("hi")])
        .observe(collector.handler());
    let emitter = run.emitter().clone();
    assert_eq!(emitter.subscription_count(), 1);

    run.await.unwrap();
    assert_eq!(emitter.subscription_count(), 0);

    // Events queued before close still drained to the observer.
    collector.wait_for(2).await;
    assert_eq!(collector.count_of("update"), 1);
}

#[tokio::test]
async fn test_agents_chain_in_declaration_order() {
    let first = Arc::new(MockModel::new().then_answer(["score: 0.9"]));
    let second = Arc::new(MockModel::new().then_answer(["keep the employee"]));

    let mut workflow = AgentWorkflow::new("pipeline");
    workflow
        .add_agent(AgentConfig::new("Scorer", "Score churn risk.", first))
        .unwrap();
    workflow
        .add_agent(AgentConfig::new("Advisor", "Advise on retention.", second))
        .unwrap();

    let result = workflow
        .run(vec![Message::user("evaluate this employee")])
        .await
        .unwrap();

    assert_eq!(result.outputs.len(), 2);
    assert_eq!(result.outputs[0].agent, "Scorer");
    assert_eq!(result.outputs[1].agent, "Advisor");
    assert_eq!(result.answer_text(), Some("keep the employee"));
}
