//! Integration tests for the automation executor.
//!
//! These tests drive complete executions through the in-memory adapters:
//! condition gating, template resolution, output binding and chaining,
//! soft failures, timeouts, and the usage-limit halt path.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flowrunner::adapters::{
    InMemoryNotificationHandler, InMemoryToolRegistry, NotificationRecord,
};
use flowrunner::application::{AutomationExecutor, ExecutionRequest};
use flowrunner::domain::automation::{
    Action, ComparisonOp, ConditionClause, ExecutionStatus, USAGE_LIMIT_ERROR,
};
use flowrunner::domain::foundation::{AutomationId, RequestId, UserId, UserInfo};
use flowrunner::ports::{ToolError, ToolOutput};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn user_info() -> UserInfo {
    UserInfo::new(UserId::new("user-1").unwrap(), "alice@example.com").with_name("Alice")
}

fn registry() -> Arc<InMemoryToolRegistry> {
    Arc::new(InMemoryToolRegistry::new())
}

fn executor(registry: &Arc<InMemoryToolRegistry>) -> AutomationExecutor {
    AutomationExecutor::new(registry.clone())
}

/// Registers a tool that returns a fixed document.
fn register_const(registry: &InMemoryToolRegistry, name: &str, output: Value) {
    registry.register_fn(name, move |_input| {
        let output = output.clone();
        Box::pin(async move { Ok(ToolOutput::Document(output)) })
    });
}

/// Registers a tool that echoes its received parameters back as a
/// document, so tests can assert on what the tool was given.
fn register_echo(registry: &InMemoryToolRegistry, name: &str) {
    registry.register_fn(name, |input| {
        Box::pin(async move {
            let params: Value =
                serde_json::from_str(&input).map_err(|e| ToolError::execution(e.to_string()))?;
            Ok(ToolOutput::Document(json!({ "received": params })))
        })
    });
}

// =============================================================================
// Scenario: single action success
// =============================================================================

#[tokio::test]
async fn single_action_success_binds_output() {
    let registry = registry();
    register_const(&registry, "get_score", json!({"score": 85}));

    let actions = vec![Action::new("get_score").with_id("fetch").with_output_as("s")];
    let result = executor(&registry)
        .execute(ExecutionRequest::new(actions, user_info()))
        .await;

    assert!(result.success);
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.actions_executed, 1);
    assert_eq!(result.actions_failed, 0);
    assert_eq!(result.action_results.len(), 1);
    assert_eq!(result.action_results[0].output.as_ref().unwrap()["score"], 85);
    assert!(result.error_summary.is_none());
}

// =============================================================================
// Scenario: condition gate
// =============================================================================

#[tokio::test]
async fn high_score_skips_the_gated_action() {
    let registry = registry();
    register_const(&registry, "send", json!({"sent": true}));

    let actions = vec![Action::new("send").with_id("notify").with_condition(
        ConditionClause::new("score", ComparisonOp::LessThan, json!(70)),
    )];

    let result = executor(&registry)
        .execute(
            ExecutionRequest::new(actions, user_info()).with_trigger_data(json!({"score": 85})),
        )
        .await;

    assert!(result.success);
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.actions_executed, 0);
    assert_eq!(result.action_results.len(), 1);

    let skipped = &result.action_results[0];
    assert!(skipped.skipped);
    assert!(skipped.success);
    assert_eq!(skipped.condition_result, Some(false));
    assert!(skipped.output.is_none());
}

#[tokio::test]
async fn low_score_runs_the_gated_action() {
    let registry = registry();
    register_const(&registry, "send", json!({"sent": true}));

    let actions = vec![Action::new("send").with_id("notify").with_condition(
        ConditionClause::new("score", ComparisonOp::LessThan, json!(70)),
    )];

    let result = executor(&registry)
        .execute(
            ExecutionRequest::new(actions, user_info()).with_trigger_data(json!({"score": 50})),
        )
        .await;

    assert_eq!(result.actions_executed, 1);
    let executed = &result.action_results[0];
    assert!(executed.success);
    assert!(!executed.skipped);
    assert_eq!(executed.condition_result, Some(true));
}

// =============================================================================
// Scenario: template substitution
// =============================================================================

#[tokio::test]
async fn parameters_are_resolved_before_invocation() {
    let registry = registry();
    register_echo(&registry, "echo");

    let actions = vec![Action::new("echo").with_parameters(
        json!({"message": "Hello {{user.name}}, your score is {{score}}"}),
    )];

    let result = executor(&registry)
        .execute(
            ExecutionRequest::new(actions, user_info())
                .with_trigger_data(json!({"score": 85}))
                .with_request_id(RequestId::new("req-7").unwrap()),
        )
        .await;

    assert!(result.success);
    let received = &result.action_results[0].output.as_ref().unwrap()["received"];
    assert_eq!(received["message"], "Hello Alice, your score is 85");

    // Reserved fields ride along with every invocation.
    assert_eq!(received["user_id"], "user-1");
    assert_eq!(received["request_id"], "req-7");
    assert_eq!(received["is_automation"], true);
}

#[tokio::test]
async fn missing_variables_degrade_to_the_sentinel() {
    let registry = registry();
    register_echo(&registry, "echo");

    let actions =
        vec![Action::new("echo").with_parameters(json!({"message": "Value: {{nope}}"}))];

    let result = executor(&registry)
        .execute(ExecutionRequest::new(actions, user_info()))
        .await;

    assert!(result.success);
    let received = &result.action_results[0].output.as_ref().unwrap()["received"];
    assert_eq!(received["message"], "Value: [No available data]");
}

// =============================================================================
// Scenario: chained outputs
// =============================================================================

#[tokio::test]
async fn later_actions_see_earlier_bindings() {
    let registry = registry();
    register_const(&registry, "get_data", json!({"value": 100}));
    registry.register_fn("double", |input| {
        Box::pin(async move {
            let params: Value =
                serde_json::from_str(&input).map_err(|e| ToolError::execution(e.to_string()))?;
            let value: i64 = params["value"]
                .as_str()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| ToolError::execution("value must be numeric"))?;
            Ok(ToolOutput::Document(json!({"result": value * 2})))
        })
    });

    let actions = vec![
        Action::new("get_data").with_id("fetch").with_output_as("data"),
        Action::new("double")
            .with_id("transform")
            .with_parameters(json!({"value": "{{data.value}}"}))
            .with_output_as("doubled"),
    ];

    let result = executor(&registry)
        .execute(ExecutionRequest::new(actions, user_info()))
        .await;

    assert!(result.success);
    assert_eq!(result.actions_executed, 2);
    assert_eq!(result.actions_failed, 0);
    assert_eq!(result.action_results[1].output.as_ref().unwrap()["result"], 200);
}

#[tokio::test]
async fn text_outputs_are_extracted_and_normalized_for_binding() {
    let registry = registry();
    registry.register_fn("summarize", |_input| {
        Box::pin(async {
            Ok(ToolOutput::Text(
                "Here is the summary:\n```json\n{\"data\": {\"score\": 92}}\n```".to_string(),
            ))
        })
    });
    register_echo(&registry, "echo");

    let actions = vec![
        Action::new("summarize").with_output_as("summary"),
        Action::new("echo").with_parameters(json!({"message": "Score: {{summary.score}}"})),
    ];

    let result = executor(&registry)
        .execute(ExecutionRequest::new(actions, user_info()))
        .await;

    assert!(result.success);
    let received = &result.action_results[1].output.as_ref().unwrap()["received"];
    assert_eq!(received["message"], "Score: 92");
}

// =============================================================================
// Scenario: soft failures
// =============================================================================

#[tokio::test]
async fn failure_continues_to_the_next_action() {
    let registry = registry();
    registry.register_fn("broken", |_input| {
        Box::pin(async { Err(ToolError::execution("upstream exploded")) })
    });
    register_const(&registry, "works", json!({"ok": true}));

    let actions = vec![
        Action::new("broken").with_id("fail_action"),
        Action::new("works").with_id("ok_action"),
    ];

    let result = executor(&registry)
        .execute(ExecutionRequest::new(actions, user_info()))
        .await;

    assert!(result.success);
    assert_eq!(result.status, ExecutionStatus::PartialFailure);
    assert_eq!(result.actions_executed, 2);
    assert_eq!(result.actions_failed, 1);
    assert!(result.error_summary.as_ref().unwrap().contains("fail_action"));
    assert!(!result.action_results[0].success);
    assert!(result.action_results[1].success);
}

#[tokio::test]
async fn all_failures_classify_as_failed() {
    let registry = registry();
    registry.register_fn("broken", |_input| {
        Box::pin(async { Err(ToolError::execution("boom")) })
    });

    let actions = vec![Action::new("broken")];
    let result = executor(&registry)
        .execute(ExecutionRequest::new(actions, user_info()))
        .await;

    assert!(!result.success);
    assert_eq!(result.status, ExecutionStatus::Failed);
    assert!(result.error_summary.is_some());
}

#[tokio::test]
async fn failed_actions_do_not_publish_bindings() {
    let registry = registry();
    registry.register_fn("broken", |_input| {
        Box::pin(async { Err(ToolError::execution("boom")) })
    });
    register_echo(&registry, "echo");

    let actions = vec![
        Action::new("broken").with_output_as("data"),
        Action::new("echo").with_parameters(json!({"message": "{{data}}"})),
    ];

    let result = executor(&registry)
        .execute(ExecutionRequest::new(actions, user_info()))
        .await;

    // The failed action's name never enters the context, so the template
    // resolves to the missing-value sentinel.
    let received = &result.action_results[1].output.as_ref().unwrap()["received"];
    assert_eq!(received["message"], "[No available data]");
}

#[tokio::test]
async fn error_prefixed_strings_count_as_failures() {
    let registry = registry();
    registry.register_fn("stringy", |_input| {
        Box::pin(async { Ok(ToolOutput::Text("Error: no access token".to_string())) })
    });

    let actions = vec![Action::new("stringy")];
    let result = executor(&registry)
        .execute(ExecutionRequest::new(actions, user_info()))
        .await;

    assert_eq!(result.status, ExecutionStatus::Failed);
    assert_eq!(
        result.action_results[0].error.as_deref(),
        Some("Error: no access token")
    );
}

#[tokio::test]
async fn unknown_tools_fail_the_action() {
    let registry = registry();
    let actions = vec![Action::new("not_registered")];

    let result = executor(&registry)
        .execute(ExecutionRequest::new(actions, user_info()))
        .await;

    assert_eq!(result.status, ExecutionStatus::Failed);
    assert!(result.action_results[0]
        .error
        .as_ref()
        .unwrap()
        .contains("Tool not found"));
}

#[tokio::test]
async fn slow_tools_are_cut_off_by_the_timeout() {
    let registry = registry();
    registry.register_fn("slow", |_input| {
        Box::pin(async {
            tokio::time::sleep(Duration::from_millis(250)).await;
            Ok(ToolOutput::Document(json!({"late": true})))
        })
    });

    let actions = vec![Action::new("slow")];
    let result = AutomationExecutor::new(registry.clone())
        .with_timeout(Duration::from_millis(50))
        .execute(ExecutionRequest::new(actions, user_info()))
        .await;

    assert_eq!(result.status, ExecutionStatus::Failed);
    assert!(result.action_results[0]
        .error
        .as_ref()
        .unwrap()
        .contains("timed out"));
}

// =============================================================================
// Scenario: usage-limit halt
// =============================================================================

#[tokio::test]
async fn usage_limit_halts_and_notifies() {
    let registry = registry();
    register_const(
        &registry,
        "llm_call",
        json!({
            "error": USAGE_LIMIT_ERROR,
            "service": "juniper",
            "message": "Monthly request limit reached"
        }),
    );

    let invocations = Arc::new(AtomicUsize::new(0));
    let counter = invocations.clone();
    registry.register_fn("after", move |_input| {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::Document(json!({"ok": true})))
        })
    });

    let notifications = Arc::new(InMemoryNotificationHandler::new());
    let automation_id = AutomationId::new();

    let actions = vec![
        Action::new("llm_call").with_id("summarize"),
        Action::new("after").with_id("followup"),
    ];
    let result = AutomationExecutor::new(registry.clone())
        .with_notifications(notifications.clone())
        .execute(
            ExecutionRequest::new(actions, user_info())
                .with_automation(automation_id, "Morning digest"),
        )
        .await;

    assert!(!result.success);
    assert_eq!(result.status, ExecutionStatus::UsageLimitExceeded);
    assert_eq!(result.actions_executed, 1);
    assert_eq!(result.actions_failed, 1);
    assert_eq!(
        result.error_summary.as_deref(),
        Some("Usage limit exceeded for juniper")
    );

    // The halting action is reported failed with the structured message.
    assert!(result.action_results[0]
        .error
        .as_ref()
        .unwrap()
        .starts_with("Usage limit exceeded:"));

    // The second action never ran but still has a result row.
    assert_eq!(result.action_results.len(), 2);
    assert!(result.action_results[1].skipped);
    assert_eq!(invocations.load(Ordering::SeqCst), 0);

    // Exactly one usage-limit notification went out.
    let sent = notifications.notifications();
    assert_eq!(sent.len(), 1);
    assert!(matches!(
        &sent[0],
        NotificationRecord::UsageLimitExceeded { automation_name, .. }
            if automation_name == "Morning digest"
    ));
}

#[tokio::test]
async fn usage_limit_without_notifier_still_halts() {
    let registry = registry();
    register_const(
        &registry,
        "llm_call",
        json!({"error": USAGE_LIMIT_ERROR, "service": "juniper", "message": "limit"}),
    );

    let actions = vec![Action::new("llm_call")];
    let result = executor(&registry)
        .execute(ExecutionRequest::new(actions, user_info()))
        .await;

    assert_eq!(result.status, ExecutionStatus::UsageLimitExceeded);
}

// =============================================================================
// Invariants
// =============================================================================

#[tokio::test]
async fn every_action_gets_a_result_row() {
    let registry = registry();
    register_const(&registry, "ok", json!({"ok": true}));
    registry.register_fn("broken", |_input| {
        Box::pin(async { Err(ToolError::execution("boom")) })
    });

    let actions = vec![
        Action::new("ok"),
        Action::new("broken"),
        Action::new("ok").with_condition(ConditionClause::new(
            "nope",
            ComparisonOp::Equal,
            json!(1),
        )),
        Action::new("ok"),
    ];
    let count = actions.len();

    let result = executor(&registry)
        .execute(ExecutionRequest::new(actions, user_info()))
        .await;

    assert_eq!(result.action_results.len(), count);
    assert_eq!(result.actions_executed, 3);
    assert_eq!(result.actions_failed, 1);
    assert_eq!(result.status, ExecutionStatus::PartialFailure);
}

#[tokio::test]
async fn all_skipped_run_completes() {
    let registry = registry();
    register_const(&registry, "ok", json!({"ok": true}));

    let gated = |path: &str| {
        Action::new("ok").with_condition(ConditionClause::new(
            path,
            ComparisonOp::Exists,
            json!(null),
        ))
    };
    let actions = vec![gated("missing_a"), gated("missing_b")];

    let result = executor(&registry)
        .execute(ExecutionRequest::new(actions, user_info()))
        .await;

    assert!(result.success);
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.actions_executed, 0);
    assert_eq!(result.action_results.len(), 2);
}

#[tokio::test]
async fn variables_seed_the_context() {
    let registry = registry();
    register_echo(&registry, "echo");

    let mut variables = serde_json::Map::new();
    variables.insert("greeting".to_string(), json!("Good morning"));

    let actions =
        vec![Action::new("echo").with_parameters(json!({"message": "{{greeting}} {{user.name}}"}))];

    let result = executor(&registry)
        .execute(ExecutionRequest::new(actions, user_info()).with_variables(variables))
        .await;

    let received = &result.action_results[0].output.as_ref().unwrap()["received"];
    assert_eq!(received["message"], "Good morning Alice");
}
