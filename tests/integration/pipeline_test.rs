//! Query Pipeline Integration Tests
//!
//! Runs whole queries through the pipeline with a mock LLM.

use std::sync::Arc;
use std::time::Duration;

use ads_copilot::models::settings::PlannerSettings;
use ads_copilot::models::UserContext;
use ads_copilot::services::planner::{ActionPlanner, PlanningFailure};
use ads_copilot::services::understanding::ContextExtractor;
use ads_copilot::PipelineOutcome;
use ads_copilot_core::{
    DateRange, ExtractedContext, FilterOperator, Query, ResultKind, SupportedAction, TimePeriod,
};
use ads_copilot_llm::{LlmError, RetryPolicy};
use chrono::NaiveDate;
use serde_json::json;

use super::support::{
    build_pipeline, test_settings, MockLlm, CONTEXT, GENERATIVE, PARAMETERS, PLANNER, SCENARIO,
    SCENARIO_PLAN,
};

fn query(text: &str) -> Query {
    Query::new(text, "user-1", "session-1")
}

// ============================================================================
// Executor handoff
// ============================================================================

#[tokio::test]
async fn test_active_campaigns_with_budget_scenario() {
    let llm = Arc::new(
        MockLlm::new()
            .reply(
                CONTEXT,
                r#"{"business_category": null, "target_audience": null, "business_entities": [], "industry_keywords": []}"#,
            )
            .reply(PARAMETERS, "{}")
            .reply(PLANNER, SCENARIO_PLAN),
    );
    let pipeline = build_pipeline(llm.clone(), None, &test_settings());

    let outcome = pipeline.run(&query(SCENARIO)).await;
    let plan = match &outcome {
        PipelineOutcome::Plan(plan) => plan,
        other => panic!("expected a plan handoff, got {other:?}"),
    };

    assert_eq!(plan.query, SCENARIO);
    assert_eq!(plan.confidence, 0.6);
    assert_eq!(plan.action_groups.len(), 1);

    let group = &plan.action_groups[0];
    assert_eq!(group.supported_actions(), vec![SupportedAction::GetCampaignsWithFilters]);
    assert_eq!(group.date_ranges, vec![DateRange::from_period(TimePeriod::Last7Days)]);
    assert_eq!(group.filters.len(), 1);
    assert_eq!(group.filters[0].field, "budget");
    assert_eq!(group.filters[0].operator, FilterOperator::GreaterThan);
    assert_eq!(group.filters[0].value, json!(100));
    assert!(plan.reasoning.contains("GET_CAMPAIGNS_WITH_FILTERS over last_7_days"));

    let planner_prompts = llm.prompts_for(PLANNER);
    assert_eq!(planner_prompts.len(), 1);
    let prompt = &planner_prompts[0];
    assert!(prompt.contains(r#""campaign_status":"ENABLED""#));
    assert!(prompt.contains(r#""time_period":"last_7_days""#));
    assert!(prompt.contains("\"Summer Sale\""));
    assert!(!prompt.contains("Winter Sale"));
}

#[test]
fn test_scenario_context_signals() {
    let context = ContextExtractor::from_patterns(SCENARIO);
    assert_eq!(context.time_periods, vec![TimePeriod::Last7Days]);
    assert!(context.metrics.is_empty());
    assert!(context.business_entities.is_empty());
}

#[tokio::test]
async fn test_compound_request_plans_each_clause() {
    let llm = Arc::new(
        MockLlm::new()
            .reply(PLANNER, r#"{"action_groups": [{"actions": ["GET_BUDGETS"]}]}"#)
            .reply(PLANNER, r#"{"action_groups": [{"actions": ["PAUSE_CAMPAIGN"], "filters": [{"field": "campaign_id", "operator": "equals", "value": "101"}]}]}"#),
    );
    let mut settings = test_settings();
    settings.context.llm_assist = false;
    let pipeline = build_pipeline(llm.clone(), None, &settings);

    let outcome = pipeline
        .run(&query("show my budgets and then pause \"Summer Sale\""))
        .await;
    let plan = outcome.as_plan().expect("plan handoff");

    assert_eq!(plan.action_groups.len(), 2);
    assert_eq!(plan.total_actions(), 2);
    // 0.5 base + 0.1 second group + 0.05 filter
    assert_eq!(plan.confidence, 0.65);
    assert_eq!(llm.prompts_for(PLANNER).len(), 2);
}

// ============================================================================
// Graceful degradation
// ============================================================================

#[tokio::test]
async fn test_non_json_planner_reply_yields_empty_plan() {
    let llm = Arc::new(MockLlm::new().reply(PLANNER, "Sorry, I am not sure what you mean."));
    let planner = ActionPlanner::new(llm, RetryPolicy::none(), PlannerSettings::default());
    let user_context = UserContext::new("user-1", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

    let outcome = planner
        .plan("what's up", &ExtractedContext::default(), &user_context)
        .await;

    assert!(outcome.plan.is_empty());
    assert_eq!(outcome.plan.confidence, 0.0);
    assert!(!outcome.plan.reasoning.is_empty());
    assert!(matches!(outcome.failure, Some(PlanningFailure::Parse(_))));
}

#[tokio::test]
async fn test_failing_llm_everywhere_still_answers() {
    let server_error = LlmError::ServerError {
        message: "upstream exploded".to_string(),
        status: Some(500),
    };
    let llm = Arc::new(
        MockLlm::new()
            .fail(CONTEXT, server_error.clone())
            .fail(PARAMETERS, server_error.clone())
            .fail(PLANNER, server_error.clone())
            .fail(GENERATIVE, server_error),
    );
    let pipeline = build_pipeline(llm, None, &test_settings());

    let outcome = pipeline.run(&query("show me my campaigns")).await;
    let result = outcome.as_fallback().expect("fallback result");

    assert_eq!(result.kind, ResultKind::BasicFallback);
    assert!(result.content.contains("temporarily unavailable"));
    assert!(result.content.contains("Here are some things you can ask me:"));
    assert_eq!(result.data.as_ref().unwrap()["error_kind"], "server_error");
}

#[tokio::test]
async fn test_rate_limited_planner_reports_retry_after() {
    let llm = Arc::new(MockLlm::new().fail(
        PLANNER,
        LlmError::RateLimited {
            message: "too many requests".to_string(),
            retry_after: Some(7),
        },
    ));
    let mut settings = test_settings();
    settings.context.llm_assist = false;
    let pipeline = build_pipeline(llm, None, &settings);

    let outcome = pipeline.run(&query("show me my campaigns")).await;
    let result = outcome.as_fallback().unwrap();

    assert_eq!(result.kind, ResultKind::BasicFallback);
    assert!(result.content.contains("in about 7 seconds"));
    let data = result.data.as_ref().unwrap();
    assert_eq!(data["retry_after"], 7);
    assert_eq!(data["service_unavailable"], true);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_longer_than_planner_timeout_is_reported() {
    let llm = Arc::new(
        MockLlm::new()
            .fail(
                PLANNER,
                LlmError::RateLimited {
                    message: "too many requests".to_string(),
                    retry_after: Some(45),
                },
            )
            .reply(GENERATIVE, "Try asking about your campaigns."),
    );
    let mut settings = test_settings();
    settings.retry = RetryPolicy::default();
    settings.context.llm_assist = false;
    let pipeline = build_pipeline(llm.clone(), None, &settings);

    let outcome = pipeline.run(&query("show me my campaigns")).await;
    let result = outcome.as_fallback().unwrap();

    assert_eq!(result.kind, ResultKind::BasicFallback);
    assert!(result.content.contains("in about 45 seconds"));
    let data = result.data.as_ref().unwrap();
    assert_eq!(data["retry_after"], 45);
    assert_eq!(data["service_unavailable"], true);
    assert!(llm.prompts_for(GENERATIVE).is_empty());
}

#[tokio::test]
async fn test_quota_exhausted_is_an_error_result() {
    let llm = Arc::new(MockLlm::new().fail(
        PLANNER,
        LlmError::QuotaExceeded {
            message: "billing hard limit reached".to_string(),
            retry_after: None,
        },
    ));
    let mut settings = test_settings();
    settings.context.llm_assist = false;
    let pipeline = build_pipeline(llm, None, &settings);

    let outcome = pipeline.run(&query("show me my campaigns")).await;
    let result = outcome.as_fallback().unwrap();

    assert_eq!(result.kind, ResultKind::Error);
    assert!(result.content.contains("\"show me my campaigns\""));
    assert!(result.content.contains("rephrasing"));
    assert_eq!(result.data.as_ref().unwrap()["error_kind"], "quota_exceeded");
}

#[tokio::test(start_paused = true)]
async fn test_stalled_planner_times_out_into_generative_answer() {
    let llm = Arc::new(
        MockLlm::new()
            .stall(PLANNER)
            .reply(GENERATIVE, "I couldn't look that up, but here is some general advice."),
    );
    let mut settings = test_settings();
    settings.context.llm_assist = false;
    settings.planner.timeout_secs = 1;
    let pipeline = build_pipeline(llm, None, &settings);

    let outcome = tokio::time::timeout(Duration::from_secs(60), pipeline.run(&query("hello there")))
        .await
        .expect("pipeline finished");
    let result = outcome.as_fallback().unwrap();

    assert_eq!(result.kind, ResultKind::ChatgptFallback);
    assert!(result.content.starts_with("I couldn't look that up"));
    assert_eq!(result.data.as_ref().unwrap()["reason"], "empty_plan");
}

// ============================================================================
// Output contract
// ============================================================================

#[tokio::test]
async fn test_outcomes_serialize_with_non_empty_text() {
    let plan_llm = Arc::new(MockLlm::new().reply(PLANNER, SCENARIO_PLAN));
    let fallback_llm = Arc::new(MockLlm::new().reply(PLANNER, r#"{"action_groups": []}"#));
    let mut settings = test_settings();
    settings.context.llm_assist = false;

    let plan = build_pipeline(plan_llm, None, &settings).run(&query(SCENARIO)).await;
    let fallback = build_pipeline(fallback_llm, None, &settings)
        .run(&query("tell me a joke"))
        .await;

    let plan_json = serde_json::to_value(&plan).unwrap();
    assert_eq!(plan_json["outcome"], "plan");
    assert!(!plan_json["reasoning"].as_str().unwrap().is_empty());

    let fallback_json = serde_json::to_value(&fallback).unwrap();
    assert_eq!(fallback_json["outcome"], "fallback");
    assert_eq!(fallback_json["type"], "basic_fallback");
    assert!(!fallback_json["content"].as_str().unwrap().is_empty());
}
