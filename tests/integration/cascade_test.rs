//! Fallback Cascade Integration Tests

use std::sync::Arc;

use ads_copilot::models::settings::FallbackSettings;
use ads_copilot::services::fallback::{FallbackCascade, FallbackReason, FallbackRequest};
use ads_copilot_core::{ActionGroup, KnowledgeBase, Plan, PlannedAction, Query, ResultKind};
use ads_copilot_llm::{LlmError, LlmProvider, RetryPolicy};

use super::support::{
    build_pipeline, knowledge, sale_campaigns, test_settings, FixedKnowledge, MockLlm, GENERATIVE,
    PLANNER,
};

fn cascade(llm: Arc<MockLlm>, kb: Option<Arc<dyn KnowledgeBase>>) -> FallbackCascade {
    FallbackCascade::new(
        Some(llm as Arc<dyn LlmProvider>),
        kb,
        RetryPolicy::none(),
        FallbackSettings::default(),
    )
}

fn weak_plan(query: &str) -> Plan {
    Plan {
        action_groups: vec![ActionGroup::new(vec![PlannedAction::parse("GET_PERFORMANCE")])],
        confidence: 0.1,
        reasoning: "Only a loose guess at the intent.".to_string(),
        query: query.to_string(),
    }
}

#[tokio::test]
async fn test_low_confidence_with_weak_knowledge_goes_generative() {
    let query = Query::new("how should I think about seasonality?", "user-1", "session-1");
    let plan = weak_plan(&query.text);
    let llm = Arc::new(MockLlm::new().reply(GENERATIVE, "Plan budgets around your peak months."));
    let entities = sale_campaigns();

    let result = cascade(llm.clone(), Some(knowledge("Seasonality is...", 0.2)))
        .run(&FallbackRequest {
            query: &query,
            reason: FallbackReason::LowConfidence,
            plan: &plan,
            unsupported_actions: &[],
            entities: &entities,
            service_error: None,
        })
        .await;

    assert_eq!(result.kind, ResultKind::ChatgptLowConfidenceFallback);
    assert!(result.content.starts_with("Plan budgets around your peak months."));

    let prompt = &llm.prompts_for(GENERATIVE)[0];
    assert!(prompt.contains("Summer Sale (campaign ENABLED)"));
    assert!(prompt.contains("Planner notes: Only a loose guess at the intent."));
}

#[tokio::test]
async fn test_confident_knowledge_short_circuits() {
    let query = Query::new("what is target ROAS bidding?", "user-1", "session-1");
    let plan = Plan::empty(&query.text, "No actions could be identified.");
    let llm = Arc::new(MockLlm::new().reply(GENERATIVE, "unused"));

    let result = cascade(llm.clone(), Some(knowledge("Target ROAS sets bids to hit a return goal.", 0.85)))
        .run(&FallbackRequest {
            query: &query,
            reason: FallbackReason::EmptyPlan,
            plan: &plan,
            unsupported_actions: &[],
            entities: &[],
            service_error: None,
        })
        .await;

    assert_eq!(result.kind, ResultKind::RagResponse);
    assert_eq!(result.confidence, Some(0.85));
    assert_eq!(result.sources, Some(vec!["help-center/bidding.md".to_string()]));
    assert!(llm.prompts_for(GENERATIVE).is_empty());
}

#[tokio::test]
async fn test_every_stage_failing_ends_in_basic_fallback() {
    let query = Query::new("forecast my spend for next quarter", "user-1", "session-1");
    let plan = Plan::empty(&query.text, "No actions could be identified.");
    let llm = Arc::new(MockLlm::new().fail(
        GENERATIVE,
        LlmError::NetworkError {
            message: "connection reset".to_string(),
        },
    ));
    let kb: Arc<dyn KnowledgeBase> = Arc::new(FixedKnowledge(None));
    let unsupported = vec!["FORECAST_SPEND".to_string()];

    let result = cascade(llm, Some(kb))
        .run(&FallbackRequest {
            query: &query,
            reason: FallbackReason::UnsupportedActions,
            plan: &plan,
            unsupported_actions: &unsupported,
            entities: &[],
            service_error: None,
        })
        .await;

    assert_eq!(result.kind, ResultKind::BasicFallback);
    assert!(result.content.contains("I can't yet perform FORECAST_SPEND"));
    assert!(result.content.contains("- Show me my active campaigns"));
}

#[tokio::test]
async fn test_low_confidence_threshold_routes_pipeline_to_cascade() {
    let llm = Arc::new(
        MockLlm::new()
            .reply(PLANNER, r#"[{"actions": ["GET_PERFORMANCE"]}]"#)
            .reply(GENERATIVE, "Here is how to read your performance report."),
    );
    let mut settings = test_settings();
    settings.context.llm_assist = false;
    settings.fallback.low_confidence_threshold = 0.55;
    let pipeline = build_pipeline(llm, Some(knowledge("maybe", 0.2)), &settings);

    let outcome = pipeline
        .run(&Query::new("performance stuff", "user-1", "session-1"))
        .await;
    assert_eq!(outcome.result_kind(), Some(ResultKind::ChatgptLowConfidenceFallback));
}

#[tokio::test]
async fn test_unsupported_only_plan_uses_unsupported_kind() {
    let llm = Arc::new(
        MockLlm::new()
            .reply(PLANNER, r#"{"action_groups": [{"actions": ["CREATE_AUDIENCE"]}]}"#)
            .reply(GENERATIVE, "Audiences are created in the audience manager."),
    );
    let mut settings = test_settings();
    settings.context.llm_assist = false;
    let pipeline = build_pipeline(llm, None, &settings);

    let outcome = pipeline
        .run(&Query::new("create an audience of past buyers", "user-1", "session-1"))
        .await;
    let result = outcome.as_fallback().unwrap();

    assert_eq!(result.kind, ResultKind::ChatgptUnsupportedActions);
    assert_eq!(result.data.as_ref().unwrap()["unsupported_actions"][0], "CREATE_AUDIENCE");
}

#[tokio::test]
async fn test_mixed_plan_is_partially_supported() {
    let llm = Arc::new(
        MockLlm::new()
            .reply(PLANNER, r#"[{"actions": ["GET_BUDGETS", "FORECAST_SPEND"], "date_ranges": ["this_month"]}]"#)
            .reply(GENERATIVE, "For forecasts, use the performance planner."),
    );
    let mut settings = test_settings();
    settings.context.llm_assist = false;
    let pipeline = build_pipeline(llm, None, &settings);

    let outcome = pipeline
        .run(&Query::new("show budgets and forecast spend this month", "user-1", "session-1"))
        .await;
    let result = outcome.as_fallback().unwrap();

    assert_eq!(result.kind, ResultKind::PartialSupport);
    assert!(result.content.starts_with("Note: I can't yet perform FORECAST_SPEND."));
    assert!(result.content.contains("[dry run] Would fetch"));
    assert!(result.content.ends_with("For forecasts, use the performance planner."));
    // 0.5 base + 0.1 multi-action + 0.05 date range
    assert_eq!(result.confidence, Some(0.65));
}
