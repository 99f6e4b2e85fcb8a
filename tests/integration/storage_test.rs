//! Storage Integration Tests
//!
//! Settings files and JSON inventories feeding a real pipeline run.

use std::fs;
use std::sync::Arc;

use ads_copilot::models::settings::PipelineSettings;
use ads_copilot::{AppError, ConfigService, DryRunHandler, JsonFileInventory, PipelineDeps, QueryPipeline};
use ads_copilot_core::{ActionRegistry, InventoryAccessor, Query};

use super::support::{MockLlm, PLANNER};

#[test]
fn test_load_explicit_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(
        &path,
        r#"
        [planner]
        timeout_secs = 12
        max_clauses = 2

        [fallback]
        low_confidence_threshold = 0.4
        example_queries = ["Show ad group performance"]
        "#,
    )
    .unwrap();

    let config = ConfigService::load(Some(&path)).unwrap();
    let settings = config.settings();
    assert_eq!(config.config_path(), path.as_path());
    assert_eq!(settings.planner.timeout_secs, 12);
    assert_eq!(settings.planner.max_clauses, 2);
    assert_eq!(settings.fallback.low_confidence_threshold, 0.4);
    assert_eq!(settings.fallback.kb_min_confidence, 0.3);
    assert_eq!(settings.context.timeout_secs, 15);
}

#[test]
fn test_missing_explicit_settings_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigService::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn test_invalid_threshold_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(&path, "[fallback]\nlow_confidence_threshold = 1.5\n").unwrap();

    let err = ConfigService::load(Some(&path)).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_per_user_inventory_file_drives_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.json");
    fs::write(
        &path,
        r#"{
            "user-1": [
                {"entity_type": "campaign", "id": "101", "name": "Summer Sale", "status": "ENABLED"},
                {"entity_type": "campaign", "id": "102", "name": "Winter Sale", "status": "PAUSED"}
            ],
            "user-2": []
        }"#,
    )
    .unwrap();

    let inventory = JsonFileInventory::new(&path);
    assert_eq!(inventory.list_entities("user-1").await.unwrap().len(), 2);
    assert!(inventory.list_entities("user-3").await.unwrap().is_empty());

    let llm = Arc::new(MockLlm::new().reply(PLANNER, r#"[{"actions": ["GET_CAMPAIGN_PERFORMANCE"]}]"#));
    let mut registry = ActionRegistry::new();
    registry.register_all(Arc::new(DryRunHandler::new()));
    let mut settings = PipelineSettings::default();
    settings.context.llm_assist = false;

    let pipeline = QueryPipeline::new(
        &settings,
        PipelineDeps {
            llm: llm.clone(),
            inventory: Arc::new(inventory),
            executor: Arc::new(registry),
            knowledge: None,
        },
    );
    let outcome = pipeline
        .run(&Query::new("how is \"Winter Sale\" doing", "user-1", "session-1"))
        .await;

    assert!(outcome.as_plan().is_some());
    let prompt = &llm.prompts_for(PLANNER)[0];
    assert!(prompt.contains("campaign \"Winter Sale\" (id 102, status PAUSED, Exact match"));
}
