//! Test doubles for the integration suite.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ads_copilot::models::settings::PipelineSettings;
use ads_copilot::{DryRunHandler, PipelineDeps, QueryPipeline};
use ads_copilot_core::{
    ActionRegistry, CoreError, CoreResult, InventoryAccessor, InventoryEntity, KnowledgeAnswer,
    KnowledgeBase, KnowledgeScope,
};
use ads_copilot_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, RetryPolicy,
    StopReason, UsageStats,
};
use async_trait::async_trait;

/// System prompt markers for each LLM call the pipeline makes.
pub const CONTEXT: &str = "extract business context";
pub const PARAMETERS: &str = "extract structured parameters";
pub const PLANNER: &str = "action planner";
pub const GENERATIVE: &str = "answer questions about online advertising";

pub const SCENARIO: &str = "Show me active campaigns from last 7 days with budget > $100";

pub const SCENARIO_PLAN: &str = r#"```json
{
  "action_groups": [
    {
      "actions": ["GET_CAMPAIGNS_WITH_FILTERS"],
      "date_ranges": ["last_7_days"],
      "filters": [
        {"field": "budget", "operator": "greater_than", "value": 100, "description": "budget greater_than 100"}
      ]
    }
  ],
  "reasoning": "Active campaigns over the last week with a budget floor."
}
```"#;

#[derive(Clone)]
enum Reply {
    Text(String),
    Fail(LlmError),
    /// Never answers.
    Stall,
}

struct Route {
    marker: &'static str,
    replies: Vec<Reply>,
}

/// LLM double that answers by system prompt marker and records user prompts.
/// Each route replays its replies in order and repeats the last one.
#[derive(Default)]
pub struct MockLlm {
    routes: Mutex<Vec<Route>>,
    prompts: Mutex<Vec<(&'static str, String)>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, marker: &'static str, text: &str) -> Self {
        self.push(marker, Reply::Text(text.to_string()))
    }

    pub fn fail(self, marker: &'static str, err: LlmError) -> Self {
        self.push(marker, Reply::Fail(err))
    }

    pub fn stall(self, marker: &'static str) -> Self {
        self.push(marker, Reply::Stall)
    }

    fn push(self, marker: &'static str, reply: Reply) -> Self {
        {
            let mut routes = self.routes.lock().unwrap();
            match routes.iter_mut().find(|r| r.marker == marker) {
                Some(route) => route.replies.push(reply),
                None => routes.push(Route {
                    marker,
                    replies: vec![reply],
                }),
            }
        }
        self
    }

    /// User prompts sent with the given marker, in call order.
    pub fn prompts_for(&self, marker: &str) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| *m == marker)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let system = system.unwrap_or_default();
        let user = messages.last().map(|m| m.content.clone()).unwrap_or_default();

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            let Some(route) = routes.iter_mut().find(|r| system.contains(r.marker)) else {
                return Err(LlmError::Other {
                    message: "no mock route".to_string(),
                });
            };
            self.prompts.lock().unwrap().push((route.marker, user));
            if route.replies.len() > 1 {
                route.replies.remove(0)
            } else {
                route.replies[0].clone()
            }
        };

        match reply {
            Reply::Text(text) => Ok(LlmResponse {
                content: Some(text),
                stop_reason: StopReason::EndTurn,
                usage: UsageStats::default(),
                model: "mock-model".to_string(),
            }),
            Reply::Fail(err) => Err(err),
            Reply::Stall => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LlmError::Timeout {
                    message: "stalled".to_string(),
                })
            }
        }
    }
}

pub struct StaticInventory(pub Vec<InventoryEntity>);

#[async_trait]
impl InventoryAccessor for StaticInventory {
    async fn list_entities(&self, _user_id: &str) -> CoreResult<Vec<InventoryEntity>> {
        Ok(self.0.clone())
    }
}

/// Knowledge base with a fixed answer, or a service error for `None`.
pub struct FixedKnowledge(pub Option<KnowledgeAnswer>);

#[async_trait]
impl KnowledgeBase for FixedKnowledge {
    async fn query(&self, _text: &str, _scope: &KnowledgeScope) -> CoreResult<KnowledgeAnswer> {
        self.0
            .clone()
            .ok_or_else(|| CoreError::service("vector store unreachable"))
    }
}

pub fn knowledge(response: &str, confidence: f64) -> Arc<dyn KnowledgeBase> {
    Arc::new(FixedKnowledge(Some(KnowledgeAnswer {
        response: response.to_string(),
        sources: vec!["help-center/bidding.md".to_string()],
        confidence,
    })))
}

/// Summer Sale (ENABLED) and Winter Sale (PAUSED).
pub fn sale_campaigns() -> Vec<InventoryEntity> {
    vec![
        InventoryEntity::campaign("101", "Summer Sale", "ENABLED")
            .with_channel("SEARCH")
            .with_budget(250.0),
        InventoryEntity::campaign("102", "Winter Sale", "PAUSED")
            .with_channel("DISPLAY")
            .with_budget(80.0),
    ]
}

pub fn test_settings() -> PipelineSettings {
    let mut settings = PipelineSettings::default();
    settings.retry = RetryPolicy::none();
    settings
}

/// Pipeline over the sale campaigns with every catalog action dry-run.
pub fn build_pipeline(
    llm: Arc<MockLlm>,
    knowledge: Option<Arc<dyn KnowledgeBase>>,
    settings: &PipelineSettings,
) -> QueryPipeline {
    let mut registry = ActionRegistry::new();
    registry.register_all(Arc::new(DryRunHandler::new()));

    QueryPipeline::new(
        settings,
        PipelineDeps {
            llm,
            inventory: Arc::new(StaticInventory(sale_campaigns())),
            executor: Arc::new(registry),
            knowledge,
        },
    )
}
