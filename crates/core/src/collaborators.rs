//! Collaborator Traits
//!
//! Boundary contracts between the planning core and the services it consumes.
//! Implementations live outside the core (backend clients, vector stores, test
//! doubles) and are injected into the pipeline as `Arc<dyn Trait>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::action::SupportedAction;
use crate::error::CoreResult;
use crate::model::{ActionGroup, InventoryEntity};

/// Read-only source of the user's campaigns and accounts.
#[async_trait]
pub trait InventoryAccessor: Send + Sync {
    async fn list_entities(&self, user_id: &str) -> CoreResult<Vec<InventoryEntity>>;
}

/// Output of running one action group against the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    pub content: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Runs validated action groups. The core never calls mutating backend
/// operations itself; it only hands groups to an executor.
#[async_trait]
pub trait PlanExecutor: Send + Sync {
    /// Whether this executor has a handler for `action`.
    fn can_run(&self, action: SupportedAction) -> bool;

    async fn execute(&self, group: &ActionGroup, query: &str) -> CoreResult<ExecutionOutput>;
}

/// Scope restriction for knowledge-base lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeScope {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

/// Answer from the semantic document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeAnswer {
    pub response: String,
    #[serde(default)]
    pub sources: Vec<String>,
    pub confidence: f64,
}

#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn query(&self, text: &str, scope: &KnowledgeScope) -> CoreResult<KnowledgeAnswer>;
}
