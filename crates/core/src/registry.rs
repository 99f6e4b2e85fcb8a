//! Action Registry
//!
//! Table-driven plan executor: each `SupportedAction` maps to one
//! `ActionHandler`. Executing a group runs its actions in order and merges
//! their outputs. Lookups are O(1) and the set of routable actions is checked
//! against the closed catalog, so there is no string dispatch anywhere.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::action::{PlannedAction, SupportedAction};
use crate::collaborators::{ExecutionOutput, PlanExecutor};
use crate::error::{CoreError, CoreResult};
use crate::model::{ActionGroup, DateRange, Filter};

/// Everything a handler needs to run one action of a group.
#[derive(Debug, Clone, Copy)]
pub struct ActionRequest<'a> {
    pub action: SupportedAction,
    pub date_ranges: &'a [DateRange],
    pub filters: &'a [Filter],
    pub query: &'a str,
}

#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, request: ActionRequest<'_>) -> CoreResult<ExecutionOutput>;
}

/// Registry mapping catalog actions to handlers.
pub struct ActionRegistry {
    handlers: HashMap<SupportedAction, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler. Replaces any existing handler for the same action.
    pub fn register(&mut self, action: SupportedAction, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(action, handler);
    }

    /// Register one handler for every catalog action.
    pub fn register_all(&mut self, handler: Arc<dyn ActionHandler>) {
        for action in SupportedAction::ALL {
            self.handlers.insert(*action, handler.clone());
        }
    }

    pub fn contains(&self, action: SupportedAction) -> bool {
        self.handlers.contains_key(&action)
    }

    /// Registered actions in catalog order.
    pub fn actions(&self) -> Vec<SupportedAction> {
        SupportedAction::ALL
            .iter()
            .copied()
            .filter(|a| self.handlers.contains_key(a))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlanExecutor for ActionRegistry {
    fn can_run(&self, action: SupportedAction) -> bool {
        self.contains(action)
    }

    async fn execute(&self, group: &ActionGroup, query: &str) -> CoreResult<ExecutionOutput> {
        if group.actions.is_empty() {
            return Err(CoreError::validation("Action group has no actions"));
        }

        let mut outputs = Vec::with_capacity(group.actions.len());
        for planned in &group.actions {
            let action = match planned {
                PlannedAction::Supported(action) => *action,
                PlannedAction::Unsupported(name) => {
                    return Err(CoreError::unsupported(name.clone()));
                }
            };
            let handler = self
                .handlers
                .get(&action)
                .ok_or_else(|| CoreError::unsupported(action.as_str()))?;

            let request = ActionRequest {
                action,
                date_ranges: &group.date_ranges,
                filters: &group.filters,
                query,
            };
            outputs.push((action, handler.handle(request).await?));
        }

        if outputs.len() == 1 {
            let (_, output) = outputs.remove(0);
            return Ok(output);
        }

        let content = outputs
            .iter()
            .map(|(_, o)| o.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let data: serde_json::Map<String, serde_json::Value> = outputs
            .iter()
            .map(|(action, o)| {
                (
                    action.as_str().to_string(),
                    o.data.clone().unwrap_or(serde_json::Value::Null),
                )
            })
            .collect();

        Ok(ExecutionOutput {
            content,
            data: Some(serde_json::Value::Object(data)),
            kind: "multi_action".to_string(),
        })
    }
}
