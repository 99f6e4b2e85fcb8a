//! Pipeline Models
//!
//! Values passed between pipeline stages and the final outcome handed to
//! callers.

use std::collections::BTreeMap;

use ads_copilot_core::{EntityMatch, FallbackResult, Plan, ResultKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Structured parameters keyed by normalized name (`campaign_status`,
/// `time_period`, `metrics`, `budget_constraints`, ...).
pub type Parameters = BTreeMap<String, serde_json::Value>;

/// Everything the planner knows about the user besides the query itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    /// Ranked inventory matches for the query.
    #[serde(default)]
    pub entities: Vec<EntityMatch>,
    #[serde(default)]
    pub parameters: Parameters,
    /// Anchor for relative date ranges.
    pub today: NaiveDate,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            entities: Vec::new(),
            parameters: Parameters::new(),
            today,
        }
    }
}

/// Result of one pipeline run: a plan for the executor, or a direct answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Plan(Plan),
    Fallback(FallbackResult),
}

impl PipelineOutcome {
    pub fn as_plan(&self) -> Option<&Plan> {
        match self {
            PipelineOutcome::Plan(plan) => Some(plan),
            PipelineOutcome::Fallback(_) => None,
        }
    }

    pub fn as_fallback(&self) -> Option<&FallbackResult> {
        match self {
            PipelineOutcome::Fallback(result) => Some(result),
            PipelineOutcome::Plan(_) => None,
        }
    }

    /// Result kind for fallbacks, `None` for plan handoffs.
    pub fn result_kind(&self) -> Option<ResultKind> {
        self.as_fallback().map(|r| r.kind)
    }
}
