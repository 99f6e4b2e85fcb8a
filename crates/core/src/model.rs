//! Domain Model
//!
//! Per-request data types that flow through the planning pipeline. Everything
//! here is created fresh for one query and dropped once the response is built.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::{PlannedAction, SupportedAction};

// ============================================================================
// Query
// ============================================================================

/// Immutable input for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub user_id: String,
    pub session_id: String,
}

impl Query {
    pub fn new(
        text: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

// ============================================================================
// Extracted context
// ============================================================================

/// Named reporting windows recognised in free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    Today,
    Yesterday,
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "last_14_days")]
    Last14Days,
    #[serde(rename = "last_30_days")]
    Last30Days,
    #[serde(rename = "last_90_days")]
    Last90Days,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisQuarter,
    ThisYear,
    LastYear,
}

impl TimePeriod {
    pub const ALL: &'static [TimePeriod] = &[
        TimePeriod::Today,
        TimePeriod::Yesterday,
        TimePeriod::Last7Days,
        TimePeriod::Last14Days,
        TimePeriod::Last30Days,
        TimePeriod::Last90Days,
        TimePeriod::ThisWeek,
        TimePeriod::LastWeek,
        TimePeriod::ThisMonth,
        TimePeriod::LastMonth,
        TimePeriod::ThisQuarter,
        TimePeriod::ThisYear,
        TimePeriod::LastYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Today => "today",
            TimePeriod::Yesterday => "yesterday",
            TimePeriod::Last7Days => "last_7_days",
            TimePeriod::Last14Days => "last_14_days",
            TimePeriod::Last30Days => "last_30_days",
            TimePeriod::Last90Days => "last_90_days",
            TimePeriod::ThisWeek => "this_week",
            TimePeriod::LastWeek => "last_week",
            TimePeriod::ThisMonth => "this_month",
            TimePeriod::LastMonth => "last_month",
            TimePeriod::ThisQuarter => "this_quarter",
            TimePeriod::ThisYear => "this_year",
            TimePeriod::LastYear => "last_year",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        Self::ALL.iter().copied().find(|p| p.as_str() == lower)
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical metric names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "ROAS")]
    Roas,
    #[serde(rename = "CTR")]
    Ctr,
    #[serde(rename = "CPC")]
    Cpc,
    #[serde(rename = "CPA")]
    Cpa,
    #[serde(rename = "conversions")]
    Conversions,
    #[serde(rename = "impressions")]
    Impressions,
    #[serde(rename = "clicks")]
    Clicks,
    #[serde(rename = "cost")]
    Cost,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Roas => "ROAS",
            Metric::Ctr => "CTR",
            Metric::Cpc => "CPC",
            Metric::Cpa => "CPA",
            Metric::Conversions => "conversions",
            Metric::Impressions => "impressions",
            Metric::Clicks => "clicks",
            Metric::Cost => "cost",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user wants to do with the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Improve,
    Optimize,
    Analyze,
    Compare,
    Suggest,
    Generate,
}

impl Objective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::Improve => "improve",
            Objective::Optimize => "optimize",
            Objective::Analyze => "analyze",
            Objective::Compare => "compare",
            Objective::Suggest => "suggest",
            Objective::Generate => "generate",
        }
    }

    /// Objectives that make budget size a relevance signal.
    pub fn is_optimization(&self) -> bool {
        matches!(self, Objective::Improve | Objective::Optimize)
    }
}

/// Semantic signals derived from the raw query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContext {
    #[serde(default)]
    pub time_periods: Vec<TimePeriod>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub business_objectives: Vec<Objective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub business_entities: Vec<String>,
    #[serde(default)]
    pub industry_keywords: Vec<String>,
}

impl ExtractedContext {
    pub fn has_optimization_objective(&self) -> bool {
        self.business_objectives.iter().any(Objective::is_optimization)
    }
}

// ============================================================================
// Inventory and entity matches
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Campaign,
    Account,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Campaign => "campaign",
            EntityType::Account => "account",
        }
    }
}

/// One campaign or account the user can see, as supplied by the inventory accessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntity {
    #[serde(default = "default_entity_type")]
    pub entity_type: EntityType,
    pub id: String,
    pub name: String,
    /// Backend status string, e.g. `ENABLED`, `PAUSED`, `REMOVED`.
    pub status: String,
    /// Advertising channel, e.g. `SEARCH`, `DISPLAY`, `VIDEO`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

fn default_entity_type() -> EntityType {
    EntityType::Campaign
}

impl InventoryEntity {
    pub fn campaign(id: impl Into<String>, name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            entity_type: EntityType::Campaign,
            id: id.into(),
            name: name.into(),
            status: status.into(),
            channel_type: None,
            budget: None,
        }
    }

    pub fn account(id: impl Into<String>, name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            entity_type: EntityType::Account,
            ..Self::campaign(id, name, status)
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel_type = Some(channel.into());
        self
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.status.eq_ignore_ascii_case("enabled")
    }

    pub fn is_paused(&self) -> bool {
        self.status.eq_ignore_ascii_case("paused")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Word,
    Fuzzy,
}

/// A scored inventory candidate for a mention in the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMatch {
    pub entity_type: EntityType,
    pub id: String,
    pub name: String,
    pub status: String,
    pub match_type: MatchType,
    /// Textual similarity, 0-100.
    pub match_score: f64,
    /// Similarity plus business-signal bonuses; the sort key.
    pub relevance: f64,
}

// ============================================================================
// Plan
// ============================================================================

/// A reporting window attached to an action group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// `YYYY-MM-DD to YYYY-MM-DD` or the named period.
    pub description: String,
}

impl DateRange {
    pub fn from_period(period: TimePeriod) -> Self {
        Self {
            start_date: None,
            end_date: None,
            period: Some(period.as_str().to_string()),
            description: period.as_str().to_string(),
        }
    }

    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        let start = start.into();
        let end = end.into();
        Self {
            description: format!("{start} to {end}"),
            start_date: Some(start),
            end_date: Some(end),
            period: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    #[serde(alias = "=", alias = "==", alias = "eq", alias = "is")]
    Equals,
    #[serde(alias = "like", alias = "includes")]
    Contains,
    #[serde(alias = ">", alias = "gt", alias = "more_than", alias = "above")]
    GreaterThan,
    #[serde(alias = "<", alias = "lt", alias = "below")]
    LessThan,
    #[serde(alias = "one_of")]
    In,
    #[serde(alias = "not_one_of")]
    NotIn,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::Contains => "contains",
            FilterOperator::GreaterThan => "greater_than",
            FilterOperator::LessThan => "less_than",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not_in",
        }
    }
}

/// A field constraint attached to an action group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: FilterOperator,
    pub value: serde_json::Value,
    #[serde(default)]
    pub description: String,
}

/// Actions that share one set of date ranges and filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionGroup {
    pub actions: Vec<PlannedAction>,
    #[serde(default)]
    pub date_ranges: Vec<DateRange>,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl ActionGroup {
    pub fn new(actions: Vec<PlannedAction>) -> Self {
        Self {
            actions,
            date_ranges: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn supported_actions(&self) -> Vec<SupportedAction> {
        self.actions.iter().filter_map(PlannedAction::as_supported).collect()
    }

    pub fn unsupported_actions(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter(|a| a.as_supported().is_none())
            .map(PlannedAction::name)
            .collect()
    }
}

/// The compiled plan for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub action_groups: Vec<ActionGroup>,
    pub confidence: f64,
    pub reasoning: String,
    pub query: String,
}

impl Plan {
    /// A plan with no groups and zero confidence.
    pub fn empty(query: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            action_groups: Vec::new(),
            confidence: 0.0,
            reasoning: reasoning.into(),
            query: query.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.action_groups.is_empty()
    }

    pub fn total_actions(&self) -> usize {
        self.action_groups.iter().map(|g| g.actions.len()).sum()
    }

    /// Distinct actions across all groups, in first-seen order.
    pub fn all_actions(&self) -> Vec<PlannedAction> {
        let mut seen = HashSet::new();
        self.action_groups
            .iter()
            .flat_map(|g| g.actions.iter())
            .filter(|a| seen.insert((*a).clone()))
            .cloned()
            .collect()
    }
}

// ============================================================================
// Fallback result
// ============================================================================

/// Terminal response kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    RagResponse,
    ChatgptFallback,
    ChatgptLowConfidenceFallback,
    PartialSupport,
    ChatgptUnsupportedActions,
    BasicFallback,
    Error,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::RagResponse => "rag_response",
            ResultKind::ChatgptFallback => "chatgpt_fallback",
            ResultKind::ChatgptLowConfidenceFallback => "chatgpt_low_confidence_fallback",
            ResultKind::PartialSupport => "partial_support",
            ResultKind::ChatgptUnsupportedActions => "chatgpt_unsupported_actions",
            ResultKind::BasicFallback => "basic_fallback",
            ResultKind::Error => "error",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A response produced without (or alongside) the plan executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackResult {
    pub content: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(rename = "type")]
    pub kind: ResultKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl FallbackResult {
    pub fn new(kind: ResultKind, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            data: None,
            kind,
            confidence: None,
            sources: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = Some(sources);
        self
    }
}
