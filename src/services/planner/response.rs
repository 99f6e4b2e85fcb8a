//! Planner Response Decoding
//!
//! Typed decoding of the planning reply and its normalization into
//! `ActionGroup`s. The reply may be a bare array of groups or an object with
//! `action_groups`. Any other shape, a non-list `actions`/`date_ranges`/
//! `filters`, or an unknown filter operator is a schema violation.

use ads_copilot_core::{ActionGroup, DateRange, Filter, FilterOperator, PlannedAction, TimePeriod};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::services::llm_json::{parse_json_value, ResponseParseError};

/// Planner reply.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PlanResponse {
    /// Zero, one or many action groups.
    pub action_groups: Vec<RawActionGroup>,
    /// Optional short explanation of the plan.
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// One group of actions sharing date ranges and filters.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RawActionGroup {
    /// Catalog action names, e.g. `GET_CAMPAIGNS`.
    pub actions: Vec<String>,
    #[serde(default)]
    pub date_ranges: Vec<RawDateRange>,
    #[serde(default)]
    pub filters: Vec<RawFilter>,
}

/// A named period (`last_7_days`) or an explicit span.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RawDateRange {
    Named(String),
    Span {
        #[serde(default)]
        start_date: Option<String>,
        #[serde(default)]
        end_date: Option<String>,
        #[serde(default)]
        period: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RawFilter {
    /// Field name, e.g. `status`, `budget`, `campaign_id`.
    pub field: String,
    /// One of equals, contains, greater_than, less_than, in, not_in.
    pub operator: String,
    pub value: Value,
    #[serde(default)]
    pub description: Option<String>,
}

/// Decode and normalize a planner reply.
pub fn parse_plan_response(text: &str) -> Result<Vec<ActionGroup>, ResponseParseError> {
    let raw_groups = match parse_json_value(text)? {
        value @ Value::Array(_) => serde_json::from_value::<Vec<RawActionGroup>>(value)
            .map_err(|e| ResponseParseError::Schema(e.to_string()))?,
        value @ Value::Object(_) => {
            let response: PlanResponse = serde_json::from_value(value)
                .map_err(|e| ResponseParseError::Schema(e.to_string()))?;
            if let Some(reasoning) = response.reasoning.as_deref() {
                debug!(reasoning, "planner: model reasoning");
            }
            response.action_groups
        }
        other => {
            return Err(ResponseParseError::Schema(format!(
                "expected a list of action groups or an object with action_groups, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut groups = Vec::with_capacity(raw_groups.len());
    for raw in raw_groups {
        if let Some(group) = normalize_group(raw)? {
            groups.push(group);
        }
    }
    Ok(dedup_groups(groups))
}

/// `None` when the group names no actions.
fn normalize_group(raw: RawActionGroup) -> Result<Option<ActionGroup>, ResponseParseError> {
    let mut actions: Vec<PlannedAction> = Vec::new();
    for name in raw.actions.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        let action = PlannedAction::parse(name);
        if !actions.contains(&action) {
            actions.push(action);
        }
    }
    if actions.is_empty() {
        debug!("planner: dropping group without actions");
        return Ok(None);
    }

    let mut date_ranges: Vec<DateRange> = Vec::new();
    for range in raw.date_ranges.into_iter().filter_map(normalize_date_range) {
        if !date_ranges.contains(&range) {
            date_ranges.push(range);
        }
    }

    let filters = raw
        .filters
        .into_iter()
        .map(normalize_filter)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(ActionGroup {
        actions,
        date_ranges,
        filters,
    }))
}

/// Normalize a date range to `YYYY-MM-DD to YYYY-MM-DD` or a named period.
/// Ranges with nothing usable are dropped.
pub fn normalize_date_range(raw: RawDateRange) -> Option<DateRange> {
    match raw {
        RawDateRange::Named(text) => named_range(&text),
        RawDateRange::Span {
            start_date,
            end_date,
            period,
            description,
        } => {
            let start = start_date.as_deref().and_then(parse_date);
            let end = end_date.as_deref().and_then(parse_date);
            if let (Some(start), Some(end)) = (start, end) {
                let (start, end) = if start <= end { (start, end) } else { (end, start) };
                let mut range = DateRange::between(
                    start.format("%Y-%m-%d").to_string(),
                    end.format("%Y-%m-%d").to_string(),
                );
                range.period = period.and_then(|p| TimePeriod::from_name(&p)).map(|p| p.as_str().to_string());
                return Some(range);
            }
            period
                .as_deref()
                .and_then(named_range)
                .or_else(|| description.as_deref().and_then(named_range))
        }
    }
}

fn named_range(text: &str) -> Option<DateRange> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(period) = TimePeriod::from_name(text) {
        return Some(DateRange::from_period(period));
    }
    if let Some((start, end)) = text.split_once(" to ") {
        if let (Some(start), Some(end)) = (parse_date(start), parse_date(end)) {
            return normalize_date_range(RawDateRange::Span {
                start_date: Some(start.to_string()),
                end_date: Some(end.to_string()),
                period: None,
                description: None,
            });
        }
    }
    Some(DateRange {
        start_date: None,
        end_date: None,
        period: None,
        description: text.to_string(),
    })
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

fn normalize_filter(raw: RawFilter) -> Result<Filter, ResponseParseError> {
    let field = raw.field.trim().to_string();
    if field.is_empty() {
        return Err(ResponseParseError::Schema("filter without a field".to_string()));
    }
    let operator_name = raw.operator.trim().to_ascii_lowercase();
    let operator: FilterOperator = serde_json::from_value(Value::String(operator_name.clone()))
        .map_err(|_| ResponseParseError::Schema(format!("unknown filter operator {operator_name:?}")))?;

    let description = match raw.description.map(|d| d.trim().to_string()) {
        Some(d) if !d.is_empty() => d,
        _ => format!("{field} {} {}", operator.as_str(), display_value(&raw.value)),
    };

    Ok(Filter {
        field,
        operator,
        value: raw.value,
        description,
    })
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Merge exact duplicates, keeping first-seen order.
pub fn dedup_groups(groups: Vec<ActionGroup>) -> Vec<ActionGroup> {
    let mut unique: Vec<ActionGroup> = Vec::with_capacity(groups.len());
    for group in groups {
        if !unique.contains(&group) {
            unique.push(group);
        }
    }
    unique
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
