//! Parameter Extractor
//!
//! Turns the query and its context into a flat parameter map. Pattern rules
//! own `campaign_status`, `time_period` and `metrics`; an LLM call may add
//! objectives, audience targeting, budget constraints and campaign names.
//! Pattern keys always win, and empty values are dropped.

use std::sync::Arc;
use std::time::Duration;

use ads_copilot_core::ExtractedContext;
use ads_copilot_llm::{complete_text, LlmProvider, LlmRequestOptions, RetryPolicy};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::patterns::detect_status;
use crate::models::Parameters;
use crate::services::llm_json::decode;

const PARAMETER_SYSTEM_PROMPT: &str = "\
You extract structured parameters from advertising questions.
Reply with a single JSON object using only these keys (omit any that do not apply):
  \"business_objectives\": [string]   // e.g. [\"increase conversions\", \"lower CPA\"]
  \"audience_targeting\": object       // e.g. {\"age\": \"25-34\", \"location\": \"Berlin\"}
  \"budget_constraints\": object       // e.g. {\"max_daily\": 50, \"currency\": \"USD\"}
  \"campaign_names\": [string]         // campaign names exactly as written in the question
Return {} when nothing applies.";

const LLM_KEYS: &[&str] = &[
    "business_objectives",
    "audience_targeting",
    "budget_constraints",
    "campaign_names",
];

/// Parameter extraction service.
pub struct ParameterExtractor {
    llm: Option<Arc<dyn LlmProvider>>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl ParameterExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            llm: Some(llm),
            retry,
            timeout,
        }
    }

    pub fn patterns_only() -> Self {
        Self {
            llm: None,
            retry: RetryPolicy::none(),
            timeout: Duration::from_secs(1),
        }
    }

    /// Extract parameters. Never fails.
    pub async fn extract(&self, query_text: &str, context: &ExtractedContext) -> Parameters {
        let mut params = self.ask_llm(query_text, context).await.unwrap_or_default();
        params.extend(pattern_parameters(query_text, context));

        let params = clean_parameters(params);
        debug!(keys = ?params.keys().collect::<Vec<_>>(), "parameters: extracted");
        params
    }

    async fn ask_llm(&self, query_text: &str, context: &ExtractedContext) -> Option<Parameters> {
        let llm = self.llm.as_ref()?;
        let context_json = serde_json::to_string(context).unwrap_or_default();
        let user_prompt = format!("Question: {query_text}\nKnown context: {context_json}");

        let call = complete_text(
            llm.as_ref(),
            PARAMETER_SYSTEM_PROMPT,
            &user_prompt,
            LlmRequestOptions::json(0.0),
            &self.retry,
        );

        let text = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, "parameters: LLM extraction failed, using patterns only");
                return None;
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "parameters: LLM extraction timed out");
                return None;
            }
        };

        match decode::<Map<String, Value>>(&text) {
            Ok(object) => Some(
                object
                    .into_iter()
                    .map(|(key, value)| (normalize_key(&key), value))
                    .filter(|(key, _)| LLM_KEYS.contains(&key.as_str()))
                    .collect(),
            ),
            Err(e) => {
                debug!(error = %e, "parameters: discarding unparseable LLM reply");
                None
            }
        }
    }
}

/// Deterministic parameters from pattern rules and the extracted context.
pub fn pattern_parameters(query_text: &str, context: &ExtractedContext) -> Parameters {
    let mut params = Parameters::new();
    if let Some(status) = detect_status(query_text) {
        params.insert("campaign_status".to_string(), Value::from(status));
    }
    if let Some(period) = context.time_periods.first() {
        params.insert("time_period".to_string(), Value::from(period.as_str()));
    }
    if !context.metrics.is_empty() {
        let metrics: Vec<Value> = context.metrics.iter().map(|m| Value::from(m.as_str())).collect();
        params.insert("metrics".to_string(), Value::Array(metrics));
    }
    params
}

/// Drop null, blank strings, empty lists and empty objects. `0` and `false` stay.
pub fn clean_parameters(params: Parameters) -> Parameters {
    params.into_iter().filter(|(_, value)| !is_empty_value(value)).collect()
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}
