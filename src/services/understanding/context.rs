//! Context Extractor
//!
//! Builds the `ExtractedContext` for a query: pattern rules supply time
//! periods, metrics, objectives and quoted entity mentions; one JSON-mode LLM
//! call adds business category, audience, further entity mentions and
//! industry keywords. The LLM half is best effort and never fails the query.

use std::sync::Arc;
use std::time::Duration;

use ads_copilot_core::{ExtractedContext, Query};
use ads_copilot_llm::{complete_text, LlmProvider, LlmRequestOptions, RetryPolicy};
use serde::Deserialize;
use tracing::{debug, warn};

use super::patterns::{detect_entity_mentions, detect_metrics, detect_objectives, detect_time_periods};
use crate::services::llm_json::decode;

const CONTEXT_SYSTEM_PROMPT: &str = "\
You extract business context from advertising questions.
Read the user's question about their advertising account and reply with a single JSON object:
{
  \"business_category\": string or null,   // the advertiser's industry, e.g. \"e-commerce\", \"local services\"
  \"target_audience\": string or null,     // who the ads are meant to reach
  \"business_entities\": [string],         // campaign, account, product or brand names mentioned
  \"industry_keywords\": [string]          // domain terms useful for keyword research
}
Use null or [] when the question does not say. Do not invent names that are not in the question.";

/// Shape of the LLM's context reply. Every field is optional.
#[derive(Debug, Default, Deserialize)]
struct LlmContextReply {
    #[serde(default)]
    business_category: Option<String>,
    #[serde(default)]
    target_audience: Option<String>,
    #[serde(default)]
    business_entities: Option<Vec<String>>,
    #[serde(default)]
    industry_keywords: Option<Vec<String>>,
}

/// Context extraction service.
pub struct ContextExtractor {
    llm: Option<Arc<dyn LlmProvider>>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl ContextExtractor {
    /// Pattern rules plus LLM assistance.
    pub fn new(llm: Arc<dyn LlmProvider>, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            llm: Some(llm),
            retry,
            timeout,
        }
    }

    /// Pattern rules only.
    pub fn patterns_only() -> Self {
        Self {
            llm: None,
            retry: RetryPolicy::none(),
            timeout: Duration::from_secs(1),
        }
    }

    /// Extract context for `query`. Never fails.
    pub async fn extract(&self, query: &Query) -> ExtractedContext {
        let mut context = Self::from_patterns(&query.text);

        if let Some(reply) = self.ask_llm(query).await {
            merge_reply(&mut context, reply);
        }

        debug!(
            time_periods = context.time_periods.len(),
            metrics = context.metrics.len(),
            objectives = context.business_objectives.len(),
            entities = context.business_entities.len(),
            "context: extracted"
        );
        context
    }

    /// The deterministic half of extraction.
    pub fn from_patterns(text: &str) -> ExtractedContext {
        ExtractedContext {
            time_periods: detect_time_periods(text),
            metrics: detect_metrics(text),
            business_objectives: detect_objectives(text),
            business_entities: detect_entity_mentions(text),
            ..ExtractedContext::default()
        }
    }

    async fn ask_llm(&self, query: &Query) -> Option<LlmContextReply> {
        let llm = self.llm.as_ref()?;
        let user_prompt = format!("Question: {}", query.text);

        let call = complete_text(
            llm.as_ref(),
            CONTEXT_SYSTEM_PROMPT,
            &user_prompt,
            LlmRequestOptions::json(0.0),
            &self.retry,
        );

        let text = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, user_id = %query.user_id, "context: LLM extraction failed, using patterns only");
                return None;
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "context: LLM extraction timed out");
                return None;
            }
        };

        match decode::<LlmContextReply>(&text) {
            Ok(reply) => Some(reply),
            Err(e) => {
                debug!(error = %e, "context: discarding unparseable LLM reply");
                None
            }
        }
    }
}

/// Scalars prefer the LLM; lists are unioned after the pattern output.
fn merge_reply(context: &mut ExtractedContext, reply: LlmContextReply) {
    if let Some(category) = reply.business_category.and_then(meaningful) {
        context.business_category = Some(category);
    }
    if let Some(audience) = reply.target_audience.and_then(meaningful) {
        context.target_audience = Some(audience);
    }
    extend_unique(
        &mut context.business_entities,
        reply.business_entities.unwrap_or_default(),
    );
    extend_unique(
        &mut context.industry_keywords,
        reply.industry_keywords.unwrap_or_default(),
    );
}

/// Drop blank and placeholder values the model uses for "nothing".
fn meaningful(value: String) -> Option<String> {
    let trimmed = value.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" | "null" | "none" | "unknown" | "n/a" => None,
        _ => Some(trimmed.to_string()),
    }
}

/// Case-insensitive union that keeps first-seen order.
fn extend_unique(target: &mut Vec<String>, extra: Vec<String>) {
    for item in extra.into_iter().filter_map(meaningful) {
        if !target.iter().any(|t| t.eq_ignore_ascii_case(&item)) {
            target.push(item);
        }
    }
}
