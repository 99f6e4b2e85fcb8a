//! Fallback Cascade
//!
//! Guarantees an answer when the plan cannot be handed to the executor.
//! Stages run in strict order, each under its own timeout, and the first
//! success ends the cascade:
//!
//! 1. Knowledge base: terminal when confident enough and non-empty.
//! 2. Generative chat: an LLM answer plus example queries.
//! 3. Canned suggestions: always succeeds.
//!
//! The generative stage is skipped when planning already failed on an LLM
//! service error, since the same provider would be asked again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ads_copilot_core::{
    FallbackResult, InventoryEntity, KnowledgeBase, KnowledgeScope, Plan, Query, ResultKind,
};
use ads_copilot_llm::{complete_text, LlmError, LlmProvider, LlmRequestOptions, RetryPolicy};
use serde_json::json;
use tracing::{debug, info, warn};

use super::suggestions::{basic_intro, example_queries, suggestion_list};
use crate::models::settings::FallbackSettings;

const GENERATIVE_SYSTEM_PROMPT: &str = "\
You answer questions about online advertising for a campaign management assistant.
The assistant could not turn the user's question into a data lookup, so answer it directly.
Be concise and practical. Refer to the user's campaigns by name when relevant.
Never claim to have changed, paused or enabled anything, and never invent performance numbers.
If the question needs an operation the assistant cannot run, say so and suggest what the user can do instead.";

/// Entity names listed in the generative prompt.
const MAX_PROMPT_ENTITIES: usize = 25;

/// Why the cascade was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    EmptyPlan,
    LowConfidence,
    UnsupportedActions,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::EmptyPlan => "empty_plan",
            FallbackReason::LowConfidence => "low_confidence",
            FallbackReason::UnsupportedActions => "unsupported_actions",
        }
    }

    /// Result kind of a successful generative answer.
    pub fn generative_kind(&self) -> ResultKind {
        match self {
            FallbackReason::EmptyPlan => ResultKind::ChatgptFallback,
            FallbackReason::LowConfidence => ResultKind::ChatgptLowConfidenceFallback,
            FallbackReason::UnsupportedActions => ResultKind::ChatgptUnsupportedActions,
        }
    }
}

/// Everything the cascade needs to answer one query.
#[derive(Debug, Clone, Copy)]
pub struct FallbackRequest<'a> {
    pub query: &'a Query,
    pub reason: FallbackReason,
    pub plan: &'a Plan,
    pub unsupported_actions: &'a [String],
    /// Accessible campaigns and accounts, named in the generative prompt.
    pub entities: &'a [InventoryEntity],
    /// Set when planning failed because the LLM service failed.
    pub service_error: Option<&'a LlmError>,
}

/// Tiered fallback service.
pub struct FallbackCascade {
    llm: Option<Arc<dyn LlmProvider>>,
    knowledge: Option<Arc<dyn KnowledgeBase>>,
    retry: RetryPolicy,
    settings: FallbackSettings,
}

impl FallbackCascade {
    pub fn new(
        llm: Option<Arc<dyn LlmProvider>>,
        knowledge: Option<Arc<dyn KnowledgeBase>>,
        retry: RetryPolicy,
        settings: FallbackSettings,
    ) -> Self {
        Self {
            llm,
            knowledge,
            retry,
            settings,
        }
    }

    /// Run the cascade. Always produces exactly one result.
    pub async fn run(&self, request: &FallbackRequest<'_>) -> FallbackResult {
        info!(
            reason = request.reason.as_str(),
            confidence = request.plan.confidence,
            unsupported = request.unsupported_actions.len(),
            "fallback: entering cascade"
        );

        if let Some(result) = self.knowledge_stage(request).await {
            info!(kind = %result.kind, "fallback: answered from knowledge base");
            return result;
        }

        if request.service_error.is_some() {
            debug!("fallback: skipping generative stage after planner service error");
        } else if let Some(result) = self.generative_stage(request).await {
            info!(kind = %result.kind, "fallback: answered by generative stage");
            return result;
        }

        let result = self.basic_stage(request);
        info!(kind = %result.kind, "fallback: answered with suggestions");
        result
    }

    /// Ask the generative stage about the part of a request that cannot be
    /// executed. `None` when the stage fails or times out.
    pub async fn explain_unsupported(
        &self,
        query: &Query,
        unsupported: &[String],
        entities: &[InventoryEntity],
    ) -> Option<String> {
        let llm = self.llm.as_ref()?;
        let prompt = format!(
            "User question: {}\n{}\
             The assistant handled the rest of the question but cannot run: {}.\n\
             Briefly explain how the user can get this done another way.",
            query.text,
            entity_line(entities),
            unsupported.join(", ")
        );
        self.generate(llm.as_ref(), &prompt).await
    }

    async fn knowledge_stage(&self, request: &FallbackRequest<'_>) -> Option<FallbackResult> {
        let knowledge = self.knowledge.as_ref()?;
        let scope = KnowledgeScope {
            user_id: request.query.user_id.clone(),
            collection: self.settings.knowledge_collection.clone(),
        };

        let answer = match self.within_stage_timeout("knowledge", knowledge.query(&request.query.text, &scope)).await? {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "fallback: knowledge base failed");
                return None;
            }
        };

        if answer.confidence < self.settings.kb_min_confidence || answer.response.trim().is_empty() {
            debug!(
                confidence = answer.confidence,
                min = self.settings.kb_min_confidence,
                "fallback: knowledge answer not usable"
            );
            return None;
        }

        Some(
            FallbackResult::new(ResultKind::RagResponse, answer.response.trim())
                .with_confidence(answer.confidence)
                .with_sources(answer.sources),
        )
    }

    async fn generative_stage(&self, request: &FallbackRequest<'_>) -> Option<FallbackResult> {
        let llm = self.llm.as_ref()?;

        let mut prompt = format!("User question: {}\n", request.query.text);
        prompt.push_str(&entity_line(request.entities));
        if !request.unsupported_actions.is_empty() {
            prompt.push_str(&format!(
                "Requested operations the assistant cannot run yet: {}\n",
                request.unsupported_actions.join(", ")
            ));
        }
        prompt.push_str(&format!("Planner notes: {}\n", request.plan.reasoning));

        let answer = self.generate(llm.as_ref(), &prompt).await?;
        let examples = example_queries(&self.settings.example_queries);
        let content = format!("{answer}\n\n{}", suggestion_list(&examples));

        Some(
            FallbackResult::new(request.reason.generative_kind(), content).with_data(json!({
                "reason": request.reason.as_str(),
                "suggestions": examples,
                "unsupported_actions": request.unsupported_actions,
            })),
        )
    }

    fn basic_stage(&self, request: &FallbackRequest<'_>) -> FallbackResult {
        let examples = example_queries(&self.settings.example_queries);
        let intro = basic_intro(
            &request.query.text,
            request.unsupported_actions,
            request.service_error,
        );
        let content = format!("{intro}\n\n{}", suggestion_list(&examples));

        let mut data = json!({
            "reason": request.reason.as_str(),
            "suggestions": examples,
        });
        if !request.unsupported_actions.is_empty() {
            data["unsupported_actions"] = json!(request.unsupported_actions);
        }
        if let Some(err) = request.service_error {
            data["service_unavailable"] = json!(true);
            data["error_kind"] = json!(err.kind());
            data["retry_after"] = json!(err.retry_after_secs());
        }

        FallbackResult::new(ResultKind::BasicFallback, content).with_data(data)
    }

    async fn generate(&self, llm: &dyn LlmProvider, prompt: &str) -> Option<String> {
        let options = LlmRequestOptions {
            temperature_override: Some(0.5),
            ..LlmRequestOptions::default()
        };
        let call = complete_text(llm, GENERATIVE_SYSTEM_PROMPT, prompt, options, &self.retry);

        match self.within_stage_timeout("generative", call).await? {
            Ok(text) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "fallback: generative stage failed");
                None
            }
        }
    }

    /// `None` when the stage exceeds its deadline.
    async fn within_stage_timeout<F: Future>(&self, stage: &str, fut: F) -> Option<F::Output> {
        let limit = Duration::from_secs(self.settings.stage_timeout_secs);
        match tokio::time::timeout(limit, fut).await {
            Ok(output) => Some(output),
            Err(_) => {
                warn!(stage, timeout_secs = limit.as_secs(), "fallback: stage timed out");
                None
            }
        }
    }
}

fn entity_line(entities: &[InventoryEntity]) -> String {
    if entities.is_empty() {
        return "Campaigns and accounts the user can access: none available\n".to_string();
    }
    let names: Vec<String> = entities
        .iter()
        .take(MAX_PROMPT_ENTITIES)
        .map(|e| format!("{} ({} {})", e.name, e.entity_type.as_str(), e.status))
        .collect();
    format!("Campaigns and accounts the user can access: {}\n", names.join(", "))
}
