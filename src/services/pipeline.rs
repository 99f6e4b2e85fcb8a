//! Query Pipeline
//!
//! Orchestrates one query end to end:
//!
//! ```text
//! query -> context -> entities -> parameters -> plan -> confidence
//!       -> executor handoff | partial support | fallback cascade
//! ```
//!
//! Every stage degrades to its neutral output. `QueryPipeline::run` never
//! fails: an unrecovered `AppError` becomes an `error` result naming the
//! query and suggesting a rephrase.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ads_copilot_core::{
    ActionGroup, ExecutionOutput, FallbackResult, InventoryAccessor, InventoryEntity, KnowledgeBase,
    Plan, PlanExecutor, PlannedAction, Query, ResultKind,
};
use ads_copilot_llm::{LlmError, LlmProvider};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::models::settings::PipelineSettings;
use crate::models::{PipelineOutcome, UserContext};
use crate::services::entity::EntityResolver;
use crate::services::fallback::{FallbackCascade, FallbackReason, FallbackRequest};
use crate::services::planner::ActionPlanner;
use crate::services::understanding::patterns::detect_status;
use crate::services::understanding::{ContextExtractor, ParameterExtractor};
use crate::utils::error::{AppError, AppResult};

const REPHRASE_EXAMPLE: &str = "Show me my active campaigns from last week";

/// Collaborators injected into the pipeline.
pub struct PipelineDeps {
    pub llm: Arc<dyn LlmProvider>,
    pub inventory: Arc<dyn InventoryAccessor>,
    pub executor: Arc<dyn PlanExecutor>,
    pub knowledge: Option<Arc<dyn KnowledgeBase>>,
}

/// The query-understanding and action-planning pipeline.
pub struct QueryPipeline {
    context: ContextExtractor,
    resolver: EntityResolver,
    parameters: ParameterExtractor,
    planner: ActionPlanner,
    cascade: FallbackCascade,
    inventory: Arc<dyn InventoryAccessor>,
    executor: Arc<dyn PlanExecutor>,
    low_confidence_threshold: f64,
}

impl QueryPipeline {
    pub fn new(settings: &PipelineSettings, deps: PipelineDeps) -> Self {
        let extraction_timeout = Duration::from_secs(settings.context.timeout_secs);
        let (context, parameters) = if settings.context.llm_assist {
            (
                ContextExtractor::new(deps.llm.clone(), settings.retry.clone(), extraction_timeout),
                ParameterExtractor::new(deps.llm.clone(), settings.retry.clone(), extraction_timeout),
            )
        } else {
            (ContextExtractor::patterns_only(), ParameterExtractor::patterns_only())
        };

        Self {
            context,
            resolver: EntityResolver::new(settings.resolver.clone()),
            parameters,
            planner: ActionPlanner::new(deps.llm.clone(), settings.retry.clone(), settings.planner.clone()),
            cascade: FallbackCascade::new(
                Some(deps.llm),
                deps.knowledge,
                settings.retry.clone(),
                settings.fallback.clone(),
            ),
            inventory: deps.inventory,
            executor: deps.executor,
            low_confidence_threshold: settings.fallback.low_confidence_threshold,
        }
    }

    /// Answer one query. Always returns an outcome.
    pub async fn run(&self, query: &Query) -> PipelineOutcome {
        let started = Instant::now();
        let outcome = match self.try_run(query).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "pipeline: unrecovered error");
                PipelineOutcome::Fallback(error_result(&query.text, &err))
            }
        };

        info!(
            user_id = %query.user_id,
            session_id = %query.session_id,
            outcome = outcome.result_kind().map(|k| k.as_str()).unwrap_or("plan"),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline: finished"
        );
        outcome
    }

    async fn try_run(&self, query: &Query) -> AppResult<PipelineOutcome> {
        if query.text.trim().is_empty() {
            return Err(AppError::validation("the question is empty"));
        }
        debug!(user_id = %query.user_id, len = query.text.len(), "pipeline: received query");

        let inventory = self.load_inventory(&query.user_id).await;
        let context = self.context.extract(query).await;

        let status_filter = detect_status(&query.text);
        let entities = self
            .resolver
            .resolve(&context, &query.text, &inventory, status_filter);
        debug!(
            matches = entities.len(),
            status_filter = status_filter.unwrap_or("all"),
            "pipeline: entities resolved"
        );

        let mut user_context = UserContext::new(&query.user_id, chrono::Local::now().date_naive());
        user_context.entities = entities;
        user_context.parameters = self.parameters.extract(&query.text, &context).await;

        let planning = self.planner.plan(&query.text, &context, &user_context).await;
        let plan = planning.plan;
        let service_error: Option<&LlmError> = planning.failure.as_ref().and_then(|f| f.service_error());

        if plan.is_empty() {
            if let Some(err) = service_error.filter(|e| !e.is_transient()) {
                return Err(AppError::Llm(err.clone()));
            }
            let request = FallbackRequest {
                query,
                reason: FallbackReason::EmptyPlan,
                plan: &plan,
                unsupported_actions: &[],
                entities: &inventory,
                service_error,
            };
            return Ok(PipelineOutcome::Fallback(self.cascade.run(&request).await));
        }

        // Non-empty plans score at least 0.5; reached only with a raised threshold.
        if plan.confidence < self.low_confidence_threshold {
            let request = FallbackRequest {
                query,
                reason: FallbackReason::LowConfidence,
                plan: &plan,
                unsupported_actions: &[],
                entities: &inventory,
                service_error: None,
            };
            return Ok(PipelineOutcome::Fallback(self.cascade.run(&request).await));
        }

        let unsupported = self.unrunnable_actions(&plan);
        let runnable = self.runnable_groups(&plan);

        if runnable.is_empty() {
            let request = FallbackRequest {
                query,
                reason: FallbackReason::UnsupportedActions,
                plan: &plan,
                unsupported_actions: &unsupported,
                entities: &inventory,
                service_error: None,
            };
            return Ok(PipelineOutcome::Fallback(self.cascade.run(&request).await));
        }

        if !unsupported.is_empty() {
            let result = self
                .partial_support(query, &plan, &runnable, &unsupported, &inventory)
                .await?;
            return Ok(PipelineOutcome::Fallback(result));
        }

        info!(
            groups = plan.action_groups.len(),
            confidence = plan.confidence,
            "pipeline: handing plan to executor"
        );
        Ok(PipelineOutcome::Plan(plan))
    }

    async fn load_inventory(&self, user_id: &str) -> Vec<InventoryEntity> {
        match self.inventory.list_entities(user_id).await {
            Ok(entities) => entities,
            Err(e) => {
                warn!(error = %e, "pipeline: inventory unavailable, continuing without entities");
                Vec::new()
            }
        }
    }

    fn is_runnable(&self, action: &PlannedAction) -> bool {
        action
            .as_supported()
            .is_some_and(|a| self.executor.can_run(a))
    }

    /// Action names the executor cannot run, in first-seen order.
    fn unrunnable_actions(&self, plan: &Plan) -> Vec<String> {
        plan.all_actions()
            .iter()
            .filter(|a| !self.is_runnable(a))
            .map(|a| a.name().to_string())
            .collect()
    }

    /// The plan restricted to runnable actions. Groups left empty are dropped.
    fn runnable_groups(&self, plan: &Plan) -> Vec<ActionGroup> {
        plan.action_groups
            .iter()
            .filter_map(|group| {
                let actions: Vec<PlannedAction> = group
                    .actions
                    .iter()
                    .filter(|a| self.is_runnable(a))
                    .cloned()
                    .collect();
                if actions.is_empty() {
                    return None;
                }
                Some(ActionGroup {
                    actions,
                    date_ranges: group.date_ranges.clone(),
                    filters: group.filters.clone(),
                })
            })
            .collect()
    }

    async fn partial_support(
        &self,
        query: &Query,
        plan: &Plan,
        runnable: &[ActionGroup],
        unsupported: &[String],
        inventory: &[InventoryEntity],
    ) -> AppResult<FallbackResult> {
        info!(
            runnable_groups = runnable.len(),
            unsupported = unsupported.len(),
            "pipeline: partial support, executing supported subset"
        );

        let mut outputs: Vec<ExecutionOutput> = Vec::with_capacity(runnable.len());
        for group in runnable {
            outputs.push(self.executor.execute(group, &query.text).await?);
        }

        let mut content = format!(
            "Note: I can't yet perform {}. Here is what I could do for the rest of your request.",
            unsupported.join(", ")
        );
        for output in &outputs {
            content.push_str("\n\n");
            content.push_str(&output.content);
        }

        let explanation = self
            .cascade
            .explain_unsupported(query, unsupported, inventory)
            .await;
        if let Some(explanation) = &explanation {
            content.push_str("\n\n");
            content.push_str(explanation);
        }

        Ok(FallbackResult::new(ResultKind::PartialSupport, content)
            .with_confidence(plan.confidence)
            .with_data(json!({
                "unsupported_actions": unsupported,
                "executed": outputs,
                "explained": explanation.is_some(),
                "plan": plan,
            })))
    }
}

/// The `error` result for an unrecovered failure.
pub fn error_result(query_text: &str, err: &AppError) -> FallbackResult {
    let content = format!(
        "{} Your question was: \"{}\". Please try rephrasing it, for example \"{REPHRASE_EXAMPLE}\".",
        user_message(err),
        query_text.trim()
    );

    let result = FallbackResult::new(ResultKind::Error, content);
    match err {
        AppError::Llm(llm_err) => result.with_data(json!({
            "error_kind": llm_err.kind(),
            "retry_after": llm_err.retry_after_secs(),
        })),
        _ => result,
    }
}

fn user_message(err: &AppError) -> String {
    match err {
        AppError::Llm(LlmError::AuthenticationFailed { .. }) => {
            "The assistant's language service rejected its credentials, so an administrator needs to check the API key."
                .to_string()
        }
        AppError::Llm(LlmError::QuotaExceeded { retry_after, .. }) => match retry_after {
            Some(secs) => format!(
                "The assistant's language service quota is used up. Please try again in about {secs} seconds."
            ),
            None => "The assistant's language service quota is used up. Please try again later.".to_string(),
        },
        AppError::Llm(LlmError::ModelNotFound { model }) => {
            format!("The configured language model \"{model}\" is not available.")
        }
        AppError::Llm(_) => "The assistant's language service could not handle this request.".to_string(),
        AppError::Validation(msg) => format!("I couldn't process that request because {msg}."),
        _ => "Something went wrong while answering your question.".to_string(),
    }
}
