//! Action Planner
//!
//! Compiles a query plus its context, resolved entities and parameters into a
//! `Plan`. The "which actions" decision is one JSON-mode LLM call per clause.
//! Compound requests ("... and also ...", "... and then ...", "...; ...") are
//! split and each clause is planned on its own, then aggregated.
//!
//! Planning never returns an error: parse failures, LLM errors and timeouts
//! produce the empty plan, with the classified failure reported alongside.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use ads_copilot_core::{ActionGroup, ExtractedContext, Plan};
use ads_copilot_llm::{complete_text_until, LlmError, LlmProvider, LlmRequestOptions, RetryPolicy};
use regex::Regex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::confidence;
use super::prompt::{system_prompt, user_prompt};
use super::response::{dedup_groups, parse_plan_response};
use crate::models::settings::PlannerSettings;
use crate::models::UserContext;
use crate::services::llm_json::ResponseParseError;

/// Why a planning call produced no groups.
#[derive(Debug, Clone)]
pub enum PlanningFailure {
    /// The reply was not a valid plan.
    Parse(ResponseParseError),
    /// The provider failed (after retries, for transient errors).
    Service(LlmError),
    /// The call exceeded the planner deadline.
    Timeout { secs: u64 },
}

impl PlanningFailure {
    /// Provider error, if this failure came from the LLM service.
    pub fn service_error(&self) -> Option<&LlmError> {
        match self {
            PlanningFailure::Service(err) => Some(err),
            _ => None,
        }
    }

    /// Failures that retrying later may fix.
    pub fn is_transient(&self) -> bool {
        match self {
            PlanningFailure::Parse(_) => false,
            PlanningFailure::Service(err) => err.is_transient(),
            PlanningFailure::Timeout { .. } => true,
        }
    }
}

impl std::fmt::Display for PlanningFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanningFailure::Parse(e) => write!(f, "could not read the planner reply: {e}"),
            PlanningFailure::Service(e) => write!(f, "planner service error: {e}"),
            PlanningFailure::Timeout { secs } => write!(f, "planner timed out after {secs}s"),
        }
    }
}

/// A plan and, when planning went wrong, why.
#[derive(Debug, Clone)]
pub struct PlanningOutcome {
    pub plan: Plan,
    pub failure: Option<PlanningFailure>,
}

/// Action planning service.
pub struct ActionPlanner {
    llm: Arc<dyn LlmProvider>,
    retry: RetryPolicy,
    settings: PlannerSettings,
}

impl ActionPlanner {
    pub fn new(llm: Arc<dyn LlmProvider>, retry: RetryPolicy, settings: PlannerSettings) -> Self {
        Self {
            llm,
            retry,
            settings,
        }
    }

    /// Plan `query_text`. Never fails; see `PlanningOutcome::failure`.
    pub async fn plan(
        &self,
        query_text: &str,
        context: &ExtractedContext,
        user_context: &UserContext,
    ) -> PlanningOutcome {
        let clauses = split_compound(query_text, self.settings.max_clauses);

        if clauses.len() <= 1 {
            let outcome = match self.plan_clause(query_text, None, context, user_context).await {
                Ok(groups) => PlanningOutcome {
                    plan: build_plan(query_text, groups),
                    failure: None,
                },
                Err(failure) => {
                    warn!(error = %failure, "planner: planning failed, returning empty plan");
                    PlanningOutcome {
                        plan: Plan::empty(query_text, format!("Planning failed: {failure}.")),
                        failure: Some(failure),
                    }
                }
            };
            log_plan(&outcome.plan);
            return outcome;
        }

        debug!(clauses = clauses.len(), "planner: compound request, planning per clause");
        let mut groups: Vec<ActionGroup> = Vec::new();
        let mut failed_clauses: Vec<String> = Vec::new();
        let mut first_failure: Option<PlanningFailure> = None;

        for clause in &clauses {
            match self.plan_clause(clause, Some(query_text), context, user_context).await {
                Ok(clause_groups) => groups.extend(clause_groups),
                Err(failure) => {
                    warn!(clause = %clause, error = %failure, "planner: clause planning failed");
                    failed_clauses.push(format!("\"{clause}\" ({failure})"));
                    first_failure.get_or_insert(failure);
                }
            }
        }

        let groups = dedup_groups(groups);
        let outcome = match (groups.is_empty(), first_failure) {
            (true, Some(failure)) => PlanningOutcome {
                plan: Plan::empty(
                    query_text,
                    format!("Planning failed for every part of the request: {}.", failed_clauses.join("; ")),
                ),
                failure: Some(failure),
            },
            (_, failure) => {
                let mut plan = build_plan(query_text, groups);
                if !failed_clauses.is_empty() {
                    plan.reasoning
                        .push_str(&format!(" Could not plan: {}.", failed_clauses.join("; ")));
                }
                PlanningOutcome { plan, failure }
            }
        };
        log_plan(&outcome.plan);
        outcome
    }

    async fn plan_clause(
        &self,
        clause: &str,
        full_query: Option<&str>,
        context: &ExtractedContext,
        user_context: &UserContext,
    ) -> Result<Vec<ActionGroup>, PlanningFailure> {
        let prompt = user_prompt(clause, full_query, context, user_context);
        let secs = self.settings.timeout_secs;
        let limit = Duration::from_secs(secs);
        let call = complete_text_until(
            self.llm.as_ref(),
            system_prompt(),
            &prompt,
            LlmRequestOptions::json(self.settings.temperature),
            &self.retry,
            Some(Instant::now() + limit),
        );

        let text = tokio::time::timeout(limit, call)
            .await
            .map_err(|_| PlanningFailure::Timeout { secs })?
            .map_err(classify_llm_error)?;

        debug!(len = text.len(), "planner: received reply");
        parse_plan_response(&text).map_err(PlanningFailure::Parse)
    }
}

/// An empty model reply is a parse problem, not a service outage.
fn classify_llm_error(err: LlmError) -> PlanningFailure {
    match err {
        LlmError::ParseError { .. } => PlanningFailure::Parse(ResponseParseError::Empty),
        other => PlanningFailure::Service(other),
    }
}

fn build_plan(query_text: &str, groups: Vec<ActionGroup>) -> Plan {
    let (confidence, reasoning) = confidence::score(&groups, query_text);
    Plan {
        action_groups: groups,
        confidence,
        reasoning,
        query: query_text.to_string(),
    }
}

fn log_plan(plan: &Plan) {
    info!(
        groups = plan.action_groups.len(),
        actions = plan.total_actions(),
        confidence = plan.confidence,
        "planner: plan ready"
    );
}

fn clause_separator() -> Option<&'static Regex> {
    static SEPARATOR: OnceLock<Option<Regex>> = OnceLock::new();
    SEPARATOR
        .get_or_init(|| Regex::new(r"(?i)\s*(?:;|\band\s+also\b|\band\s+then\b)\s*").ok())
        .as_ref()
}

/// Split a compound request into at most `max_clauses` clauses. Clauses past
/// the limit are folded into the last one.
pub fn split_compound(query_text: &str, max_clauses: usize) -> Vec<String> {
    let Some(separator) = clause_separator() else {
        return vec![query_text.trim().to_string()];
    };

    let mut clauses: Vec<String> = separator
        .split(query_text)
        .map(|c| c.trim().trim_end_matches(['.', '?', '!']).trim())
        .filter(|c| c.chars().any(char::is_alphanumeric))
        .map(str::to_string)
        .collect();

    let max_clauses = max_clauses.max(1);
    if clauses.len() > max_clauses {
        let tail = clauses.split_off(max_clauses - 1).join("; ");
        clauses.push(tail);
    }
    if clauses.len() <= 1 {
        return vec![query_text.trim().to_string()];
    }
    clauses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::ScriptedLlm;
    use ads_copilot_core::SupportedAction;
    use chrono::NaiveDate;

    const MARKER: &str = "action planner";

    fn planner(llm: ScriptedLlm) -> ActionPlanner {
        ActionPlanner::new(Arc::new(llm), RetryPolicy::none(), PlannerSettings::default())
    }

    fn user_context() -> UserContext {
        UserContext::new("u1", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    #[test]
    fn test_split_compound() {
        assert_eq!(
            split_compound("Show my campaigns and also my budgets", 4),
            vec!["Show my campaigns", "my budgets"]
        );
        assert_eq!(
            split_compound("pause Summer Sale; enable Winter Sale and then show budgets.", 4),
            vec!["pause Summer Sale", "enable Winter Sale", "show budgets"]
        );
        assert_eq!(split_compound("a; b; c", 2), vec!["a", "b; c"]);
        assert_eq!(split_compound("Show clicks and impressions", 4), vec!["Show clicks and impressions"]);
        assert_eq!(split_compound("budgets;", 4), vec!["budgets;"]);
    }

    #[tokio::test]
    async fn test_single_clause_plan() {
        let llm = ScriptedLlm::new().reply(
            MARKER,
            r#"{"action_groups": [{"actions": ["GET_BUDGETS"], "date_ranges": ["this_month"]}]}"#,
        );
        let outcome = planner(llm)
            .plan("show my budgets this month", &ExtractedContext::default(), &user_context())
            .await;
        assert!(outcome.failure.is_none());
        assert_eq!(outcome.plan.total_actions(), 1);
        assert_eq!(outcome.plan.confidence, 0.55);
        assert_eq!(outcome.plan.query, "show my budgets this month");
    }

    #[tokio::test]
    async fn test_non_json_reply_yields_empty_plan() {
        let llm = ScriptedLlm::new().reply(MARKER, "I'd be happy to help with your campaigns!");
        let outcome = planner(llm)
            .plan("show campaigns", &ExtractedContext::default(), &user_context())
            .await;
        assert!(outcome.plan.is_empty());
        assert_eq!(outcome.plan.confidence, 0.0);
        assert!(outcome.plan.reasoning.starts_with("Planning failed"));
        assert!(matches!(outcome.failure, Some(PlanningFailure::Parse(_))));
    }

    #[tokio::test]
    async fn test_permanent_service_error_is_classified() {
        let llm = ScriptedLlm::new().fail(
            MARKER,
            LlmError::QuotaExceeded {
                message: "insufficient_quota".to_string(),
                retry_after: Some(60),
            },
        );
        let outcome = planner(llm)
            .plan("show campaigns", &ExtractedContext::default(), &user_context())
            .await;
        let failure = outcome.failure.unwrap();
        assert!(!failure.is_transient());
        assert_eq!(failure.service_error().and_then(LlmError::retry_after_secs), Some(60));
        assert!(outcome.plan.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_empty_plan() {
        let outcome = planner(ScriptedLlm::new().stall(MARKER))
            .plan("show campaigns", &ExtractedContext::default(), &user_context())
            .await;
        assert!(matches!(outcome.failure, Some(PlanningFailure::Timeout { secs: 30 })));
        assert!(outcome.plan.is_empty());
        assert!(!outcome.plan.reasoning.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_retry_after_surfaces_the_rate_limit() {
        let llm = ScriptedLlm::new().fail(
            MARKER,
            LlmError::RateLimited {
                message: "slow down".to_string(),
                retry_after: Some(45),
            },
        );
        let planner = ActionPlanner::new(Arc::new(llm), RetryPolicy::default(), PlannerSettings::default());
        let outcome = planner
            .plan("show campaigns", &ExtractedContext::default(), &user_context())
            .await;

        let failure = outcome.failure.unwrap();
        assert!(failure.is_transient());
        assert_eq!(failure.service_error().and_then(LlmError::retry_after_secs), Some(45));
        assert!(outcome.plan.is_empty());
    }

    #[tokio::test]
    async fn test_compound_request_aggregates_clauses() {
        let llm = ScriptedLlm::new()
            .reply(MARKER, r#"[{"actions": ["GET_CAMPAIGNS"]}]"#)
            .reply(MARKER, "not json");
        let planner = planner(llm);
        let outcome = planner
            .plan(
                "Show my campaigns and also my budgets",
                &ExtractedContext::default(),
                &user_context(),
            )
            .await;

        assert_eq!(outcome.plan.action_groups.len(), 1);
        assert_eq!(
            outcome.plan.action_groups[0].supported_actions(),
            vec![SupportedAction::GetCampaigns]
        );
        assert!(outcome.plan.reasoning.contains("Could not plan: \"my budgets\""));
        assert!(matches!(outcome.failure, Some(PlanningFailure::Parse(_))));
    }
}
