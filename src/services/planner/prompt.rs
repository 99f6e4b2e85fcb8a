//! Planner Prompt
//!
//! Prompt text for the planning call. The system prompt lists the closed
//! action catalog and embeds the JSON schema of the expected reply, derived
//! from the same structs the reply is decoded into.

use std::sync::OnceLock;

use ads_copilot_core::{ExtractedContext, SupportedAction, TimePeriod};

use super::response::PlanResponse;
use crate::models::UserContext;

const PLANNER_SYSTEM_TEMPLATE: &str = "\
You are the action planner for an advertising account assistant.
Translate the user's request into action groups drawn from this catalog of actions:
{catalog}

Rules:
- Return zero, one or several action groups. Actions that share the same date ranges and filters belong in one group.
- Use catalog names exactly. If the request needs an operation the catalog lacks, name it in UPPER_SNAKE_CASE anyway; it will be reported to the user as unsupported.
- date_ranges entries are either a named period ({periods}) or an object {\"start_date\": \"YYYY-MM-DD\", \"end_date\": \"YYYY-MM-DD\"}.
- filters entries are objects with field, operator (equals, contains, greater_than, less_than, in, not_in), value and a short description.
- When the request targets specific matched entities, filter on campaign_id or account_id using their ids.
- Return {\"action_groups\": []} when the request is not about the advertising account.

Reply with a single JSON object that validates against this JSON schema:
{schema}";

/// Catalog listing for the system prompt, one action per line.
pub fn catalog_text() -> String {
    SupportedAction::ALL
        .iter()
        .map(|action| {
            let d = action.descriptor();
            let mut line = format!("- {}: {} (hints: {})", d.name, d.description, d.keywords.join(", "));
            if d.mutating {
                line.push_str(" [changes account state]");
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// JSON schema of the planner reply.
pub fn response_schema() -> String {
    let schema = schemars::schema_for!(PlanResponse);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// The planner system prompt, rendered once.
pub fn system_prompt() -> &'static str {
    static PROMPT: OnceLock<String> = OnceLock::new();
    PROMPT.get_or_init(|| {
        let periods = TimePeriod::ALL
            .iter()
            .map(TimePeriod::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        PLANNER_SYSTEM_TEMPLATE
            .replace("{catalog}", &catalog_text())
            .replace("{periods}", &periods)
            .replace("{schema}", &response_schema())
    })
}

/// The per-request user prompt.
///
/// `full_query` is set when `clause` is one part of a compound request.
pub fn user_prompt(
    clause: &str,
    full_query: Option<&str>,
    context: &ExtractedContext,
    user_context: &UserContext,
) -> String {
    let mut prompt = format!("Request: {clause}\n");
    if let Some(full) = full_query {
        prompt.push_str(&format!(
            "This is one part of the larger request: \"{full}\". Plan only this part.\n"
        ));
    }
    prompt.push_str(&format!("Today: {}\n", user_context.today.format("%Y-%m-%d")));
    prompt.push_str(&format!(
        "Detected context: {}\n",
        serde_json::to_string(context).unwrap_or_default()
    ));

    prompt.push_str("Matched entities:\n");
    if user_context.entities.is_empty() {
        prompt.push_str("- none\n");
    }
    for entity in &user_context.entities {
        prompt.push_str(&format!(
            "- {} \"{}\" (id {}, status {}, {:?} match, score {})\n",
            entity.entity_type.as_str(),
            entity.name,
            entity.id,
            entity.status,
            entity.match_type,
            entity.match_score
        ));
    }

    prompt.push_str(&format!(
        "Extracted parameters: {}\n",
        serde_json::to_string(&user_context.parameters).unwrap_or_default()
    ));
    prompt
}
