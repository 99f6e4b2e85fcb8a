//! Canned Suggestions
//!
//! Example queries and the static answer used when every other fallback
//! stage has failed.

use ads_copilot_llm::LlmError;

/// Offered when the settings do not configure their own examples.
pub const DEFAULT_EXAMPLE_QUERIES: &[&str] = &[
    "Show me my active campaigns",
    "How did my campaigns perform last week?",
    "Which campaigns have the best ROAS this month?",
    "Compare clicks this month versus last month",
    "Show my budgets and spend pacing",
    "Suggest new keywords for my search campaigns",
];

/// Configured examples, or the defaults when none are configured.
pub fn example_queries(configured: &[String]) -> Vec<String> {
    let configured: Vec<String> = configured
        .iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();
    if configured.is_empty() {
        DEFAULT_EXAMPLE_QUERIES.iter().map(|q| q.to_string()).collect()
    } else {
        configured
    }
}

/// Bulleted list of example queries.
pub fn suggestion_list(examples: &[String]) -> String {
    let mut text = String::from("Here are some things you can ask me:");
    for example in examples {
        text.push_str("\n- ");
        text.push_str(example);
    }
    text
}

/// Opening sentence of the static answer.
pub fn basic_intro(query_text: &str, unsupported: &[String], service_error: Option<&LlmError>) -> String {
    if let Some(err) = service_error {
        let when = match err.retry_after_secs() {
            Some(secs) => format!("in about {secs} seconds"),
            None => "in a moment".to_string(),
        };
        return format!(
            "The assistant's language service is temporarily unavailable, so I couldn't work out \
             how to answer \"{query_text}\". Please try again {when}."
        );
    }
    if !unsupported.is_empty() {
        return format!(
            "I can't yet perform {} for \"{query_text}\".",
            unsupported.join(", ")
        );
    }
    format!("I couldn't match \"{query_text}\" to anything I can look up in your advertising account.")
}
