//! Confidence Scoring
//!
//! Plan confidence from plan structure alone:
//!
//! | Signal                              | Contribution                  |
//! |-------------------------------------|-------------------------------|
//! | at least one group                  | 0.5 base (0.0 when empty)     |
//! | each group beyond the first         | +0.1, capped at +0.3 in total |
//! | each group with several actions     | +0.1                          |
//! | each group with a date range        | +0.05                         |
//! | each group with a filter            | +0.05                         |
//!
//! The sum is clamped to 1.0 and rounded to two decimals.

use ads_copilot_core::ActionGroup;

const BASE: f64 = 0.5;
const PER_EXTRA_GROUP: f64 = 0.1;
const EXTRA_GROUP_CAP: f64 = 0.3;
const MULTI_ACTION_BONUS: f64 = 0.1;
const DATE_RANGE_BONUS: f64 = 0.05;
const FILTER_BONUS: f64 = 0.05;

/// Confidence in `[0, 1]` and a reasoning sentence for a set of action groups.
pub fn score(groups: &[ActionGroup], query_text: &str) -> (f64, String) {
    (confidence(groups), reasoning(groups, query_text))
}

pub fn confidence(groups: &[ActionGroup]) -> f64 {
    if groups.is_empty() {
        return 0.0;
    }

    let extra_groups = (groups.len() - 1) as f64;
    let mut total = BASE + (PER_EXTRA_GROUP * extra_groups).min(EXTRA_GROUP_CAP);
    for group in groups {
        if group.actions.len() > 1 {
            total += MULTI_ACTION_BONUS;
        }
        if !group.date_ranges.is_empty() {
            total += DATE_RANGE_BONUS;
        }
        if !group.filters.is_empty() {
            total += FILTER_BONUS;
        }
    }

    (total.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// Deterministic description of the groups.
pub fn reasoning(groups: &[ActionGroup], query_text: &str) -> String {
    if groups.is_empty() {
        return format!("No actions could be identified for \"{query_text}\".");
    }

    let mut text = format!(
        "Identified {} action group{} for \"{query_text}\".",
        groups.len(),
        plural(groups.len())
    );

    for (index, group) in groups.iter().enumerate() {
        let actions: Vec<&str> = group.actions.iter().map(|a| a.name()).collect();
        text.push_str(&format!(" Group {}: {}", index + 1, actions.join(", ")));

        if !group.date_ranges.is_empty() {
            let ranges: Vec<&str> = group.date_ranges.iter().map(|r| r.description.as_str()).collect();
            text.push_str(&format!(" over {}", ranges.join(", ")));
        }
        if !group.filters.is_empty() {
            let filters: Vec<&str> = group.filters.iter().map(|f| f.description.as_str()).collect();
            text.push_str(&format!(
                " with {} filter{} ({})",
                group.filters.len(),
                plural(group.filters.len()),
                filters.join("; ")
            ));
        }
        text.push('.');
    }

    let unsupported: Vec<&str> = groups.iter().flat_map(|g| g.unsupported_actions()).collect();
    if !unsupported.is_empty() {
        text.push_str(&format!(" Unsupported actions: {}.", unsupported.join(", ")));
    }
    text
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
