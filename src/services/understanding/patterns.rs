//! Pattern Rules
//!
//! Case-insensitive regex rules that pull deterministic signals out of the
//! raw query: reporting windows, metrics, objectives, quoted entity names,
//! status words and channel keywords. Compiled once.

use std::sync::OnceLock;

use ads_copilot_core::{EntityType, Metric, Objective, TimePeriod};
use regex::Regex;

struct Rule<T> {
    value: T,
    regex: Regex,
}

fn compile<T: Copy>(raw: &[(T, &str)]) -> Vec<Rule<T>> {
    raw.iter()
        .filter_map(|(value, pattern)| {
            Regex::new(&format!("(?i){pattern}"))
                .ok()
                .map(|regex| Rule { value: *value, regex })
        })
        .collect()
}

/// Values of every matching rule, ordered by where they first occur in `text`.
fn matches_in_order<T: Copy + PartialEq>(rules: &[Rule<T>], text: &str) -> Vec<T> {
    let mut hits: Vec<(usize, T)> = rules
        .iter()
        .filter_map(|rule| rule.regex.find(text).map(|m| (m.start(), rule.value)))
        .collect();
    hits.sort_by_key(|(pos, _)| *pos);

    let mut ordered = Vec::with_capacity(hits.len());
    for (_, value) in hits {
        if !ordered.contains(&value) {
            ordered.push(value);
        }
    }
    ordered
}

fn time_period_rules() -> &'static [Rule<TimePeriod>] {
    static RULES: OnceLock<Vec<Rule<TimePeriod>>> = OnceLock::new();
    RULES.get_or_init(|| {
        compile(&[
            (TimePeriod::Today, r"\btoday\b"),
            (TimePeriod::Yesterday, r"\byesterday\b"),
            (TimePeriod::Last7Days, r"\b(?:last|past|previous)\s+(?:7|seven)\s+days?\b|\bpast\s+week\b"),
            (TimePeriod::Last14Days, r"\b(?:last|past|previous)\s+(?:14|fourteen)\s+days?\b|\b(?:last|past)\s+(?:2|two)\s+weeks\b"),
            (TimePeriod::Last30Days, r"\b(?:last|past|previous)\s+(?:30|thirty)\s+days?\b|\bpast\s+month\b"),
            (TimePeriod::Last90Days, r"\b(?:last|past|previous)\s+(?:90|ninety)\s+days?\b|\b(?:last|past)\s+(?:3|three)\s+months\b"),
            (TimePeriod::ThisWeek, r"\bthis\s+week\b"),
            (TimePeriod::LastWeek, r"\b(?:last|previous)\s+week\b"),
            (TimePeriod::ThisMonth, r"\bthis\s+month\b|\bmonth\s+to\s+date\b|\bmtd\b"),
            (TimePeriod::LastMonth, r"\b(?:last|previous)\s+month\b"),
            (TimePeriod::ThisQuarter, r"\bthis\s+quarter\b|\bquarter\s+to\s+date\b"),
            (TimePeriod::ThisYear, r"\bthis\s+year\b|\byear\s+to\s+date\b|\bytd\b"),
            (TimePeriod::LastYear, r"\b(?:last|previous)\s+year\b"),
        ])
    })
}

fn metric_rules() -> &'static [Rule<Metric>] {
    static RULES: OnceLock<Vec<Rule<Metric>>> = OnceLock::new();
    RULES.get_or_init(|| {
        compile(&[
            (Metric::Roas, r"\broas\b|\breturn\s+on\s+ad\s+spend\b"),
            (Metric::Ctr, r"\bctr\b|\bclick[-\s]?through\s+rates?\b"),
            (Metric::Cpc, r"\bcpc\b|\bcost\s+per\s+click\b"),
            (Metric::Cpa, r"\bcpa\b|\bcost\s+per\s+(?:acquisition|conversion|action)\b"),
            (Metric::Conversions, r"\bconversions\b|\bconversion\s+(?:count|volume)\b"),
            (Metric::Impressions, r"\bimpressions?\b"),
            // "cost per click" must not also count as raw clicks
            (Metric::Clicks, r"\bclicks\b|\bclick\s+volume\b"),
            (Metric::Cost, r"\b(?:spend|spent|spending|ad\s+cost|total\s+cost)\b"),
        ])
    })
}

fn objective_rules() -> &'static [Rule<Objective>] {
    static RULES: OnceLock<Vec<Rule<Objective>>> = OnceLock::new();
    RULES.get_or_init(|| {
        compile(&[
            (Objective::Improve, r"\b(?:improve|improving|boost|increase|grow)\b"),
            (Objective::Optimize, r"\boptimi[sz](?:e|ing|ation)\b"),
            (Objective::Analyze, r"\b(?:analy[sz]e|analysis|insights?|why)\b"),
            (Objective::Compare, r"\b(?:compare|comparison|versus|vs\.?)(?:\s|$)"),
            (Objective::Suggest, r"\b(?:suggest|suggestions?|recommend|recommendations?|ideas?)\b"),
            (Objective::Generate, r"\b(?:generate|create|write|draft)\b"),
        ])
    })
}

fn status_rules() -> &'static [Rule<&'static str>] {
    static RULES: OnceLock<Vec<Rule<&'static str>>> = OnceLock::new();
    RULES.get_or_init(|| {
        compile(&[
            ("ENABLED", r"\b(?:active|enabled|running|live)\b"),
            ("PAUSED", r"\b(?:paused|stopped|inactive)\b"),
            ("REMOVED", r"\b(?:removed|deleted)\b"),
        ])
    })
}

fn entity_type_rules() -> &'static [Rule<EntityType>] {
    static RULES: OnceLock<Vec<Rule<EntityType>>> = OnceLock::new();
    RULES.get_or_init(|| {
        compile(&[
            (EntityType::Campaign, r"\bcampaigns?\b"),
            (EntityType::Account, r"\baccounts?\b"),
        ])
    })
}

fn channel_rules() -> &'static [Rule<&'static str>] {
    static RULES: OnceLock<Vec<Rule<&'static str>>> = OnceLock::new();
    RULES.get_or_init(|| {
        compile(&[
            ("SEARCH", r"\bsearch\b"),
            ("DISPLAY", r"\b(?:display|banner)\b"),
            ("VIDEO", r"\b(?:video|youtube)\b"),
            ("SHOPPING", r"\bshopping\b"),
            ("PERFORMANCE_MAX", r"\b(?:performance\s+max|pmax)\b"),
            ("DEMAND_GEN", r"\b(?:demand\s+gen|discovery)\b"),
            ("APP", r"\bapp\b"),
        ])
    })
}

fn mention_rules() -> &'static [Regex] {
    static RULES: OnceLock<Vec<Regex>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            r#""([^"]{2,80})""#,
            r#"(?:^|\s)'([^']{2,80})'"#,
            r"(?i)\b(?:campaign|account|ad\s+group)s?\s+(?:named|called|titled)\s+([A-Za-z0-9][A-Za-z0-9&'\- ]*?)(?:\s+(?:from|for|in|during|over|with|and|since|last|this)\b|[?.!,;]|$)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Reporting windows named in `text`, in order of appearance.
pub fn detect_time_periods(text: &str) -> Vec<TimePeriod> {
    matches_in_order(time_period_rules(), text)
}

/// Metrics named in `text`, in order of appearance.
pub fn detect_metrics(text: &str) -> Vec<Metric> {
    matches_in_order(metric_rules(), text)
}

/// Objective verbs in `text`, in order of appearance.
pub fn detect_objectives(text: &str) -> Vec<Objective> {
    matches_in_order(objective_rules(), text)
}

/// Quoted phrases and "campaign named X" style mentions, trimmed and deduplicated.
pub fn detect_entity_mentions(text: &str) -> Vec<String> {
    let mut hits: Vec<(usize, String)> = Vec::new();
    for regex in mention_rules() {
        for caps in regex.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let mention = m.as_str().trim();
                if !mention.is_empty() {
                    hits.push((m.start(), mention.to_string()));
                }
            }
        }
    }
    hits.sort_by_key(|(pos, _)| *pos);

    let mut mentions: Vec<String> = Vec::new();
    for (_, mention) in hits {
        if !mentions.iter().any(|m| m.eq_ignore_ascii_case(&mention)) {
            mentions.push(mention);
        }
    }
    mentions
}

/// Campaign status implied by the first status word in `text`.
pub fn detect_status(text: &str) -> Option<&'static str> {
    matches_in_order(status_rules(), text).into_iter().next()
}

/// Entity type referred to generically ("campaigns", "accounts").
pub fn detect_entity_type(text: &str) -> Option<EntityType> {
    matches_in_order(entity_type_rules(), text).into_iter().next()
}

/// Advertising channels named in `text`, as backend channel identifiers.
pub fn detect_channels(text: &str) -> Vec<&'static str> {
    matches_in_order(channel_rules(), text)
}
