//! Settings Models
//!
//! Pipeline configuration, stored as TOML. Every field has a default so a
//! missing or partial settings file still yields a working pipeline.

use ads_copilot_llm::{ProviderConfig, RetryPolicy};
use serde::{Deserialize, Serialize};

/// Top-level pipeline configuration (settings.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default)]
    pub llm: ProviderConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub context: ContextSettings,
    #[serde(default)]
    pub resolver: ResolverWeights,
    #[serde(default)]
    pub planner: PlannerSettings,
    #[serde(default)]
    pub fallback: FallbackSettings,
}

/// Context and parameter extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSettings {
    /// Run the LLM-assisted half of context and parameter extraction.
    #[serde(default = "default_true")]
    pub llm_assist: bool,
    #[serde(default = "default_extraction_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_extraction_timeout() -> u64 {
    15
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            llm_assist: true,
            timeout_secs: default_extraction_timeout(),
        }
    }
}

/// Relevance weights for entity resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverWeights {
    /// Bonus for `ENABLED` entities.
    #[serde(default = "default_enabled_bonus")]
    pub enabled_bonus: f64,
    /// Bonus for `PAUSED` entities.
    #[serde(default = "default_paused_bonus")]
    pub paused_bonus: f64,
    /// Bonus when the query names the entity's advertising channel.
    #[serde(default = "default_channel_bonus")]
    pub channel_bonus: f64,
    /// Bonus for budgets above `budget_threshold` on improve/optimize queries.
    #[serde(default = "default_budget_bonus")]
    pub budget_bonus: f64,
    #[serde(default = "default_budget_threshold")]
    pub budget_threshold: f64,
    /// Fuzzy scores must exceed this to count as a match (0-100).
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    /// Share of the entity name's significant words (0-100) that must appear
    /// in the query for a word match.
    #[serde(default = "default_word_overlap")]
    pub word_overlap_threshold: f64,
}

fn default_enabled_bonus() -> f64 {
    20.0
}

fn default_paused_bonus() -> f64 {
    10.0
}

fn default_channel_bonus() -> f64 {
    15.0
}

fn default_budget_bonus() -> f64 {
    10.0
}

fn default_budget_threshold() -> f64 {
    100.0
}

fn default_fuzzy_threshold() -> f64 {
    70.0
}

fn default_word_overlap() -> f64 {
    60.0
}

impl Default for ResolverWeights {
    fn default() -> Self {
        Self {
            enabled_bonus: default_enabled_bonus(),
            paused_bonus: default_paused_bonus(),
            channel_bonus: default_channel_bonus(),
            budget_bonus: default_budget_bonus(),
            budget_threshold: default_budget_threshold(),
            fuzzy_threshold: default_fuzzy_threshold(),
            word_overlap_threshold: default_word_overlap(),
        }
    }
}

/// Action planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// Deadline for one planning call, retries included.
    #[serde(default = "default_planner_timeout")]
    pub timeout_secs: u64,
    /// Upper bound on clauses planned separately for one compound query.
    #[serde(default = "default_max_clauses")]
    pub max_clauses: usize,
    #[serde(default)]
    pub temperature: f32,
}

fn default_planner_timeout() -> u64 {
    30
}

fn default_max_clauses() -> usize {
    4
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_planner_timeout(),
            max_clauses: default_max_clauses(),
            temperature: 0.0,
        }
    }
}

/// Fallback cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackSettings {
    /// Plans scoring below this are routed to the cascade. Non-empty plans
    /// score at least 0.5, so only a threshold above that catches them.
    #[serde(default = "default_low_confidence")]
    pub low_confidence_threshold: f64,
    /// Minimum knowledge-base confidence for a terminal answer.
    #[serde(default = "default_kb_min_confidence")]
    pub kb_min_confidence: f64,
    /// Deadline for each cascade stage.
    #[serde(default = "default_stage_timeout")]
    pub stage_timeout_secs: u64,
    /// Knowledge-base collection to search, if the store partitions documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_collection: Option<String>,
    /// Example queries offered to the user; the built-in list is used when empty.
    #[serde(default)]
    pub example_queries: Vec<String>,
}

fn default_low_confidence() -> f64 {
    0.3
}

fn default_kb_min_confidence() -> f64 {
    0.3
}

fn default_stage_timeout() -> u64 {
    20
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            low_confidence_threshold: default_low_confidence(),
            kb_min_confidence: default_kb_min_confidence(),
            stage_timeout_secs: default_stage_timeout(),
            knowledge_collection: None,
            example_queries: Vec::new(),
        }
    }
}

impl PipelineSettings {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.llm.model.trim().is_empty() {
            return Err("llm.model must not be empty".to_string());
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }

        if self.retry.multiplier < 1.0 {
            return Err("retry.multiplier must be at least 1.0".to_string());
        }

        for (name, value) in [
            ("fallback.low_confidence_threshold", self.fallback.low_confidence_threshold),
            ("fallback.kb_min_confidence", self.fallback.kb_min_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be between 0.0 and 1.0, got {value}"));
            }
        }

        for (name, value) in [
            ("resolver.fuzzy_threshold", self.resolver.fuzzy_threshold),
            ("resolver.word_overlap_threshold", self.resolver.word_overlap_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!("{name} must be between 0 and 100, got {value}"));
            }
        }

        if self.planner.max_clauses == 0 {
            return Err("planner.max_clauses must be at least 1".to_string());
        }

        for (name, secs) in [
            ("context.timeout_secs", self.context.timeout_secs),
            ("planner.timeout_secs", self.planner.timeout_secs),
            ("fallback.stage_timeout_secs", self.fallback.stage_timeout_secs),
        ] {
            if secs == 0 {
                return Err(format!("{name} must be greater than zero"));
            }
        }

        Ok(())
    }
}
