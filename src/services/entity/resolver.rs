//! Entity Resolver
//!
//! Matches the query (and any entity mentions pulled out of it) against the
//! user's inventory. Each candidate is scored by the strongest strategy that
//! fires: whole-phrase containment (exact), significant-word overlap (word),
//! then the best of partial and token-sort similarity (fuzzy). Candidates
//! that fire no strategy are dropped. Relevance adds status, channel and
//! budget bonuses to the textual score. A status filter only narrows generic
//! listings; named entities match whatever their status.

use std::cmp::Ordering;

use ads_copilot_core::{EntityMatch, ExtractedContext, InventoryEntity, MatchType};
use tracing::debug;

use super::similarity::{contains_phrase, normalize, partial_ratio, token_sort_ratio, word_overlap};
use crate::models::settings::ResolverWeights;
use crate::services::understanding::patterns::{detect_channels, detect_entity_type};

/// Names shorter than this are only matched exactly or by word.
const MIN_FUZZY_LEN: usize = 4;

/// Score given to every item returned by a generic listing ("show my campaigns").
const LISTING_SCORE: f64 = 70.0;

/// Inventory matching service. Pure and deterministic.
#[derive(Debug, Clone, Default)]
pub struct EntityResolver {
    weights: ResolverWeights,
}

impl EntityResolver {
    pub fn new(weights: ResolverWeights) -> Self {
        Self { weights }
    }

    /// Rank inventory items mentioned by the query.
    ///
    /// Names are matched against every status. `status_filter` only narrows
    /// a generic listing ("show my active campaigns"): `None` or `"all"`
    /// keeps every status, otherwise statuses are compared
    /// case-insensitively, with `active` meaning `ENABLED`.
    pub fn resolve(
        &self,
        context: &ExtractedContext,
        query_text: &str,
        inventory: &[InventoryEntity],
        status_filter: Option<&str>,
    ) -> Vec<EntityMatch> {
        let mut texts: Vec<&str> = vec![query_text];
        texts.extend(context.business_entities.iter().map(String::as_str));

        let channels = detect_channels(query_text);
        let optimizing = context.has_optimization_objective();
        let mut matches: Vec<EntityMatch> = inventory
            .iter()
            .filter_map(|entity| {
                let (match_type, score) = self.score_name(&entity.name, &texts)?;
                Some(self.to_match(entity, match_type, score, &channels, optimizing))
            })
            .collect();

        if matches.is_empty() && context.business_entities.is_empty() {
            if let Some(entity_type) = detect_entity_type(query_text) {
                matches = inventory
                    .iter()
                    .filter(|e| e.entity_type == entity_type && status_matches(status_filter, &e.status))
                    .map(|e| self.to_match(e, MatchType::Word, LISTING_SCORE, &channels, optimizing))
                    .collect();
                debug!(
                    entity_type = entity_type.as_str(),
                    count = matches.len(),
                    "resolver: generic reference, listing inventory"
                );
            }
        }

        matches.sort_by(compare_matches);
        debug!(
            inventory = inventory.len(),
            matched = matches.len(),
            status_filter = status_filter.unwrap_or("all"),
            "resolver: resolved entities"
        );
        matches
    }

    fn score_name(&self, name: &str, texts: &[&str]) -> Option<(MatchType, f64)> {
        if texts.iter().any(|text| contains_phrase(text, name)) {
            return Some((MatchType::Exact, 100.0));
        }

        let overlap = texts
            .iter()
            .map(|text| word_overlap(name, text))
            .fold(0.0_f64, f64::max);
        if overlap >= self.weights.word_overlap_threshold {
            return Some((MatchType::Word, round2(overlap)));
        }

        if normalize(name).chars().count() < MIN_FUZZY_LEN {
            return None;
        }
        let fuzzy = texts
            .iter()
            .map(|text| partial_ratio(name, text).max(token_sort_ratio(name, text)))
            .fold(0.0_f64, f64::max);
        (fuzzy > self.weights.fuzzy_threshold).then(|| (MatchType::Fuzzy, round2(fuzzy)))
    }

    fn to_match(
        &self,
        entity: &InventoryEntity,
        match_type: MatchType,
        score: f64,
        channels: &[&str],
        optimizing: bool,
    ) -> EntityMatch {
        EntityMatch {
            entity_type: entity.entity_type,
            id: entity.id.clone(),
            name: entity.name.clone(),
            status: entity.status.clone(),
            match_type,
            match_score: score,
            relevance: round2(score + self.bonus(entity, channels, optimizing)),
        }
    }

    fn bonus(&self, entity: &InventoryEntity, channels: &[&str], optimizing: bool) -> f64 {
        let w = &self.weights;
        let mut bonus = 0.0;

        if entity.is_enabled() {
            bonus += w.enabled_bonus;
        } else if entity.is_paused() {
            bonus += w.paused_bonus;
        }

        let channel_hit = entity
            .channel_type
            .as_deref()
            .map(canonical_channel)
            .is_some_and(|channel| channels.contains(&channel.as_str()));
        if channel_hit {
            bonus += w.channel_bonus;
        }

        if optimizing && entity.budget.is_some_and(|b| b > w.budget_threshold) {
            bonus += w.budget_bonus;
        }
        bonus
    }
}

/// Relevance, then match score, descending; name ascending on ties.
fn compare_matches(a: &EntityMatch, b: &EntityMatch) -> Ordering {
    b.relevance
        .total_cmp(&a.relevance)
        .then_with(|| b.match_score.total_cmp(&a.match_score))
        .then_with(|| a.name.cmp(&b.name))
}

/// Canonical backend status for a user-facing status word.
pub fn canonical_status(status: &str) -> String {
    match status.trim().to_ascii_lowercase().as_str() {
        "active" | "enabled" | "running" | "live" => "ENABLED".to_string(),
        "paused" | "inactive" | "stopped" => "PAUSED".to_string(),
        "removed" | "deleted" => "REMOVED".to_string(),
        other => other.to_ascii_uppercase(),
    }
}

fn status_matches(filter: Option<&str>, status: &str) -> bool {
    match filter.map(str::trim) {
        None | Some("") => true,
        Some(f) if f.eq_ignore_ascii_case("all") || f.eq_ignore_ascii_case("any") => true,
        Some(f) => canonical_status(f) == canonical_status(status),
    }
}

fn canonical_channel(channel: &str) -> String {
    channel.trim().to_ascii_uppercase().replace([' ', '-'], "_")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
