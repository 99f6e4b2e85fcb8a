//! Entity Resolution Integration Tests

use ads_copilot::models::settings::ResolverWeights;
use ads_copilot::services::entity::EntityResolver;
use ads_copilot::services::understanding::patterns::detect_status;
use ads_copilot::services::understanding::ContextExtractor;
use ads_copilot_core::{InventoryEntity, MatchType};

use super::support::sale_campaigns;

#[test]
fn test_active_campaigns_with_enabled_filter() {
    let text = "Show me active campaigns";
    let context = ContextExtractor::from_patterns(text);
    let matches = EntityResolver::default().resolve(&context, text, &sale_campaigns(), Some("enabled"));

    let names: Vec<&str> = matches.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Summer Sale"]);
}

#[test]
fn test_status_word_does_not_replace_the_named_campaign() {
    let text = "Why is my Winter Sale campaign not running?";
    let context = ContextExtractor::from_patterns(text);
    let status = detect_status(text);
    assert_eq!(status, Some("ENABLED"));

    let matches = EntityResolver::default().resolve(&context, text, &sale_campaigns(), status);
    let names: Vec<&str> = matches.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Winter Sale"]);
    assert_eq!(matches[0].match_type, MatchType::Exact);
}

#[test]
fn test_generic_listing_ranks_enabled_first() {
    let text = "Show me campaigns";
    let context = ContextExtractor::from_patterns(text);
    let matches = EntityResolver::default().resolve(&context, text, &sale_campaigns(), None);

    let names: Vec<&str> = matches.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Summer Sale", "Winter Sale"]);
    assert!(matches.iter().all(|m| m.match_type == MatchType::Word));
    assert!(matches[0].relevance > matches[1].relevance);
}

#[test]
fn test_quoted_name_is_an_exact_match() {
    let text = "How is \"Summer Sale\" doing?";
    let context = ContextExtractor::from_patterns(text);
    assert_eq!(context.business_entities, vec!["Summer Sale"]);

    let matches = EntityResolver::default().resolve(&context, text, &sale_campaigns(), None);
    assert_eq!(matches[0].name, "Summer Sale");
    assert_eq!(matches[0].match_type, MatchType::Exact);
    assert_eq!(matches[0].match_score, 100.0);
}

#[test]
fn test_paused_filter_and_custom_weights() {
    let text = "which campaigns are paused";
    let context = ContextExtractor::from_patterns(text);
    let weights = ResolverWeights {
        paused_bonus: 40.0,
        ..ResolverWeights::default()
    };
    let matches = EntityResolver::new(weights).resolve(&context, text, &sale_campaigns(), Some("paused"));

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].name, "Winter Sale");
    assert_eq!(matches[0].relevance, 110.0);
}

#[test]
fn test_accounts_are_not_listed_for_campaign_queries() {
    let mut inventory = sale_campaigns();
    inventory.push(InventoryEntity::account("9", "Main Account", "ENABLED"));
    let text = "list my campaigns";
    let context = ContextExtractor::from_patterns(text);

    let matches = EntityResolver::default().resolve(&context, text, &inventory, None);
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m.name != "Main Account"));
}
