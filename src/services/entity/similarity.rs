//! String Similarity
//!
//! Scoring helpers for entity resolution, all on a 0-100 scale. Built on
//! `strsim`'s normalized Levenshtein distance.

use std::collections::HashSet;

/// Words that never identify an entity on their own.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "of", "in", "on", "for", "to", "my", "our", "me", "show",
    "campaign", "campaigns", "account", "accounts", "ad", "ads",
];

/// Lowercase, replace punctuation with spaces, collapse whitespace.
pub fn normalize(text: &str) -> String {
    let mut lowered = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            lowered.extend(c.to_lowercase());
        } else {
            lowered.push(' ');
        }
    }
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn tokens(text: &str) -> Vec<String> {
    normalize(text).split(' ').filter(|t| !t.is_empty()).map(str::to_string).collect()
}

/// Best similarity of the shorter string against every same-length window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    let (short, long) = if a.chars().count() <= b.chars().count() { (a, b) } else { (b, a) };

    let short_len = short.chars().count();
    if short_len == 0 {
        return 0.0;
    }
    let long_chars: Vec<char> = long.chars().collect();
    if short_len >= long_chars.len() {
        return strsim::normalized_levenshtein(&short, &long) * 100.0;
    }

    long_chars
        .windows(short_len)
        .map(|window| {
            let window: String = window.iter().collect();
            strsim::normalized_levenshtein(&short, &window)
        })
        .fold(0.0_f64, f64::max)
        * 100.0
}

/// Similarity after sorting each side's tokens, so word order does not matter.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let sorted = |s: &str| {
        let mut t = tokens(s);
        t.sort();
        t.join(" ")
    };
    strsim::normalized_levenshtein(&sorted(a), &sorted(b)) * 100.0
}

/// Whether `needle` occurs in `haystack` as a whole-word phrase.
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    let needle = normalize(needle);
    if needle.is_empty() {
        return false;
    }
    format!(" {} ", normalize(haystack)).contains(&format!(" {needle} "))
}

/// Share (0-100) of the name's significant words that appear in `text`.
pub fn word_overlap(name: &str, text: &str) -> f64 {
    let significant: Vec<String> = tokens(name)
        .into_iter()
        .filter(|t| t.len() > 1 && !STOPWORDS.contains(&t.as_str()))
        .collect();
    if significant.is_empty() {
        return 0.0;
    }
    let present: HashSet<String> = tokens(text).into_iter().collect();
    let hits = significant.iter().filter(|t| present.contains(*t)).count();
    hits as f64 * 100.0 / significant.len() as f64
}
