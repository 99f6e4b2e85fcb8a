//! LLM JSON Responses
//!
//! Locates and decodes the JSON payload in a model response. Models wrap
//! JSON in markdown fences or surround it with prose, so the payload is found
//! by bracket matching (aware of string literals) and then decoded into typed
//! structs. Anything that does not decode is an error; nothing is guessed.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResponseParseError {
    #[error("response was empty")]
    Empty,
    #[error("no JSON value found in response (starts with: {0:?})")]
    NoJson(String),
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("unexpected response shape: {0}")]
    Schema(String),
}

/// Content of the first markdown code fence, or the input unchanged.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_fence = &trimmed[start + 3..];
    // Skip the language tag line (```json)
    let body = match after_fence.find('\n') {
        Some(nl) => &after_fence[nl + 1..],
        None => after_fence,
    };
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// The outermost JSON object or array starting at the first `{` or `[`.
///
/// Brackets inside string literals are ignored. Returns `None` when the
/// brackets never balance.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let mut closers: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => closers.push('}'),
            '[' => closers.push(']'),
            '}' | ']' => {
                if closers.pop() != Some(ch) {
                    return None;
                }
                if closers.is_empty() {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the JSON payload of a response into an untyped value.
pub fn parse_json_value(text: &str) -> Result<Value, ResponseParseError> {
    if text.trim().is_empty() {
        return Err(ResponseParseError::Empty);
    }
    let body = strip_code_fences(text);
    let block = extract_json_block(body)
        .ok_or_else(|| ResponseParseError::NoJson(text.chars().take(80).collect()))?;
    serde_json::from_str(block).map_err(|e| ResponseParseError::InvalidJson(e.to_string()))
}

/// Parse and decode the JSON payload of a response into `T`.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ResponseParseError> {
    let value = parse_json_value(text)?;
    serde_json::from_value(value).map_err(|e| ResponseParseError::Schema(e.to_string()))
}
