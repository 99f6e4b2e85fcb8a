//! LLM Provider Trait
//!
//! Defines the common interface for all LLM providers.

use async_trait::async_trait;

use super::types::{LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message};

/// Trait that all LLM providers must implement.
///
/// Pipeline components only ever see `Arc<dyn LlmProvider>`, so tests swap in
/// scripted providers without touching the network.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Send a message and get a complete response.
    ///
    /// # Arguments
    /// * `messages` - Conversation history
    /// * `system` - Optional system prompt
    /// * `request_options` - JSON mode and sampling overrides
    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse>;
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Map an HTTP error status (and optional `Retry-After` header) to an `LlmError`.
///
/// A 429 whose body names an exhausted quota is permanent; any other 429 is a
/// transient rate limit.
pub fn parse_http_error(
    status: u16,
    body: &str,
    retry_after: Option<u32>,
    provider: &str,
) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        408 => LlmError::Timeout {
            message: format!("{}: request timeout", provider),
        },
        429 => {
            let lower = body.to_lowercase();
            if lower.contains("insufficient_quota") || lower.contains("exceeded your current quota") {
                LlmError::QuotaExceeded {
                    message: body.to_string(),
                    retry_after,
                }
            } else {
                LlmError::RateLimited {
                    message: body.to_string(),
                    retry_after,
                }
            }
        }
        400 | 422 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}
