//! Ads Copilot LLM
//!
//! Provides the completion-service boundary used by the planning pipeline:
//! - `LlmProvider` trait and request/response types
//! - OpenAI-compatible chat completions provider
//! - `LlmError` taxonomy with transient/permanent classification
//! - Retry with exponential backoff and jitter
//! - HTTP client factory

pub mod http_client;
pub mod openai;
pub mod provider;
pub mod retry;
pub mod types;

// Re-export main types
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use retry::{complete_text, complete_text_until, with_retry, with_retry_until, RetryPolicy};
pub use types::*;
