//! Error Handling
//!
//! Unified error type for the application crate.
//! Uses thiserror for ergonomic error definitions.

use ads_copilot_core::CoreError;
use ads_copilot_llm::LlmError;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML settings parse errors
    #[error("Settings parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Errors raised by collaborators (inventory, executor, knowledge base)
    #[error(transparent)]
    Core(#[from] CoreError),

    /// LLM provider errors that survived retries
    #[error("Language model error: {0}")]
    Llm(#[from] LlmError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Short machine-readable kind for structured error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Serialization(_) => "serialization",
            AppError::Toml(_) => "config",
            AppError::Core(_) => "backend",
            AppError::Llm(err) => err.kind(),
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
        }
    }

    /// Provider wait hint carried by LLM rate-limit and quota errors.
    pub fn retry_after_secs(&self) -> Option<u32> {
        match self {
            AppError::Llm(err) => err.retry_after_secs(),
            _ => None,
        }
    }
}

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
