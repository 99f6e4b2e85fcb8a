//! Fallback Service
//!
//! Answers queries the plan executor cannot take: knowledge base first,
//! then a generative answer, then canned suggestions.

pub mod cascade;
pub mod suggestions;

pub use cascade::{FallbackCascade, FallbackReason, FallbackRequest};
pub use suggestions::{example_queries, DEFAULT_EXAMPLE_QUERIES};
