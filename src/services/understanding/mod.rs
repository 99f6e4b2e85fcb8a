//! Query Understanding
//!
//! Context and parameter extraction: the deterministic pattern rules and the
//! LLM-assisted extractors built on them.

pub mod context;
pub mod parameters;
pub mod patterns;

pub use context::ContextExtractor;
pub use parameters::{clean_parameters, pattern_parameters, ParameterExtractor};
