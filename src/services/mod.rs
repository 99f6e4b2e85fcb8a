//! Services
//!
//! Pipeline stages and the orchestrator that runs them.

pub mod dry_run;
pub mod entity;
pub mod fallback;
pub mod llm_json;
pub mod pipeline;
pub mod planner;
pub mod understanding;

#[cfg(test)]
pub mod test_support;

pub use dry_run::DryRunHandler;
pub use entity::EntityResolver;
pub use fallback::{FallbackCascade, FallbackReason, FallbackRequest};
pub use pipeline::{error_result, PipelineDeps, QueryPipeline};
pub use planner::{ActionPlanner, PlanningFailure, PlanningOutcome};
pub use understanding::{ContextExtractor, ParameterExtractor};
