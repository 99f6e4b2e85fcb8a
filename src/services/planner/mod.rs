//! Action Planning
//!
//! Prompting, reply decoding, confidence scoring and the planner service
//! that ties them together.

pub mod action_planner;
pub mod confidence;
pub mod prompt;
pub mod response;

pub use action_planner::{split_compound, ActionPlanner, PlanningFailure, PlanningOutcome};
pub use response::parse_plan_response;
