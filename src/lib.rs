//! Ads Copilot
//!
//! Query understanding and action planning for an advertising-account
//! assistant. A free-text question becomes either a plan of catalog actions
//! for the executor or a direct answer from the fallback cascade.
//!
//! It includes:
//! - Pipeline services (context, entities, parameters, planner, fallback)
//! - Storage layer (settings file, JSON inventory)
//! - Data models and utilities

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::{PipelineOutcome, PipelineSettings, UserContext};
pub use services::{DryRunHandler, PipelineDeps, QueryPipeline};
pub use storage::{ConfigService, JsonFileInventory};
pub use utils::error::{AppError, AppResult};
