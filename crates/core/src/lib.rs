//! Ads Copilot Core
//!
//! Domain model, closed action catalog, and collaborator traits for the Ads
//! Copilot workspace. This crate has no dependencies on LLM providers, HTTP
//! clients, or configuration loading.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `action` - The closed action vocabulary (`SupportedAction`, `PlannedAction`)
//! - `model` - Per-request data (`Query`, `ExtractedContext`, `EntityMatch`, `Plan`, `FallbackResult`)
//! - `collaborators` - Boundary traits (`InventoryAccessor`, `PlanExecutor`, `KnowledgeBase`)
//! - `registry` - Table-driven executor (`ActionRegistry`, `ActionHandler`)

pub mod action;
pub mod collaborators;
pub mod error;
pub mod model;
pub mod registry;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Action Catalog ─────────────────────────────────────────────────────
pub use action::{ActionDescriptor, PlannedAction, SupportedAction};

// ── Domain Model ───────────────────────────────────────────────────────
pub use model::{
    ActionGroup, DateRange, EntityMatch, EntityType, ExtractedContext, FallbackResult, Filter,
    FilterOperator, InventoryEntity, MatchType, Metric, Objective, Plan, Query, ResultKind,
    TimePeriod,
};

// ── Collaborators ──────────────────────────────────────────────────────
pub use collaborators::{
    ExecutionOutput, InventoryAccessor, KnowledgeAnswer, KnowledgeBase, KnowledgeScope,
    PlanExecutor,
};

// ── Registry ───────────────────────────────────────────────────────────
pub use registry::{ActionHandler, ActionRegistry, ActionRequest};
