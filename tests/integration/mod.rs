//! Integration Tests Module
//!
//! End-to-end tests for the query pipeline with scripted LLM, inventory and
//! knowledge-base collaborators.

// Shared test doubles
mod support;

// Full pipeline runs: handoff, degradation, error results
mod pipeline_test;

// Fallback cascade ordering and result kinds
mod cascade_test;

// Inventory matching and status filtering
mod resolver_test;

// Settings file and JSON inventory loading
mod storage_test;
