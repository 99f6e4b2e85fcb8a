//! Entity Resolution
//!
//! Fuzzy matching of free-text mentions against the user's campaign and
//! account inventory.

pub mod resolver;
pub mod similarity;

pub use resolver::{canonical_status, EntityResolver};
