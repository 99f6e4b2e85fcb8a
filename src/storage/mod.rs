//! Storage Layer
//!
//! Settings loading and the file-backed inventory used by the CLI.

pub mod config;
pub mod inventory;

pub use config::*;
pub use inventory::*;
