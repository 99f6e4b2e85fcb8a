//! Data Models
//!
//! Settings and the values exchanged between pipeline stages.

pub mod pipeline;
pub mod settings;

pub use pipeline::*;
pub use settings::*;
