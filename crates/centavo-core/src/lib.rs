//! # centavo-core
//!
//! Core types, traits, and abstractions for the centavo adaptive keyword
//! learning engine.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the other centavo crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod weights;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use weights::normalized_shares;
