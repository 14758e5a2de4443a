//! # centavo-learn
//!
//! The adaptive keyword-weight learning pipeline.
//!
//! A correction event (a user reassigning a transaction's category) flows
//! through this crate: the word extractor tokenizes the snapshot
//! description, the engine updates usage counters under the old and new
//! categories, the normalizer recomputes each affected token's weight
//! shares across the account, and the eviction manager trims touched
//! categories back under the vocabulary cap.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use centavo_learn::CorrectionEngine;
//!
//! let engine = CorrectionEngine::new(keywords.clone(), categories.clone());
//! let outcome = engine.apply(&event).await?;
//! ```

pub mod engine;
pub mod evict;
pub mod extract;
pub mod normalize;
pub mod score;
pub mod spell;

// Re-export core types
pub use centavo_core::*;

pub use engine::{CorrectionEngine, CorrectionOutcome};
pub use evict::EvictionManager;
pub use extract::extract;
pub use normalize::Normalizer;
pub use score::{score_description, CategoryScore};
pub use spell::{HttpSpellCorrector, NoopSpellCorrector, SpellConfig, SpellCorrector};
