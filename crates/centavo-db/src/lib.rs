//! # centavo-db
//!
//! PostgreSQL storage layer for the centavo learning engine.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for keywords, categories, and transactions
//! - The deduplicating correction queue
//! - An in-memory store for deterministic tests
//!
//! The schema lives in `migrations/`; consumers that manage schema
//! externally only need `DATABASE_URL` at runtime.
//!
//! ## Example
//!
//! ```rust,ignore
//! use centavo_db::{create_pool, PgKeywordRepository};
//! use centavo_core::KeywordRepository;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool("postgres://localhost/centavo").await?;
//!     let keywords = PgKeywordRepository::new(pool);
//!
//!     let scores = keywords.lookup(account_id, "coffee").await?;
//!     println!("{} categories know this token", scores.len());
//!     Ok(())
//! }
//! ```

pub mod categories;
pub mod keywords;
pub mod memory;
pub mod pool;
pub mod queue;
pub mod transactions;

// Re-export core types
pub use centavo_core::*;

// Re-export repository implementations
pub use categories::PgCategoryRepository;
pub use keywords::PgKeywordRepository;
pub use memory::MemoryStore;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use queue::PgCorrectionQueue;
pub use transactions::PgTransactionRepository;
