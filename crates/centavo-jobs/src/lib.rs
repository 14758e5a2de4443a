//! # centavo-jobs
//!
//! Background worker for correction learning jobs.
//!
//! This crate provides:
//! - The trigger helper that snapshots a transaction and queues a correction
//! - Async job processing with concurrent workers
//! - Worker lifecycle notifications via broadcast channels
//! - Retry with exponential backoff, delegated to the queue
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use centavo_jobs::{LearningHandler, WorkerBuilder, WorkerConfig};
//! use centavo_learn::CorrectionEngine;
//!
//! let engine = Arc::new(CorrectionEngine::new(keywords, categories));
//!
//! let worker = WorkerBuilder::new(queue)
//!     .with_config(WorkerConfig::from_env())
//!     .with_handler(LearningHandler::new(engine))
//!     .build();
//!
//! let handle = worker.start();
//!
//! // Listen for events
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! // Graceful shutdown
//! handle.shutdown().await?;
//! ```

pub mod handler;
pub mod trigger;
pub mod worker;

// Re-export core types
pub use centavo_core::*;

pub use handler::{CorrectionHandler, JobContext, JobOutcome, LearningHandler, NoOpHandler};
pub use trigger::enqueue_correction;
pub use worker::{CorrectionWorker, WorkerBuilder, WorkerConfig, WorkerEvent, WorkerHandle};

/// Default maximum retries for failed jobs.
pub const DEFAULT_MAX_RETRIES: i32 = centavo_core::defaults::JOB_MAX_RETRIES;

/// Default polling interval for job processing (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = centavo_core::defaults::JOB_POLL_INTERVAL_MS;
