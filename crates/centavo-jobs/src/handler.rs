//! Handlers executed by the correction worker for each claimed job.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use centavo_core::CorrectionJob;
use centavo_learn::{CorrectionEngine, CorrectionOutcome};

/// Context provided to a handler for one claimed job.
pub struct JobContext {
    /// The job being processed.
    pub job: CorrectionJob,
}

impl JobContext {
    pub fn new(job: CorrectionJob) -> Self {
        Self { job }
    }
}

/// Result of handler execution, mapped by the worker onto the queue:
/// `Success` completes the job, `Retry` goes through
/// [`CorrectionQueue::fail`](centavo_core::CorrectionQueue::fail) (re-pend
/// with backoff until the retry budget is spent), and `Failed` is discarded
/// immediately without retry.
#[derive(Debug)]
pub enum JobOutcome {
    /// The learning pass ran (including the no-op and skip cases).
    Success,
    /// Unrecoverable failure.
    Failed(String),
    /// Transient failure worth another attempt.
    Retry(String),
}

/// Trait for correction job handlers.
#[async_trait]
pub trait CorrectionHandler: Send + Sync {
    async fn execute(&self, ctx: JobContext) -> JobOutcome;
}

/// Runs the learning pipeline for each claimed correction.
pub struct LearningHandler {
    engine: Arc<CorrectionEngine>,
}

impl LearningHandler {
    pub fn new(engine: Arc<CorrectionEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CorrectionHandler for LearningHandler {
    async fn execute(&self, ctx: JobContext) -> JobOutcome {
        // A payload that does not decode is a poisoned job; retrying cannot
        // fix it.
        let event = match ctx.job.event() {
            Ok(event) => event,
            Err(e) => return JobOutcome::Failed(format!("Undecodable payload: {e}")),
        };

        match self.engine.apply(&event).await {
            Ok(CorrectionOutcome::Applied { tokens, evicted }) => {
                debug!(
                    subsystem = "jobs",
                    component = "learning_handler",
                    op = "execute",
                    job_id = %ctx.job.id,
                    token_count = tokens,
                    evicted_count = evicted,
                    "Correction learned"
                );
                JobOutcome::Success
            }
            // Nothing to learn is still a finished job.
            Ok(CorrectionOutcome::NoTokens) | Ok(CorrectionOutcome::SkippedMissingCategory) => {
                JobOutcome::Success
            }
            Err(e) => JobOutcome::Retry(e.to_string()),
        }
    }
}

/// No-op handler for testing.
pub struct NoOpHandler;

#[async_trait]
impl CorrectionHandler for NoOpHandler {
    async fn execute(&self, _ctx: JobContext) -> JobOutcome {
        JobOutcome::Success
    }
}
