//! Core traits for centavo storage abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability. The PostgreSQL
//! implementations live in `centavo-db`; an in-memory implementation is
//! provided there for deterministic tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// KEYWORD REPOSITORY
// =============================================================================

/// Repository for keyword rows — the weight store of the learning engine.
///
/// Counter mutations must be atomic at the statement level: two concurrent
/// increments of the same `(category_id, text)` pair may not lose an update.
#[async_trait]
pub trait KeywordRepository: Send + Sync {
    /// Upsert a keyword row per token under `category_id` and increment its
    /// `manual_usage_count` by 1.
    ///
    /// Rows created here default to `normalized_weight = 1.0` and a manual
    /// count of 1. `last_used_at` is refreshed to `at` either way.
    async fn record_manual_use(
        &self,
        category_id: Uuid,
        tokens: &[String],
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Upsert a keyword row per token under `category_id` and increment its
    /// `auto_usage_count` by 1. The automatic counterpart of
    /// [`record_manual_use`](Self::record_manual_use), called when an
    /// uncorrected automatic categorization sticks.
    async fn record_auto_use(
        &self,
        category_id: Uuid,
        tokens: &[String],
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Decrement `auto_usage_count` by 1, floored at 0, for every token that
    /// already has a row under `category_id`. Tokens without a row are
    /// skipped — this never creates rows.
    async fn release_auto_use(&self, category_id: Uuid, tokens: &[String]) -> Result<()>;

    /// Every keyword row with matching `text` across all categories of the
    /// account.
    async fn list_for_token(&self, account_id: Uuid, text: &str) -> Result<Vec<Keyword>>;

    /// All keyword rows of one category, unordered.
    async fn list_for_category(&self, category_id: Uuid) -> Result<Vec<Keyword>>;

    /// Persist one normalization group in a single pass. Either every
    /// `(keyword_id, weight)` update lands or none do.
    async fn set_normalized_weights(&self, updates: &[(Uuid, f64)]) -> Result<()>;

    /// Delete the rows of `category_id` ranked beyond `cap` by total weight
    /// descending, breaking ties by most-recent `last_used_at` kept first,
    /// then ascending `text`. Returns the number of deleted rows.
    async fn trim_to_cap(&self, category_id: Uuid, cap: i64) -> Result<u64>;

    /// Number of keyword rows currently held by the category.
    async fn count_for_category(&self, category_id: Uuid) -> Result<i64>;

    /// Read-only classifier contract: per-category scores for one token
    /// within an account, ordered by normalized weight descending.
    async fn lookup(&self, account_id: Uuid, token: &str) -> Result<Vec<KeywordScore>>;
}

// =============================================================================
// COLLABORATOR REPOSITORIES
// =============================================================================

/// Read-only access to categories.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Category>>;

    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Owning account of the category, when it exists.
    async fn account_of(&self, id: Uuid) -> Result<Option<Uuid>> {
        Ok(self.get(id).await?.map(|c| c.account_id))
    }
}

/// Read-only access to transactions, used at trigger time to snapshot the
/// description text.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<TransactionSummary>>;
}

// =============================================================================
// CORRECTION QUEUE
// =============================================================================

/// At-least-once delivery queue for correction events with consumer-side
/// deduplication.
#[async_trait]
pub trait CorrectionQueue: Send + Sync {
    /// Enqueue a correction event. Returns `None` when a job with the same
    /// dedup key already exists, so double-submits cannot double-count.
    async fn enqueue(&self, event: &CorrectionEvent) -> Result<Option<Uuid>>;

    /// Atomically claim the next pending job whose `next_attempt_at` has
    /// passed, marking it running. Returns `None` when the queue is empty.
    async fn claim_next(&self) -> Result<Option<CorrectionJob>>;

    /// Mark a claimed job completed.
    async fn complete(&self, job_id: Uuid) -> Result<()>;

    /// Record a failure. While `retry_count < max_retries` the job returns
    /// to pending with `next_attempt_at` pushed out by exponential backoff;
    /// otherwise it is marked failed permanently.
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()>;

    /// Mark a job failed permanently, bypassing the retry budget. For
    /// unrecoverable failures such as an undecodable payload, where retrying
    /// cannot change the outcome.
    async fn discard(&self, job_id: Uuid, error: &str) -> Result<()>;

    /// Number of jobs currently pending.
    async fn pending_count(&self) -> Result<i64>;

    /// Queue statistics snapshot.
    async fn stats(&self) -> Result<QueueStats>;
}
