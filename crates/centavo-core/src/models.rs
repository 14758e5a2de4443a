//! Core data models for the centavo learning engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::defaults::MANUAL_WEIGHT_MULTIPLIER;

// =============================================================================
// CATEGORY & TRANSACTION TYPES
// =============================================================================

/// A spending category owned by exactly one account.
///
/// Categories are never mutated by the learning core; they are read to
/// verify existence and resolve ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    /// Owning account. Normalization groups are scoped to one account.
    pub account_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Read-only view of a financial transaction, as seen by the learning core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub id: Uuid,
    pub account_id: Uuid,
    /// Free-text description the word extractor tokenizes.
    pub description: String,
    /// Currently assigned category, if any.
    pub category_id: Option<Uuid>,
}

// =============================================================================
// KEYWORD TYPES
// =============================================================================

/// A persisted (category, token) pair with usage counters and a normalized
/// weight. The central entity of the learning engine.
///
/// Invariants maintained by the repositories:
/// - `(category_id, text)` is unique
/// - `auto_usage_count >= 0` and `manual_usage_count >= 0` (decrements floor
///   at zero)
/// - `normalized_weight` is in `[0, 1]`
/// - at most [`crate::defaults::KEYWORD_CAP`] rows per category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub id: Uuid,
    pub category_id: Uuid,
    /// Normalized token: lowercase, length >= 3.
    pub text: String,
    /// Hits from automatic (uncorrected) categorizations.
    pub auto_usage_count: i32,
    /// Hits from explicit user corrections.
    pub manual_usage_count: i32,
    /// This category's 0..1 share of the token's combined signal among all
    /// categories of one account sharing the token.
    pub normalized_weight: f64,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl Keyword {
    /// Combined signal strength of this row. Manual corrections are a
    /// stronger, directly-labeled signal than incidental automatic hits.
    pub fn total_weight(&self) -> i64 {
        self.manual_usage_count as i64 * MANUAL_WEIGHT_MULTIPLIER + self.auto_usage_count as i64
    }
}

/// Per-category score for one token, exposed read-only to the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordScore {
    pub category_id: Uuid,
    pub normalized_weight: f64,
    pub total_weight: i64,
}

// =============================================================================
// CORRECTION TYPES
// =============================================================================

/// A user action reassigning a transaction's category, snapshotted at
/// trigger time.
///
/// The description is captured when the correction happens rather than
/// re-fetched inside the background task, so a later edit of the
/// transaction cannot change what this event learns from. The transaction
/// id is kept for audit logging only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionEvent {
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    /// Description text frozen at trigger time.
    pub description: String,
    /// Category the transaction was moved away from, when known.
    pub old_category_id: Option<Uuid>,
    /// Category the user assigned.
    pub new_category_id: Uuid,
    pub corrected_at: DateTime<Utc>,
}

impl CorrectionEvent {
    /// Deduplication identifier: transaction id plus correction timestamp.
    ///
    /// Two deliveries of the same correction share this key, so the queue
    /// can drop the duplicate and redelivery cannot double-count.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}:{}",
            self.transaction_id,
            self.corrected_at.timestamp_micros()
        )
    }
}

// =============================================================================
// QUEUE TYPES
// =============================================================================

/// Status of a queued correction job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A persisted correction job in the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionJob {
    pub id: Uuid,
    pub status: JobStatus,
    /// Serialized [`CorrectionEvent`].
    pub payload: JsonValue,
    /// Unique key for consumer-side deduplication.
    pub dedup_key: String,
    pub retry_count: i32,
    pub max_retries: i32,
    pub error_message: Option<String>,
    /// Earliest instant the job may be claimed (advanced by retry backoff).
    pub next_attempt_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CorrectionJob {
    /// Deserialize the correction event carried by this job.
    pub fn event(&self) -> crate::error::Result<CorrectionEvent> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// Queue statistics summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: i64,
    pub running: i64,
    pub completed: i64,
    pub failed: i64,
}
