//! Centralized default constants for the centavo learning engine.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates should reference these constants instead of defining
//! their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// KEYWORD LEARNING
// =============================================================================

/// Maximum keyword rows retained per category. Rows ranked beyond this
/// position by total weight are evicted after each learning pass.
pub const KEYWORD_CAP: i64 = 50;

/// Multiplier applied to manual usage when computing a keyword's total
/// weight. A manual correction is a directly-labeled signal, so it counts
/// three times as much as an incidental automatic hit.
pub const MANUAL_WEIGHT_MULTIPLIER: i64 = 3;

/// Minimum token length kept by the word extractor.
pub const MIN_TOKEN_LEN: usize = 3;

/// Normalized weight assigned to a keyword row on creation, before the
/// normalizer has seen the token's full group.
pub const DEFAULT_NORMALIZED_WEIGHT: f64 = 1.0;

/// Tolerance for comparing normalized-weight sums against 1.0.
pub const WEIGHT_EPSILON: f64 = 1e-9;

// =============================================================================
// JOBS
// =============================================================================

/// Execution time budget for one correction job, in seconds.
pub const JOB_TIMEOUT_SECS: u64 = 60;

/// Maximum concurrent correction jobs per worker.
pub const JOB_MAX_CONCURRENT: usize = 4;

/// Default retry limit before a correction job is marked failed.
pub const JOB_MAX_RETRIES: i32 = 3;

/// Worker polling interval when the queue is empty, in milliseconds.
pub const JOB_POLL_INTERVAL_MS: u64 = 500;

/// Base for exponential retry backoff, in seconds. Attempt `n` is delayed
/// by roughly `RETRY_BACKOFF_BASE_SECS * 2^n` plus jitter.
pub const RETRY_BACKOFF_BASE_SECS: u64 = 2;

/// Capacity of the worker event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learning_constants() {
        assert_eq!(KEYWORD_CAP, 50);
        assert_eq!(MANUAL_WEIGHT_MULTIPLIER, 3);
        assert_eq!(MIN_TOKEN_LEN, 3);
        assert_eq!(DEFAULT_NORMALIZED_WEIGHT, 1.0);
    }

    #[test]
    fn test_job_constants() {
        assert_eq!(JOB_TIMEOUT_SECS, 60);
        assert!(JOB_MAX_CONCURRENT >= 1);
        assert!(JOB_MAX_RETRIES >= 1);
    }
}
