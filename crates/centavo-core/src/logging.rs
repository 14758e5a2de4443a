//! Structured logging schema and field name constants for centavo.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-token iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "learn", "db", "jobs", "spell"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "engine", "normalizer", "eviction", "pool", "worker"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "apply_correction", "normalize", "evict", "claim_next"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Account UUID owning the categories being operated on.
pub const ACCOUNT_ID: &str = "account_id";

/// Category UUID being operated on.
pub const CATEGORY_ID: &str = "category_id";

/// Transaction UUID a correction refers to (audit only).
pub const TRANSACTION_ID: &str = "transaction_id";

/// Correction job UUID being processed.
pub const JOB_ID: &str = "job_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of tokens extracted from a description.
pub const TOKEN_COUNT: &str = "token_count";

/// Number of keyword rows deleted by an eviction pass.
pub const EVICTED_COUNT: &str = "evicted_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Database table or entity affected.
pub const DB_TABLE: &str = "db_table";
