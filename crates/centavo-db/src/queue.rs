//! Correction queue repository implementation.

use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use async_trait::async_trait;
use centavo_core::defaults::{JOB_MAX_RETRIES, RETRY_BACKOFF_BASE_SECS};
use centavo_core::{
    CorrectionEvent, CorrectionJob, CorrectionQueue, Error, JobStatus, QueueStats, Result,
};

/// Exponential backoff with jitter for retry attempt `retry_count`.
///
/// Roughly `base * 2^n` seconds plus up to `base` seconds of jitter, capped
/// at attempt 6 so the delay stays bounded.
pub(crate) fn retry_backoff(retry_count: i32) -> Duration {
    let base = RETRY_BACKOFF_BASE_SECS;
    let exp = base.saturating_mul(1u64 << retry_count.clamp(0, 6) as u32);
    let jitter = rand::thread_rng().gen_range(0..=base);
    Duration::seconds((exp + jitter) as i64)
}

/// PostgreSQL implementation of [`CorrectionQueue`].
pub struct PgCorrectionQueue {
    pool: Pool<Postgres>,
}

impl PgCorrectionQueue {
    /// Create a new PgCorrectionQueue with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    #[allow(dead_code)]
    fn status_to_str(status: JobStatus) -> &'static str {
        match status {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    fn str_to_status(s: &str) -> JobStatus {
        match s {
            "running" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }

    /// Parse a queue row into a CorrectionJob struct.
    fn parse_job_row(row: sqlx::postgres::PgRow) -> CorrectionJob {
        let status: String = row.get("status");
        CorrectionJob {
            id: row.get("id"),
            status: Self::str_to_status(&status),
            payload: row.get("payload"),
            dedup_key: row.get("dedup_key"),
            retry_count: row.get("retry_count"),
            max_retries: row.get("max_retries"),
            error_message: row.get("error_message"),
            next_attempt_at: row.get("next_attempt_at"),
            created_at: row.get("created_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        }
    }
}

#[async_trait]
impl CorrectionQueue for PgCorrectionQueue {
    async fn enqueue(&self, event: &CorrectionEvent) -> Result<Option<Uuid>> {
        let job_id = Uuid::now_v7();
        let now = Utc::now();
        let payload = serde_json::to_value(event)?;

        // ON CONFLICT DO NOTHING makes redelivery of the same correction a
        // no-op: the dedup key is unique across the queue's lifetime.
        let inserted = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO correction_queue
                 (id, status, payload, dedup_key, max_retries, next_attempt_at, created_at)
             VALUES ($1, 'pending', $2, $3, $4, $5, $5)
             ON CONFLICT (dedup_key) DO NOTHING
             RETURNING id",
        )
        .bind(job_id)
        .bind(&payload)
        .bind(event.dedup_key())
        .bind(JOB_MAX_RETRIES)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(inserted)
    }

    async fn claim_next(&self) -> Result<Option<CorrectionJob>> {
        let now = Utc::now();

        // FOR UPDATE SKIP LOCKED lets concurrent workers claim without
        // blocking each other.
        let row = sqlx::query(
            "UPDATE correction_queue
             SET status = 'running', started_at = $1
             WHERE id = (
                 SELECT id FROM correction_queue
                 WHERE status = 'pending' AND next_attempt_at <= $1
                 ORDER BY created_at ASC
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING id, status, payload, dedup_key, retry_count, max_retries,
                       error_message, next_attempt_at, created_at, started_at, completed_at",
        )
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_job_row))
    }

    async fn complete(&self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE correction_queue
             SET status = 'completed', completed_at = $1
             WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let (retry_count, max_retries): (i32, i32) =
            sqlx::query_as("SELECT retry_count, max_retries FROM correction_queue WHERE id = $1")
                .bind(job_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;

        if retry_count < max_retries {
            // Retry: back to pending with backoff applied.
            let next = now + retry_backoff(retry_count);
            sqlx::query(
                "UPDATE correction_queue
                 SET status = 'pending', retry_count = $1, error_message = $2,
                     next_attempt_at = $3, started_at = NULL
                 WHERE id = $4",
            )
            .bind(retry_count + 1)
            .bind(error)
            .bind(next)
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        } else {
            // Max retries exceeded: mark as failed.
            sqlx::query(
                "UPDATE correction_queue
                 SET status = 'failed', completed_at = $1, error_message = $2
                 WHERE id = $3",
            )
            .bind(now)
            .bind(error)
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn discard(&self, job_id: Uuid, error: &str) -> Result<()> {
        sqlx::query(
            "UPDATE correction_queue
             SET status = 'failed', completed_at = $1, error_message = $2
             WHERE id = $3",
        )
        .bind(Utc::now())
        .bind(error)
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn pending_count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM correction_queue WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(count)
    }

    async fn stats(&self) -> Result<QueueStats> {
        let row = sqlx::query(
            "SELECT
                 COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                 COUNT(*) FILTER (WHERE status = 'running') AS running,
                 COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                 COUNT(*) FILTER (WHERE status = 'failed') AS failed
             FROM correction_queue",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(QueueStats {
            pending: row.get("pending"),
            running: row.get("running"),
            completed: row.get("completed"),
            failed: row.get("failed"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_str_roundtrip() {
        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            let s = PgCorrectionQueue::status_to_str(status);
            assert_eq!(PgCorrectionQueue::str_to_status(s), status);
        }
    }

    #[test]
    fn test_retry_backoff_grows() {
        // Jitter adds at most RETRY_BACKOFF_BASE_SECS, so attempt 3's floor
        // exceeds attempt 0's ceiling.
        let first = retry_backoff(0);
        let later = retry_backoff(3);
        assert!(first.num_seconds() >= RETRY_BACKOFF_BASE_SECS as i64);
        assert!(later.num_seconds() > first.num_seconds());
    }

    #[test]
    fn test_retry_backoff_caps_exponent() {
        // Large retry counts must not overflow the shift.
        let capped = retry_backoff(100);
        assert!(capped.num_seconds() <= (RETRY_BACKOFF_BASE_SECS as i64) * 65 + 1);
    }
}
