//! Keyword repository implementation.
//!
//! Counter mutations are single SQL statements, so concurrent corrections
//! touching the same `(category_id, text)` pair cannot lose updates: the
//! upsert-and-increment and the floored decrement are both atomic on the
//! database side.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use centavo_core::{Error, Keyword, KeywordRepository, KeywordScore, Result};

/// PostgreSQL implementation of [`KeywordRepository`].
pub struct PgKeywordRepository {
    pool: Pool<Postgres>,
}

impl PgKeywordRepository {
    /// Create a new PgKeywordRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse a keyword row into a Keyword struct.
    fn parse_keyword_row(row: sqlx::postgres::PgRow) -> Keyword {
        Keyword {
            id: row.get("id"),
            category_id: row.get("category_id"),
            text: row.get("text"),
            auto_usage_count: row.get("auto_usage_count"),
            manual_usage_count: row.get("manual_usage_count"),
            normalized_weight: row.get("normalized_weight"),
            created_at: row.get("created_at"),
            last_used_at: row.get("last_used_at"),
        }
    }

    /// Upsert every token under `category_id`, adding `manual`/`auto` to the
    /// respective counter in one atomic statement.
    async fn record_use(
        &self,
        category_id: Uuid,
        tokens: &[String],
        at: DateTime<Utc>,
        manual: i32,
        auto: i32,
    ) -> Result<()> {
        if tokens.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = tokens.iter().map(|_| Uuid::now_v7()).collect();

        sqlx::query(
            "INSERT INTO keywords
                 (id, category_id, text, auto_usage_count, manual_usage_count,
                  normalized_weight, created_at, last_used_at)
             SELECT t.id, $1, t.text, $4, $5, 1.0, $6, $6
             FROM unnest($2::uuid[], $3::text[]) AS t(id, text)
             ON CONFLICT (category_id, text) DO UPDATE
             SET auto_usage_count = keywords.auto_usage_count + $4,
                 manual_usage_count = keywords.manual_usage_count + $5,
                 last_used_at = EXCLUDED.last_used_at",
        )
        .bind(category_id)
        .bind(&ids)
        .bind(tokens)
        .bind(auto)
        .bind(manual)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }
}

#[async_trait]
impl KeywordRepository for PgKeywordRepository {
    async fn record_manual_use(
        &self,
        category_id: Uuid,
        tokens: &[String],
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.record_use(category_id, tokens, at, 1, 0).await
    }

    async fn record_auto_use(
        &self,
        category_id: Uuid,
        tokens: &[String],
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.record_use(category_id, tokens, at, 0, 1).await
    }

    async fn release_auto_use(&self, category_id: Uuid, tokens: &[String]) -> Result<()> {
        if tokens.is_empty() {
            return Ok(());
        }

        // Existing rows only; GREATEST floors the counter at zero.
        sqlx::query(
            "UPDATE keywords
             SET auto_usage_count = GREATEST(auto_usage_count - 1, 0)
             WHERE category_id = $1 AND text = ANY($2)",
        )
        .bind(category_id)
        .bind(tokens)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn list_for_token(&self, account_id: Uuid, text: &str) -> Result<Vec<Keyword>> {
        let rows = sqlx::query(
            "SELECT k.id, k.category_id, k.text, k.auto_usage_count, k.manual_usage_count,
                    k.normalized_weight, k.created_at, k.last_used_at
             FROM keywords k
             JOIN categories c ON c.id = k.category_id
             WHERE c.account_id = $1 AND k.text = $2",
        )
        .bind(account_id)
        .bind(text)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_keyword_row).collect())
    }

    async fn list_for_category(&self, category_id: Uuid) -> Result<Vec<Keyword>> {
        let rows = sqlx::query(
            "SELECT id, category_id, text, auto_usage_count, manual_usage_count,
                    normalized_weight, created_at, last_used_at
             FROM keywords WHERE category_id = $1",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_keyword_row).collect())
    }

    async fn set_normalized_weights(&self, updates: &[(Uuid, f64)]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = updates.iter().map(|(id, _)| *id).collect();
        let weights: Vec<f64> = updates.iter().map(|(_, w)| *w).collect();

        // One statement for the whole group — no partial writes.
        sqlx::query(
            "UPDATE keywords
             SET normalized_weight = u.weight
             FROM unnest($1::uuid[], $2::float8[]) AS u(id, weight)
             WHERE keywords.id = u.id",
        )
        .bind(&ids)
        .bind(&weights)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn trim_to_cap(&self, category_id: Uuid, cap: i64) -> Result<u64> {
        // Keep order: total weight DESC, most recently used first, then text
        // for full determinism among exact ties.
        let result = sqlx::query(
            "DELETE FROM keywords
             WHERE id IN (
                 SELECT id FROM keywords
                 WHERE category_id = $1
                 ORDER BY (manual_usage_count * 3 + auto_usage_count) DESC,
                          last_used_at DESC,
                          text ASC
                 OFFSET $2
             )",
        )
        .bind(category_id)
        .bind(cap)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }

    async fn count_for_category(&self, category_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM keywords WHERE category_id = $1")
                .bind(category_id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(count)
    }

    async fn lookup(&self, account_id: Uuid, token: &str) -> Result<Vec<KeywordScore>> {
        let rows = sqlx::query(
            "SELECT k.category_id, k.normalized_weight,
                    (k.manual_usage_count * 3 + k.auto_usage_count)::bigint AS total_weight
             FROM keywords k
             JOIN categories c ON c.id = k.category_id
             WHERE c.account_id = $1 AND k.text = $2
             ORDER BY k.normalized_weight DESC",
        )
        .bind(account_id)
        .bind(token)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| KeywordScore {
                category_id: row.get("category_id"),
                normalized_weight: row.get("normalized_weight"),
                total_weight: row.get("total_weight"),
            })
            .collect())
    }
}
