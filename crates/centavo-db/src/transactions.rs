//! Transaction repository implementation.
//!
//! Read-only: the learning core resolves a transaction's description and
//! owner at trigger time and never writes back.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use centavo_core::{Error, Result, TransactionRepository, TransactionSummary};

/// PostgreSQL implementation of [`TransactionRepository`].
pub struct PgTransactionRepository {
    pool: Pool<Postgres>,
}

impl PgTransactionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn get(&self, id: Uuid) -> Result<Option<TransactionSummary>> {
        let row = sqlx::query(
            "SELECT id, account_id, description, category_id FROM transactions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| TransactionSummary {
            id: row.get("id"),
            account_id: row.get("account_id"),
            description: row.get("description"),
            category_id: row.get("category_id"),
        }))
    }
}
