//! Category repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use centavo_core::{Category, CategoryRepository, Error, Result};

/// PostgreSQL implementation of [`CategoryRepository`].
pub struct PgCategoryRepository {
    pool: Pool<Postgres>,
}

impl PgCategoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Category>> {
        let row = sqlx::query(
            "SELECT id, account_id, name, icon, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| Category {
            id: row.get("id"),
            account_id: row.get("account_id"),
            name: row.get("name"),
            icon: row.get("icon"),
            created_at: row.get("created_at"),
        }))
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(exists)
    }
}
