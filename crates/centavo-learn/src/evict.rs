//! Per-category vocabulary cap enforcement.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use centavo_core::defaults::KEYWORD_CAP;
use centavo_core::{KeywordRepository, Result};

/// Enforces the keyword cap for one category at a time.
///
/// Runs synchronously at the end of a learning pass, scoped to the
/// categories that pass touched — not a periodic global sweep. Deletion is
/// idempotent, so overlapping eviction passes are harmless.
pub struct EvictionManager {
    keywords: Arc<dyn KeywordRepository>,
}

impl EvictionManager {
    pub fn new(keywords: Arc<dyn KeywordRepository>) -> Self {
        Self { keywords }
    }

    /// Restore `count(keywords(category)) <= KEYWORD_CAP` by deleting the
    /// rows ranked beyond the cap by total weight. Ties keep the most
    /// recently used row. Returns the number of evicted rows.
    pub async fn evict(&self, category_id: Uuid) -> Result<u64> {
        let evicted = self.keywords.trim_to_cap(category_id, KEYWORD_CAP).await?;

        if evicted > 0 {
            info!(
                subsystem = "learn",
                component = "eviction",
                op = "evict",
                category_id = %category_id,
                evicted_count = evicted,
                "Evicted low-weight keywords"
            );
        } else {
            debug!(
                subsystem = "learn",
                component = "eviction",
                op = "evict",
                category_id = %category_id,
                "Category within cap"
            );
        }

        Ok(evicted)
    }
}
