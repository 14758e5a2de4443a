//! Normalized-weight recomputation across one account's categories.

use std::sync::Arc;

use tracing::trace;
use uuid::Uuid;

use centavo_core::{normalized_shares, KeywordRepository, Result};

/// Recomputes normalized weights for token groups.
///
/// A group is every keyword row of one account whose `text` matches a
/// token, across all of the account's categories — the safe scope: a
/// correction may shift weight between categories the correction itself
/// never touched.
pub struct Normalizer {
    keywords: Arc<dyn KeywordRepository>,
}

impl Normalizer {
    pub fn new(keywords: Arc<dyn KeywordRepository>) -> Self {
        Self { keywords }
    }

    /// Recompute normalized weights for every token in the affected set.
    ///
    /// Each group is persisted in a single repository pass, so concurrent
    /// readers never observe a half-written group. Groups whose combined
    /// total weight is zero are left untouched (divide-by-zero guard).
    pub async fn normalize(&self, account_id: Uuid, tokens: &[String]) -> Result<()> {
        for token in tokens {
            let group = self.keywords.list_for_token(account_id, token).await?;
            match normalized_shares(&group) {
                Some(updates) => {
                    self.keywords.set_normalized_weights(&updates).await?;
                    trace!(
                        subsystem = "learn",
                        component = "normalizer",
                        op = "normalize",
                        token = %token,
                        group_size = updates.len(),
                        "Normalized token group"
                    );
                }
                None => {
                    trace!(
                        subsystem = "learn",
                        component = "normalizer",
                        op = "normalize",
                        token = %token,
                        "Zero combined weight, group left unchanged"
                    );
                }
            }
        }
        Ok(())
    }
}
