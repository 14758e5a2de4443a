//! The weight update engine: applies correction events to the keyword
//! store.
//!
//! One engine pass runs under a per-account async lock so that update,
//! normalization, and eviction apply as one unit relative to other passes
//! for the same account. Counter mutations themselves are additionally
//! atomic at the repository level.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use centavo_core::{CategoryRepository, CorrectionEvent, KeywordRepository, Result};

use crate::evict::EvictionManager;
use crate::extract::extract;
use crate::normalize::Normalizer;
use crate::spell::{NoopSpellCorrector, SpellCorrector};

/// Result of applying one correction event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectionOutcome {
    /// Keyword rows were updated.
    Applied {
        /// Number of distinct tokens learned.
        tokens: usize,
        /// Keyword rows removed by the eviction passes.
        evicted: u64,
    },
    /// The description yielded no tokens; nothing was written.
    NoTokens,
    /// The target category disappeared (or changed owner) before the event
    /// ran; nothing was written.
    SkippedMissingCategory,
}

/// Applies correction events to the weight store.
pub struct CorrectionEngine {
    keywords: Arc<dyn KeywordRepository>,
    categories: Arc<dyn CategoryRepository>,
    speller: Arc<dyn SpellCorrector>,
    normalizer: Normalizer,
    eviction: EvictionManager,
    /// One async lock per account, created lazily. Serializes overlapping
    /// learning passes for the same account.
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl CorrectionEngine {
    /// Create an engine without a spell-correction collaborator.
    pub fn new(
        keywords: Arc<dyn KeywordRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self::with_spell_corrector(keywords, categories, Arc::new(NoopSpellCorrector))
    }

    /// Create an engine with a spell-correction collaborator.
    pub fn with_spell_corrector(
        keywords: Arc<dyn KeywordRepository>,
        categories: Arc<dyn CategoryRepository>,
        speller: Arc<dyn SpellCorrector>,
    ) -> Self {
        Self {
            normalizer: Normalizer::new(keywords.clone()),
            eviction: EvictionManager::new(keywords.clone()),
            keywords,
            categories,
            speller,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn account_lock(&self, account_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        // Drop entries no task holds anymore, so the map tracks only
        // accounts with an in-flight pass instead of growing forever.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(account_id).or_default().clone()
    }

    /// Pass extracted tokens through the spell collaborator. A failure is
    /// non-fatal and keeps the raw token.
    async fn spell_pass(&self, tokens: impl IntoIterator<Item = String>) -> Vec<String> {
        let mut corrected = Vec::new();
        for token in tokens {
            match self.speller.correct(&token).await {
                Ok(fixed) if !fixed.is_empty() => corrected.push(fixed),
                Ok(_) => corrected.push(token),
                Err(e) => {
                    warn!(
                        subsystem = "learn",
                        component = "engine",
                        op = "spell",
                        token = %token,
                        error = %e,
                        "Spell correction failed, using raw token"
                    );
                    corrected.push(token);
                }
            }
        }
        corrected.sort();
        corrected.dedup();
        corrected
    }

    /// Apply one correction event.
    ///
    /// Semantics per token of the snapshot description:
    /// - upsert + increment `manual_usage_count` under the new category
    /// - decrement `auto_usage_count` (floored at 0) under the old category
    ///   when it is known, differs from the new one, and already has a row
    ///
    /// then renormalize every affected token across the account and evict
    /// both touched categories back under the cap. Writes touch keyword
    /// rows only — never the transaction or the categories.
    pub async fn apply(&self, event: &CorrectionEvent) -> Result<CorrectionOutcome> {
        let start = Instant::now();

        // The triggering user action already succeeded; a category deleted
        // in the meantime makes this learning pass moot, not an error.
        let category = match self.categories.get(event.new_category_id).await? {
            Some(c) if c.account_id == event.account_id => c,
            _ => {
                warn!(
                    subsystem = "learn",
                    component = "engine",
                    op = "apply_correction",
                    transaction_id = %event.transaction_id,
                    category_id = %event.new_category_id,
                    "Target category no longer exists, skipping correction"
                );
                return Ok(CorrectionOutcome::SkippedMissingCategory);
            }
        };

        let tokens = self.spell_pass(extract(&event.description)).await;
        if tokens.is_empty() {
            debug!(
                subsystem = "learn",
                component = "engine",
                op = "apply_correction",
                transaction_id = %event.transaction_id,
                "Description yielded no tokens, nothing to learn"
            );
            return Ok(CorrectionOutcome::NoTokens);
        }

        let lock = self.account_lock(event.account_id).await;
        let _guard = lock.lock().await;

        self.keywords
            .record_manual_use(event.new_category_id, &tokens, event.corrected_at)
            .await?;

        let old_category = event
            .old_category_id
            .filter(|old| *old != event.new_category_id);
        if let Some(old) = old_category {
            self.keywords.release_auto_use(old, &tokens).await?;
        }

        self.normalizer.normalize(event.account_id, &tokens).await?;

        let mut evicted = self.eviction.evict(event.new_category_id).await?;
        if let Some(old) = old_category {
            evicted += self.eviction.evict(old).await?;
        }

        info!(
            subsystem = "learn",
            component = "engine",
            op = "apply_correction",
            account_id = %event.account_id,
            transaction_id = %event.transaction_id,
            category = %category.name,
            token_count = tokens.len(),
            evicted_count = evicted,
            duration_ms = start.elapsed().as_millis() as u64,
            "Correction applied"
        );

        Ok(CorrectionOutcome::Applied {
            tokens: tokens.len(),
            evicted,
        })
    }

    /// Record an automatic categorization that stuck (no user correction):
    /// increments `auto_usage_count` for the description's tokens under the
    /// assigned category, then renormalizes and evicts.
    pub async fn record_automatic(
        &self,
        account_id: Uuid,
        category_id: Uuid,
        description: &str,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<CorrectionOutcome> {
        if self.categories.account_of(category_id).await? != Some(account_id) {
            return Ok(CorrectionOutcome::SkippedMissingCategory);
        }

        let tokens = self.spell_pass(extract(description)).await;
        if tokens.is_empty() {
            return Ok(CorrectionOutcome::NoTokens);
        }

        let lock = self.account_lock(account_id).await;
        let _guard = lock.lock().await;

        self.keywords
            .record_auto_use(category_id, &tokens, at)
            .await?;
        self.normalizer.normalize(account_id, &tokens).await?;
        let evicted = self.eviction.evict(category_id).await?;

        Ok(CorrectionOutcome::Applied {
            tokens: tokens.len(),
            evicted,
        })
    }

    #[cfg(test)]
    async fn tracked_account_locks(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;

    use centavo_db::MemoryStore;

    #[tokio::test]
    async fn test_account_lock_map_does_not_accumulate() {
        let store = MemoryStore::new();
        let engine = CorrectionEngine::new(Arc::new(store.clone()), Arc::new(store.clone()));

        for _ in 0..8 {
            let account = Uuid::now_v7();
            let cafe = store.add_category(account, "Cafe");
            let event = CorrectionEvent {
                transaction_id: Uuid::now_v7(),
                account_id: account,
                description: "coffee".into(),
                old_category_id: None,
                new_category_id: cafe,
                corrected_at: Utc::now(),
            };
            engine.apply(&event).await.expect("apply failed");
        }

        // Idle entries are reclaimed on the next lock acquisition, so at
        // most the last account's entry can linger.
        assert!(engine.tracked_account_locks().await <= 1);
    }
}
