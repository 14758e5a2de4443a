//! In-memory store for deterministic testing.
//!
//! Implements every storage trait over plain hash maps so the learning
//! pipeline and the job worker can be exercised without a live database.
//! Always compiled (like the Postgres repositories) so integration tests in
//! other crates can use it.
//!
//! ## Usage
//!
//! ```rust
//! use centavo_db::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let account = uuid::Uuid::now_v7();
//! let cafe = store.add_category(account, "Cafe");
//! assert!(store.keyword(cafe, "coffee").is_none());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use centavo_core::defaults::{DEFAULT_NORMALIZED_WEIGHT, JOB_MAX_RETRIES};
use centavo_core::{
    Category, CategoryRepository, CorrectionEvent, CorrectionJob, CorrectionQueue, JobStatus,
    Keyword, KeywordRepository, KeywordScore, QueueStats, Result, TransactionRepository,
    TransactionSummary,
};

use crate::queue::retry_backoff;

#[derive(Default)]
struct Inner {
    categories: HashMap<Uuid, Category>,
    transactions: HashMap<Uuid, TransactionSummary>,
    /// Keyed by `(category_id, text)` — the uniqueness invariant.
    keywords: HashMap<(Uuid, String), Keyword>,
    jobs: Vec<CorrectionJob>,
}

/// In-memory implementation of all centavo storage traits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store lock poisoned")
    }

    /// Seed a category and return its id.
    pub fn add_category(&self, account_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::now_v7();
        self.lock().categories.insert(
            id,
            Category {
                id,
                account_id,
                name: name.to_string(),
                icon: None,
                created_at: Utc::now(),
            },
        );
        id
    }

    /// Seed a transaction and return its id.
    pub fn add_transaction(
        &self,
        account_id: Uuid,
        description: &str,
        category_id: Option<Uuid>,
    ) -> Uuid {
        let id = Uuid::now_v7();
        self.lock().transactions.insert(
            id,
            TransactionSummary {
                id,
                account_id,
                description: description.to_string(),
                category_id,
            },
        );
        id
    }

    /// Seed a keyword row directly, bypassing the usual upsert path.
    pub fn insert_keyword(&self, keyword: Keyword) {
        self.lock()
            .keywords
            .insert((keyword.category_id, keyword.text.clone()), keyword);
    }

    /// Fetch one keyword row by category and token, if present.
    pub fn keyword(&self, category_id: Uuid, text: &str) -> Option<Keyword> {
        self.lock()
            .keywords
            .get(&(category_id, text.to_string()))
            .cloned()
    }

    /// Snapshot of every keyword row, for whole-store assertions.
    pub fn all_keywords(&self) -> Vec<Keyword> {
        self.lock().keywords.values().cloned().collect()
    }

    /// Fetch a queue job by id.
    pub fn job(&self, job_id: Uuid) -> Option<CorrectionJob> {
        self.lock().jobs.iter().find(|j| j.id == job_id).cloned()
    }

    fn account_of_category(inner: &Inner, category_id: Uuid) -> Option<Uuid> {
        inner.categories.get(&category_id).map(|c| c.account_id)
    }

    fn record_use(
        &self,
        category_id: Uuid,
        tokens: &[String],
        at: DateTime<Utc>,
        manual: i32,
        auto: i32,
    ) {
        let mut inner = self.lock();
        for token in tokens {
            let entry = inner
                .keywords
                .entry((category_id, token.clone()))
                .or_insert_with(|| Keyword {
                    id: Uuid::now_v7(),
                    category_id,
                    text: token.clone(),
                    auto_usage_count: 0,
                    manual_usage_count: 0,
                    normalized_weight: DEFAULT_NORMALIZED_WEIGHT,
                    created_at: at,
                    last_used_at: at,
                });
            entry.manual_usage_count += manual;
            entry.auto_usage_count += auto;
            entry.last_used_at = at;
        }
    }
}

#[async_trait]
impl KeywordRepository for MemoryStore {
    async fn record_manual_use(
        &self,
        category_id: Uuid,
        tokens: &[String],
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.record_use(category_id, tokens, at, 1, 0);
        Ok(())
    }

    async fn record_auto_use(
        &self,
        category_id: Uuid,
        tokens: &[String],
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.record_use(category_id, tokens, at, 0, 1);
        Ok(())
    }

    async fn release_auto_use(&self, category_id: Uuid, tokens: &[String]) -> Result<()> {
        let mut inner = self.lock();
        for token in tokens {
            // Existing rows only; decrements floor at zero.
            if let Some(k) = inner.keywords.get_mut(&(category_id, token.clone())) {
                k.auto_usage_count = (k.auto_usage_count - 1).max(0);
            }
        }
        Ok(())
    }

    async fn list_for_token(&self, account_id: Uuid, text: &str) -> Result<Vec<Keyword>> {
        let inner = self.lock();
        Ok(inner
            .keywords
            .values()
            .filter(|k| {
                k.text == text
                    && Self::account_of_category(&inner, k.category_id) == Some(account_id)
            })
            .cloned()
            .collect())
    }

    async fn list_for_category(&self, category_id: Uuid) -> Result<Vec<Keyword>> {
        Ok(self
            .lock()
            .keywords
            .values()
            .filter(|k| k.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn set_normalized_weights(&self, updates: &[(Uuid, f64)]) -> Result<()> {
        let mut inner = self.lock();
        for (id, weight) in updates {
            if let Some(k) = inner.keywords.values_mut().find(|k| k.id == *id) {
                k.normalized_weight = *weight;
            }
        }
        Ok(())
    }

    async fn trim_to_cap(&self, category_id: Uuid, cap: i64) -> Result<u64> {
        let mut inner = self.lock();
        let mut rows: Vec<Keyword> = inner
            .keywords
            .values()
            .filter(|k| k.category_id == category_id)
            .cloned()
            .collect();

        if rows.len() as i64 <= cap {
            return Ok(0);
        }

        // Keep order: total weight DESC, most recently used first, text ASC.
        rows.sort_by(|a, b| {
            b.total_weight()
                .cmp(&a.total_weight())
                .then(b.last_used_at.cmp(&a.last_used_at))
                .then(a.text.cmp(&b.text))
        });

        let evicted = rows.split_off(cap as usize);
        for k in &evicted {
            inner.keywords.remove(&(k.category_id, k.text.clone()));
        }
        Ok(evicted.len() as u64)
    }

    async fn count_for_category(&self, category_id: Uuid) -> Result<i64> {
        Ok(self
            .lock()
            .keywords
            .values()
            .filter(|k| k.category_id == category_id)
            .count() as i64)
    }

    async fn lookup(&self, account_id: Uuid, token: &str) -> Result<Vec<KeywordScore>> {
        let mut scores: Vec<KeywordScore> = self
            .list_for_token(account_id, token)
            .await?
            .into_iter()
            .map(|k| KeywordScore {
                category_id: k.category_id,
                normalized_weight: k.normalized_weight,
                total_weight: k.total_weight(),
            })
            .collect();
        scores.sort_by(|a, b| {
            b.normalized_weight
                .partial_cmp(&a.normalized_weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(scores)
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.lock().categories.get(&id).cloned())
    }
}

#[async_trait]
impl TransactionRepository for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<TransactionSummary>> {
        Ok(self.lock().transactions.get(&id).cloned())
    }
}

#[async_trait]
impl CorrectionQueue for MemoryStore {
    async fn enqueue(&self, event: &CorrectionEvent) -> Result<Option<Uuid>> {
        let mut inner = self.lock();
        let dedup_key = event.dedup_key();
        if inner.jobs.iter().any(|j| j.dedup_key == dedup_key) {
            return Ok(None);
        }

        let now = Utc::now();
        let job = CorrectionJob {
            id: Uuid::now_v7(),
            status: JobStatus::Pending,
            payload: serde_json::to_value(event)?,
            dedup_key,
            retry_count: 0,
            max_retries: JOB_MAX_RETRIES,
            error_message: None,
            next_attempt_at: now,
            created_at: now,
            started_at: None,
            completed_at: None,
        };
        let id = job.id;
        inner.jobs.push(job);
        Ok(Some(id))
    }

    async fn claim_next(&self) -> Result<Option<CorrectionJob>> {
        let now = Utc::now();
        let mut inner = self.lock();
        let job = inner
            .jobs
            .iter_mut()
            .filter(|j| j.status == JobStatus::Pending && j.next_attempt_at <= now)
            .min_by_key(|j| j.created_at);

        Ok(job.map(|j| {
            j.status = JobStatus::Running;
            j.started_at = Some(now);
            j.clone()
        }))
    }

    async fn complete(&self, job_id: Uuid) -> Result<()> {
        let mut inner = self.lock();
        if let Some(j) = inner.jobs.iter_mut().find(|j| j.id == job_id) {
            j.status = JobStatus::Completed;
            j.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()> {
        let now = Utc::now();
        let mut inner = self.lock();
        if let Some(j) = inner.jobs.iter_mut().find(|j| j.id == job_id) {
            if j.retry_count < j.max_retries {
                j.status = JobStatus::Pending;
                j.next_attempt_at = now + retry_backoff(j.retry_count);
                j.retry_count += 1;
                j.error_message = Some(error.to_string());
                j.started_at = None;
            } else {
                j.status = JobStatus::Failed;
                j.completed_at = Some(now);
                j.error_message = Some(error.to_string());
            }
        }
        Ok(())
    }

    async fn discard(&self, job_id: Uuid, error: &str) -> Result<()> {
        let mut inner = self.lock();
        if let Some(j) = inner.jobs.iter_mut().find(|j| j.id == job_id) {
            j.status = JobStatus::Failed;
            j.completed_at = Some(Utc::now());
            j.error_message = Some(error.to_string());
        }
        Ok(())
    }

    async fn pending_count(&self) -> Result<i64> {
        Ok(self
            .lock()
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::Pending)
            .count() as i64)
    }

    async fn stats(&self) -> Result<QueueStats> {
        let inner = self.lock();
        let count = |s: JobStatus| inner.jobs.iter().filter(|j| j.status == s).count() as i64;
        Ok(QueueStats {
            pending: count(JobStatus::Pending),
            running: count(JobStatus::Running),
            completed: count(JobStatus::Completed),
            failed: count(JobStatus::Failed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn event_for(account_id: Uuid, new_category_id: Uuid) -> CorrectionEvent {
        CorrectionEvent {
            transaction_id: Uuid::now_v7(),
            account_id,
            description: "coffee starbucks".into(),
            old_category_id: None,
            new_category_id,
            corrected_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_manual_use_creates_with_defaults() {
        let store = MemoryStore::new();
        let account = Uuid::now_v7();
        let cafe = store.add_category(account, "Cafe");

        store
            .record_manual_use(cafe, &tokens(&["coffee"]), Utc::now())
            .await
            .unwrap();

        let k = store.keyword(cafe, "coffee").unwrap();
        assert_eq!(k.manual_usage_count, 1);
        assert_eq!(k.auto_usage_count, 0);
        assert_eq!(k.normalized_weight, 1.0);
    }

    #[tokio::test]
    async fn test_manual_use_increments_existing() {
        let store = MemoryStore::new();
        let account = Uuid::now_v7();
        let cafe = store.add_category(account, "Cafe");

        for _ in 0..3 {
            store
                .record_manual_use(cafe, &tokens(&["coffee"]), Utc::now())
                .await
                .unwrap();
        }

        assert_eq!(store.keyword(cafe, "coffee").unwrap().manual_usage_count, 3);
    }

    #[tokio::test]
    async fn test_release_floors_at_zero_and_never_creates() {
        let store = MemoryStore::new();
        let account = Uuid::now_v7();
        let cafe = store.add_category(account, "Cafe");

        store
            .record_auto_use(cafe, &tokens(&["coffee"]), Utc::now())
            .await
            .unwrap();

        // Two releases: 1 -> 0 -> still 0.
        store
            .release_auto_use(cafe, &tokens(&["coffee", "ghost"]))
            .await
            .unwrap();
        store
            .release_auto_use(cafe, &tokens(&["coffee"]))
            .await
            .unwrap();

        assert_eq!(store.keyword(cafe, "coffee").unwrap().auto_usage_count, 0);
        assert!(store.keyword(cafe, "ghost").is_none());
    }

    #[tokio::test]
    async fn test_trim_to_cap_keeps_top_by_weight() {
        let store = MemoryStore::new();
        let account = Uuid::now_v7();
        let cafe = store.add_category(account, "Cafe");
        let now = Utc::now();

        for i in 0..55 {
            store.insert_keyword(Keyword {
                id: Uuid::now_v7(),
                category_id: cafe,
                text: format!("token{i:02}"),
                auto_usage_count: i,
                manual_usage_count: 0,
                normalized_weight: 1.0,
                created_at: now,
                last_used_at: now,
            });
        }

        let evicted = store.trim_to_cap(cafe, 50).await.unwrap();
        assert_eq!(evicted, 5);
        assert_eq!(store.count_for_category(cafe).await.unwrap(), 50);
        // The five lowest-weight rows (auto 0..=4) are gone.
        for i in 0..5 {
            assert!(store.keyword(cafe, &format!("token{i:02}")).is_none());
        }
        assert!(store.keyword(cafe, "token05").is_some());
    }

    #[tokio::test]
    async fn test_trim_tie_break_evicts_least_recently_used() {
        let store = MemoryStore::new();
        let account = Uuid::now_v7();
        let cafe = store.add_category(account, "Cafe");
        let now = Utc::now();

        // Equal weights; "stale" was used an hour earlier.
        for (text, used_at) in [("fresh", now), ("stale", now - chrono::Duration::hours(1))] {
            store.insert_keyword(Keyword {
                id: Uuid::now_v7(),
                category_id: cafe,
                text: text.into(),
                auto_usage_count: 1,
                manual_usage_count: 0,
                normalized_weight: 1.0,
                created_at: now,
                last_used_at: used_at,
            });
        }

        store.trim_to_cap(cafe, 1).await.unwrap();
        assert!(store.keyword(cafe, "fresh").is_some());
        assert!(store.keyword(cafe, "stale").is_none());
    }

    #[tokio::test]
    async fn test_lookup_scoped_to_account() {
        let store = MemoryStore::new();
        let account_a = Uuid::now_v7();
        let account_b = Uuid::now_v7();
        let cafe = store.add_category(account_a, "Cafe");
        let other = store.add_category(account_b, "Cafe");

        store
            .record_manual_use(cafe, &tokens(&["coffee"]), Utc::now())
            .await
            .unwrap();
        store
            .record_manual_use(other, &tokens(&["coffee"]), Utc::now())
            .await
            .unwrap();

        let scores = store.lookup(account_a, "coffee").await.unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].category_id, cafe);
        assert_eq!(scores[0].total_weight, 3);
    }

    #[tokio::test]
    async fn test_enqueue_deduplicates() {
        let store = MemoryStore::new();
        let account = Uuid::now_v7();
        let cafe = store.add_category(account, "Cafe");
        let event = event_for(account, cafe);

        assert!(store.enqueue(&event).await.unwrap().is_some());
        assert!(store.enqueue(&event).await.unwrap().is_none());
        assert_eq!(store.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_claim_complete_lifecycle() {
        let store = MemoryStore::new();
        let account = Uuid::now_v7();
        let cafe = store.add_category(account, "Cafe");
        store.enqueue(&event_for(account, cafe)).await.unwrap();

        let job = store.claim_next().await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert!(store.claim_next().await.unwrap().is_none());

        store.complete(job.id).await.unwrap();
        assert_eq!(store.job(job.id).unwrap().status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_fail_repends_with_backoff_until_exhausted() {
        let store = MemoryStore::new();
        let account = Uuid::now_v7();
        let cafe = store.add_category(account, "Cafe");
        store.enqueue(&event_for(account, cafe)).await.unwrap();

        let job = store.claim_next().await.unwrap().unwrap();
        store.fail(job.id, "datastore hiccup").await.unwrap();

        let retried = store.job(job.id).unwrap();
        assert_eq!(retried.status, JobStatus::Pending);
        assert_eq!(retried.retry_count, 1);
        assert!(retried.next_attempt_at > Utc::now());

        // Exhaust the remaining retries.
        for _ in 0..retried.max_retries {
            store.fail(job.id, "datastore hiccup").await.unwrap();
        }
        assert_eq!(store.job(job.id).unwrap().status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_discard_fails_immediately_without_retry() {
        let store = MemoryStore::new();
        let account = Uuid::now_v7();
        let cafe = store.add_category(account, "Cafe");
        store.enqueue(&event_for(account, cafe)).await.unwrap();

        let job = store.claim_next().await.unwrap().unwrap();
        store.discard(job.id, "bad payload").await.unwrap();

        let discarded = store.job(job.id).unwrap();
        assert_eq!(discarded.status, JobStatus::Failed);
        assert_eq!(discarded.retry_count, 0);
        assert_eq!(discarded.error_message.as_deref(), Some("bad payload"));
        assert!(store.claim_next().await.unwrap().is_none());
    }
}
