//! Trigger-side helper: turn a user correction into a queued job.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use centavo_core::{CorrectionEvent, CorrectionQueue, Result, TransactionRepository};

/// Enqueue a learning job for a category correction.
///
/// Resolves the transaction to snapshot its description at trigger time, so
/// the background pass learns from the text the user actually saw. Returns
/// the queued job id, or `None` when the queue deduplicated the event or the
/// transaction no longer exists. The user-facing reassignment has already
/// been persisted by the caller; nothing here can fail it.
pub async fn enqueue_correction(
    queue: &dyn CorrectionQueue,
    transactions: &dyn TransactionRepository,
    transaction_id: Uuid,
    old_category_id: Option<Uuid>,
    new_category_id: Uuid,
    corrected_at: DateTime<Utc>,
) -> Result<Option<Uuid>> {
    let transaction = match transactions.get(transaction_id).await? {
        Some(t) => t,
        None => {
            warn!(
                subsystem = "jobs",
                component = "trigger",
                op = "enqueue_correction",
                %transaction_id,
                "Transaction not found, skipping learning"
            );
            return Ok(None);
        }
    };

    let event = CorrectionEvent {
        transaction_id,
        account_id: transaction.account_id,
        description: transaction.description,
        old_category_id,
        new_category_id,
        corrected_at,
    };

    let job_id = queue.enqueue(&event).await?;
    match job_id {
        Some(id) => debug!(
            subsystem = "jobs",
            component = "trigger",
            op = "enqueue_correction",
            %transaction_id,
            job_id = %id,
            "Correction queued"
        ),
        None => debug!(
            subsystem = "jobs",
            component = "trigger",
            op = "enqueue_correction",
            %transaction_id,
            "Duplicate correction dropped"
        ),
    }

    Ok(job_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    use centavo_db::MemoryStore;

    #[tokio::test]
    async fn test_enqueue_snapshots_description() {
        let store = MemoryStore::new();
        let account = Uuid::now_v7();
        let cafe = store.add_category(account, "Cafe");
        let groceries = store.add_category(account, "Groceries");
        let tx = store.add_transaction(account, "coffee starbucks 350", Some(cafe));

        let job_id = enqueue_correction(&store, &store, tx, Some(cafe), groceries, Utc::now())
            .await
            .unwrap()
            .unwrap();

        let job = store.job(job_id).unwrap();
        let event = job.event().unwrap();
        assert_eq!(event.description, "coffee starbucks 350");
        assert_eq!(event.account_id, account);
        assert_eq!(event.old_category_id, Some(cafe));
        assert_eq!(event.new_category_id, groceries);
    }

    #[tokio::test]
    async fn test_missing_transaction_is_a_noop() {
        let store = MemoryStore::new();

        let job_id = enqueue_correction(
            &store,
            &store,
            Uuid::now_v7(),
            None,
            Uuid::now_v7(),
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(job_id.is_none());
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_double_submit_deduplicated() {
        let store = MemoryStore::new();
        let account = Uuid::now_v7();
        let cafe = store.add_category(account, "Cafe");
        let tx = store.add_transaction(account, "coffee", None);
        let at = Utc::now();

        let first = enqueue_correction(&store, &store, tx, None, cafe, at)
            .await
            .unwrap();
        let second = enqueue_correction(&store, &store, tx, None, cafe, at)
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(store.pending_count().await.unwrap(), 1);
    }
}
