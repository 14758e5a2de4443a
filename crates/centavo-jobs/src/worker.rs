//! Correction worker: drains the queue and runs the learning pipeline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use centavo_core::{CorrectionQueue, Result};

use crate::handler::{CorrectionHandler, JobContext, JobOutcome};
use crate::DEFAULT_POLL_INTERVAL_MS;

/// Configuration for the correction worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Polling interval in milliseconds when the queue is empty.
    pub poll_interval_ms: u64,
    /// Maximum number of concurrently executing jobs.
    pub max_concurrent_jobs: usize,
    /// Execution time budget for one job.
    pub job_timeout: Duration,
    /// Whether to process jobs at all.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_concurrent_jobs: centavo_core::defaults::JOB_MAX_CONCURRENT,
            job_timeout: Duration::from_secs(centavo_core::defaults::JOB_TIMEOUT_SECS),
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `LEARN_WORKER_ENABLED` | `true` | Enable/disable correction processing |
    /// | `LEARN_MAX_CONCURRENT` | `4` | Max concurrent jobs |
    /// | `LEARN_POLL_INTERVAL_MS` | `500` | Polling interval when queue is empty |
    pub fn from_env() -> Self {
        let enabled = std::env::var("LEARN_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let max_concurrent_jobs = std::env::var("LEARN_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(centavo_core::defaults::JOB_MAX_CONCURRENT)
            .max(1);

        let poll_interval_ms = std::env::var("LEARN_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        Self {
            poll_interval_ms,
            max_concurrent_jobs,
            job_timeout: Duration::from_secs(centavo_core::defaults::JOB_TIMEOUT_SECS),
            enabled,
        }
    }

    /// Create a new config with custom poll interval.
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set maximum concurrent jobs.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }

    /// Set the per-job execution time budget.
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// Enable or disable job processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the correction worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// A job was claimed and started.
    JobStarted { job_id: Uuid },
    /// A job completed successfully.
    JobCompleted { job_id: Uuid },
    /// A job failed (it may still be retried by the queue).
    JobFailed { job_id: Uuid, error: String },
    /// Worker started.
    WorkerStarted,
    /// Worker stopped.
    WorkerStopped,
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| centavo_core::Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }
}

/// Worker that processes correction jobs from the queue.
pub struct CorrectionWorker {
    queue: Arc<dyn CorrectionQueue>,
    handler: Arc<dyn CorrectionHandler>,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl CorrectionWorker {
    pub fn new(
        queue: Arc<dyn CorrectionQueue>,
        handler: Arc<dyn CorrectionHandler>,
        config: WorkerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(centavo_core::defaults::EVENT_BUS_CAPACITY);
        Self {
            queue,
            handler,
            config,
            event_tx,
        }
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    /// Run the worker loop with concurrent job processing.
    ///
    /// Claims up to `max_concurrent_jobs` at a time and processes them
    /// concurrently. Only sleeps when the queue is empty.
    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Correction worker is disabled, not starting");
            return;
        }

        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            max_concurrent = self.config.max_concurrent_jobs,
            "Correction worker started"
        );

        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            // Check for shutdown before claiming jobs
            if shutdown_rx.try_recv().is_ok() {
                info!("Correction worker received shutdown signal");
                break;
            }

            let mut claimed = 0;
            let mut tasks = tokio::task::JoinSet::new();

            for _ in 0..self.config.max_concurrent_jobs {
                match self.claim_job().await {
                    Some(job) => {
                        claimed += 1;
                        let worker = self.clone_refs();
                        tasks.spawn(async move {
                            worker.execute_job(job).await;
                        });
                    }
                    None => break,
                }
            }

            if claimed == 0 {
                // Queue empty — sleep before polling again
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Correction worker received shutdown signal");
                        break;
                    }
                    _ = sleep(poll_interval) => {}
                }
            } else {
                debug!(claimed, "Processing correction batch");
                while let Some(result) = tasks.join_next().await {
                    if let Err(e) = result {
                        error!(error = ?e, "Correction task panicked");
                    }
                }
                // No sleep: immediately try to claim more jobs
            }
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!("Correction worker stopped");
    }

    /// Claim the next available job without processing it.
    async fn claim_job(&self) -> Option<centavo_core::CorrectionJob> {
        match self.queue.claim_next().await {
            Ok(Some(job)) => Some(job),
            Ok(None) => None,
            Err(e) => {
                error!(error = ?e, "Failed to claim correction job");
                None
            }
        }
    }

    /// Clone references needed for spawned job tasks.
    fn clone_refs(&self) -> WorkerRef {
        WorkerRef {
            queue: self.queue.clone(),
            handler: self.handler.clone(),
            event_tx: self.event_tx.clone(),
            job_timeout: self.config.job_timeout,
        }
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }

    /// Get the pending job count.
    pub async fn pending_count(&self) -> Result<i64> {
        self.queue.pending_count().await
    }
}

/// Lightweight reference bundle for executing a single job in a spawned task.
struct WorkerRef {
    queue: Arc<dyn CorrectionQueue>,
    handler: Arc<dyn CorrectionHandler>,
    event_tx: broadcast::Sender<WorkerEvent>,
    job_timeout: Duration,
}

impl WorkerRef {
    /// Execute a single claimed job.
    async fn execute_job(self, job: centavo_core::CorrectionJob) {
        let start = Instant::now();
        let job_id = job.id;

        info!(
            subsystem = "jobs",
            component = "worker",
            op = "execute",
            %job_id,
            retry_count = job.retry_count,
            "Processing correction job"
        );

        let _ = self.event_tx.send(WorkerEvent::JobStarted { job_id });

        let ctx = JobContext::new(job);
        let outcome = match tokio::time::timeout(self.job_timeout, self.handler.execute(ctx)).await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    %job_id,
                    "Correction job exceeded timeout of {:?}",
                    self.job_timeout
                );
                JobOutcome::Retry(format!("Job exceeded timeout of {:?}", self.job_timeout))
            }
        };

        match outcome {
            JobOutcome::Success => {
                if let Err(e) = self.queue.complete(job_id).await {
                    error!(error = ?e, %job_id, "Failed to mark job as completed");
                } else {
                    info!(
                        %job_id,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Correction job completed"
                    );
                    let _ = self.event_tx.send(WorkerEvent::JobCompleted { job_id });
                }
            }
            JobOutcome::Retry(error) => {
                if let Err(e) = self.queue.fail(job_id, &error).await {
                    error!(error = ?e, %job_id, "Failed to record job failure");
                } else {
                    warn!(
                        %job_id,
                        %error,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Correction job failed"
                    );
                    let _ = self.event_tx.send(WorkerEvent::JobFailed { job_id, error });
                }
            }
            // Unrecoverable failures skip the retry budget entirely.
            JobOutcome::Failed(error) => {
                if let Err(e) = self.queue.discard(job_id, &error).await {
                    error!(error = ?e, %job_id, "Failed to discard job");
                } else {
                    warn!(
                        %job_id,
                        %error,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Correction job discarded"
                    );
                    let _ = self.event_tx.send(WorkerEvent::JobFailed { job_id, error });
                }
            }
        }
    }
}

/// Builder for creating a correction worker.
pub struct WorkerBuilder {
    queue: Arc<dyn CorrectionQueue>,
    config: WorkerConfig,
    handler: Option<Arc<dyn CorrectionHandler>>,
}

impl WorkerBuilder {
    pub fn new(queue: Arc<dyn CorrectionQueue>) -> Self {
        Self {
            queue,
            config: WorkerConfig::default(),
            handler: None,
        }
    }

    /// Set the worker configuration.
    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the handler.
    pub fn with_handler<H: CorrectionHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Build and return the worker. Defaults to the no-op handler when none
    /// was set.
    pub fn build(self) -> CorrectionWorker {
        let handler = self
            .handler
            .unwrap_or_else(|| Arc::new(crate::handler::NoOpHandler));
        CorrectionWorker::new(self.queue, handler, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_config_default() {
        let config = WorkerConfig::default();
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(config.max_concurrent_jobs, 4);
        assert_eq!(
            config.job_timeout,
            Duration::from_secs(centavo_core::defaults::JOB_TIMEOUT_SECS)
        );
        assert!(config.enabled);
    }

    #[test]
    fn test_worker_config_builder() {
        let config = WorkerConfig::default()
            .with_poll_interval(1000)
            .with_max_concurrent(8)
            .with_job_timeout(Duration::from_millis(250))
            .with_enabled(false);

        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.max_concurrent_jobs, 8);
        assert_eq!(config.job_timeout, Duration::from_millis(250));
        assert!(!config.enabled);
    }

    #[test]
    fn test_worker_config_chaining_order_independence() {
        let config1 = WorkerConfig::default()
            .with_enabled(false)
            .with_max_concurrent(10)
            .with_poll_interval(3000);

        let config2 = WorkerConfig::default()
            .with_poll_interval(3000)
            .with_enabled(false)
            .with_max_concurrent(10);

        assert_eq!(config1.poll_interval_ms, config2.poll_interval_ms);
        assert_eq!(config1.max_concurrent_jobs, config2.max_concurrent_jobs);
        assert_eq!(config1.enabled, config2.enabled);
    }

    #[test]
    fn test_worker_event_clone_and_debug() {
        let job_id = Uuid::now_v7();
        let event = WorkerEvent::JobFailed {
            job_id,
            error: "boom".into(),
        };

        let cloned = event.clone();
        match cloned {
            WorkerEvent::JobFailed { job_id: id, error } => {
                assert_eq!(id, job_id);
                assert_eq!(error, "boom");
            }
            _ => panic!("Wrong event variant"),
        }

        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("JobFailed"));
    }
}
