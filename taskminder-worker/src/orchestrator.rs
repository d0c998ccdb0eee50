/// Worker orchestrator
///
/// Drives the two scheduled activities of the worker on one loop:
///
/// ```text
/// WorkerOrchestrator
///   ├─> ReminderSweep: every REMINDER_INTERVAL_MINUTES
///   └─> JobQueue + JobExecutor: every JOB_POLL_INTERVAL_SECS
/// ```
///
/// Work in progress is finished before a shutdown is honoured; the loop only
/// checks the token between ticks.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskminder_worker::dispatch::Dispatcher;
/// use taskminder_worker::orchestrator::{OrchestratorConfig, WorkerOrchestrator};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let orchestrator = WorkerOrchestrator::new(
///     pool,
///     Arc::new(Dispatcher::new()),
///     OrchestratorConfig::default(),
/// );
///
/// let shutdown = orchestrator.shutdown_token();
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     shutdown.cancel();
/// });
///
/// orchestrator.run().await;
/// # Ok(())
/// # }
/// ```

use crate::config::WorkerConfig;
use crate::dispatch::Dispatcher;
use crate::jobs::JobExecutor;
use crate::queue::{JobQueue, QueueError};
use crate::sweep::{ReminderSweep, SweepReport};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Orchestrator timing
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub reminder_interval: Duration,
    pub job_poll_interval: Duration,
    pub job_batch_size: usize,

    /// Running jobs older than this are requeued
    pub job_stale_after: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            reminder_interval: Duration::from_secs(60 * 60),
            job_poll_interval: Duration::from_secs(2),
            job_batch_size: 10,
            job_stale_after: crate::queue::DEFAULT_STALE_AFTER,
        }
    }
}

impl From<&WorkerConfig> for OrchestratorConfig {
    fn from(config: &WorkerConfig) -> Self {
        OrchestratorConfig {
            reminder_interval: config.reminder_interval,
            job_poll_interval: config.job_poll_interval,
            job_batch_size: config.job_batch_size,
            job_stale_after: config.job_stale_after,
        }
    }
}

/// Worker orchestrator
pub struct WorkerOrchestrator {
    sweep: ReminderSweep,
    queue: JobQueue,
    executor: JobExecutor,
    config: OrchestratorConfig,
    shutdown_token: CancellationToken,
}

impl WorkerOrchestrator {
    pub fn new(db: PgPool, dispatcher: Arc<Dispatcher>, config: OrchestratorConfig) -> Self {
        WorkerOrchestrator {
            sweep: ReminderSweep::new(db.clone(), dispatcher.clone()),
            queue: JobQueue::with_batch_size(db.clone(), config.job_batch_size)
                .with_stale_after(config.job_stale_after),
            executor: JobExecutor::new(db, dispatcher),
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Token that stops [`run`](Self::run) when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs one reminder sweep
    pub async fn run_sweep(&self) -> SweepReport {
        self.sweep.run_once().await
    }

    /// Claims and executes one batch of jobs
    ///
    /// Returns how many jobs were claimed.
    pub async fn run_jobs_once(&self) -> Result<usize, QueueError> {
        let jobs = self.queue.claim_jobs(None).await?;

        for job in &jobs {
            if let Err(e) = self.executor.execute(&self.queue, job).await {
                tracing::error!(job_id = %job.id, error = %e, "Failed to record job outcome");
            }
        }

        Ok(jobs.len())
    }

    /// Runs until the shutdown token is cancelled
    ///
    /// The first sweep and the first job poll happen immediately.
    pub async fn run(&self) {
        tracing::info!(
            reminder_interval_secs = self.config.reminder_interval.as_secs(),
            job_poll_interval_secs = self.config.job_poll_interval.as_secs(),
            "Worker orchestrator starting"
        );

        let mut sweep_tick = interval(self.config.reminder_interval);
        sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut poll_tick = interval(self.config.job_poll_interval);
        poll_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_token.cancelled() => break,

                _ = sweep_tick.tick() => {
                    self.run_sweep().await;
                }

                _ = poll_tick.tick() => {
                    if let Err(e) = self.run_jobs_once().await {
                        tracing::error!(error = %e, "Failed to claim notification jobs");
                    }
                }
            }
        }

        tracing::info!("Worker orchestrator shut down");
    }
}
