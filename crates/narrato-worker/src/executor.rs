//! Job executor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use narrato_queue::{Delivery, JobQueue};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::processor::{process_job, JobOutcome, ProcessingContext};

/// Consumes render jobs from the stream and runs them one at a time.
pub struct JobExecutor {
    config: WorkerConfig,
    queue: Arc<JobQueue>,
    ctx: Arc<ProcessingContext>,
    shutdown: watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    /// `shutdown` is the sender side of the channel the context's FFmpeg
    /// runner listens on.
    pub fn new(
        config: WorkerConfig,
        queue: JobQueue,
        ctx: ProcessingContext,
        shutdown: watch::Sender<bool>,
    ) -> Self {
        Self {
            config,
            queue: Arc::new(queue),
            ctx: Arc::new(ctx),
            shutdown,
            consumer_name: format!("worker-{}", Uuid::new_v4()),
        }
    }

    pub fn consumer_name(&self) -> &str {
        &self.consumer_name
    }

    /// Run until [`JobExecutor::shutdown`] is called.
    ///
    /// Stream reads are never cancelled mid-flight: a read that Redis has
    /// answered always yields its deliveries. Shutdown is noticed between
    /// reads, which block for at most `poll_block`.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting job executor '{}' (batch size {}, jobs run sequentially)",
            self.consumer_name, self.config.batch_size
        );

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut claims = ClaimSchedule::new(self.config.claim_interval);
        let block_ms = self.config.poll_block.as_millis() as u64;

        while !*shutdown_rx.borrow() {
            if claims.due(Instant::now()) {
                self.claim_orphans().await;
                continue;
            }

            match self
                .queue
                .consume(&self.consumer_name, block_ms, self.config.batch_size)
                .await
            {
                Ok(deliveries) => {
                    for delivery in deliveries {
                        self.execute(delivery).await;
                    }
                }
                Err(e) => {
                    error!("Error consuming jobs: {}", e);
                    tokio::select! {
                        _ = shutdown_rx.changed() => {}
                        _ = tokio::time::sleep(Duration::from_secs(5)) => {}
                    }
                }
            }
        }

        info!("Shutdown signal received, job executor stopped");
        Ok(())
    }

    /// Take over jobs left pending by a crashed consumer.
    async fn claim_orphans(&self) {
        match self
            .queue
            .claim_pending(&self.consumer_name, self.config.claim_min_idle, self.config.batch_size)
            .await
        {
            Ok(deliveries) => {
                if !deliveries.is_empty() {
                    info!("Claimed {} pending jobs", deliveries.len());
                }
                for delivery in deliveries {
                    self.execute(delivery).await;
                }
            }
            Err(e) => warn!("Failed to claim pending jobs: {}", e),
        }
    }

    /// Run one delivery and acknowledge it once its outcome is recorded.
    async fn execute(&self, delivery: Delivery) {
        let task_id = delivery.job.task_id.clone();
        debug!("Executing task {} (message {})", task_id, delivery.message_id);

        match process_job(&self.ctx, &delivery.job, self.shutdown.subscribe()).await {
            Ok(outcome) => {
                if let JobOutcome::Finished(record) = &outcome {
                    info!("Task {} finished as {}", task_id, record.status);
                }
                if let Err(e) = self.queue.ack(&delivery.message_id).await {
                    error!("Failed to ack task {}: {}", task_id, e);
                }
            }
            Err(e) => {
                // Left pending; a later claim retries the status write.
                error!("Could not record outcome of task {}: {}", task_id, e);
            }
        }
    }

    /// Signal shutdown. In-flight FFmpeg processes are killed and the
    /// running task is recorded as cancelled.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// When the next orphan scan is due. The first scan runs immediately.
#[derive(Debug)]
struct ClaimSchedule {
    interval: Duration,
    last: Option<Instant>,
}

impl ClaimSchedule {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns `true` and restarts the interval when a scan is due at `now`.
    fn due(&mut self, now: Instant) -> bool {
        let due = self
            .last
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval);
        if due {
            self.last = Some(now);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_claim_scan_runs_immediately() {
        let mut schedule = ClaimSchedule::new(Duration::from_secs(30));
        assert!(schedule.due(Instant::now()));
    }

    #[test]
    fn test_claim_scan_waits_for_interval() {
        let start = Instant::now();
        let mut schedule = ClaimSchedule::new(Duration::from_secs(30));
        assert!(schedule.due(start));
        assert!(!schedule.due(start + Duration::from_secs(1)));
        assert!(!schedule.due(start + Duration::from_secs(29)));
        assert!(schedule.due(start + Duration::from_secs(30)));
        assert!(!schedule.due(start + Duration::from_secs(31)));
    }
}
