//! Job queue using Redis Streams.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, error, info, warn};

use narrato_models::{TaskId, TaskRecord};

use crate::error::{QueueError, QueueResult};
use crate::job::RenderVideoJob;
use crate::status::StatusStore;

/// Default status record lifetime: 7 days.
pub const DEFAULT_STATUS_TTL_SECS: u64 = 7 * 24 * 3600;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for jobs
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// How long task status records live
    pub status_ttl: Duration,
    /// How long an enqueued task id blocks a second enqueue
    pub dedup_ttl: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "narrato:jobs".to_string(),
            consumer_group: "narrato:workers".to_string(),
            status_ttl: Duration::from_secs(DEFAULT_STATUS_TTL_SECS),
            dedup_ttl: Duration::from_secs(3600),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            stream_name: std::env::var("QUEUE_STREAM").unwrap_or(defaults.stream_name),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP")
                .unwrap_or(defaults.consumer_group),
            status_ttl: std::env::var("TASK_STATUS_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.status_ttl),
            dedup_ttl: defaults.dedup_ttl,
        }
    }
}

/// Hands accepted jobs to the background executor.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    /// Enqueue `job`; returns the transport's message id.
    async fn dispatch(&self, job: RenderVideoJob) -> QueueResult<String>;
}

/// A job read from the stream, with the id needed to acknowledge it.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message_id: String,
    pub job: RenderVideoJob,
}

/// A stream entry whose job payload could not be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedEntry {
    /// Task id carried next to the payload, when readable
    pub task_id: Option<TaskId>,
    pub reason: String,
}

/// Decode the job carried by a stream entry.
pub fn decode_entry(map: &HashMap<String, redis::Value>) -> Result<RenderVideoJob, MalformedEntry> {
    let task_id = match map.get("task_id") {
        Some(redis::Value::BulkString(bytes)) => std::str::from_utf8(bytes)
            .ok()
            .filter(|s| !s.is_empty())
            .map(TaskId::from_string),
        _ => None,
    };

    let payload = match map.get("job") {
        Some(redis::Value::BulkString(bytes)) => bytes,
        _ => {
            return Err(MalformedEntry {
                task_id,
                reason: "missing job payload".to_string(),
            })
        }
    };

    serde_json::from_slice::<RenderVideoJob>(payload).map_err(|e| MalformedEntry {
        task_id,
        reason: e.to_string(),
    })
}

/// Mark the task behind a malformed entry as failed.
///
/// Returns `false` when the entry carries no task id.
pub async fn record_malformed(status: &dyn StatusStore, entry: &MalformedEntry) -> QueueResult<bool> {
    let Some(task_id) = &entry.task_id else {
        return Ok(false);
    };
    let record = TaskRecord::failed(format!("malformed job payload: {}", entry.reason));
    status.set_status(task_id, &record).await?;
    Ok(true)
}

/// Job queue client.
pub struct JobQueue {
    client: redis::Client,
    config: QueueConfig,
    status: Option<Arc<dyn StatusStore>>,
}

impl JobQueue {
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self {
            client,
            config,
            status: None,
        })
    }

    /// Record undecodable deliveries as failed in `status`.
    pub fn with_status_store(mut self, status: Arc<dyn StatusStore>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Initialize the queue (create consumer group if not exists).
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("Consumer group already exists: {}", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Enqueue a render job. A task id can be enqueued once per dedup window.
    pub async fn enqueue(&self, job: &RenderVideoJob) -> QueueResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(job)?;
        let dedup_key = format!("narrato:dedup:{}", job.idempotency_key());

        // SET NX claims the task id atomically.
        let claimed: bool = redis::cmd("SET")
            .arg(&dedup_key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(self.config.dedup_ttl.as_secs().max(1))
            .query_async::<Option<String>>(&mut conn)
            .await?
            .is_some();
        if !claimed {
            warn!("Duplicate job rejected: {}", job.task_id);
            return Err(QueueError::enqueue_failed("Duplicate job"));
        }

        let message_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("task_id")
            .arg(job.task_id.as_str())
            .query_async(&mut conn)
            .await?;

        info!("Enqueued task {} with message ID {}", job.task_id, message_id);
        Ok(message_id)
    }

    /// Acknowledge and delete a message.
    pub async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.config.stream_name)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        debug!("Acknowledged message: {}", message_id);
        Ok(())
    }

    /// Stream length.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }

    /// Check that Redis answers.
    pub async fn ping(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }

    /// Read new messages for `consumer_name`, blocking up to `block_ms`.
    pub async fn consume(
        &self,
        consumer_name: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<Delivery>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Option<redis::streams::StreamReadReply> = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">")
            .query_async(&mut conn)
            .await?;

        let mut deliveries = Vec::new();
        for stream_key in result.map(|r| r.keys).unwrap_or_default() {
            for entry in stream_key.ids {
                if let Some(delivery) = self.accept_entry(entry.id, &entry.map).await {
                    debug!("Consumed task {} from stream", delivery.job.task_id);
                    deliveries.push(delivery);
                }
            }
        }

        Ok(deliveries)
    }

    /// Claim messages left pending by a crashed consumer for longer than
    /// `min_idle`.
    pub async fn claim_pending(
        &self,
        consumer_name: &str,
        min_idle: Duration,
        count: usize,
    ) -> QueueResult<Vec<Delivery>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let min_idle_ms = min_idle.as_millis() as u64;

        let pending: redis::streams::StreamPendingCountReply = redis::cmd("XPENDING")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("IDLE")
            .arg(min_idle_ms)
            .arg("-")
            .arg("+")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        if pending.ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut cmd = redis::cmd("XCLAIM");
        cmd.arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg(min_idle_ms);
        for p in &pending.ids {
            cmd.arg(&p.id);
        }
        let claimed: redis::streams::StreamClaimReply = cmd.query_async(&mut conn).await?;

        let mut deliveries = Vec::new();
        for entry in claimed.ids {
            if let Some(delivery) = self.accept_entry(entry.id, &entry.map).await {
                info!("Claimed pending task {} from stream", delivery.job.task_id);
                deliveries.push(delivery);
            }
        }

        Ok(deliveries)
    }

    /// Decode a stream entry. Malformed entries fail their task when the id
    /// is readable, then are acknowledged and dropped.
    async fn accept_entry(
        &self,
        message_id: String,
        map: &HashMap<String, redis::Value>,
    ) -> Option<Delivery> {
        match decode_entry(map) {
            Ok(job) => Some(Delivery { message_id, job }),
            Err(malformed) => {
                warn!("Dropping message {}: {}", message_id, malformed.reason);
                if let Some(status) = &self.status {
                    match record_malformed(status.as_ref(), &malformed).await {
                        Ok(true) => {}
                        Ok(false) => warn!("Message {} carries no task id", message_id),
                        Err(e) => {
                            // Left pending so a later claim retries the write.
                            error!("Failed to record malformed message {}: {}", message_id, e);
                            return None;
                        }
                    }
                }
                self.ack(&message_id).await.ok();
                None
            }
        }
    }
}

#[async_trait]
impl JobDispatcher for JobQueue {
    async fn dispatch(&self, job: RenderVideoJob) -> QueueResult<String> {
        self.enqueue(&job).await
    }
}
