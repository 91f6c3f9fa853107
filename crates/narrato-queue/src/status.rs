//! Task status store.
//!
//! One record per task under `task_status:<id>`. Writes are single-key and
//! atomic; a terminal record is never replaced by a different record.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, warn};

use narrato_models::{TaskId, TaskRecord};

use crate::error::{QueueError, QueueResult};

/// Durable mapping from task id to status record.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Write `record` for `task_id`.
    ///
    /// Rewriting the current record is a no-op success. Returns `false` when
    /// the stored record is terminal and `record` differs from it; the stored
    /// record is left untouched.
    async fn set_status(&self, task_id: &TaskId, record: &TaskRecord) -> QueueResult<bool>;

    /// The stored record, or `processing` when nothing has been written yet.
    async fn get_status(&self, task_id: &TaskId) -> QueueResult<TaskRecord>;

    /// Check that the backing store answers.
    async fn ping(&self) -> QueueResult<()> {
        Ok(())
    }
}

/// Redis-backed status store.
pub struct RedisStatusStore {
    client: redis::Client,
    /// Expiry applied on every write; 0 keeps records forever
    ttl_secs: u64,
    script: redis::Script,
}

// KEYS[1] = status key, ARGV[1] = record JSON, ARGV[2] = ttl seconds
const SET_STATUS_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if current and current ~= ARGV[1] then
  local ok, decoded = pcall(cjson.decode, current)
  if ok and (decoded.status == 'completed' or decoded.status == 'failed') then
    return 0
  end
end
local ttl = tonumber(ARGV[2])
if ttl and ttl > 0 then
  redis.call('SET', KEYS[1], ARGV[1], 'EX', ttl)
else
  redis.call('SET', KEYS[1], ARGV[1])
end
return 1
"#;

impl RedisStatusStore {
    pub fn new(redis_url: &str, ttl_secs: u64) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            ttl_secs,
            script: redis::Script::new(SET_STATUS_SCRIPT),
        })
    }
}

#[async_trait]
impl StatusStore for RedisStatusStore {
    async fn set_status(&self, task_id: &TaskId, record: &TaskRecord) -> QueueResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(record)?;

        let applied: i32 = self
            .script
            .key(task_id.status_key())
            .arg(&payload)
            .arg(self.ttl_secs)
            .invoke_async(&mut conn)
            .await?;

        if applied == 1 {
            debug!("Set task status for {}: {}", task_id, payload);
            Ok(true)
        } else {
            warn!(
                "Ignored status {} for {}: record is already terminal",
                record.status, task_id
            );
            Ok(false)
        }
    }

    async fn get_status(&self, task_id: &TaskId) -> QueueResult<TaskRecord> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let data: Option<String> = conn.get(task_id.status_key()).await?;
        match data {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(TaskRecord::processing()),
        }
    }

    async fn ping(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }
}

/// In-process status store with the same semantics as the Redis store.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    records: Mutex<HashMap<String, TaskRecord>>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored record, without the `processing` default.
    pub fn stored(&self, task_id: &TaskId) -> Option<TaskRecord> {
        self.records
            .lock()
            .ok()
            .and_then(|r| r.get(&task_id.status_key()).cloned())
    }

    fn lock(&self) -> QueueResult<std::sync::MutexGuard<'_, HashMap<String, TaskRecord>>> {
        self.records
            .lock()
            .map_err(|_| QueueError::status("memory status store poisoned"))
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn set_status(&self, task_id: &TaskId, record: &TaskRecord) -> QueueResult<bool> {
        let mut records = self.lock()?;
        let key = task_id.status_key();
        if let Some(current) = records.get(&key) {
            if !current.can_transition_to(record) {
                return Ok(false);
            }
        }
        records.insert(key, record.clone());
        Ok(true)
    }

    async fn get_status(&self, task_id: &TaskId) -> QueueResult<TaskRecord> {
        Ok(self
            .lock()?
            .get(&task_id.status_key())
            .cloned()
            .unwrap_or_else(TaskRecord::processing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrato_models::TaskStatus;

    #[tokio::test]
    async fn test_unknown_task_reads_processing() {
        let store = MemoryStatusStore::new();
        let record = store.get_status(&TaskId::new()).await.unwrap();
        assert_eq!(record.status, TaskStatus::Processing);
        assert_eq!(record.video_url, None);
    }

    #[tokio::test]
    async fn test_terminal_record_is_final() {
        let store = MemoryStatusStore::new();
        let id = TaskId::new();

        assert!(store.set_status(&id, &TaskRecord::processing()).await.unwrap());
        let done = TaskRecord::completed("https://cdn/video-files/x.mp4");
        assert!(store.set_status(&id, &done).await.unwrap());

        assert!(!store
            .set_status(&id, &TaskRecord::failed("late failure"))
            .await
            .unwrap());
        assert!(!store.set_status(&id, &TaskRecord::processing()).await.unwrap());
        // Idempotent rewrite of the same terminal record.
        assert!(store.set_status(&id, &done).await.unwrap());

        assert_eq!(store.get_status(&id).await.unwrap(), done);
    }

    #[tokio::test]
    async fn test_repeated_reads_are_identical() {
        let store = MemoryStatusStore::new();
        let id = TaskId::new();
        store
            .set_status(&id, &TaskRecord::failed("boom"))
            .await
            .unwrap();

        let first = serde_json::to_vec(&store.get_status(&id).await.unwrap()).unwrap();
        let second = serde_json::to_vec(&store.get_status(&id).await.unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_redis_store_accepts_url() {
        assert!(RedisStatusStore::new("redis://localhost:6379", 60).is_ok());
        assert!(RedisStatusStore::new("not a url", 60).is_err());
    }
}
