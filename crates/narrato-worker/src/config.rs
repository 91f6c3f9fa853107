//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use narrato_media::DEFAULT_CAPTION_FONT;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Jobs fetched per stream read; fetched jobs still run one at a time
    pub batch_size: usize,
    /// Whole-task deadline
    pub job_timeout: Duration,
    /// Deadline for a single FFmpeg invocation
    pub ffmpeg_timeout: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Parent directory for per-task temporary directories
    pub work_dir: PathBuf,
    /// How long XREADGROUP blocks waiting for new jobs
    pub poll_block: Duration,
    /// How often the worker scans for orphaned pending jobs
    pub claim_interval: Duration,
    /// Minimum idle time before a pending job can be claimed (crash recovery).
    /// Must exceed `job_timeout`, or a job still running elsewhere is claimed.
    pub claim_min_idle: Duration,
    /// Background music bed for genres that mix music
    pub music_path: PathBuf,
    /// Font used to draw captions
    pub caption_font_path: PathBuf,
    /// Port for the Prometheus scrape endpoint; disabled when unset
    pub metrics_port: Option<u16>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            job_timeout: Duration::from_secs(1800),
            ffmpeg_timeout: Duration::from_secs(900),
            shutdown_timeout: Duration::from_secs(60),
            work_dir: PathBuf::from("/tmp/narrato"),
            poll_block: Duration::from_secs(1),
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(2400),
            music_path: PathBuf::from("assets/music.mp3"),
            caption_font_path: PathBuf::from(DEFAULT_CAPTION_FONT),
            metrics_port: None,
        }
    }
}

fn env_secs(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let defaults = Self::default();
        let config = Self {
            batch_size: defaults.batch_size,
            job_timeout: env_secs("WORKER_JOB_TIMEOUT", defaults.job_timeout),
            ffmpeg_timeout: env_secs("WORKER_FFMPEG_TIMEOUT", defaults.ffmpeg_timeout),
            shutdown_timeout: env_secs("WORKER_SHUTDOWN_TIMEOUT", defaults.shutdown_timeout),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            poll_block: defaults.poll_block,
            claim_interval: env_secs("WORKER_CLAIM_INTERVAL_SECS", defaults.claim_interval),
            claim_min_idle: env_secs("WORKER_CLAIM_MIN_IDLE_SECS", defaults.claim_min_idle),
            music_path: std::env::var("BACKGROUND_MUSIC_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.music_path),
            caption_font_path: std::env::var("CAPTION_FONT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.caption_font_path),
            metrics_port: std::env::var("WORKER_METRICS_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings under which a running job could be claimed by a
    /// second worker.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.claim_min_idle <= self.job_timeout {
            return Err(WorkerError::config_error(format!(
                "claim min idle ({}s) must exceed job timeout ({}s)",
                self.claim_min_idle.as_secs(),
                self.job_timeout.as_secs()
            )));
        }
        if self.batch_size == 0 {
            return Err(WorkerError::config_error("batch size must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_read_one_job_at_a_time() {
        let config = WorkerConfig::default();
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.job_timeout, Duration::from_secs(1800));
        assert!(config.metrics_port.is_none());
    }

    #[test]
    fn test_default_claim_idle_outlasts_job_timeout() {
        let config = WorkerConfig::default();
        assert!(config.claim_min_idle > config.job_timeout);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_claim_idle_within_job_timeout_is_rejected() {
        let config = WorkerConfig {
            claim_min_idle: Duration::from_secs(900),
            ..WorkerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, WorkerError::ConfigError(_)));
        assert!(err.to_string().contains("900s"));

        let equal = WorkerConfig {
            claim_min_idle: Duration::from_secs(1800),
            ..WorkerConfig::default()
        };
        assert!(equal.validate().is_err());
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let config = WorkerConfig {
            batch_size: 0,
            ..WorkerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
