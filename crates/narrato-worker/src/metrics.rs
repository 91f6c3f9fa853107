//! Prometheus metrics for the worker.

use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Metric names as constants for consistency.
pub mod names {
    pub const TASKS_COMPLETED_TOTAL: &str = "narrato_tasks_completed_total";
    pub const TASKS_FAILED_TOTAL: &str = "narrato_tasks_failed_total";
    pub const TASKS_SKIPPED_TOTAL: &str = "narrato_tasks_skipped_total";
    pub const SCENE_BUILD_SECONDS: &str = "narrato_scene_build_seconds";
    pub const TIMELINE_ENCODE_SECONDS: &str = "narrato_timeline_encode_seconds";
    pub const TASK_DURATION_SECONDS: &str = "narrato_task_duration_seconds";
}

/// Serve `/metrics` on `port`.
pub fn init_metrics(port: u16) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
        .install()
        .map_err(|e| e.to_string())
}

pub fn record_task_completed(genre: &str, duration_secs: f64) {
    let labels = [("genre", genre.to_string())];
    counter!(names::TASKS_COMPLETED_TOTAL, &labels).increment(1);
    histogram!(names::TASK_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_task_failed(genre: &str, kind: &str) {
    let labels = [("genre", genre.to_string()), ("kind", kind.to_string())];
    counter!(names::TASKS_FAILED_TOTAL, &labels).increment(1);
}

/// A redelivered task that was already terminal.
pub fn record_task_skipped() {
    counter!(names::TASKS_SKIPPED_TOTAL).increment(1);
}

pub fn record_scene_build(genre: &str, duration_secs: f64) {
    let labels = [("genre", genre.to_string())];
    histogram!(names::SCENE_BUILD_SECONDS, &labels).record(duration_secs);
}

pub fn record_timeline_encode(genre: &str, duration_secs: f64) {
    let labels = [("genre", genre.to_string())];
    histogram!(names::TIMELINE_ENCODE_SECONDS, &labels).record(duration_secs);
}
