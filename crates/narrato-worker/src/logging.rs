//! Structured task logging.

use tracing::{error, info, warn, Span};

use narrato_models::TaskId;

/// Logs task lifecycle events with the task id and operation attached.
#[derive(Debug, Clone)]
pub struct JobLogger {
    task_id: String,
    operation: String,
}

impl JobLogger {
    pub fn new(task_id: &TaskId, operation: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Task started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Task progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Task warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Task failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Task completed: {}", message
        );
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span covering the whole task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "task",
            task_id = %self.task_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let task_id = TaskId::from_string("t-42");
        let logger = JobLogger::new(&task_id, "render_motivation");

        assert_eq!(logger.task_id(), "t-42");
        assert_eq!(logger.operation(), "render_motivation");
    }

    #[test]
    fn test_logging_without_subscriber() {
        let logger = JobLogger::new(&TaskId::new(), "render_animation");
        logger.log_start("2 scenes");
        logger.log_progress("scene 1/2");
        logger.log_warning("slow provider");
        logger.log_error("boom");
        logger.log_completion("done");
        let _span = logger.create_span();
    }
}
