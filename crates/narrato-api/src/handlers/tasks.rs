//! Task submission and status query.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use narrato_models::{SceneInput, TaskId, TaskRecord, DEFAULT_LANGUAGE};
use narrato_queue::RenderVideoJob;

use crate::error::{ApiError, ApiResult};
use crate::handlers::parse_genre;
use crate::metrics;
use crate::state::AppState;

/// Submission body.
#[derive(Debug, Deserialize)]
pub struct SubmitTaskRequest {
    #[serde(default)]
    pub scene_data: Vec<SceneInput>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTaskResponse {
    pub task_id: String,
}

/// Accept scene data for asynchronous rendering.
///
/// The `processing` record is written before the job is handed off, so a
/// poll that races the worker never sees an unknown task.
pub async fn submit_task(
    State(state): State<AppState>,
    Path(genre): Path<String>,
    payload: Result<Json<SubmitTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmitTaskResponse>)> {
    let genre = parse_genre(&genre)?;
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => {
            return Err(ApiError::bad_request("No scene data provided"))
        }
        Err(rejection) => return Err(ApiError::bad_request(rejection.body_text())),
    };
    if request.scene_data.is_empty() {
        return Err(ApiError::bad_request("No scene data provided"));
    }

    let language = request
        .language
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    let task_id = TaskId::new();
    state
        .status
        .set_status(&task_id, &TaskRecord::processing())
        .await?;

    let scene_count = request.scene_data.len();
    let job = RenderVideoJob::new(task_id.clone(), genre, language, request.scene_data);
    if let Err(e) = state.dispatcher.dispatch(job).await {
        error!(task_id = %task_id, "Failed to dispatch task: {}", e);
        state
            .status
            .set_status(&task_id, &TaskRecord::failed(format!("dispatch failed: {}", e)))
            .await
            .ok();
        return Err(e.into());
    }

    metrics::record_task_submitted(genre.as_str());
    info!(task_id = %task_id, genre = %genre, scenes = scene_count, "Task accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitTaskResponse {
            task_id: task_id.to_string(),
        }),
    ))
}

/// Current status record of a task.
pub async fn get_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskRecord>> {
    let record = state
        .status
        .get_status(&TaskId::from_string(task_id))
        .await?;
    Ok(Json(record))
}
