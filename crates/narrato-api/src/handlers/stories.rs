//! Story generation passthrough.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use narrato_models::Story;

use crate::error::ApiResult;
use crate::handlers::{parse_genre, required};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StoryQuery {
    pub topic: Option<String>,
    pub language: Option<String>,
}

/// Generate a scene-by-scene story for a genre.
///
/// Synchronous; the status store is never touched.
pub async fn generate_story(
    State(state): State<AppState>,
    Path(genre): Path<String>,
    Query(query): Query<StoryQuery>,
) -> ApiResult<Json<Story>> {
    let genre = parse_genre(&genre)?;
    let topic = required(query.topic, "No topic provided")?;
    let language = required(query.language, "No language provided")?;

    let story = state.story.write_story(genre, &topic, &language).await?;
    info!(genre = %genre, scenes = story.scenes.len(), "Generated story");

    Ok(Json(story))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::testing::{body_json, test_app};

    async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = test_app();
        let response = app
            .router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    #[tokio::test]
    async fn test_story_passthrough() {
        let (status, json) =
            get("/api/stories/animation?topic=a%20brave%20fox&language=English").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["scenes"][0]["sentences"], "A story about a brave fox.");
        assert_eq!(json["scenes"][0]["visual_prompt"], "animation: a brave fox");
        assert_eq!(json["complete_story"], "A story about a brave fox.");
    }

    #[tokio::test]
    async fn test_story_requires_topic() {
        let (status, json) = get("/api/stories/motivation?language=English").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No topic provided");
    }

    #[tokio::test]
    async fn test_story_requires_language() {
        let (status, json) = get("/api/stories/motivation?topic=grit&language=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No language provided");
    }
}
