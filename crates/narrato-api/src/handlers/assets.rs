//! Generic asset endpoints: images, stock footage, narration audio.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use narrato_models::Genre;
use narrato_storage::AssetKind;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{parse_genre, required};
use crate::state::AppState;

const DEFAULT_STOCK_LIMIT: u32 = 10;
const DEFAULT_STOCK_MIN_DURATION: f64 = 10.0;

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub prompt: Option<String>,
}

/// Generate one image from a prompt.
pub async fn generate_image(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> ApiResult<Json<UrlResponse>> {
    let prompt = required(query.prompt, "No prompt provided")?;
    let url = state.images.generate(&prompt).await?;
    Ok(Json(UrlResponse { url }))
}

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub prompt: Option<String>,
    pub limit: Option<u32>,
    pub min_duration: Option<f64>,
}

/// Find one stock video for a query.
pub async fn search_stock_video(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
) -> ApiResult<Json<UrlResponse>> {
    let prompt = required(query.prompt, "No prompt provided")?;
    let limit = query.limit.unwrap_or(DEFAULT_STOCK_LIMIT).max(1);
    let min_duration = query.min_duration.unwrap_or(DEFAULT_STOCK_MIN_DURATION);

    let url = state.stock.search(&prompt, limit, min_duration).await?;
    Ok(Json(UrlResponse { url }))
}

#[derive(Debug, Deserialize)]
pub struct AudioQuery {
    pub text: Option<String>,
    pub language: Option<String>,
    pub genre: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AudioResponse {
    pub name: String,
}

/// Synthesize narration and upload it as an audio asset.
///
/// Voices come from the genre's table (animation unless `genre` is given).
/// The local file is removed when the handler returns, whatever the outcome.
pub async fn generate_audio(
    State(state): State<AppState>,
    Query(query): Query<AudioQuery>,
) -> ApiResult<Json<AudioResponse>> {
    let text = required(query.text, "No text provided")?;
    let language = required(query.language, "No language provided")?;
    let genre = match query.genre {
        Some(raw) => parse_genre(&raw)?,
        None => Genre::Animation,
    };

    let profile = genre.profile();
    let voice = profile
        .voices
        .resolve(&language)
        .ok_or_else(|| ApiError::internal(format!("no voice configured for {}", genre)))?;

    let file = tempfile::Builder::new()
        .prefix("narration-")
        .suffix(".mp3")
        .tempfile()
        .map_err(|e| ApiError::internal(format!("temp file: {}", e)))?;

    state.speech.synthesize(&text, voice, file.path()).await?;
    let stored = state.storage.upload(file.path(), AssetKind::Audio).await?;
    info!(name = %stored.name, language = %language, "Uploaded narration audio");

    Ok(Json(AudioResponse { name: stored.name }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteAudioRequest {
    #[serde(default)]
    pub audio_urls: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResult {
    pub url: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteAudioResponse {
    pub results: Vec<DeleteResult>,
}

/// Delete narration audio assets. Each URL is reported on its own.
pub async fn delete_audio(
    State(state): State<AppState>,
    payload: Result<Json<DeleteAudioRequest>, JsonRejection>,
) -> ApiResult<Json<DeleteAudioResponse>> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => {
            return Err(ApiError::bad_request("No audio URLs provided"))
        }
        Err(rejection) => return Err(ApiError::bad_request(rejection.body_text())),
    };
    if request.audio_urls.is_empty() {
        return Err(ApiError::bad_request("No audio URLs provided"));
    }

    let mut results = Vec::with_capacity(request.audio_urls.len());
    for url in request.audio_urls {
        let deleted = match state.storage.delete(&url).await {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!(url = %url, "Failed to delete audio: {}", e);
                false
            }
        };
        results.push(DeleteResult { url, deleted });
    }

    Ok(Json(DeleteAudioResponse { results }))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use narrato_storage::{AssetKind, AssetStore};

    use crate::testing::{body_json, test_app, TestApp};

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_generate_image() {
        let TestApp { router, .. } = test_app();
        let response = router
            .oneshot(get("/api/images?prompt=a%20red%20fox"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["url"],
            "https://images.test/a red fox.jpg"
        );
    }

    #[tokio::test]
    async fn test_generate_image_requires_prompt() {
        let TestApp { router, .. } = test_app();
        let response = router.oneshot(get("/api/images")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No prompt provided");
    }

    #[tokio::test]
    async fn test_stock_search_defaults() {
        let TestApp { router, stock, .. } = test_app();
        let response = router
            .oneshot(get("/api/stock-videos?prompt=ocean"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["url"], "https://stock.test/ocean.mp4");
        assert_eq!(stock.calls(), vec![("ocean".to_string(), 10, 10.0)]);
    }

    #[tokio::test]
    async fn test_stock_search_without_results_is_not_found() {
        let TestApp { router, .. } = test_app();
        let response = router
            .oneshot(get("/api/stock-videos?prompt=nothing&limit=3&min_duration=5"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_audio_uploads_and_cleans_up() {
        let TestApp {
            router,
            storage,
            speech,
            ..
        } = test_app();
        let response = router
            .oneshot(get("/api/audio?text=Hola&language=French"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let name = body_json(response).await["name"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(name.ends_with(".mp3"));
        assert!(storage.contains(&AssetKind::Audio.object_key(&name)));

        let (voice, path) = speech.last_call().unwrap();
        assert_eq!(voice, "hFgOzpmS0CMtL2to8sAl");
        assert!(!Path::new(&path).exists());
    }

    #[tokio::test]
    async fn test_generate_audio_uses_genre_voices() {
        let TestApp { router, speech, .. } = test_app();
        let response = router
            .oneshot(get("/api/audio?text=Go&language=German&genre=commercial"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        // Commercial falls back to its English voice.
        assert_eq!(speech.last_call().unwrap().0, "vKNO07o9JhKMgjLKbyQK");
    }

    #[tokio::test]
    async fn test_generate_audio_requires_text() {
        let TestApp { router, .. } = test_app();
        let response = router
            .oneshot(get("/api/audio?language=English"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No text provided");
    }

    #[tokio::test]
    async fn test_delete_audio_reports_each_url() {
        let TestApp {
            router, storage, ..
        } = test_app();

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.mp3");
        std::fs::write(&file, b"ID3").unwrap();
        let stored = storage.upload(&file, AssetKind::Audio).await.unwrap();

        let body = serde_json::json!({
            "audio_urls": [stored.url, "https://cdn.test/audio-files/missing.mp3"]
        });
        let request = Request::builder()
            .method("POST")
            .uri("/api/audio/delete")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["results"][0]["deleted"], true);
        assert_eq!(json["results"][1]["deleted"], false);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_delete_audio_requires_urls() {
        let TestApp { router, .. } = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/audio/delete")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"audio_urls": []}"#))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No audio URLs provided");
    }

    #[tokio::test]
    async fn test_delete_audio_without_body_is_json_error() {
        let TestApp { router, .. } = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/audio/delete")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No audio URLs provided");
    }

    #[tokio::test]
    async fn test_delete_audio_malformed_json_is_json_error() {
        let TestApp { router, .. } = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/audio/delete")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }
}
