use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    analysis::{
        dto::{AnalyzeResponse, HistoryItem},
        repo::AnalysisResult,
        service::{analyze_upload, AudioUpload},
    },
    auth::extractors::AuthUser,
    error::ApiError,
    state::AppState,
};

pub fn analyze_routes() -> Router<AppState> {
    Router::new()
        .route("/audio/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

pub fn history_routes() -> Router<AppState> {
    Router::new().route("/users/:id/history", get(history))
}

/// POST /audio/analyze (multipart, single `audio` file field)
#[instrument(skip(state, mp))]
pub async fn analyze(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut upload: Option<AudioUpload> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() != Some("audio") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "audio".into());
        let bytes: Bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("failed to read audio field: {e}")))?;
        upload = Some(AudioUpload { file_name, bytes });
        break;
    }

    let upload = upload.ok_or_else(|| ApiError::validation("audio file field is required"))?;
    if upload.bytes.is_empty() {
        return Err(ApiError::validation("audio file is empty"));
    }

    let outcome = analyze_upload(&state, user_id, upload).await?;

    Ok(Json(AnalyzeResponse {
        label: outcome.record.label,
        confidence: outcome.prediction.confidence,
        suggestion: outcome.record.suggestion,
        analysis_id: outcome.record.id,
        audio_url: outcome.record.storage_key,
    }))
}

/// GET /users/:id/history — every stored analysis for the user, newest
/// first.
#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(auth_id): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<HistoryItem>>, ApiError> {
    if auth_id != user_id {
        return Err(ApiError::auth("token does not match user"));
    }

    let rows = AnalysisResult::list_by_user(&state.db, user_id).await?;
    let items = rows
        .into_iter()
        .map(|r| HistoryItem {
            id: r.id,
            label: r.label,
            suggestion: r.suggestion,
            audio_file_name: r.audio_file_name,
            audio_url: r.storage_key,
            created_at: r.created_at,
        })
        .collect();
    Ok(Json(items))
}
