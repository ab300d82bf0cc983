use std::sync::Arc;
use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{ApiSession, CurrentSession};
use crate::models::emotion::{EmotionResponse, HistoryEntry};
use crate::pipeline::annotate;
use crate::pipeline::upload::{allowed_extension, TempUpload};
use crate::AppState;

const IMAGE_FIELD: &str = "image";

pub async fn process_emotion(
    State(state): State<Arc<AppState>>,
    ApiSession(session): ApiSession,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<EmotionResponse>> {
    state.stats.inc_uploads();
    let outcome = match multipart {
        Ok(multipart) => analyze_upload(&state, &session, multipart).await,
        Err(rejection) => Err(multipart_rejection(rejection)),
    };
    match &outcome {
        Ok(_) => state.stats.inc_detections(),
        Err(ApiError::Unexpected(_)) => state.stats.inc_failures(),
        Err(_) => state.stats.inc_rejected(),
    }
    outcome.map(Json)
}

async fn analyze_upload(state: &AppState, session: &CurrentSession, mut multipart: Multipart) -> ApiResult<EmotionResponse> {
    let (filename, bytes) = read_image_field(&mut multipart)
        .await?
        .ok_or_else(|| ApiError::validation("No image provided"))?;
    let ext = allowed_extension(&filename).ok_or_else(|| ApiError::validation("Invalid file"))?;
    info!("Processing upload {:?} ({} bytes) for {:?}", filename, bytes.len(), session.username);

    // Removed when `upload` drops, whichever way this function returns.
    let upload = TempUpload::write(&state.config.upload_dir, &ext, &bytes).await?;

    let image = tokio::task::spawn_blocking(move || annotate::decode(&bytes))
        .await
        .context("Image decoding task failed")?
        .map_err(|e| {
            debug!("Unreadable upload {:?}: {:#}", filename, e);
            ApiError::validation("Error reading image")
        })?;

    let detection = match state.detector.detect(upload.path()).await? {
        Some(detection) => detection,
        None => {
            state.stats.inc_no_face();
            return Err(ApiError::validation("No face detected in image"));
        }
    };

    let mood_text = state.mood.write_mood(&detection.label, detection.confidence).await?;

    let annotator = state.annotator.clone();
    let to_draw = detection.clone();
    let image_uri = tokio::task::spawn_blocking(move || annotator.render_data_uri(&image, &to_draw))
        .await
        .context("Annotation task failed")??;

    let entry = HistoryEntry::from_detection(&detection, chrono::Local::now());
    let confidence = entry.confidence;
    if !state.sessions.append_history(&session.token, entry) {
        // Session expired or logged out while the request was in flight.
        return Err(ApiError::Auth);
    }

    Ok(EmotionResponse {
        image: image_uri,
        emotion: detection.label,
        confidence,
        mood_text,
    })
}

/// First multipart field named `image`, as (claimed filename, contents).
async fn read_image_field(multipart: &mut Multipart) -> ApiResult<Option<(String, Bytes)>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some((filename, bytes)));
    }
    Ok(None)
}

/// A body that is not `multipart/form-data` carries no image field.
fn multipart_rejection(rejection: MultipartRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge;
    }
    debug!("Upload is not multipart: {}", rejection.body_text());
    ApiError::validation("No image provided")
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::validation(format!("Malformed upload: {}", e.body_text()))
    }
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    ApiSession(session): ApiSession,
) -> ApiResult<Json<serde_json::Value>> {
    let history = state.sessions.history(&session.token).ok_or(ApiError::Auth)?;
    Ok(Json(serde_json::json!({ "history": history })))
}

pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    ApiSession(session): ApiSession,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.sessions.clear_history(&session.token) {
        return Err(ApiError::Auth);
    }
    info!("Cleared history for {:?}", session.username);
    Ok(Json(serde_json::json!({ "message": "History cleared" })))
}
