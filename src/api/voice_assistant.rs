//! Voice assistant endpoints: audio or text in, structured task out

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState, read_multipart, transcribe_upload};
use crate::tasks::Task;

/// Build the voice assistant router
#[must_use]
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/process", post(process_audio))
        .route("/process-text-only", post(process_text))
        .with_state(state)
}

/// Text-only task creation request
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// Task creation response
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub task: Task,
    pub success: bool,
    pub message: &'static str,
}

/// Process an uploaded audio clip into a task
///
/// Pipeline: normalize → transcribe → extract. Any stage error maps to the
/// error envelope; a partial task is never returned.
async fn process_audio(
    State(state): State<Arc<ApiState>>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let upload = read_multipart(multipart).await?;
    let transcript = transcribe_upload(&state, upload, None).await?;
    let task = state.extractor.extract(&transcript, Utc::now()).await?;

    Ok(Json(ProcessResponse {
        task,
        success: true,
        message: "task created from voice input",
    }))
}

/// Process plain text into a task (no audio)
async fn process_text(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<TextRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let task = state.extractor.extract(&request.text, Utc::now()).await?;

    Ok(Json(ProcessResponse {
        task,
        success: true,
        message: "task created from text input",
    }))
}
