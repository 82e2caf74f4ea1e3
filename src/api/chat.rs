//! Task-aware chat endpoints (text and voice)

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::{get, post},
};
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState, read_multipart, transcribe_upload};
use crate::audio::AudioFormat;
use crate::tasks::Task;

/// Build the chat router
#[must_use]
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/text", post(chat_text))
        .route("/voice", post(chat_voice))
        .route("/supported-audio-formats", get(supported_audio_formats))
        .with_state(state)
}

/// Text chat request with the caller's current task list as context
#[derive(Debug, Deserialize)]
pub struct ChatTextRequest {
    pub message: String,
    #[serde(default, alias = "task_context")]
    pub tasks: Vec<Task>,
    /// Caller's GMT offset, e.g. "+05:30"
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "+00:00".to_string()
}

/// Chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    /// The user message as understood (transcription fixes applied)
    pub user_message: String,
    /// Base64 MP3 of the spoken reply, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

/// Chat with a text message
async fn chat_text(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatTextRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("empty message".to_string()));
    }

    let reply = state
        .chat
        .respond(&request.message, &request.tasks, &request.timezone, Utc::now())
        .await?;

    Ok(Json(ChatResponse {
        reply: reply.reply,
        user_message: reply.user_message,
        audio: None,
    }))
}

/// Chat with a voice message
///
/// Multipart fields: the audio part, optional `tasks` (JSON array), optional
/// `timezone`, optional `speak` ("true" to get a spoken reply back).
async fn chat_voice(
    State(state): State<Arc<ApiState>>,
    multipart: Multipart,
) -> Result<Json<ChatResponse>, ApiError> {
    let upload = read_multipart(multipart).await?;

    let tasks: Vec<Task> = match upload
        .fields
        .get("tasks")
        .or_else(|| upload.fields.get("task_context"))
    {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON in tasks field: {e}")))?,
        None => Vec::new(),
    };
    let timezone = upload
        .fields
        .get("timezone")
        .cloned()
        .unwrap_or_else(default_timezone);
    let speak = upload
        .fields
        .get("speak")
        .is_some_and(|v| matches!(v.as_str(), "true" | "1"));

    let transcript = transcribe_upload(&state, upload, None).await?;
    let reply = state
        .chat
        .respond(&transcript, &tasks, &timezone, Utc::now())
        .await?;

    let audio = if speak {
        let bytes = state
            .tts
            .synthesize(&reply.reply, Some(&state.tts_voice), state.tts_speed)
            .await?;
        Some(base64::engine::general_purpose::STANDARD.encode(bytes))
    } else {
        None
    };

    Ok(Json(ChatResponse {
        reply: reply.reply,
        user_message: reply.user_message,
        audio,
    }))
}

/// Supported upload formats
#[derive(Debug, Serialize)]
pub struct SupportedFormatsResponse {
    pub supported_formats: Vec<&'static str>,
    pub canonical_format: &'static str,
    pub description: &'static str,
}

/// List the audio formats accepted by the voice endpoints
async fn supported_audio_formats() -> Json<SupportedFormatsResponse> {
    Json(SupportedFormatsResponse {
        supported_formats: AudioFormat::SUPPORTED
            .iter()
            .copied()
            .map(AudioFormat::extension)
            .collect(),
        canonical_format: "wav",
        description: "Uploads are converted to 16 kHz mono WAV before transcription \
                      where the provider does not decode the container natively.",
    })
}
