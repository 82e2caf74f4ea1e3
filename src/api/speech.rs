//! Direct speech conversion endpoints (speech-to-text and text-to-speech)

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState, AudioUpload, read_multipart, transcribe_upload};

/// Build the speech-to-text router
#[must_use]
pub fn stt_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/convert", post(convert_inline))
        .route("/convert-file", post(convert_file))
        .with_state(state)
}

/// Build the text-to-speech router
#[must_use]
pub fn tts_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/convert", post(synthesize))
        .route("/voices", get(voices))
        .with_state(state)
}

/// Inline transcription request: base64 audio in a JSON body
#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    /// Base64-encoded audio, optionally as a `data:audio/...;base64,` URL
    pub audio: String,
    /// Declared format when the bytes alone are inconclusive
    #[serde(default)]
    pub format: Option<String>,
    /// Language hint (e.g. "en" or "en-US"); auto-detect when absent
    #[serde(default)]
    pub language: Option<String>,
}

/// Transcription response
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub text: String,
    pub language: String,
}

/// Transcribe base64-encoded audio
async fn convert_inline(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ConvertRequest>,
) -> Result<Json<ConvertResponse>, ApiError> {
    // Accept both raw base64 and data URLs
    let encoded = request
        .audio
        .rsplit_once("base64,")
        .map_or(request.audio.as_str(), |(_, tail)| tail);

    let data = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| ApiError::BadRequest(format!("invalid base64 audio: {e}")))?;

    let declared_name = request.format.as_deref().map(|ext| format!("audio.{ext}"));
    let upload = AudioUpload {
        data,
        filename: declared_name,
        content_type: None,
        fields: HashMap::new(),
    };

    let language = request.language.clone();
    let text = transcribe_upload(&state, upload, language.as_deref()).await?;

    Ok(Json(ConvertResponse {
        text,
        language: language.unwrap_or_else(|| "auto-detected".to_string()),
    }))
}

/// Transcribe an uploaded audio file
async fn convert_file(
    State(state): State<Arc<ApiState>>,
    multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let upload = read_multipart(multipart).await?;
    let language = upload.fields.get("language").cloned();

    let text = transcribe_upload(&state, upload, language.as_deref()).await?;

    Ok(Json(ConvertResponse {
        text,
        language: language.unwrap_or_else(|| "auto-detected".to_string()),
    }))
}

/// Synthesis request
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub speed: Option<f32>,
}

/// Synthesize text to speech
///
/// Returns audio in MP3 format
async fn synthesize(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SynthesizeRequest>,
) -> Result<Response, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("empty text".to_string()));
    }

    let voice = request.voice.as_deref().unwrap_or(&state.tts_voice);
    let speed = request.speed.unwrap_or(state.tts_speed);

    let audio = state.tts.synthesize(&request.text, Some(voice), speed).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        audio,
    )
        .into_response())
}

/// Available voices
#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<String>,
    pub default_voice: String,
}

/// List the voices offered by the synthesis backend
async fn voices(State(state): State<Arc<ApiState>>) -> Json<VoicesResponse> {
    Json(VoicesResponse {
        voices: state.tts.voices(),
        default_voice: state.tts_voice.clone(),
    })
}
