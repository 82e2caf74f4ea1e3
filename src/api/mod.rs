//! HTTP API server for the voicetask gateway

pub mod chat;
pub mod health;
pub mod rate_limit;
pub mod speech;
pub mod voice_assistant;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::audio::{self, AudioBlob};
use crate::chat::ChatOrchestrator;
use crate::config::Config;
use crate::providers::{Complete, Providers, Synthesize, Transcribe};
use crate::tasks::TaskExtractor;
use crate::{Error, Result};

/// Shared state for API handlers
///
/// Provider handles are trait objects so tests and alternate backends swap in
/// without touching the pipelines.
pub struct ApiState {
    pub stt: Arc<dyn Transcribe>,
    pub llm: Arc<dyn Complete>,
    pub tts: Arc<dyn Synthesize>,
    pub extractor: TaskExtractor,
    pub chat: ChatOrchestrator,
    pub tts_voice: String,
    pub tts_speed: f32,
    pub rate_limiter: Option<rate_limit::SharedLimiter>,
}

impl ApiState {
    /// Assemble handler state from constructed providers
    #[must_use]
    pub fn new(providers: &Providers, config: &Config) -> Self {
        Self {
            stt: providers.stt.clone(),
            llm: providers.llm.clone(),
            tts: providers.tts.clone(),
            extractor: TaskExtractor::new(providers.llm.clone()),
            chat: ChatOrchestrator::new(providers.llm.clone()),
            tts_voice: config.tts.voice.clone(),
            tts_speed: config.tts.speed,
            rate_limiter: config
                .server
                .rate_limit_per_minute
                .map(rate_limit::create_limiter),
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    #[must_use]
    pub const fn new(state: Arc<ApiState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(state: Arc<ApiState>) -> Router {
        let router = Router::new()
            .nest(
                "/voice-assistant",
                voice_assistant::router(state.clone()),
            )
            .nest("/chat", chat::router(state.clone()))
            .nest("/speech-to-text", speech::stt_router(state.clone()))
            .nest("/text-to-speech", speech::tts_router(state.clone()))
            .merge(health::router())
            .merge(health::ready_router(state.clone()));

        let router = router.layer(axum::middleware::from_fn_with_state(
            state,
            rate_limit::rate_limit_middleware,
        ));

        // Browser clients upload audio from arbitrary origins
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, Self::router(self.state))
            .await
            .map_err(|e| Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

/// API-level error with a stable machine-readable kind
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request body or missing field
    BadRequest(String),
    /// Pipeline error carrying the crate taxonomy
    Pipeline(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Pipeline(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Pipeline(err) => {
                let status = match &err {
                    Error::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    Error::Decode(_)
                    | Error::ProviderRejected(_)
                    | Error::UnsupportedVoice(_) => StatusCode::BAD_REQUEST,
                    Error::AmbiguousDate(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    Error::Extraction(_) => StatusCode::BAD_GATEWAY,
                    Error::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.kind(), err.to_string())
            }
        };

        tracing::debug!(%status, code, %message, "request failed");

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody { code, message },
            }),
        )
            .into_response()
    }
}

/// Parsed multipart upload: the audio part plus any text fields
pub(crate) struct AudioUpload {
    pub data: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub fields: HashMap<String, String>,
}

/// Drain a multipart body into the audio part and its sibling text fields
///
/// The audio part is matched by field name (`audio_file` or `file`) or by an
/// `audio/*`/`video/*` content type.
pub(crate) async fn read_multipart(
    mut multipart: Multipart,
) -> std::result::Result<AudioUpload, ApiError> {
    let mut data = Vec::new();
    let mut filename = None;
    let mut content_type = None;
    let mut fields = HashMap::new();
    let mut saw_audio = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let field_mime = field.content_type().map(ToString::to_string);
        let is_audio = matches!(name.as_str(), "audio_file" | "file")
            || field_mime
                .as_deref()
                .is_some_and(|m| m.starts_with("audio/") || m.starts_with("video/"));

        if is_audio {
            filename = field.file_name().map(ToString::to_string);
            content_type = field_mime;
            data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?
                .to_vec();
            saw_audio = true;
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read field {name}: {e}")))?;
            fields.insert(name, value);
        }
    }

    if !saw_audio {
        return Err(ApiError::BadRequest("no audio file provided".to_string()));
    }

    Ok(AudioUpload {
        data,
        filename,
        content_type,
        fields,
    })
}

/// Normalize an upload and run it through the transcription provider
pub(crate) async fn transcribe_upload(
    state: &ApiState,
    upload: AudioUpload,
    language: Option<&str>,
) -> std::result::Result<String, ApiError> {
    let format = audio::detect_format(
        upload.filename.as_deref(),
        upload.content_type.as_deref(),
        &upload.data,
    )?;
    let blob = audio::normalize(AudioBlob::new(upload.data, format))?;
    let filename = blob.filename();
    let text = state.stt.transcribe(&blob.data, &filename, language).await?;
    Ok(text)
}
