//! External AI provider clients
//!
//! Each capability (speech-to-text, chat completion, text-to-speech) sits
//! behind an object-safe trait so pipelines never see a concrete backend and
//! tests can substitute deterministic implementations.

mod deepgram;
mod elevenlabs;
mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;

use crate::config::{Config, SttBackend, TtsBackend};
use crate::{Error, Result};

pub use deepgram::DeepgramClient;
pub use elevenlabs::ElevenLabsClient;
pub use openai::{ChatClient, SpeechClient, WhisperClient};

/// Speech-to-text capability
#[async_trait]
pub trait Transcribe: Send + Sync {
    /// Transcribe audio bytes to plain text
    ///
    /// A single best-effort attempt; the caller decides whether to retry on
    /// [`Error::ProviderUnavailable`].
    ///
    /// # Errors
    ///
    /// Returns error if transcription fails
    async fn transcribe(
        &self,
        audio: &[u8],
        filename: &str,
        language: Option<&str>,
    ) -> Result<String>;

    /// Backend name for logging and readiness reporting
    fn name(&self) -> &'static str;
}

/// Chat completion capability
#[async_trait]
pub trait Complete: Send + Sync {
    /// Send a system prompt and user message, return the completion text
    ///
    /// # Errors
    ///
    /// Returns error if the completion fails
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String>;

    /// Backend name for logging and readiness reporting
    fn name(&self) -> &'static str;
}

/// Text-to-speech capability
#[async_trait]
pub trait Synthesize: Send + Sync {
    /// Synthesize text to audio bytes (MP3)
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVoice`] for a voice outside
    /// [`Synthesize::voices`], or a provider error if synthesis fails
    async fn synthesize(&self, text: &str, voice: Option<&str>, speed: f32) -> Result<Vec<u8>>;

    /// Voices this backend offers
    fn voices(&self) -> Vec<String>;

    /// Backend name for logging and readiness reporting
    fn name(&self) -> &'static str;
}

/// Build an HTTP client with the mandatory per-call timeout
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("Voicetask-Gateway/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(Error::Http)
}

/// Classify a non-success provider response
///
/// 429 and 5xx mean the provider is down or throttling (retryable upstream
/// outage); any other 4xx means the input was rejected.
pub(crate) async fn classify_response(context: &str, response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::error!(context, status = %status, body = %body, "provider API error");
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        Error::ProviderUnavailable(format!("{context} error {status}: {body}"))
    } else {
        Error::ProviderRejected(format!("{context} error {status}: {body}"))
    }
}

/// Classify a transport-level failure (no HTTP response received)
///
/// Timeouts and connection failures are upstream outages; anything else is a
/// local defect and passes through as a plain HTTP error.
pub(crate) fn classify_transport(context: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() || err.is_connect() {
        Error::ProviderUnavailable(format!("{context} request failed: {err}"))
    } else {
        Error::Http(err)
    }
}

/// Provider handles shared by the request façade
#[derive(Clone)]
pub struct Providers {
    pub stt: Arc<dyn Transcribe>,
    pub llm: Arc<dyn Complete>,
    pub tts: Arc<dyn Synthesize>,
}

impl Providers {
    /// Construct the configured backends
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a selected backend is missing its API key
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let openai_key = || -> Result<String> {
            config
                .api_keys
                .openai
                .as_ref()
                .map(|key| key.expose_secret().to_string())
                .ok_or_else(|| Error::Config("OPENAI_API_KEY is not set".to_string()))
        };

        let stt: Arc<dyn Transcribe> = match config.stt.backend {
            SttBackend::Whisper => Arc::new(WhisperClient::new(
                openai_key()?,
                config.stt.model.clone(),
                timeout,
            )?),
            SttBackend::Deepgram => {
                let key = config
                    .api_keys
                    .deepgram
                    .as_ref()
                    .map(|key| key.expose_secret().to_string())
                    .ok_or_else(|| Error::Config("DEEPGRAM_API_KEY is not set".to_string()))?;
                Arc::new(DeepgramClient::new(key, config.stt.model.clone(), timeout)?)
            }
        };

        let llm: Arc<dyn Complete> = Arc::new(ChatClient::new(
            openai_key()?,
            config.llm.model.clone(),
            config.llm.max_tokens,
            config.llm.temperature,
            timeout,
        )?);

        let tts: Arc<dyn Synthesize> = match config.tts.backend {
            TtsBackend::OpenAi => Arc::new(SpeechClient::new(
                openai_key()?,
                config.tts.model.clone(),
                config.tts.voice.clone(),
                timeout,
            )?),
            TtsBackend::ElevenLabs => {
                let key = config
                    .api_keys
                    .elevenlabs
                    .as_ref()
                    .map(|key| key.expose_secret().to_string())
                    .ok_or_else(|| Error::Config("ELEVENLABS_API_KEY is not set".to_string()))?;
                Arc::new(ElevenLabsClient::new(
                    key,
                    config.tts.model.clone(),
                    config.tts.voice.clone(),
                    config.tts.extra_voices.clone(),
                    timeout,
                )?)
            }
        };

        Ok(Self { stt, llm, tts })
    }
}
