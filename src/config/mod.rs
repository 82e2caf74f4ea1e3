//! Configuration for the voicetask gateway
//!
//! One explicit [`Config`] is built at process start (file overlay, then
//! environment) and passed into component constructors; nothing reads the
//! environment after startup.

pub mod file;

use std::path::Path;

use secrecy::SecretString;

use crate::{Error, Result};
use file::GatewayConfigFile;

/// Default port, matching the service this gateway replaces
pub const DEFAULT_PORT: u16 = 8029;

/// Default per-provider-call timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Per-provider-call timeout in seconds (mandatory bound on every
    /// external call)
    pub request_timeout_secs: u64,

    /// Chat completion configuration
    pub llm: LlmConfig,

    /// Speech-to-text configuration
    pub stt: SttConfig,

    /// Text-to-speech configuration
    pub tts: TtsConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Global requests-per-minute cap; `None` disables rate limiting
    pub rate_limit_per_minute: Option<u32>,
}

/// Chat completion configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: u32,

    /// Sampling temperature (kept low; task extraction wants stable output)
    pub temperature: f32,
}

/// Speech-to-text configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    pub backend: SttBackend,
    pub model: String,
}

/// Text-to-speech configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub backend: TtsBackend,
    pub model: String,
    /// Default voice identifier
    pub voice: String,
    /// Speed multiplier (0.25 to 4.0)
    pub speed: f32,
    /// Additional allowed voice identifiers (ElevenLabs voice IDs)
    pub extra_voices: Vec<String>,
}

/// Speech-to-text backend selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SttBackend {
    #[default]
    Whisper,
    Deepgram,
}

impl SttBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "whisper" | "openai" => Ok(Self::Whisper),
            "deepgram" => Ok(Self::Deepgram),
            other => Err(Error::Config(format!("unknown STT backend: {other}"))),
        }
    }
}

/// Text-to-speech backend selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TtsBackend {
    #[default]
    OpenAi,
    ElevenLabs,
}

impl TtsBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "elevenlabs" => Ok(Self::ElevenLabs),
            other => Err(Error::Config(format!("unknown TTS backend: {other}"))),
        }
    }
}

/// API keys for external services
#[derive(Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper, chat completions, TTS)
    pub openai: Option<SecretString>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<SecretString>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<SecretString>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("openai", &self.openai.is_some())
            .field("deepgram", &self.deepgram.is_some())
            .field("elevenlabs", &self.elevenlabs.is_some())
            .finish()
    }
}

impl Config {
    /// Load configuration: file overlay first, environment on top
    ///
    /// # Errors
    ///
    /// Returns error if the config file is malformed or a backend selector
    /// is unrecognized
    pub fn load(file_path: Option<&Path>, port_override: Option<u16>) -> Result<Self> {
        let overlay = GatewayConfigFile::load(file_path)?;

        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let stt_backend = env("VOICETASK_STT_BACKEND")
            .or(overlay.stt.backend)
            .map_or(Ok(SttBackend::default()), |v| SttBackend::parse(&v))?;

        let tts_backend = env("VOICETASK_TTS_BACKEND")
            .or(overlay.tts.backend)
            .map_or(Ok(TtsBackend::default()), |v| TtsBackend::parse(&v))?;

        let request_timeout_secs = env("VOICETASK_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .or(overlay.server.request_timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            server: ServerConfig {
                port: port_override
                    .or(overlay.server.port)
                    .unwrap_or(DEFAULT_PORT),
                rate_limit_per_minute: env("VOICETASK_RATE_LIMIT")
                    .and_then(|v| v.parse().ok())
                    .or(overlay.server.rate_limit_per_minute),
            },
            request_timeout_secs,
            llm: LlmConfig {
                model: env("VOICETASK_LLM_MODEL")
                    .or(overlay.llm.model)
                    .unwrap_or_else(|| "gpt-4o-mini".to_string()),
                max_tokens: overlay.llm.max_tokens.unwrap_or(512),
                temperature: overlay.llm.temperature.unwrap_or(0.3),
            },
            stt: SttConfig {
                backend: stt_backend,
                model: env("VOICETASK_STT_MODEL")
                    .or(overlay.stt.model)
                    .unwrap_or_else(|| default_stt_model(stt_backend).to_string()),
            },
            tts: TtsConfig {
                backend: tts_backend,
                model: env("VOICETASK_TTS_MODEL")
                    .or(overlay.tts.model)
                    .unwrap_or_else(|| default_tts_model(tts_backend).to_string()),
                voice: env("VOICETASK_TTS_VOICE")
                    .or(overlay.tts.voice)
                    .unwrap_or_else(|| "alloy".to_string()),
                speed: overlay.tts.speed.unwrap_or(1.0),
                extra_voices: overlay.tts.extra_voices.unwrap_or_default(),
            },
            api_keys: ApiKeys {
                openai: env("OPENAI_API_KEY").map(SecretString::from),
                deepgram: env("DEEPGRAM_API_KEY")
                    .or(overlay.api_keys.deepgram)
                    .map(SecretString::from),
                elevenlabs: env("ELEVENLABS_API_KEY")
                    .or(overlay.api_keys.elevenlabs)
                    .map(SecretString::from),
            }
            .merge_file_openai(overlay.api_keys.openai),
        })
    }
}

impl ApiKeys {
    /// File-sourced OpenAI key only fills the gap; the env var wins
    fn merge_file_openai(mut self, file_key: Option<String>) -> Self {
        if self.openai.is_none() {
            self.openai = file_key.filter(|k| !k.is_empty()).map(SecretString::from);
        }
        self
    }
}

const fn default_stt_model(backend: SttBackend) -> &'static str {
    match backend {
        SttBackend::Whisper => "whisper-1",
        SttBackend::Deepgram => "nova-2",
    }
}

const fn default_tts_model(backend: TtsBackend) -> &'static str {
    match backend {
        TtsBackend::OpenAi => "tts-1",
        TtsBackend::ElevenLabs => "eleven_monolingual_v1",
    }
}
