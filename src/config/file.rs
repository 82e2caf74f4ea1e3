//! TOML configuration file loading
//!
//! Supports `~/.config/omni/voicetask/config.toml` as a persistent config
//! source. All fields are optional — the file is a partial overlay on top of
//! defaults, and environment variables override the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct GatewayConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Speech-to-text configuration
    #[serde(default)]
    pub stt: SttFileConfig,

    /// Text-to-speech configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Port to listen on
    pub port: Option<u16>,

    /// Global requests-per-minute cap; absent disables rate limiting
    pub rate_limit_per_minute: Option<u32>,

    /// Per-provider-call timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,

    /// Max tokens per completion
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    pub temperature: Option<f32>,
}

/// Speech-to-text configuration
#[derive(Debug, Default, Deserialize)]
pub struct SttFileConfig {
    /// Backend ("whisper" or "deepgram")
    pub backend: Option<String>,

    /// Model identifier (e.g. "whisper-1", "nova-2")
    pub model: Option<String>,
}

/// Text-to-speech configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// Backend ("openai" or "elevenlabs")
    pub backend: Option<String>,

    /// Model identifier (e.g. "tts-1")
    pub model: Option<String>,

    /// Default voice identifier
    pub voice: Option<String>,

    /// Speed multiplier (0.25 to 4.0)
    pub speed: Option<f32>,

    /// Additional allowed voice identifiers (ElevenLabs voice IDs)
    pub extra_voices: Option<Vec<String>>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub elevenlabs: Option<String>,
}

impl GatewayConfigFile {
    /// Default config file path under the user config directory
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "omni", "voicetask")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load the config file from an explicit path or the default location
    ///
    /// A missing file yields the all-default overlay.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let parsed = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(parsed)
    }
}
