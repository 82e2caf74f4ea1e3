//! Error types for the voicetask gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while processing a request pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Uploaded audio is in a format outside the allow-list
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Audio bytes could not be decoded (empty or malformed)
    #[error("audio decode error: {0}")]
    Decode(String),

    /// Upstream provider outage or throttling (retryable by the caller)
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider rejected the input (non-retryable)
    #[error("provider rejected request: {0}")]
    ProviderRejected(String),

    /// Model output could not be parsed into a complete task
    #[error("task extraction failed: {0}")]
    Extraction(String),

    /// Date phrase recognized but not resolvable to a calendar day
    #[error("ambiguous date: {0}")]
    AmbiguousDate(String),

    /// Requested synthesis voice is not offered by the backend
    #[error("unsupported voice: {0}")]
    UnsupportedVoice(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Stable machine-readable kind for API error envelopes
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Decode(_) => "decode_error",
            Self::ProviderUnavailable(_) => "provider_unavailable",
            Self::ProviderRejected(_) => "provider_rejected",
            Self::Extraction(_) => "extraction_failed",
            Self::AmbiguousDate(_) => "ambiguous_date",
            Self::UnsupportedVoice(_) => "unsupported_voice",
            Self::Io(_) => "io_error",
            Self::Http(_) => "http_error",
            Self::Serialization(_) => "serialization_error",
            Self::Toml(_) => "toml_error",
        }
    }
}
