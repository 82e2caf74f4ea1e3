//! Deepgram transcription backend

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{Transcribe, classify_response, classify_transport, http_client};
use crate::{Error, Result};

#[derive(Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

/// Transcribes speech via Deepgram
pub struct DeepgramClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl DeepgramClient {
    /// Create a new Deepgram transcription client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing or the HTTP client cannot be built
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Deepgram API key required".to_string()));
        }

        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Transcribe for DeepgramClient {
    async fn transcribe(
        &self,
        audio: &[u8],
        _filename: &str,
        language: Option<&str>,
    ) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Deepgram transcription");

        let mut url = format!(
            "https://api.deepgram.com/v1/listen?model={}&punctuate=true",
            self.model
        );
        if let Some(language) = language {
            url.push_str("&language=");
            url.push_str(language);
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| classify_transport("Deepgram", e))?;

        if !response.status().is_success() {
            return Err(classify_response("Deepgram", response).await);
        }

        let result: DeepgramResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Deepgram response");
            Error::Http(e)
        })?;

        let transcript = result
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.clone())
            .unwrap_or_default();

        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }

    fn name(&self) -> &'static str {
        "deepgram"
    }
}
