//! ElevenLabs speech synthesis backend

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{Synthesize, classify_response, classify_transport, http_client};
use crate::{Error, Result};

/// Synthesizes speech via ElevenLabs
///
/// ElevenLabs voices are account-scoped IDs rather than a fixed catalogue,
/// so the allowed set comes from configuration.
pub struct ElevenLabsClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    default_voice: String,
    voices: Vec<String>,
}

impl ElevenLabsClient {
    /// Create a new ElevenLabs synthesis client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing or the HTTP client cannot be built
    pub fn new(
        api_key: String,
        model: String,
        default_voice: String,
        extra_voices: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }

        let mut voices = vec![default_voice.clone()];
        voices.extend(extra_voices.into_iter().filter(|v| *v != default_voice));

        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model,
            default_voice,
            voices,
        })
    }
}

#[async_trait]
impl Synthesize for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice: Option<&str>, _speed: f32) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let voice = voice.unwrap_or(self.default_voice.as_str());
        if !self.voices.iter().any(|v| v == voice) {
            return Err(Error::UnsupportedVoice(voice.to_string()));
        }

        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{voice}");

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport("ElevenLabs TTS", e))?;

        if !response.status().is_success() {
            return Err(classify_response("ElevenLabs TTS", response).await);
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    fn voices(&self) -> Vec<String> {
        self.voices.clone()
    }

    fn name(&self) -> &'static str {
        "elevenlabs"
    }
}
