//! OpenAI provider backends: Whisper transcription, chat completions, speech

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Complete, Synthesize, Transcribe, classify_response, classify_transport, http_client};
use crate::audio::AudioFormat;
use crate::{Error, Result};

/// Voices offered by the OpenAI speech API
const OPENAI_VOICES: &[&str] = &[
    "alloy", "ash", "coral", "echo", "fable", "nova", "onyx", "sage", "shimmer",
];

/// Response from the Whisper transcription API
#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes speech via OpenAI Whisper
pub struct WhisperClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl WhisperClient {
    /// Create a new Whisper transcription client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing or the HTTP client cannot be built
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Transcribe for WhisperClient {
    async fn transcribe(
        &self,
        audio: &[u8],
        filename: &str,
        language: Option<&str>,
    ) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        let mime = filename
            .rsplit_once('.')
            .and_then(|(_, ext)| AudioFormat::from_extension(ext))
            .map_or("audio/wav", AudioFormat::mime_type);

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name(filename.to_string())
                    .mime_str(mime)
                    .map_err(|e| Error::ProviderRejected(e.to_string()))?,
            )
            .text("model", self.model.clone());

        if let Some(language) = language {
            // Whisper takes a bare ISO-639-1 code, not a BCP-47 tag
            let code = language.split('-').next().unwrap_or(language);
            form = form.text("language", code.to_string());
        }

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| classify_transport("Whisper", e))?;

        if !response.status().is_success() {
            return Err(classify_response("Whisper", response).await);
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Whisper response");
            Error::Http(e)
        })?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }

    fn name(&self) -> &'static str {
        "openai-whisper"
    }
}

/// Chat completions client
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatClient {
    /// Create a new chat completions client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing or the HTTP client cannot be built
    pub fn new(
        api_key: String,
        model: String,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for chat completions".to_string(),
            ));
        }

        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model,
            max_tokens,
            temperature,
        })
    }
}

#[async_trait]
impl Complete for ChatClient {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: user_message,
                },
            ],
            max_tokens: Some(self.max_tokens),
            temperature: self.temperature,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport("chat completion", e))?;

        if !response.status().is_success() {
            return Err(classify_response("chat completion", response).await);
        }

        let result: ChatCompletionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse completion response");
            Error::Http(e)
        })?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::ProviderUnavailable("no completion choices returned".to_string()))
    }

    fn name(&self) -> &'static str {
        "openai-chat"
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Synthesizes speech via the OpenAI speech API
#[derive(Debug)]
pub struct SpeechClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    default_voice: String,
}

impl SpeechClient {
    /// Create a new speech synthesis client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing, the default voice is unknown, or
    /// the HTTP client cannot be built
    pub fn new(
        api_key: String,
        model: String,
        default_voice: String,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }
        if !OPENAI_VOICES.contains(&default_voice.as_str()) {
            return Err(Error::Config(format!(
                "unknown default TTS voice: {default_voice}"
            )));
        }

        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model,
            default_voice,
        })
    }
}

#[async_trait]
impl Synthesize for SpeechClient {
    async fn synthesize(&self, text: &str, voice: Option<&str>, speed: f32) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let voice = voice.unwrap_or(self.default_voice.as_str());
        if !OPENAI_VOICES.contains(&voice) {
            return Err(Error::UnsupportedVoice(voice.to_string()));
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice,
            speed,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport("OpenAI TTS", e))?;

        if !response.status().is_success() {
            return Err(classify_response("OpenAI TTS", response).await);
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    fn voices(&self) -> Vec<String> {
        OPENAI_VOICES.iter().map(ToString::to_string).collect()
    }

    fn name(&self) -> &'static str {
        "openai-tts"
    }
}
