//! Shared test utilities: deterministic provider mocks and state builders

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use voicetask_gateway::api::ApiState;
use voicetask_gateway::chat::ChatOrchestrator;
use voicetask_gateway::tasks::TaskExtractor;
use voicetask_gateway::{Complete, Error, Result, Synthesize, Transcribe};

/// Transcriber returning a fixed transcript; rejects empty audio like a real
/// provider would
pub struct FixedTranscriber(pub String);

#[async_trait]
impl Transcribe for FixedTranscriber {
    async fn transcribe(
        &self,
        audio: &[u8],
        _filename: &str,
        _language: Option<&str>,
    ) -> Result<String> {
        if audio.is_empty() {
            return Err(Error::ProviderRejected("empty audio".to_string()));
        }
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "mock-stt"
    }
}

/// Completion backend returning a fixed reply and recording every prompt pair
pub struct RecordingCompleter {
    pub reply: String,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl RecordingCompleter {
    pub fn new(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.into(),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// All (system, user) prompt pairs seen so far
    pub fn recorded(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Complete for RecordingCompleter {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_message.to_string()));
        Ok(self.reply.clone())
    }

    fn name(&self) -> &'static str {
        "mock-llm"
    }
}

/// Completion backend that always fails as an upstream outage
pub struct UnavailableCompleter;

#[async_trait]
impl Complete for UnavailableCompleter {
    async fn complete(&self, _system_prompt: &str, _user_message: &str) -> Result<String> {
        Err(Error::ProviderUnavailable("mock outage".to_string()))
    }

    fn name(&self) -> &'static str {
        "mock-llm-down"
    }
}

/// Synthesizer returning fixed bytes and recording the text it was given
pub struct FixedSynthesizer {
    pub audio: Vec<u8>,
    pub voices: Vec<String>,
    pub spoken: Mutex<Vec<String>>,
}

impl FixedSynthesizer {
    pub fn new(audio: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            audio,
            voices: vec!["alloy".to_string(), "nova".to_string()],
            spoken: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Synthesize for FixedSynthesizer {
    async fn synthesize(&self, text: &str, voice: Option<&str>, _speed: f32) -> Result<Vec<u8>> {
        if let Some(voice) = voice {
            if !self.voices.iter().any(|v| v == voice) {
                return Err(Error::UnsupportedVoice(voice.to_string()));
            }
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(self.audio.clone())
    }

    fn voices(&self) -> Vec<String> {
        self.voices.clone()
    }

    fn name(&self) -> &'static str {
        "mock-tts"
    }
}

/// Assemble API state around mock providers
pub fn build_state(
    stt: Arc<dyn Transcribe>,
    llm: Arc<dyn Complete>,
    tts: Arc<dyn Synthesize>,
) -> Arc<ApiState> {
    Arc::new(ApiState {
        stt,
        llm: llm.clone(),
        tts,
        extractor: TaskExtractor::new(llm.clone()),
        chat: ChatOrchestrator::new(llm),
        tts_voice: "alloy".to_string(),
        tts_speed: 1.0,
        rate_limiter: None,
    })
}

/// Default state: fixed transcript, fixed completion, fixed audio
pub fn default_state(transcript: &str, completion: &str) -> Arc<ApiState> {
    build_state(
        Arc::new(FixedTranscriber(transcript.to_string())),
        RecordingCompleter::new(completion),
        FixedSynthesizer::new(b"mock-mp3-bytes".to_vec()),
    )
}

/// Generate a mono 16 kHz sine-wave WAV clip
pub fn make_wav(duration_secs: f32) -> Vec<u8> {
    make_wav_at(duration_secs, 16_000)
}

/// Generate a mono sine-wave WAV clip at an arbitrary sample rate
pub fn make_wav_at(duration_secs: f32, sample_rate: u32) -> Vec<u8> {
    let num_samples = (sample_rate as f32 * duration_secs) as usize;
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        })
        .collect();
    voicetask_gateway::audio::samples_to_wav(&samples, sample_rate).unwrap()
}

/// Build a multipart request body with one file part and optional text fields
pub fn multipart_body(
    boundary: &str,
    filename: &str,
    content_type: &str,
    file_bytes: &[u8],
    fields: &[(&str, &str)],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"audio_file\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
