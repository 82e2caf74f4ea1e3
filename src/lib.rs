//! Voicetask Gateway - voice-to-task assistant over external AI providers
//!
//! This library provides the core functionality for the voicetask gateway:
//! - Audio normalization for uploaded voice clips
//! - Provider clients for speech-to-text, chat completion, and text-to-speech
//! - Structured task extraction from transcripts
//! - Task-aware chat orchestration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  HTTP Façade (axum)                  │
//! │  voice-assistant │ chat │ speech-to-text │ tts      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │            Pipelines (per request)                   │
//! │  Normalize → Transcribe → Extract/Chat → Synthesize │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │         External Providers (reqwest)                 │
//! │     STT  │  Chat completion  │  TTS                 │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Every request owns its data end to end: the audio blob, transcript, and
//! task records live for one pipeline execution and are dropped with the
//! response. The gateway keeps no durable state.

pub mod api;
pub mod audio;
pub mod chat;
pub mod config;
pub mod error;
pub mod providers;
pub mod tasks;

pub use api::{ApiServer, ApiState};
pub use audio::{AudioBlob, AudioFormat};
pub use chat::{ChatOrchestrator, ChatReply};
pub use config::Config;
pub use error::{Error, Result};
pub use providers::{Complete, Providers, Synthesize, Transcribe};
pub use tasks::{Priority, Task, TaskExtractor, TaskStatus};
