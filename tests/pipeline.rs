//! Pipeline property tests with deterministic provider mocks

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use voicetask_gateway::chat::ChatOrchestrator;
use voicetask_gateway::tasks::TaskExtractor;
use voicetask_gateway::{Error, Priority, Transcribe};

mod common;
use common::{FixedSynthesizer, FixedTranscriber, RecordingCompleter, UnavailableCompleter};

fn noon() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap()
}

const CALL_MOM_REPLY: &str = r#"{
    "title": "Call mom",
    "description": "Call mom to catch up",
    "priority": "high",
    "date": "2026-08-07",
    "time": "17:00",
    "category": "personal",
    "tags": ["call", "mom"]
}"#;

#[tokio::test]
async fn extractor_is_idempotent_for_a_deterministic_backend() {
    let extractor = TaskExtractor::new(RecordingCompleter::new(CALL_MOM_REPLY));
    let transcript = "remind me to call mom tomorrow at 5pm, high priority";

    let first = extractor.extract(transcript, noon()).await.unwrap();
    let second = extractor.extract(transcript, noon()).await.unwrap();

    // Identical content; only the generated id differs
    assert_eq!(first.title, second.title);
    assert_eq!(first.description, second.description);
    assert_eq!(first.priority, second.priority);
    assert_eq!(first.due_date, second.due_date);
    assert_eq!(first.due_time, second.due_time);
    assert_eq!(first.category, second.category);
    assert_eq!(first.tags, second.tags);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn call_mom_scenario_extracts_the_expected_task() {
    let extractor = TaskExtractor::new(RecordingCompleter::new(CALL_MOM_REPLY));

    let task = extractor
        .extract("remind me to call mom tomorrow at 5pm, high priority", noon())
        .await
        .unwrap();

    assert!(task.title.contains("Call mom"));
    assert_eq!(task.priority, Priority::High);
    assert_eq!(
        task.due_date,
        chrono::NaiveDate::from_ymd_opt(2026, 8, 7)
    );
    assert_eq!(task.due_time, chrono::NaiveTime::from_hms_opt(17, 0, 0));
}

#[tokio::test]
async fn extraction_prompt_carries_date_anchors() {
    let llm = RecordingCompleter::new(CALL_MOM_REPLY);
    let extractor = TaskExtractor::new(llm.clone());

    extractor
        .extract("call mom tomorrow", noon())
        .await
        .unwrap();

    let (_, user_prompt) = &llm.recorded()[0];
    assert!(user_prompt.contains("2026-08-06"));
    assert!(user_prompt.contains("2026-08-07"));
    assert!(user_prompt.contains("call mom tomorrow"));
}

#[tokio::test]
async fn empty_transcript_never_yields_a_task() {
    let extractor = TaskExtractor::new(RecordingCompleter::new(CALL_MOM_REPLY));

    let err = extractor.extract("   ", noon()).await.unwrap_err();
    assert!(matches!(err, Error::Extraction(_)));
}

#[tokio::test]
async fn empty_audio_is_rejected_before_any_task_exists() {
    let stt = FixedTranscriber("should not be reached".to_string());

    let err = stt.transcribe(&[], "audio.wav", None).await.unwrap_err();
    assert!(matches!(err, Error::ProviderRejected(_)));
}

#[tokio::test]
async fn provider_outage_propagates_unchanged() {
    let extractor = TaskExtractor::new(Arc::new(UnavailableCompleter));

    let err = extractor.extract("call mom", noon()).await.unwrap_err();
    assert!(matches!(err, Error::ProviderUnavailable(_)));
}

#[tokio::test]
async fn synthesized_reply_matches_the_transcribed_text() {
    // Transcribe → synthesize round-trip: the synthesizer must be handed
    // exactly the text the transcriber produced
    let stt = FixedTranscriber("your meeting is at noon".to_string());
    let tts = FixedSynthesizer::new(b"voice-bytes".to_vec());

    let transcript = stt
        .transcribe(b"fake-audio", "audio.wav", None)
        .await
        .unwrap();
    let audio = voicetask_gateway::Synthesize::synthesize(&*tts, &transcript, None, 1.0)
        .await
        .unwrap();

    assert_eq!(audio, b"voice-bytes");
    let spoken = tts.spoken.lock().unwrap();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0], "your meeting is at noon");
}

#[tokio::test]
async fn chat_reply_envelope_is_parsed() {
    let llm = RecordingCompleter::new(
        r#"{"response": "Two tasks due tomorrow.", "user_msg": "what's due tomorrow?"}"#,
    );
    let chat = ChatOrchestrator::new(llm);

    let reply = chat
        .respond("whats due tomorow?", &[], "+02:00", noon())
        .await
        .unwrap();

    assert_eq!(reply.reply, "Two tasks due tomorrow.");
    assert_eq!(reply.user_message, "what's due tomorrow?");
}

#[tokio::test]
async fn chat_prompt_mentions_caller_timezone() {
    let llm = RecordingCompleter::new("plain reply");
    let chat = ChatOrchestrator::new(llm.clone());

    let reply = chat.respond("hello", &[], "+05:30", noon()).await.unwrap();

    assert_eq!(reply.reply, "plain reply");
    let (system, _) = &llm.recorded()[0];
    assert!(system.contains("GMT+05:30"));
}
