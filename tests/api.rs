//! API endpoint integration tests
//!
//! Drive the full router with deterministic provider mocks; no network.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine;
use chrono::{Days, Utc};
use tower::ServiceExt;

use voicetask_gateway::api::ApiServer;

mod common;
use common::{
    FixedSynthesizer, FixedTranscriber, RecordingCompleter, build_state, default_state, make_wav,
    multipart_body,
};

const TASK_REPLY: &str = r#"{
    "title": "Call mom",
    "description": "Call mom to catch up",
    "priority": "high",
    "date": "tomorrow",
    "time": "17:00",
    "category": "personal",
    "tags": ["call", "mom"]
}"#;

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_version() {
    let app = ApiServer::router(default_state("hi", "{}"));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn ready_endpoint_names_backends() {
    let app = ApiServer::router(default_state("hi", "{}"));

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["checks"]["transcription"]["backend"], "mock-stt");
    assert_eq!(json["checks"]["completion"]["backend"], "mock-llm");
    assert_eq!(json["checks"]["synthesis"]["backend"], "mock-tts");
}

#[tokio::test]
async fn process_text_only_returns_structured_task() {
    let app = ApiServer::router(default_state("unused", TASK_REPLY));
    let tomorrow = Utc::now()
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap();

    let response = app
        .oneshot(json_request(
            "/voice-assistant/process-text-only",
            serde_json::json!({"text": "remind me to call mom tomorrow at 5pm, high priority"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    let task = &json["task"];
    assert!(task["title"].as_str().unwrap().contains("Call mom"));
    assert_eq!(task["priority"], "high");
    assert_eq!(task["due_date"], tomorrow.format("%Y-%m-%d").to_string());
    assert_eq!(task["due_time"], "17:00");
    assert_eq!(task["status"], "pending");
}

#[tokio::test]
async fn process_audio_runs_the_full_pipeline() {
    let state = build_state(
        Arc::new(FixedTranscriber(
            "remind me to call mom tomorrow at 5pm".to_string(),
        )),
        RecordingCompleter::new(TASK_REPLY),
        FixedSynthesizer::new(b"mp3".to_vec()),
    );
    let app = ApiServer::router(state);

    let boundary = "voicetask-test-boundary";
    let body = multipart_body(boundary, "note.wav", "audio/wav", &make_wav(0.2), &[]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/voice-assistant/process")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["task"]["title"], "Call mom");
}

#[tokio::test]
async fn unparseable_completion_is_an_extraction_error() {
    let app = ApiServer::router(default_state("unused", "I couldn't find a task in that."));

    let response = app
        .oneshot(json_request(
            "/voice-assistant/process-text-only",
            serde_json::json!({"text": "mumble mumble"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "extraction_failed");
}

#[tokio::test]
async fn chat_with_no_tasks_does_not_fabricate() {
    let llm = RecordingCompleter::new(
        r#"{"response": "Your plate is clear today.", "user_msg": "what's on my plate today?"}"#,
    );
    let state = build_state(
        Arc::new(FixedTranscriber("unused".to_string())),
        llm.clone(),
        FixedSynthesizer::new(b"mp3".to_vec()),
    );
    let app = ApiServer::router(state);

    let response = app
        .oneshot(json_request(
            "/chat/text",
            serde_json::json!({"message": "what's on my plate today?", "tasks": []}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["reply"], "Your plate is clear today.");

    // The prompt must forbid invented tasks and carry none
    let calls = llm.recorded();
    assert_eq!(calls.len(), 1);
    let (system, user) = &calls[0];
    assert!(system.contains("Do not invent"));
    assert!(!system.contains("relevant tasks"));
    assert_eq!(user, "what's on my plate today?");
}

#[tokio::test]
async fn chat_embeds_relevant_tasks_in_the_prompt() {
    let llm = RecordingCompleter::new(r#"{"response": "One task today.", "user_msg": "ok"}"#);
    let state = build_state(
        Arc::new(FixedTranscriber("unused".to_string())),
        llm.clone(),
        FixedSynthesizer::new(b"mp3".to_vec()),
    );
    let app = ApiServer::router(state);

    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let response = app
        .oneshot(json_request(
            "/chat/text",
            serde_json::json!({
                "message": "what's due today?",
                "tasks": [{
                    "id": "0b0f3a60-9d9c-4b77-8a1a-3a2b6f9d1a2b",
                    "title": "File expenses",
                    "description": "Q3 expense report",
                    "priority": "medium",
                    "due_date": today,
                }],
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let (system, _) = &llm.recorded()[0];
    assert!(system.contains("File expenses"));
}

#[tokio::test]
async fn voice_chat_returns_spoken_reply_when_asked() {
    let llm = RecordingCompleter::new(r#"{"response": "All done.", "user_msg": "status?"}"#);
    let state = build_state(
        Arc::new(FixedTranscriber("status?".to_string())),
        llm,
        FixedSynthesizer::new(b"speech-bytes".to_vec()),
    );
    let app = ApiServer::router(state);

    let boundary = "voicetask-test-boundary";
    let body = multipart_body(
        boundary,
        "question.wav",
        "audio/wav",
        &make_wav(0.2),
        &[("tasks", "[]"), ("speak", "true")],
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat/voice")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["reply"], "All done.");
    let audio = json["audio"].as_str().unwrap();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(audio)
        .unwrap();
    assert_eq!(decoded, b"speech-bytes");
}

#[tokio::test]
async fn supported_formats_lists_the_allow_list() {
    let app = ApiServer::router(default_state("hi", "{}"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/chat/supported-audio-formats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let formats: Vec<&str> = json["supported_formats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(formats.contains(&"wav"));
    assert!(formats.contains(&"mp3"));
    assert_eq!(json["canonical_format"], "wav");
}

#[tokio::test]
async fn stt_convert_accepts_base64_audio() {
    let app = ApiServer::router(default_state("hello from base64", "{}"));

    let audio = base64::engine::general_purpose::STANDARD.encode(make_wav(0.2));
    let response = app
        .oneshot(json_request(
            "/speech-to-text/convert",
            serde_json::json!({"audio": audio, "language": "en-US"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["text"], "hello from base64");
    assert_eq!(json["language"], "en-US");
}

#[tokio::test]
async fn stt_convert_rejects_empty_audio() {
    let app = ApiServer::router(default_state("unused", "{}"));

    let response = app
        .oneshot(json_request(
            "/speech-to-text/convert",
            serde_json::json!({"audio": ""}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "decode_error");
}

#[tokio::test]
async fn stt_convert_file_uploads_audio() {
    let app = ApiServer::router(default_state("file transcript", "{}"));

    let boundary = "voicetask-test-boundary";
    let body = multipart_body(boundary, "clip.wav", "audio/wav", &make_wav(0.2), &[]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/speech-to-text/convert-file")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["text"], "file transcript");
}

#[tokio::test]
async fn tts_convert_returns_mpeg_audio() {
    let app = ApiServer::router(default_state("unused", "{}"));

    let response = app
        .oneshot(json_request(
            "/text-to-speech/convert",
            serde_json::json!({"text": "hello there", "voice": "nova"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "audio/mpeg"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"mock-mp3-bytes");
}

#[tokio::test]
async fn tts_convert_rejects_unknown_voice() {
    let app = ApiServer::router(default_state("unused", "{}"));

    let response = app
        .oneshot(json_request(
            "/text-to-speech/convert",
            serde_json::json!({"text": "hello", "voice": "baritone-9000"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "unsupported_voice");
}

#[tokio::test]
async fn tts_convert_rejects_empty_text() {
    let app = ApiServer::router(default_state("unused", "{}"));

    let response = app
        .oneshot(json_request(
            "/text-to-speech/convert",
            serde_json::json!({"text": "  "}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn tts_voices_lists_backend_voices() {
    let app = ApiServer::router(default_state("unused", "{}"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/text-to-speech/voices")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["default_voice"], "alloy");
    assert!(json["voices"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn unsupported_upload_format_is_rejected() {
    let app = ApiServer::router(default_state("unused", "{}"));

    let boundary = "voicetask-test-boundary";
    let body = multipart_body(
        boundary,
        "clip.aiff",
        "application/octet-stream",
        &[0x00, 0x01, 0x02, 0x03],
        &[],
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/speech-to-text/convert-file")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "unsupported_format");
}
