//! Structured task extraction from free-form transcripts

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use super::dates;
use super::{Priority, Task, TaskStatus};
use crate::providers::Complete;
use crate::{Error, Result};

/// Models love to wrap JSON in prose; grab the outermost object
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that extracts task information from text and returns it as JSON.";

/// Field shape the extraction prompt asks the model to emit
#[derive(Debug, Deserialize)]
struct RawTask {
    title: Option<String>,
    description: Option<String>,
    priority: Option<String>,
    date: Option<String>,
    time: Option<String>,
    category: Option<String>,
    tags: Option<Vec<String>>,
}

/// Turns transcript text into a structured [`Task`] via the completion
/// provider
///
/// Stateless and deterministic given a deterministic backend: the request
/// timestamp anchors all relative dates, so the same transcript and clock
/// always produce the same task fields.
pub struct TaskExtractor {
    llm: Arc<dyn Complete>,
}

impl TaskExtractor {
    #[must_use]
    pub fn new(llm: Arc<dyn Complete>) -> Self {
        Self { llm }
    }

    /// Extract a task from transcript text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Extraction`] when the transcript is empty or the
    /// model reply is not a complete task record; provider errors pass
    /// through unchanged. Never returns a partially-filled task.
    pub async fn extract(&self, transcript: &str, now: DateTime<Utc>) -> Result<Task> {
        if transcript.trim().is_empty() {
            return Err(Error::Extraction("empty transcript".to_string()));
        }

        let prompt = build_prompt(transcript, now);
        let reply = self.llm.complete(SYSTEM_PROMPT, &prompt).await?;

        let raw = parse_reply(&reply)?;
        let task = validate(raw, now)?;

        tracing::info!(title = %task.title, priority = ?task.priority, "task extracted");
        Ok(task)
    }
}

/// Build the two-step correction-and-extraction prompt
///
/// Step one asks the model to fix transcription artifacts in place (same
/// language, same intent); step two extracts the task record with today and
/// tomorrow pre-resolved so the model never has to guess the clock.
fn build_prompt(transcript: &str, now: DateTime<Utc>) -> String {
    let today = now.date_naive();
    let tomorrow = today.succ_opt().unwrap_or(today);

    format!(
        r#"The input may be in any language. Your task has two steps.

STEP 1: FIX ANY TRANSCRIPTION ERRORS IN THE INPUT TEXT
- Keep the same language as the input
- Fix obvious transcription errors, especially numbers, dates, and times
- Keep the original meaning and intent; do not translate
- If the text is already correct, use it as is

STEP 2: EXTRACT TASK INFORMATION FROM THE CORRECTED TEXT
The JSON structure and field names are English. The values of "title" and
"description" stay in the input language; every other value is English.
Never use relative words like tomorrow, today, or next week inside the
title or description.

Current date and time: {now}
Today's date: {today} ({today_long})
Tomorrow's date: {tomorrow} ({tomorrow_long})

Text to analyze: "{transcript}"

Extract a task with these fields:
- title: a clear, concise title (input language, no relative date words)
- description: what needs to be done (input language, no relative date words)
- priority: "high", "medium", or "low" based on urgency keywords
- date: any date mention converted to YYYY-MM-DD ("tomorrow" = {tomorrow},
  "today" = {today}, "next week" = about 7 days out); null when no date is
  mentioned
- time: any time mention as HH:MM in 24-hour clock; null when no time is
  mentioned; never words like morning or evening
- category: one of work, personal, health, shopping, meeting, reminder, etc.
- tags: relevant keywords

Respond with a JSON object only, no additional text. Example:
{{
    "title": "Call John about project meeting",
    "description": "Need to call John to discuss the upcoming project meeting details",
    "priority": "medium",
    "date": "{today}",
    "time": "14:00",
    "category": "work",
    "tags": ["call", "meeting", "john", "project"]
}}"#,
        now = now.format("%Y-%m-%dT%H:%M:%SZ"),
        today = today.format("%Y-%m-%d"),
        today_long = today.format("%A, %B %d, %Y"),
        tomorrow = tomorrow.format("%Y-%m-%d"),
        tomorrow_long = tomorrow.format("%A, %B %d, %Y"),
    )
}

/// Pull the task record out of the model reply
fn parse_reply(reply: &str) -> Result<RawTask> {
    let json = JSON_OBJECT
        .find(reply)
        .ok_or_else(|| Error::Extraction("no JSON object in completion".to_string()))?;

    serde_json::from_str(json.as_str())
        .map_err(|e| Error::Extraction(format!("malformed task record: {e}")))
}

/// Validate the raw record into a complete task
///
/// The title is mandatory; a record without one is an extraction failure,
/// not a task with a placeholder. The softer fields are normalized: missing
/// description falls back to the title, unrecognized priority becomes
/// medium, and an unresolvable date follows the documented drop-to-none
/// policy.
fn validate(raw: RawTask, now: DateTime<Utc>) -> Result<Task> {
    let title = raw
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Extraction("task record is missing a title".to_string()))?;

    let description = raw
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| title.clone());

    let priority = raw
        .priority
        .as_deref()
        .map_or(Priority::Medium, Priority::parse_lenient);

    let due_date = raw.date.as_deref().and_then(|s| resolve_date(s, now));
    let due_time = raw.time.as_deref().and_then(parse_time);

    Ok(Task {
        id: Uuid::new_v4(),
        title,
        description,
        priority,
        due_date,
        due_time,
        category: raw.category.filter(|c| !c.is_empty()),
        status: TaskStatus::Pending,
        tags: raw.tags.unwrap_or_default(),
    })
}

/// Resolve the model's date field; unresolvable dates drop to none
fn resolve_date(value: &str, now: DateTime<Utc>) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    // ISO datetime: keep the calendar day
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    match dates::resolve_relative(value, now) {
        Ok(date) => date,
        Err(e) => {
            tracing::warn!(value, error = %e, "dropping unresolvable due date");
            None
        }
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}
