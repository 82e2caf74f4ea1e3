//! Task-aware chat orchestration
//!
//! One request in, one reply out: the caller supplies the message and its
//! current task list, the orchestrator narrows the list to what the message
//! is actually about, embeds it in the system prompt, and forwards a single
//! completion call. No conversation memory is kept between requests.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

use crate::providers::Complete;
use crate::tasks::{Priority, Task, TaskStatus};
use crate::Result;

/// Upper bound on tasks embedded in a prompt
const MAX_CONTEXT_TASKS: usize = 15;

/// A task-aware chat reply
#[derive(Clone, Debug)]
pub struct ChatReply {
    /// Assistant reply text
    pub reply: String,
    /// The user message as the model understood it (transcription fixes applied)
    pub user_message: String,
}

/// Forwards task-aware chat to the completion provider
pub struct ChatOrchestrator {
    llm: Arc<dyn Complete>,
}

impl ChatOrchestrator {
    #[must_use]
    pub fn new(llm: Arc<dyn Complete>) -> Self {
        Self { llm }
    }

    /// Produce a reply to `message` given the caller's task list
    ///
    /// `timezone` is the caller's GMT offset (e.g. "+05:30"); task times are
    /// stored in GMT and the model is told to convert on display.
    ///
    /// # Errors
    ///
    /// Returns provider errors unchanged; never a partial reply.
    pub async fn respond(
        &self,
        message: &str,
        tasks: &[Task],
        timezone: &str,
        now: DateTime<Utc>,
    ) -> Result<ChatReply> {
        let relevant = filter_relevant(tasks, message, now);
        tracing::debug!(
            total = tasks.len(),
            relevant = relevant.len(),
            "task context filtered"
        );

        let system_prompt = build_system_prompt(&relevant, timezone, now)?;
        let reply = self.llm.complete(&system_prompt, message).await?;

        Ok(parse_reply(&reply, message))
    }
}

/// Narrow the caller's task list to what the message asks about
///
/// Explicit filters (date window, priority, status, overdue, keyword) are
/// checked first; when none matches, a bounded default window keeps the
/// prompt small.
#[must_use]
pub fn filter_relevant<'a>(tasks: &'a [Task], message: &str, now: DateTime<Utc>) -> Vec<&'a Task> {
    if tasks.is_empty() {
        return Vec::new();
    }

    let message = message.to_lowercase();
    let today = now.date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    let contains_any = |words: &[&str]| words.iter().any(|w| message.contains(w));

    let due_in = |task: &Task, from: NaiveDate, to: NaiveDate| {
        task.due_date.is_some_and(|d| d >= from && d <= to)
    };

    let mut filtered: Vec<&Task> = if contains_any(&["today", "today's"]) {
        tasks.iter().filter(|t| t.due_date == Some(today)).collect()
    } else if contains_any(&["tomorrow", "tomorrow's"]) {
        tasks
            .iter()
            .filter(|t| t.due_date == Some(tomorrow))
            .collect()
    } else if contains_any(&["next week", "next 7 days", "upcoming week"]) {
        let end = today.checked_add_days(Days::new(7)).unwrap_or(today);
        tasks.iter().filter(|t| due_in(t, today, end)).collect()
    } else if contains_any(&["this week", "week"]) {
        let start = today
            .checked_sub_days(Days::new(u64::from(today.weekday().num_days_from_monday())))
            .unwrap_or(today);
        let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
        tasks.iter().filter(|t| due_in(t, start, end)).collect()
    } else if contains_any(&["urgent", "high priority", "important"]) {
        tasks.iter().filter(|t| t.priority == Priority::High).collect()
    } else if contains_any(&["low priority", "least important"]) {
        tasks.iter().filter(|t| t.priority == Priority::Low).collect()
    } else if contains_any(&["pending", "not started", "todo"]) {
        tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .collect()
    } else if contains_any(&["in progress", "working on", "current"]) {
        tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .collect()
    } else if contains_any(&["completed", "done", "finished"]) {
        tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .collect()
    } else if contains_any(&["overdue", "late", "past due"]) {
        tasks
            .iter()
            .filter(|t| {
                t.due_date.is_some_and(|d| d < today) && t.status != TaskStatus::Completed
            })
            .collect()
    } else if contains_any(&["about", "regarding", "related to"]) {
        let keywords = trailing_keywords(&message, &["about", "regarding", "related to"]);
        if keywords.is_empty() {
            Vec::new()
        } else {
            tasks
                .iter()
                .filter(|t| {
                    let title = t.title.to_lowercase();
                    let description = t.description.to_lowercase();
                    keywords
                        .iter()
                        .any(|k| title.contains(k) || description.contains(k))
                })
                .collect()
        }
    } else {
        Vec::new()
    };

    // No explicit filter matched; fall back to a bounded default window
    if filtered.is_empty() {
        if contains_any(&[
            "schedule",
            "agenda",
            "calendar",
            "tasks",
            "what do i have",
            "meeting",
            "meetings",
            "appointments",
        ]) {
            let meeting_query = contains_any(&["meeting", "meetings", "appointment", "appointments"]);
            let start = if meeting_query {
                today.checked_sub_days(Days::new(1)).unwrap_or(today)
            } else {
                today
            };
            let end = today.checked_add_days(Days::new(7)).unwrap_or(today);
            filtered = tasks.iter().filter(|t| due_in(t, start, end)).collect();

            if meeting_query {
                let meeting_words = ["meeting", "conference", "call", "appointment"];
                let meetings: Vec<&Task> = filtered
                    .iter()
                    .copied()
                    .filter(|t| {
                        let title = t.title.to_lowercase();
                        let description = t.description.to_lowercase();
                        meeting_words
                            .iter()
                            .any(|w| title.contains(w) || description.contains(w))
                    })
                    .collect();
                if !meetings.is_empty() {
                    filtered = meetings;
                }
            }

            filtered.sort_by_key(|t| (std::cmp::Reverse(t.priority), t.due_date));
            filtered.truncate(10);
        } else {
            let mut today_tasks: Vec<&Task> =
                tasks.iter().filter(|t| t.due_date == Some(today)).collect();
            today_tasks.truncate(3);
            let mut tomorrow_tasks: Vec<&Task> = tasks
                .iter()
                .filter(|t| t.due_date == Some(tomorrow))
                .collect();
            tomorrow_tasks.truncate(3);
            filtered = today_tasks;
            filtered.extend(tomorrow_tasks);
        }
    }

    if filtered.len() > MAX_CONTEXT_TASKS {
        filtered.sort_by_key(|t| {
            (
                t.due_date.unwrap_or(NaiveDate::MAX),
                std::cmp::Reverse(t.priority),
            )
        });
        filtered.truncate(MAX_CONTEXT_TASKS);
    }

    filtered
}

/// Collect up to three words following each trigger phrase
fn trailing_keywords(message: &str, phrases: &[&str]) -> Vec<String> {
    let mut keywords = Vec::new();
    for phrase in phrases {
        if let Some(idx) = message.find(phrase) {
            let rest = message[idx + phrase.len()..].trim();
            keywords.extend(
                rest.split_whitespace()
                    .take(3)
                    .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
                    .filter(|w| !w.is_empty()),
            );
        }
    }
    keywords
}

/// Build the task-aware system prompt
fn build_system_prompt(
    relevant: &[&Task],
    timezone: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let mut prompt = format!(
        r#"You are a helpful AI assistant with task management capabilities.
Current date and time (GMT): {date} ({date_long})
User's timezone: GMT{timezone}
Note: convert all times to the user's timezone (GMT{timezone}) when displaying times or dates.

You help users manage their tasks and answer questions about their schedule, priorities, and workload.

IMPORTANT: always respond in the following JSON format:
{{"response": "Your helpful response here", "user_msg": "The corrected user message (fix any errors or keep as-is)"}}"#,
        date = now.format("%Y-%m-%d %H:%M:%S"),
        date_long = now.format("%A, %B %d, %Y at %H:%M"),
    );

    if relevant.is_empty() {
        prompt.push_str(
            "\n\nThe user has no tasks matching this request. Do not invent, assume, or \
             reference any tasks; answer from general knowledge only.",
        );
    } else {
        let tasks_json = serde_json::to_string_pretty(relevant)?;
        prompt.push_str(&format!(
            r#"

You have access to the following relevant tasks:
{tasks_json}

Use this task information to provide relevant and contextual responses.

Guidelines:
- All times in the system are GMT; convert to the user's timezone for display
- due_date is the day the task should be done; due_time is 24-hour GMT
- Be concise and helpful
- Reference specific tasks when relevant
- Help prioritize and organize tasks"#
        ));
    }

    Ok(prompt)
}

/// Parse the model's JSON reply envelope, falling back to raw text
fn parse_reply(reply: &str, original_message: &str) -> ChatReply {
    let trimmed = reply.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            let text = value
                .get("response")
                .and_then(|v| v.as_str())
                .unwrap_or(trimmed);
            let user_message = value
                .get("user_msg")
                .and_then(|v| v.as_str())
                .unwrap_or(original_message);
            return ChatReply {
                reply: text.to_string(),
                user_message: user_message.to_string(),
            };
        }
    }

    ChatReply {
        reply: reply.to_string(),
        user_message: original_message.to_string(),
    }
}
