//! Relative due-date resolution
//!
//! Resolves the date phrases the extraction model is allowed to echo back
//! ("today", "tomorrow", explicit DD/MM/YYYY) against the request clock.
//! Everything in local logic is anchored to the request timestamp, never the
//! server wall clock, so extraction stays deterministic under test.

use std::sync::LazyLock;

use chrono::{DateTime, Days, NaiveDate, Utc};
use regex::Regex;

use crate::{Error, Result};

static EXPLICIT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").expect("valid regex"));

/// Phrases that clearly refer to a date but cannot be pinned to a day
const VAGUE_PHRASES: &[&str] = &["someday", "sometime", "soon", "later", "eventually", "whenever"];

/// Resolve a natural-language date phrase against the request time
///
/// Returns `Ok(None)` when the text contains no date reference at all.
///
/// # Errors
///
/// Returns [`Error::AmbiguousDate`] for a phrase that is date-like but not
/// resolvable to a calendar day (e.g. "someday"), or an explicit date that
/// does not exist (e.g. 31/02).
pub fn resolve_relative(text: &str, now: DateTime<Utc>) -> Result<Option<NaiveDate>> {
    let today = now.date_naive();
    let lower = text.to_lowercase();

    if lower.contains("today") || lower.contains("tonight") {
        return Ok(Some(today));
    }
    if lower.contains("tomorrow") {
        return Ok(today.checked_add_days(Days::new(1)));
    }
    if lower.contains("next week") {
        return Ok(today.checked_add_days(Days::new(7)));
    }
    if lower.contains("next month") {
        return Ok(today.checked_add_days(Days::new(30)));
    }

    if let Some(captures) = EXPLICIT_DATE.captures(&lower) {
        let day: u32 = captures[1].parse().unwrap_or(0);
        let month: u32 = captures[2].parse().unwrap_or(0);
        let year: i32 = captures[3].parse().unwrap_or(0);
        return NaiveDate::from_ymd_opt(year, month, day)
            .map(Some)
            .ok_or_else(|| Error::AmbiguousDate(format!("{day:02}/{month:02}/{year}")));
    }

    if let Some(phrase) = VAGUE_PHRASES.iter().find(|p| lower.contains(*p)) {
        return Err(Error::AmbiguousDate((*phrase).to_string()));
    }

    Ok(None)
}
