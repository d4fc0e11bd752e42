use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::AgentError;
use crate::services::calendar::CalendarBackend;
use crate::services::temporal::dateparse;

pub const MEETING_MINUTES: i64 = 30;

const BOOKED_DESCRIPTION: &str = "Booked via assistant";
const RESCHEDULED_DESCRIPTION: &str = "Rescheduled via assistant";

/// Combines an already-resolved date with a free-text time phrase.
pub fn resolve_start(
    date: NaiveDate,
    time_text: &str,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, AgentError> {
    let combined = format!("{} {}", date.format("%Y-%m-%d"), time_text);
    dateparse::parse_single(&combined, now).ok_or_else(|| AgentError::Parse(time_text.to_string()))
}

pub async fn book_meeting(
    backend: &dyn CalendarBackend,
    start: NaiveDateTime,
    title: &str,
    description: &str,
) -> Result<String, AgentError> {
    let end = start + Duration::minutes(MEETING_MINUTES);
    let event = backend.create_event(title, description, start, end).await?;
    tracing::info!(id = %event.id, title = %title, start = %start, "booked meeting");

    Ok(format!(
        "Booking confirmed: {} on {} from {} to {}.",
        title,
        start.format("%Y-%m-%d"),
        start.format("%I:%M %p"),
        end.format("%I:%M %p")
    ))
}

pub async fn book_meeting_default(
    backend: &dyn CalendarBackend,
    start: NaiveDateTime,
    title: &str,
) -> Result<String, AgentError> {
    book_meeting(backend, start, title, BOOKED_DESCRIPTION).await
}

/// Delete-then-create. The lookup spans the next year; an exact
/// case-insensitive title match is required and the chronologically
/// earliest match wins. A missing match is logged and skipped. Not
/// transactional: a backend failure after the delete is reported, not
/// rolled back.
pub async fn reschedule_meeting(
    backend: &dyn CalendarBackend,
    title: &str,
    new_start: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<String, AgentError> {
    let candidates = backend
        .list_events(now, now + Duration::days(365), Some(title))
        .await?;

    let existing = candidates
        .into_iter()
        .find(|e| titles_match(&e.title, title));

    match existing {
        Some(event) => {
            tracing::info!(id = %event.id, start = %event.start, "deleting event for reschedule");
            backend.delete_event(&event.id).await?;
        }
        None => {
            tracing::warn!(title = %title, "no existing event matched, booking at the new time anyway");
        }
    }

    let end = new_start + Duration::minutes(MEETING_MINUTES);
    backend
        .create_event(title, RESCHEDULED_DESCRIPTION, new_start, end)
        .await?;

    Ok(format!(
        "Rescheduled {} to {} from {} to {}.",
        title,
        new_start.format("%Y-%m-%d"),
        new_start.format("%I:%M %p"),
        end.format("%I:%M %p")
    ))
}

/// Deletes the first event on `date` whose title matches exactly,
/// ignoring case. No match is `NotFound`, which callers surface as an
/// informational reply, not a failure.
pub async fn delete_meeting(
    backend: &dyn CalendarBackend,
    title: &str,
    date: NaiveDate,
) -> Result<String, AgentError> {
    let day_start = date.and_time(NaiveTime::MIN);
    let day_end = day_start + Duration::days(1);
    let events = backend.list_events(day_start, day_end, None).await?;

    let target = events
        .into_iter()
        .find(|e| titles_match(&e.title, title))
        .ok_or_else(|| AgentError::NotFound {
            title: title.to_string(),
        })?;

    backend.delete_event(&target.id).await?;
    tracing::info!(id = %target.id, title = %title, "deleted event");

    Ok(format!("Deleted '{}' on {}.", title, date))
}

fn titles_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
