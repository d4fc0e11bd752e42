pub mod dateparse;

use chrono::{Datelike, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// A temporal expression found in an utterance. Midnight (00:00) is the
/// sentinel for "date only, no time given".
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalMatch {
    pub text: String,
    pub datetime: NaiveDateTime,
}

pub fn has_time(dt: NaiveDateTime) -> bool {
    dt.time() != NaiveTime::MIN
}

static TEMPORAL_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday",
        r"|january|february|march|april|may|june|july|august|september|october|november|december",
        r"|today|tonight|tomorrow|days?|am|pm|noon|midday|midnight)\b",
    ))
    .unwrap()
});

/// Rejects spurious numeric matches (phone-number-like tokens): a match is
/// kept only if it starts with a digit or names something temporal.
fn looks_temporal(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_digit()) || TEMPORAL_KEYWORD.is_match(text)
}

/// Extracts temporal expressions from `text`, ordered by precedence.
/// Resolution rules, first success wins unless a later rule explicitly
/// overrides:
///
/// 1. manual day+month ("8 July"), current year, upgraded by a richer
///    same-date match that carries a time-of-day;
/// 2. general search, filtered through `looks_temporal`;
/// 3. an explicit ISO date (plus optional explicit time) overrides
///    everything before it;
/// 4. weekday-name fallback when nothing has a concrete time yet.
///
/// An empty result means "ask the user", never an error.
pub fn extract(text: &str, now: NaiveDateTime) -> Vec<TemporalMatch> {
    let mut matches: Vec<TemporalMatch> = Vec::new();

    if let Some((matched, date)) = dateparse::day_month_in_year(text, now.year()) {
        matches.push(TemporalMatch {
            text: matched,
            datetime: date.and_time(NaiveTime::MIN),
        });
        for (t, dt) in dateparse::search_all(text, now) {
            if dt.date() == date && has_time(dt) {
                matches = vec![TemporalMatch { text: t, datetime: dt }];
                break;
            }
        }
    }

    if matches.is_empty() {
        matches = dateparse::search_all(text, now)
            .into_iter()
            .filter(|(t, _)| looks_temporal(t))
            .map(|(text, datetime)| TemporalMatch { text, datetime })
            .collect();
    }

    if let Some(m) = iso_override(text) {
        matches = vec![m];
    }

    if matches.is_empty() || matches.iter().all(|m| !has_time(m.datetime)) {
        if let Some(m) = weekday_fallback(text, now) {
            matches = vec![m];
        }
    }

    matches
}

fn iso_override(text: &str) -> Option<TemporalMatch> {
    let (iso_text, date) = dateparse::first_iso_date(text)?;
    match dateparse::first_explicit_time(text) {
        Some((time_text, time)) => Some(TemporalMatch {
            text: format!("{iso_text} {time_text}"),
            datetime: date.and_time(time),
        }),
        None => Some(TemporalMatch {
            text: iso_text,
            datetime: date.and_time(NaiveTime::MIN),
        }),
    }
}

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

fn weekday_fallback(text: &str, now: NaiveDateTime) -> Option<TemporalMatch> {
    let lower = text.to_lowercase();
    let today = now.date();

    let mut found: Option<(String, chrono::NaiveDate)> = None;
    for (i, day) in WEEKDAYS.iter().enumerate() {
        let this_kw = format!("this {day}");
        let next_kw = format!("next {day}");
        if lower.contains(&this_kw) {
            found = Some((this_kw, dateparse::resolve_weekday(Some("this"), i, today)));
        } else if lower.contains(&next_kw) {
            found = Some((next_kw, dateparse::resolve_weekday(Some("next"), i, today)));
        } else if lower.contains(day) {
            found = Some((day.to_string(), dateparse::resolve_weekday(None, i, today)));
        }
        if found.is_some() {
            break;
        }
    }

    let (matched, date) = found?;
    match dateparse::first_explicit_time(text) {
        Some((time_text, time)) => Some(TemporalMatch {
            text: format!("{matched} {time_text}"),
            datetime: date.and_time(time),
        }),
        None => Some(TemporalMatch {
            text: matched,
            datetime: date.and_time(NaiveTime::MIN),
        }),
    }
}

/// Vague time-of-day windows, used to shape prompts only. An utterance
/// carrying a window but no exact time still needs the user to supply one.
pub fn vague_window(text: &str) -> Option<(u32, u32)> {
    let lower = text.to_lowercase();
    if lower.contains("morning") {
        Some((9, 12))
    } else if lower.contains("afternoon") {
        Some((12, 17))
    } else if lower.contains("evening") {
        Some((17, 20))
    } else if lower.contains("night") {
        Some((20, 22))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        // Wednesday
        NaiveDateTime::parse_from_str("2025-07-02 10:00", "%Y-%m-%d %H:%M").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_manual_day_month() {
        let matches = extract("delete it on 9 July", now());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].datetime, dt("2025-07-09 00:00"));
        assert!(!has_time(matches[0].datetime));
    }

    #[test]
    fn test_day_month_upgraded_by_time() {
        let matches = extract("book 9 July at 2 PM", now());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].datetime, dt("2025-07-09 14:00"));
    }

    #[test]
    fn test_iso_override_with_time() {
        let matches = extract("meet tomorrow, actually 2025-07-20 at 4 PM", now());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].datetime, dt("2025-07-20 16:00"));
    }

    #[test]
    fn test_iso_date_only() {
        let matches = extract("Check availability on 2025-07-10", now());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].datetime, dt("2025-07-10 00:00"));
    }

    #[test]
    fn test_general_search_tomorrow() {
        let matches = extract("Book a call tomorrow at 2 PM", now());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].datetime, dt("2025-07-03 14:00"));
        assert!(has_time(matches[0].datetime));
    }

    #[test]
    fn test_weekday_fallback_merges_standalone_time() {
        let matches = extract("see you next friday at 11 AM", now());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].datetime, dt("2025-07-11 11:00"));
    }

    #[test]
    fn test_weekday_without_time_is_date_only() {
        let matches = extract("friday works for me", now());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].datetime, dt("2025-07-04 00:00"));
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        assert!(extract("what a lovely day it has been", now()).is_empty());
    }

    #[test]
    fn test_spurious_numbers_filtered() {
        // phone-number-ish tokens resolve through no rule
        assert!(extract("call me at extension five", now()).is_empty());
    }

    #[test]
    fn test_vague_windows() {
        assert_eq!(vague_window("friday morning"), Some((9, 12)));
        assert_eq!(vague_window("in the afternoon"), Some((12, 17)));
        assert_eq!(vague_window("tomorrow evening"), Some((17, 20)));
        assert_eq!(vague_window("late at night"), Some((20, 22)));
        assert_eq!(vague_window("at 2 PM"), None);
    }

    #[test]
    fn test_vague_window_does_not_produce_a_time() {
        let matches = extract("book friday morning", now());
        assert_eq!(matches.len(), 1);
        assert!(!has_time(matches[0].datetime));
    }
}
