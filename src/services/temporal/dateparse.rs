//! Natural-language date/time parsing primitives. Resolution is
//! future-biased: a current-year date already past rolls to next year, a
//! bare time already past today rolls to tomorrow.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

const MONTHS: &str =
    "january|february|march|april|may|june|july|august|september|october|november|december";
const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(20\d{2})-(\d{2})-(\d{2})\b").unwrap());

static DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+({MONTHS})\b")).unwrap()
});

static MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b({MONTHS})\s+(\d{{1,2}})(?:st|nd|rd|th)?\b")).unwrap()
});

static IN_N_DAYS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bin\s+(\d{1,3})\s+days?\b").unwrap());

static RELATIVE_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(day after tomorrow|tomorrow|today|tonight)\b").unwrap());

static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:(this|next)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
    .unwrap()
});

static MERIDIEM_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m\.?\b").unwrap());

static CLOCK_24H: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").unwrap());

static NAMED_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(noon|midday|midnight)\b").unwrap());

struct DateHit {
    text: String,
    date: NaiveDate,
}

struct TimeHit {
    start: usize,
    text: String,
    time: NaiveTime,
}

fn overlaps<T>(start: usize, end: usize, taken: &[(usize, usize, T)]) -> bool {
    taken.iter().any(|(s, e, _)| start < *e && end > *s)
}

fn month_index(name: &str) -> Option<u32> {
    MONTHS
        .split('|')
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as u32 + 1)
}

/// Next occurrence of `weekday` (0 = Monday). `this` never resolves to
/// today; `next` lands 7-13 days out; bare names allow today.
pub(crate) fn resolve_weekday(modifier: Option<&str>, weekday: usize, today: NaiveDate) -> NaiveDate {
    let current = today.weekday().num_days_from_monday() as i64;
    let base = (weekday as i64 - current).rem_euclid(7);
    let offset = match modifier {
        Some("this") => {
            if base == 0 {
                7
            } else {
                base
            }
        }
        Some("next") => base + 7,
        _ => base,
    };
    today + Duration::days(offset)
}

/// Scan order is precedence order: an ISO date outranks a day+month token,
/// which outranks relative words and weekday names. Overlapping spans keep
/// the higher-precedence hit.
fn scan_dates(text: &str, today: NaiveDate) -> Vec<DateHit> {
    let mut spans: Vec<(usize, usize, ())> = Vec::new();
    let mut hits: Vec<DateHit> = Vec::new();
    let mut take = |spans: &mut Vec<(usize, usize, ())>,
                    hits: &mut Vec<DateHit>,
                    start: usize,
                    end: usize,
                    matched: &str,
                    date: NaiveDate| {
        if !overlaps(start, end, spans) {
            spans.push((start, end, ()));
            hits.push(DateHit {
                text: matched.to_string(),
                date,
            });
        }
    };

    for cap in ISO_DATE.captures_iter(text) {
        let m = cap.get(0).unwrap();
        let (y, mo, d) = (
            cap[1].parse().unwrap_or(0),
            cap[2].parse().unwrap_or(0),
            cap[3].parse().unwrap_or(0),
        );
        if let Some(date) = NaiveDate::from_ymd_opt(y, mo, d) {
            take(&mut spans, &mut hits, m.start(), m.end(), m.as_str(), date);
        }
    }

    for cap in DAY_MONTH.captures_iter(text) {
        let m = cap.get(0).unwrap();
        let day: u32 = cap[1].parse().unwrap_or(0);
        if let Some(date) = month_index(&cap[2])
            .and_then(|mo| NaiveDate::from_ymd_opt(today.year(), mo, day))
            .map(|d| future_biased_date(d, today))
        {
            take(&mut spans, &mut hits, m.start(), m.end(), m.as_str(), date);
        }
    }

    for cap in MONTH_DAY.captures_iter(text) {
        let m = cap.get(0).unwrap();
        let day: u32 = cap[2].parse().unwrap_or(0);
        if let Some(date) = month_index(&cap[1])
            .and_then(|mo| NaiveDate::from_ymd_opt(today.year(), mo, day))
            .map(|d| future_biased_date(d, today))
        {
            take(&mut spans, &mut hits, m.start(), m.end(), m.as_str(), date);
        }
    }

    for cap in IN_N_DAYS.captures_iter(text) {
        let m = cap.get(0).unwrap();
        if let Ok(n) = cap[1].parse::<i64>() {
            take(
                &mut spans,
                &mut hits,
                m.start(),
                m.end(),
                m.as_str(),
                today + Duration::days(n),
            );
        }
    }

    for cap in RELATIVE_DAY.captures_iter(text) {
        let m = cap.get(0).unwrap();
        let date = match cap[1].to_lowercase().as_str() {
            "day after tomorrow" => today + Duration::days(2),
            "tomorrow" => today + Duration::days(1),
            _ => today,
        };
        take(&mut spans, &mut hits, m.start(), m.end(), m.as_str(), date);
    }

    for cap in WEEKDAY.captures_iter(text) {
        let m = cap.get(0).unwrap();
        let modifier = cap.get(1).map(|m| m.as_str().to_lowercase());
        let name = cap[2].to_lowercase();
        let Some(idx) = WEEKDAYS.iter().position(|d| *d == name) else {
            continue;
        };
        let date = resolve_weekday(modifier.as_deref(), idx, today);
        take(&mut spans, &mut hits, m.start(), m.end(), m.as_str(), date);
    }

    hits
}

fn future_biased_date(date: NaiveDate, today: NaiveDate) -> NaiveDate {
    if date < today {
        NaiveDate::from_ymd_opt(date.year() + 1, date.month(), date.day()).unwrap_or(date)
    } else {
        date
    }
}

fn scan_times(text: &str) -> Vec<TimeHit> {
    let mut spans: Vec<(usize, usize, ())> = Vec::new();
    let mut hits: Vec<TimeHit> = Vec::new();
    let mut take = |spans: &mut Vec<(usize, usize, ())>,
                    hits: &mut Vec<TimeHit>,
                    start: usize,
                    end: usize,
                    matched: &str,
                    time: NaiveTime| {
        if !overlaps(start, end, spans) {
            spans.push((start, end, ()));
            hits.push(TimeHit {
                start,
                text: matched.to_string(),
                time,
            });
        }
    };

    for cap in MERIDIEM_TIME.captures_iter(text) {
        let m = cap.get(0).unwrap();
        let hour: u32 = cap[1].parse().unwrap_or(0);
        let minute: u32 = cap.get(2).map_or(0, |v| v.as_str().parse().unwrap_or(0));
        if !(1..=12).contains(&hour) || minute > 59 {
            continue;
        }
        let hour24 = match (&cap[3].to_lowercase()[..], hour) {
            ("a", 12) => 0,
            ("a", h) => h,
            ("p", 12) => 12,
            (_, h) => h + 12,
        };
        if let Some(time) = NaiveTime::from_hms_opt(hour24, minute, 0) {
            take(&mut spans, &mut hits, m.start(), m.end(), m.as_str(), time);
        }
    }

    for cap in CLOCK_24H.captures_iter(text) {
        let m = cap.get(0).unwrap();
        let (h, min) = (cap[1].parse().unwrap_or(0), cap[2].parse().unwrap_or(0));
        if let Some(time) = NaiveTime::from_hms_opt(h, min, 0) {
            take(&mut spans, &mut hits, m.start(), m.end(), m.as_str(), time);
        }
    }

    for cap in NAMED_TIME.captures_iter(text) {
        let m = cap.get(0).unwrap();
        let time = match cap[1].to_lowercase().as_str() {
            "midnight" => NaiveTime::MIN,
            _ => NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        };
        take(&mut spans, &mut hits, m.start(), m.end(), m.as_str(), time);
    }

    hits.sort_by_key(|h| h.start);
    hits
}

/// All date/time expressions found in `text`, each as (matched text,
/// resolved datetime). The first date expression absorbs the first
/// standalone time expression when both appear; midnight marks a
/// date-only match.
pub fn search_all(text: &str, now: NaiveDateTime) -> Vec<(String, NaiveDateTime)> {
    let today = now.date();
    let dates = scan_dates(text, today);
    let times = scan_times(text);

    if dates.is_empty() {
        return times
            .into_iter()
            .map(|t| {
                let mut dt = today.and_time(t.time);
                if dt <= now {
                    dt += Duration::days(1);
                }
                (t.text, dt)
            })
            .collect();
    }

    dates
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            if i == 0 {
                if let Some(t) = times.first() {
                    return (format!("{} {}", d.text, t.text), d.date.and_time(t.time));
                }
            }
            (d.text, d.date.and_time(NaiveTime::MIN))
        })
        .collect()
}

/// Best single interpretation of `text`, or None when nothing parses.
pub fn parse_single(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    search_all(text, now).into_iter().next().map(|(_, dt)| dt)
}

/// The `"8 July"` manual pattern, pinned to the given year with no future
/// bias. Returns the matched text and the constructed date.
pub(crate) fn day_month_in_year(text: &str, year: i32) -> Option<(String, NaiveDate)> {
    let cap = DAY_MONTH.captures(text)?;
    let m = cap.get(0).unwrap();
    let day: u32 = cap[1].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month_index(&cap[2])?, day)?;
    Some((m.as_str().to_string(), date))
}

pub(crate) fn first_iso_date(text: &str) -> Option<(String, NaiveDate)> {
    let cap = ISO_DATE.captures(text)?;
    let m = cap.get(0).unwrap();
    let date = NaiveDate::from_ymd_opt(
        cap[1].parse().ok()?,
        cap[2].parse().ok()?,
        cap[3].parse().ok()?,
    )?;
    Some((m.as_str().to_string(), date))
}

pub(crate) fn first_explicit_time(text: &str) -> Option<(String, NaiveTime)> {
    scan_times(text).into_iter().next().map(|t| (t.text, t.time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        // Wednesday
        NaiveDateTime::parse_from_str("2025-07-02 10:00", "%Y-%m-%d %H:%M").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(parse_single("2025-07-10", now()), Some(dt("2025-07-10 00:00")));
    }

    #[test]
    fn test_iso_date_with_24h_time() {
        assert_eq!(
            parse_single("2025-07-10 14:00", now()),
            Some(dt("2025-07-10 14:00"))
        );
    }

    #[test]
    fn test_iso_date_with_meridiem() {
        assert_eq!(
            parse_single("2025-07-11 2 PM", now()),
            Some(dt("2025-07-11 14:00"))
        );
    }

    #[test]
    fn test_tomorrow_with_time() {
        assert_eq!(
            parse_single("tomorrow at 2 PM", now()),
            Some(dt("2025-07-03 14:00"))
        );
    }

    #[test]
    fn test_day_month() {
        assert_eq!(parse_single("9 July", now()), Some(dt("2025-07-09 00:00")));
        assert_eq!(parse_single("8th July", now()), Some(dt("2025-07-08 00:00")));
    }

    #[test]
    fn test_month_day() {
        assert_eq!(parse_single("July 10", now()), Some(dt("2025-07-10 00:00")));
    }

    #[test]
    fn test_past_day_month_rolls_to_next_year() {
        assert_eq!(parse_single("1 January", now()), Some(dt("2026-01-01 00:00")));
    }

    #[test]
    fn test_bare_weekday_is_nearest_future_occurrence() {
        // now() is Wednesday 2025-07-02
        assert_eq!(parse_single("friday", now()), Some(dt("2025-07-04 00:00")));
        assert_eq!(parse_single("monday", now()), Some(dt("2025-07-07 00:00")));
        // bare name on the same weekday resolves to today
        assert_eq!(parse_single("wednesday", now()), Some(dt("2025-07-02 00:00")));
    }

    #[test]
    fn test_this_weekday_never_today() {
        assert_eq!(
            parse_single("this wednesday", now()),
            Some(dt("2025-07-09 00:00"))
        );
        assert_eq!(parse_single("this friday", now()), Some(dt("2025-07-04 00:00")));
    }

    #[test]
    fn test_next_weekday_is_week_out() {
        assert_eq!(parse_single("next friday", now()), Some(dt("2025-07-11 00:00")));
        assert_eq!(
            parse_single("next wednesday", now()),
            Some(dt("2025-07-09 00:00"))
        );
    }

    #[test]
    fn test_weekday_with_time() {
        assert_eq!(
            parse_single("monday at 11 AM", now()),
            Some(dt("2025-07-07 11:00"))
        );
    }

    #[test]
    fn test_bare_time_future_bias() {
        // 2 PM is still ahead of 10:00 today
        assert_eq!(parse_single("2 PM", now()), Some(dt("2025-07-02 14:00")));
        // 9 AM already passed, rolls to tomorrow
        assert_eq!(parse_single("9 AM", now()), Some(dt("2025-07-03 09:00")));
    }

    #[test]
    fn test_noon_and_midnight() {
        assert_eq!(parse_single("tomorrow at noon", now()), Some(dt("2025-07-03 12:00")));
        assert_eq!(first_explicit_time("at midnight").unwrap().1, NaiveTime::MIN);
    }

    #[test]
    fn test_meridiem_edge_hours() {
        assert_eq!(parse_single("tomorrow 12 PM", now()), Some(dt("2025-07-03 12:00")));
        assert_eq!(parse_single("tomorrow 12 AM", now()), Some(dt("2025-07-03 00:00")));
        assert_eq!(
            parse_single("tomorrow 3:30 pm", now()),
            Some(dt("2025-07-03 15:30"))
        );
    }

    #[test]
    fn test_in_n_days() {
        assert_eq!(parse_single("in 3 days", now()), Some(dt("2025-07-05 00:00")));
    }

    #[test]
    fn test_unparsable_is_none() {
        assert_eq!(parse_single("hello there", now()), None);
        assert_eq!(parse_single("", now()), None);
    }

    #[test]
    fn test_search_all_reports_matched_text() {
        let matches = search_all("book 9 July at 2 PM", now());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0, "9 July 2 PM");
        assert_eq!(matches[0].1, dt("2025-07-09 14:00"));
    }

    #[test]
    fn test_day_month_in_year_no_bias() {
        let (text, d) = day_month_in_year("1 January please", 2025).unwrap();
        assert_eq!(text, "1 January");
        assert_eq!(d, date("2025-01-01"));
    }

    #[test]
    fn test_invalid_calendar_date_rejected() {
        assert_eq!(parse_single("2025-13-40", now()), None);
        assert_eq!(parse_single("31 February", now()), None);
    }
}
