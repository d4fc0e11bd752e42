use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::AgentError;
use crate::models::intent::{classify, Intent};
use crate::models::{Flow, Session};
use crate::services::availability;
use crate::services::temporal::{self, dateparse};
use crate::services::{actions, calendar::CalendarBackend};
use crate::state::AppState;

const PROMPT_RESCHEDULE_TITLE: &str = "Which event would you like to reschedule?";
const PROMPT_RESCHEDULE_WHEN: &str = "What new date and time should I move it to?";
const PROMPT_RESCHEDULE_RETRY: &str =
    "Please give me a date and time like \"tomorrow at 3 PM\" or \"next Friday at 11 AM\".";
const PROMPT_DELETE_TITLE: &str = "Which event would you like to delete?";
const PROMPT_DELETE_DATE: &str =
    "What date is that event on? Something like \"tomorrow\" or \"9 July\" works.";
const PROMPT_DELETE_DATE_RETRY: &str =
    "I couldn't understand that date. Try something like \"tomorrow\" or \"July 10\".";
const PROMPT_BOOKING_DATE: &str = "What date should I schedule the meeting for?";
const PROMPT_BOOKING_TIME: &str = "What time should I schedule it?";
const PROMPT_BOOKING_TIME_RETRY: &str =
    "I couldn't understand that time. Try something like \"2 PM\" or \"14:00\".";
const PROMPT_BOOKING_TITLE: &str = "What should I title the event?";
const PROMPT_AVAILABILITY_DATE: &str = "Which date should I check? You can say \"tomorrow\" or give a date like 2025-07-10.";

const GREETING_REPLY: &str = "Hi there! I can help you manage your calendar. Try something like \"Book a meeting on Friday\" or \"Check availability on July 10\".";

const HELP_REPLY: &str = "I'm your calendar assistant. Here's what I can do:\n\
- Book a meeting (\"Schedule a call on Friday at 4 PM\")\n\
- Reschedule an event (\"Reschedule 'Team Sync' to Monday at 11 AM\")\n\
- Delete an event (\"Delete 'Project Review' from tomorrow\")\n\
- Check your availability (\"Check availability on July 15\")\n\
Just tell me what you'd like to do.";

const FALLBACK_REPLY: &str = "Sorry, I didn't catch that. Try asking me to book, reschedule, or delete a meeting, or to check availability.";

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"['"](.+?)['"]"#).unwrap());

static RESCHEDULE_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:reschedule|resched|change|move|shift|postpone)\s+(.+?)\s+to\b").unwrap()
});

static TO_PHRASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bto\s+(.+)$").unwrap());

static DELETE_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:delete|remove|cancel|unschedule)\s+(.+?)(?:\s+(?:from|on)\b|$)").unwrap()
});

static DELETE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:from|on)\s+(.+)$").unwrap());

/// The single entry point: consumes one utterance for one session and
/// always produces reply text. Every failure is rendered, nothing
/// propagates to the transport layer.
pub async fn handle_utterance(
    state: &AppState,
    session_id: &str,
    text: &str,
    now: NaiveDateTime,
) -> String {
    let mut session = state.sessions.load(session_id, now);

    tracing::info!(
        session = %session_id,
        flow = ?session.flow,
        text = %text,
        "processing utterance"
    );

    let reply = route(state, &mut session, text.trim(), now).await;
    state.sessions.save(session_id, session, now);
    reply
}

/// Flow states take precedence over fresh intent classification, in the
/// order they are matched here.
async fn route(state: &AppState, session: &mut Session, text: &str, now: NaiveDateTime) -> String {
    let calendar = state.calendar.as_ref();

    match session.flow.clone() {
        Flow::AwaitingRescheduleTitle => {
            session.flow = Flow::AwaitingRescheduleDateTime {
                title: text.to_string(),
            };
            PROMPT_RESCHEDULE_WHEN.to_string()
        }

        Flow::AwaitingRescheduleDateTime { title } => {
            match dateparse::parse_single(text, now) {
                None => PROMPT_RESCHEDULE_RETRY.to_string(),
                Some(new_start) => {
                    session.flow = Flow::Idle;
                    session.last_date = Some(new_start.date());
                    run_reschedule(calendar, &title, new_start, now).await
                }
            }
        }

        Flow::AwaitingDeleteTitle => {
            session.flow = Flow::AwaitingDeleteDateTime {
                title: text.to_string(),
            };
            PROMPT_DELETE_DATE.to_string()
        }

        Flow::AwaitingDeleteDateTime { title } => match dateparse::parse_single(text, now) {
            None => PROMPT_DELETE_DATE_RETRY.to_string(),
            Some(dt) => {
                session.flow = Flow::Idle;
                session.last_date = Some(dt.date());
                run_delete(calendar, &title, dt.date()).await
            }
        },

        Flow::AwaitingBookingDate => {
            let matches = temporal::extract(text, now);
            match matches.first() {
                None => PROMPT_BOOKING_DATE.to_string(),
                Some(m) => {
                    let date = m.datetime.date();
                    session.last_date = Some(date);
                    session.flow = Flow::AwaitingBookingTime { date };
                    booking_time_prompt(text)
                }
            }
        }

        Flow::AwaitingBookingTime { date } => {
            if dateparse::first_explicit_time(text).is_some() {
                match actions::resolve_start(date, text, now) {
                    Ok(start) if temporal::has_time(start) => {
                        session.flow = Flow::AwaitingBookingTitle {
                            date: start.date(),
                            time: start.time(),
                        };
                        PROMPT_BOOKING_TITLE.to_string()
                    }
                    _ => PROMPT_BOOKING_TIME_RETRY.to_string(),
                }
            } else if let Some(m) = temporal::extract(text, now).first() {
                // a fresh date but still no concrete time — adopt it and
                // keep asking
                let new_date = m.datetime.date();
                session.last_date = Some(new_date);
                session.flow = Flow::AwaitingBookingTime { date: new_date };
                booking_time_prompt(text)
            } else {
                PROMPT_BOOKING_TIME_RETRY.to_string()
            }
        }

        Flow::AwaitingBookingTitle { date, time } => {
            session.flow = Flow::Idle;
            session.last_date = None;
            match actions::book_meeting_default(calendar, date.and_time(time), text).await {
                Ok(reply) => reply,
                Err(e) => render_error(e),
            }
        }

        Flow::Idle => route_idle(state, session, text, now).await,
    }
}

async fn route_idle(
    state: &AppState,
    session: &mut Session,
    text: &str,
    now: NaiveDateTime,
) -> String {
    let calendar = state.calendar.as_ref();

    match classify(text) {
        Intent::Reschedule => {
            let title = extract_quoted(text).or_else(|| capture(&RESCHEDULE_TITLE, text));
            match title {
                None => {
                    session.flow = Flow::AwaitingRescheduleTitle;
                    PROMPT_RESCHEDULE_TITLE.to_string()
                }
                Some(title) => {
                    let new_start = capture(&TO_PHRASE, text)
                        .and_then(|phrase| dateparse::parse_single(&phrase, now));
                    match new_start {
                        None => {
                            session.flow = Flow::AwaitingRescheduleDateTime { title };
                            PROMPT_RESCHEDULE_WHEN.to_string()
                        }
                        Some(dt) => {
                            session.last_date = Some(dt.date());
                            run_reschedule(calendar, &title, dt, now).await
                        }
                    }
                }
            }
        }

        Intent::Delete => {
            let title = extract_quoted(text).or_else(|| capture(&DELETE_TITLE, text));
            match title {
                None => {
                    session.flow = Flow::AwaitingDeleteTitle;
                    PROMPT_DELETE_TITLE.to_string()
                }
                Some(title) => {
                    let date = capture(&DELETE_DATE, text)
                        .and_then(|phrase| dateparse::parse_single(&phrase, now))
                        .map(|dt| dt.date());
                    match date {
                        None => {
                            session.flow = Flow::AwaitingDeleteDateTime { title };
                            PROMPT_DELETE_DATE.to_string()
                        }
                        Some(date) => {
                            session.last_date = Some(date);
                            run_delete(calendar, &title, date).await
                        }
                    }
                }
            }
        }

        Intent::Availability => {
            let date = temporal::extract(text, now)
                .first()
                .map(|m| m.datetime.date())
                .or(session.last_date);
            match date {
                None => PROMPT_AVAILABILITY_DATE.to_string(),
                Some(date) => {
                    session.last_date = Some(date);
                    check_availability(calendar, date).await
                }
            }
        }

        Intent::Book => {
            let matches = temporal::extract(text, now);
            match matches.first() {
                None => {
                    session.flow = Flow::AwaitingBookingDate;
                    PROMPT_BOOKING_DATE.to_string()
                }
                Some(m) => {
                    let date = m.datetime.date();
                    session.last_date = Some(date);
                    if temporal::has_time(m.datetime) {
                        session.flow = Flow::AwaitingBookingTitle {
                            date,
                            time: m.datetime.time(),
                        };
                        PROMPT_BOOKING_TITLE.to_string()
                    } else {
                        session.flow = Flow::AwaitingBookingTime { date };
                        booking_time_prompt(text)
                    }
                }
            }
        }

        Intent::Greeting => GREETING_REPLY.to_string(),
        Intent::Help => HELP_REPLY.to_string(),
        Intent::Unknown => render_error(AgentError::AmbiguousInput),
    }
}

async fn run_reschedule(
    calendar: &dyn CalendarBackend,
    title: &str,
    new_start: NaiveDateTime,
    now: NaiveDateTime,
) -> String {
    match actions::reschedule_meeting(calendar, title, new_start, now).await {
        Ok(reply) => reply,
        Err(e) => render_error(e),
    }
}

async fn run_delete(calendar: &dyn CalendarBackend, title: &str, date: NaiveDate) -> String {
    match actions::delete_meeting(calendar, title, date).await {
        Ok(reply) => reply,
        Err(AgentError::NotFound { title }) => format!(
            "I couldn't find an event titled '{title}' on {date}, so nothing was deleted."
        ),
        Err(e) => render_error(e),
    }
}

async fn check_availability(calendar: &dyn CalendarBackend, date: NaiveDate) -> String {
    let day_start = date.and_time(NaiveTime::MIN);
    match calendar
        .list_events(day_start, day_start + Duration::days(1), None)
        .await
    {
        Ok(events) => {
            let busy: Vec<_> = events.iter().map(|e| (e.start, e.end)).collect();
            let slots = availability::free_slots(date, &busy);
            availability::render_day(date, &slots)
        }
        Err(e) => render_error(e),
    }
}

fn booking_time_prompt(text: &str) -> String {
    match temporal::vague_window(text) {
        Some((from, to)) => format!(
            "Sometime between {from}:00 and {to}:00 — what exact time should I use?"
        ),
        None => PROMPT_BOOKING_TIME.to_string(),
    }
}

fn extract_quoted(text: &str) -> Option<String> {
    capture(&QUOTED, text)
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn render_error(e: AgentError) -> String {
    match e {
        AgentError::Parse(text) => format!(
            "I couldn't make sense of \"{text}\" as a date or time. Could you rephrase it?"
        ),
        AgentError::NotFound { title } => {
            format!("I couldn't find an event titled '{title}'.")
        }
        AgentError::Backend(reason) => {
            tracing::error!(reason = %reason, "calendar backend failure");
            "Sorry, I couldn't reach the calendar right now. Please try again in a moment."
                .to_string()
        }
        AgentError::AmbiguousInput => FALLBACK_REPLY.to_string(),
    }
}
