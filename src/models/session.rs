use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// The dialogue state machine. Each variant carries exactly the data that
/// is valid in that state, so "awaiting a title while already holding a
/// date" cannot be represented for flows that never reach that shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Flow {
    Idle,
    AwaitingRescheduleTitle,
    AwaitingRescheduleDateTime { title: String },
    AwaitingDeleteTitle,
    AwaitingDeleteDateTime { title: String },
    AwaitingBookingDate,
    AwaitingBookingTime { date: NaiveDate },
    AwaitingBookingTitle { date: NaiveDate, time: NaiveTime },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub flow: Flow,
    /// Most recently resolved date, used when a later instruction omits one.
    pub last_date: Option<NaiveDate>,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl Session {
    fn new(now: NaiveDateTime, ttl_minutes: i64) -> Self {
        Self {
            flow: Flow::Idle,
            last_date: None,
            last_activity: now,
            expires_at: now + Duration::minutes(ttl_minutes),
        }
    }
}

/// Per-session dialogue memory, keyed by session id. Sessions expire after
/// an idle TTL; an expired id restarts from Idle.
pub struct SessionStore {
    ttl_minutes: i64,
    inner: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            ttl_minutes,
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn load(&self, session_id: &str, now: NaiveDateTime) -> Session {
        let mut sessions = self.inner.lock().unwrap();
        sessions.retain(|_, s| s.expires_at > now);
        sessions
            .get(session_id)
            .cloned()
            .unwrap_or_else(|| Session::new(now, self.ttl_minutes))
    }

    pub fn save(&self, session_id: &str, mut session: Session, now: NaiveDateTime) {
        session.last_activity = now;
        session.expires_at = now + Duration::minutes(self.ttl_minutes);
        self.inner
            .lock()
            .unwrap()
            .insert(session_id.to_string(), session);
    }

    pub fn active_count(&self, now: NaiveDateTime) -> usize {
        let mut sessions = self.inner.lock().unwrap();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.len()
    }
}
