use std::env;

use chrono::{Duration, NaiveDateTime, Utc};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub calendar_backend: String,
    pub calendar_api_url: String,
    pub calendar_api_key: String,
    pub calendar_id: String,
    pub timezone_name: String,
    pub utc_offset_minutes: i64,
    pub session_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            calendar_backend: env::var("CALENDAR_BACKEND").unwrap_or_else(|_| "memory".to_string()),
            calendar_api_url: env::var("CALENDAR_API_URL").unwrap_or_default(),
            calendar_api_key: env::var("CALENDAR_API_KEY").unwrap_or_default(),
            calendar_id: env::var("CALENDAR_ID").unwrap_or_else(|_| "primary".to_string()),
            timezone_name: env::var("TIMEZONE").unwrap_or_else(|_| "Asia/Kolkata".to_string()),
            utc_offset_minutes: env::var("UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(330),
            session_ttl_minutes: env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    /// Wall-clock time in the fixed working timezone.
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().naive_utc() + Duration::minutes(self.utc_offset_minutes)
    }
}
