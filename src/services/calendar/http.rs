use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::CalendarBackend;
use crate::errors::AgentError;
use crate::models::CalendarEvent;

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct HttpCalendarBackend {
    base_url: String,
    api_key: String,
    calendar_id: String,
    timezone_name: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct WireEvent {
    id: String,
    title: String,
    description: Option<String>,
    start: String,
    end: String,
}

#[derive(Serialize)]
struct CreateEventBody<'a> {
    title: &'a str,
    description: &'a str,
    start: String,
    end: String,
    time_zone: &'a str,
}

impl HttpCalendarBackend {
    pub fn new(base_url: String, api_key: String, calendar_id: String, timezone_name: String) -> Self {
        Self {
            base_url,
            api_key,
            calendar_id,
            timezone_name,
            client: reqwest::Client::new(),
        }
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.base_url, self.calendar_id)
    }

    fn parse_event(&self, wire: WireEvent) -> Result<CalendarEvent, AgentError> {
        let start = NaiveDateTime::parse_from_str(&wire.start, WIRE_FORMAT)
            .map_err(|e| AgentError::Backend(format!("bad event start '{}': {e}", wire.start)))?;
        let end = NaiveDateTime::parse_from_str(&wire.end, WIRE_FORMAT)
            .map_err(|e| AgentError::Backend(format!("bad event end '{}': {e}", wire.end)))?;
        Ok(CalendarEvent {
            id: wire.id,
            title: wire.title,
            description: wire.description,
            start,
            end,
        })
    }
}

fn backend_err(context: &str, e: impl std::fmt::Display) -> AgentError {
    AgentError::Backend(format!("{context}: {e}"))
}

#[async_trait]
impl CalendarBackend for HttpCalendarBackend {
    async fn list_events(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        title_filter: Option<&str>,
    ) -> Result<Vec<CalendarEvent>, AgentError> {
        let mut request = self
            .client
            .get(self.events_url())
            .bearer_auth(&self.api_key)
            .query(&[
                ("time_min", start.format(WIRE_FORMAT).to_string()),
                ("time_max", end.format(WIRE_FORMAT).to_string()),
            ]);
        if let Some(q) = title_filter {
            request = request.query(&[("q", q)]);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| backend_err("failed to list events", e))?
            .error_for_status()
            .map_err(|e| backend_err("calendar API rejected list", e))?;

        let wire: Vec<WireEvent> = resp
            .json()
            .await
            .map_err(|e| backend_err("failed to parse event list", e))?;

        let mut events = wire
            .into_iter()
            .map(|w| self.parse_event(w))
            .collect::<Result<Vec<_>, _>>()?;
        events.sort_by_key(|e| e.start);
        Ok(events)
    }

    async fn create_event(
        &self,
        title: &str,
        description: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<CalendarEvent, AgentError> {
        let body = CreateEventBody {
            title,
            description,
            start: start.format(WIRE_FORMAT).to_string(),
            end: end.format(WIRE_FORMAT).to_string(),
            time_zone: &self.timezone_name,
        };

        let resp = self
            .client
            .post(self.events_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| backend_err("failed to create event", e))?
            .error_for_status()
            .map_err(|e| backend_err("calendar API rejected create", e))?;

        let wire: WireEvent = resp
            .json()
            .await
            .map_err(|e| backend_err("failed to parse created event", e))?;
        self.parse_event(wire)
    }

    async fn delete_event(&self, id: &str) -> Result<(), AgentError> {
        let resp = self
            .client
            .delete(format!("{}/{id}", self.events_url()))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| backend_err("failed to delete event", e))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AgentError::NotFound {
                title: id.to_string(),
            });
        }
        resp.error_for_status()
            .map_err(|e| backend_err("calendar API rejected delete", e))?;
        Ok(())
    }
}
