use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::CalendarBackend;
use crate::errors::AgentError;
use crate::models::CalendarEvent;

/// Process-local calendar, used in dev mode and as the test double.
#[derive(Default)]
pub struct InMemoryCalendar {
    events: Mutex<Vec<CalendarEvent>>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl CalendarBackend for InMemoryCalendar {
    async fn list_events(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        title_filter: Option<&str>,
    ) -> Result<Vec<CalendarEvent>, AgentError> {
        let events = self.events.lock().unwrap();
        let mut matched: Vec<CalendarEvent> = events
            .iter()
            .filter(|e| e.start < end && e.end > start)
            .filter(|e| {
                title_filter.map_or(true, |q| {
                    e.title.to_lowercase().contains(&q.to_lowercase())
                })
            })
            .cloned()
            .collect();
        matched.sort_by_key(|e| e.start);
        Ok(matched)
    }

    async fn create_event(
        &self,
        title: &str,
        description: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<CalendarEvent, AgentError> {
        let event = CalendarEvent {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: Some(description.to_string()),
            start,
            end,
        };
        self.events.lock().unwrap().push(event.clone());
        Ok(event)
    }

    async fn delete_event(&self, id: &str) -> Result<(), AgentError> {
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Err(AgentError::NotFound {
                title: id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list_in_range() {
        let cal = InMemoryCalendar::new();
        cal.create_event("Standup", "", dt("2025-07-10 09:00"), dt("2025-07-10 09:30"))
            .await
            .unwrap();
        cal.create_event("Elsewhere", "", dt("2025-07-11 09:00"), dt("2025-07-11 09:30"))
            .await
            .unwrap();

        let events = cal
            .list_events(dt("2025-07-10 00:00"), dt("2025-07-11 00:00"), None)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Standup");
    }

    #[tokio::test]
    async fn test_title_filter_is_case_insensitive() {
        let cal = InMemoryCalendar::new();
        cal.create_event("Team Sync", "", dt("2025-07-10 10:00"), dt("2025-07-10 10:30"))
            .await
            .unwrap();

        let events = cal
            .list_events(dt("2025-07-01 00:00"), dt("2025-08-01 00:00"), Some("team sync"))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_event_is_not_found() {
        let cal = InMemoryCalendar::new();
        let err = cal.delete_event("no-such-id").await.unwrap_err();
        assert!(matches!(err, AgentError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_sorted_by_start() {
        let cal = InMemoryCalendar::new();
        cal.create_event("Later", "", dt("2025-07-10 15:00"), dt("2025-07-10 15:30"))
            .await
            .unwrap();
        cal.create_event("Earlier", "", dt("2025-07-10 09:00"), dt("2025-07-10 09:30"))
            .await
            .unwrap();

        let events = cal
            .list_events(dt("2025-07-10 00:00"), dt("2025-07-11 00:00"), None)
            .await
            .unwrap();
        assert_eq!(events[0].title, "Earlier");
        assert_eq!(events[1].title, "Later");
    }
}
