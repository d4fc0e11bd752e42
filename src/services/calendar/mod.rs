pub mod http;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::errors::AgentError;
use crate::models::CalendarEvent;

/// The remote calendar service. Timestamps are naive datetimes already in
/// the fixed working timezone; the transport layer owns the zone handling.
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    /// Events overlapping the half-open range `[start, end)`, ordered by
    /// start time. `title_filter` is a case-insensitive substring
    /// pre-filter, like a search query.
    async fn list_events(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        title_filter: Option<&str>,
    ) -> Result<Vec<CalendarEvent>, AgentError>;

    async fn create_event(
        &self,
        title: &str,
        description: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<CalendarEvent, AgentError>;

    async fn delete_event(&self, id: &str) -> Result<(), AgentError>;
}
