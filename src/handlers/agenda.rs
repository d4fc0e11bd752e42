use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{Duration, NaiveTime};
use serde::Serialize;

use crate::errors::AgentError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct AgendaEntry {
    pub time: String,
    pub title: String,
}

#[derive(Serialize)]
pub struct AgendaResponse {
    pub date: String,
    pub entries: Vec<AgendaEntry>,
}

/// Today's events, for the "today at a glance" panel.
pub async fn today(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AgendaResponse>, AgentError> {
    let today = state.config.local_now().date();
    let day_start = today.and_time(NaiveTime::MIN);

    let events = state
        .calendar
        .list_events(day_start, day_start + Duration::days(1), None)
        .await?;

    let entries = events
        .into_iter()
        .map(|e| AgendaEntry {
            time: e.start.format("%I:%M %p").to_string(),
            title: e.title,
        })
        .collect();

    Ok(Json(AgendaResponse {
        date: today.to_string(),
        entries,
    }))
}
