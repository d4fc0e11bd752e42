use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use meetbot::config::AppConfig;
use meetbot::handlers;
use meetbot::models::SessionStore;
use meetbot::services::calendar::http::HttpCalendarBackend;
use meetbot::services::calendar::memory::InMemoryCalendar;
use meetbot::services::calendar::CalendarBackend;
use meetbot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let calendar: Box<dyn CalendarBackend> = match config.calendar_backend.as_str() {
        "http" => {
            anyhow::ensure!(
                !config.calendar_api_url.is_empty(),
                "CALENDAR_API_URL must be set when CALENDAR_BACKEND=http"
            );
            tracing::info!(url = %config.calendar_api_url, "using HTTP calendar backend");
            Box::new(HttpCalendarBackend::new(
                config.calendar_api_url.clone(),
                config.calendar_api_key.clone(),
                config.calendar_id.clone(),
                config.timezone_name.clone(),
            ))
        }
        _ => {
            tracing::info!("using in-memory calendar backend (dev mode)");
            Box::new(InMemoryCalendar::new())
        }
    };

    let state = Arc::new(AppState {
        sessions: SessionStore::new(config.session_ttl_minutes),
        config,
        calendar,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/agenda/today", get(handlers::agenda::today))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let addr = format!("0.0.0.0:{}", state.config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
