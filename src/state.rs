use crate::config::AppConfig;
use crate::models::SessionStore;
use crate::services::calendar::CalendarBackend;

pub struct AppState {
    pub config: AppConfig,
    pub calendar: Box<dyn CalendarBackend>,
    pub sessions: SessionStore,
}
