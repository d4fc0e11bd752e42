use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A fixed-width interval within the working window, labeled free or busy.
/// Derived per query, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub busy: bool,
}
