use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::Slot;

pub const WORK_START_HOUR: u32 = 9;
pub const WORK_END_HOUR: u32 = 17;
pub const SLOT_MINUTES: i64 = 30;

/// Partitions the working window on `date` into contiguous 30-minute
/// slots and labels each against the busy intervals. Busy intervals are
/// half-open `[start, end)` pairs already in the working timezone; a slot
/// is busy iff it overlaps any of them.
pub fn free_slots(date: NaiveDate, busy: &[(NaiveDateTime, NaiveDateTime)]) -> Vec<Slot> {
    let work_start = date.and_hms_opt(WORK_START_HOUR, 0, 0).unwrap();
    let work_end = date.and_hms_opt(WORK_END_HOUR, 0, 0).unwrap();

    let mut slots = Vec::new();
    let mut current = work_start;
    while current < work_end {
        let slot_start = current;
        let slot_end = current + Duration::minutes(SLOT_MINUTES);
        current = slot_end;

        let is_busy = busy
            .iter()
            .any(|(b_start, b_end)| slot_start < *b_end && slot_end > *b_start);

        slots.push(Slot {
            start: slot_start,
            end: slot_end,
            busy: is_busy,
        });
    }
    slots
}

/// Two-column day grid. Renders an explicit notice when nothing is free.
pub fn render_day(date: NaiveDate, slots: &[Slot]) -> String {
    if !slots.iter().any(|s| !s.busy) {
        return format!("No free slots available on {date}.");
    }

    let cells: Vec<String> = slots
        .iter()
        .map(|s| {
            let label = if s.busy { "Booked" } else { "Free" };
            format!(
                "{} to {}  {}",
                s.start.format("%I:%M %p"),
                s.end.format("%I:%M %p"),
                label
            )
        })
        .collect();

    let mut lines = Vec::new();
    for pair in cells.chunks(2) {
        match pair {
            [left, right] => lines.push(format!("{left:<34}{right}")),
            [left] => lines.push(left.clone()),
            _ => {}
        }
    }

    format!(
        "Availability for {date}:\n\n{}\n\nWould you like me to book one of these?",
        lines.join("\n")
    )
}
