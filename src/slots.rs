//! Candidate slot generation.
//!
//! The returned order (day index, then start time) is the order in which the
//! assigner tries slots, so it doubles as the tie-break between equally good
//! placements.

use crate::config::SchedulingConfig;
use crate::data::{CandidateSlot, Day};

/// Enumerates contiguous `session_duration_minutes` windows between the two
/// hours on every active day. A trailing partial window is dropped.
pub fn generate_slots(
    include_weekends: bool,
    session_duration_minutes: u32,
    day_start_hour: u32,
    day_end_hour: u32,
) -> Vec<CandidateSlot> {
    if session_duration_minutes == 0 {
        return Vec::new();
    }
    let (Some(day_start), Some(day_end)) = (day_start_hour.checked_mul(60), day_end_hour.checked_mul(60))
    else {
        return Vec::new();
    };

    Day::ALL
        .iter()
        .filter(|day| include_weekends || !day.is_weekend())
        .flat_map(|&day| {
            (day_start..day_end)
                .step_by(session_duration_minutes as usize)
                .filter_map(move |start| {
                    let end = start.checked_add(session_duration_minutes)?;
                    (end <= day_end).then(|| CandidateSlot::new(day, start, end))
                })
        })
        .collect()
}

impl SchedulingConfig {
    pub fn candidate_slots(&self) -> Vec<CandidateSlot> {
        generate_slots(
            self.include_weekends,
            self.session_duration_minutes,
            self.day_start_hour,
            self.day_end_hour,
        )
    }
}
