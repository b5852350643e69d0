use log::{info, trace};
use std::time::Instant;

use crate::assigner::BacktrackingAssigner;
use crate::data::{ScheduleRequest, ScheduleResponse, ScoreRequest, ScoreResponse, SearchStatus};
use crate::error::ScheduleError;
use crate::scorer;

/// Schedules one student group: generates slots, runs the backtracking
/// assigner and scores whatever it produced.
pub fn solve(input: &ScheduleRequest) -> Result<ScheduleResponse, ScheduleError> {
    let start_time = Instant::now();
    input.config.validate()?;

    let slots = input.config.candidate_slots();
    info!(
        "Scheduling {} demands into {} venues over {} candidate slots ({} locked, {} booked elsewhere)...",
        input.demands.len(),
        input.venues.len(),
        slots.len(),
        input.locked.len(),
        input.committed_elsewhere.len()
    );
    trace!(
        "{} (slot, venue) pairs per demand at most",
        slots.len() * input.venues.len()
    );

    let outcome = BacktrackingAssigner::new(&input.venues, &slots, &input.committed_elsewhere)
        .with_max_backtracks(input.config.max_backtracks)
        .assign(&input.demands, &input.locked)?;

    let mut assignments = outcome.assignments;
    scorer::annotate_slot_scores(&mut assignments, &input.demands);
    let score = scorer::score(&assignments, &input.demands);
    let unmet_soft_constraints = scorer::unmet_preferences(&assignments, &input.demands);

    let duration = start_time.elapsed();
    match outcome.status {
        SearchStatus::Complete => info!(
            "Schedule complete in {:.2?} after {} backtracks, score {:.2}",
            duration, outcome.backtracks, score.total
        ),
        status => info!(
            "Search stopped ({:?}) in {:.2?} with {} subjects unplaced, score {:.2}",
            status,
            duration,
            outcome.unplaced.len(),
            score.total
        ),
    }

    Ok(ScheduleResponse {
        assignments,
        score,
        status: outcome.status,
        complete: outcome.unplaced.is_empty(),
        unplaced_subjects: outcome.unplaced,
        backtracks: outcome.backtracks,
        unmet_soft_constraints,
    })
}

/// Rescores an existing timetable, e.g. after manual edits.
pub fn rescore(input: &ScoreRequest) -> ScoreResponse {
    ScoreResponse {
        score: scorer::score(&input.assignments, &input.demands),
        unmet_soft_constraints: scorer::unmet_preferences(&input.assignments, &input.demands),
    }
}
