//! Soft-preference scoring of a timetable.
//!
//! | Axis | Measures | Score |
//! |------|----------|-------|
//! | Gap | mean per-day idle minutes between classes, counting only gaps in (0, 120) | `max(0, 10 - avg/30)` |
//! | Distribution | population std-dev of Monday..Friday class counts | `max(0, 10 - 2*sd)` |
//! | Preference | 5 points for a preferred day, 5 for a preferred start time | mean points |
//!
//! Total is `0.4*gap + 0.3*distribution + 0.3*preference`. Nothing is rounded here.

use itertools::Itertools;
use std::collections::HashMap;

use crate::data::{
    Assignment, Day, ScoreBreakdown, SubjectDemand, SubjectId, UnmetSoftConstraint, format_minute,
};

const GAP_WEIGHT: f64 = 0.4;
const DISTRIBUTION_WEIGHT: f64 = 0.3;
const PREFERENCE_WEIGHT: f64 = 0.3;

/// Gaps of this many minutes or more count as a proper break.
const ACCEPTABLE_BREAK_MINUTES: u32 = 120;
const PREFERRED_DAY_POINTS: f64 = 5.0;
const PREFERRED_TIME_POINTS: f64 = 5.0;
/// Preference score when no assignment has a matching demand.
const NEUTRAL_PREFERENCE: f64 = 5.0;

pub fn score(assignments: &[Assignment], demands: &[SubjectDemand]) -> ScoreBreakdown {
    if assignments.is_empty() {
        return ScoreBreakdown::default();
    }

    let gap = gap_score(assignments);
    let distribution = distribution_score(assignments);
    let preference = preference_score(assignments, demands);

    ScoreBreakdown {
        gap,
        distribution,
        preference,
        total: GAP_WEIGHT * gap + DISTRIBUTION_WEIGHT * distribution + PREFERENCE_WEIGHT * preference,
    }
}

pub fn gap_score(assignments: &[Assignment]) -> f64 {
    let by_day: HashMap<Day, Vec<&Assignment>> =
        assignments.iter().map(|a| (a.day, a)).into_group_map();

    let mut total_gap = 0u64;
    let mut busy_days = 0u32;
    for day in Day::ALL {
        let Some(classes) = by_day.get(&day) else {
            continue;
        };
        if classes.len() < 2 {
            continue;
        }
        busy_days += 1;
        total_gap += classes
            .iter()
            .sorted_by_key(|a| a.start)
            .tuple_windows()
            .map(|(current, next)| next.start.saturating_sub(current.end))
            .filter(|&gap| gap > 0 && gap < ACCEPTABLE_BREAK_MINUTES)
            .map(u64::from)
            .sum::<u64>();
    }

    let average_gap = if busy_days == 0 {
        0.0
    } else {
        total_gap as f64 / busy_days as f64
    };
    (10.0 - average_gap / 30.0).max(0.0)
}

/// Weekend classes are not counted.
pub fn distribution_score(assignments: &[Assignment]) -> f64 {
    let mut counts = [0u32; 5];
    for assignment in assignments {
        if let Some(bucket) = counts.get_mut(assignment.day.index()) {
            *bucket += 1;
        }
    }

    let n = counts.len() as f64;
    let mean = counts.iter().map(|&c| c as f64).sum::<f64>() / n;
    let variance = counts
        .iter()
        .map(|&c| {
            let d = c as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (10.0 - variance.sqrt() * 2.0).max(0.0)
}

pub fn preference_score(assignments: &[Assignment], demands: &[SubjectDemand]) -> f64 {
    let demand_map = demand_lookup(demands);

    let mut points = 0.0;
    let mut matched = 0u32;
    for assignment in assignments {
        if let Some(demand) = demand_map.get(&assignment.subject_id) {
            points += preference_points(assignment, demand);
            matched += 1;
        }
    }

    if matched == 0 {
        NEUTRAL_PREFERENCE
    } else {
        points / matched as f64
    }
}

/// Points (0, 5 or 10) an assignment earns against its demand's preferences.
pub fn preference_points(assignment: &Assignment, demand: &SubjectDemand) -> f64 {
    let mut points = 0.0;
    if demand.prefers_day(assignment.day) {
        points += PREFERRED_DAY_POINTS;
    }
    if demand.prefers_start(assignment.start) {
        points += PREFERRED_TIME_POINTS;
    }
    points
}

/// Fills `Assignment::score` with each assignment's preference points.
/// Locked assignments and those without a matching demand are left untouched.
pub fn annotate_slot_scores(assignments: &mut [Assignment], demands: &[SubjectDemand]) {
    let demand_map = demand_lookup(demands);
    for assignment in assignments.iter_mut().filter(|a| !a.is_locked) {
        if let Some(demand) = demand_map.get(&assignment.subject_id) {
            assignment.score = Some(preference_points(assignment, demand));
        }
    }
}

/// Lists the day and time preferences that the timetable does not honour.
pub fn unmet_preferences(
    assignments: &[Assignment],
    demands: &[SubjectDemand],
) -> Vec<UnmetSoftConstraint> {
    let demand_map = demand_lookup(demands);
    let mut unmet = Vec::new();

    for assignment in assignments {
        let Some(demand) = demand_map.get(&assignment.subject_id) else {
            continue;
        };
        if !demand.preferred_days.is_empty() && !demand.prefers_day(assignment.day) {
            unmet.push(UnmetSoftConstraint {
                constraint_type: "Preferred Day".to_string(),
                description: format!(
                    "Subject {} is scheduled on {}, preferred days are {}.",
                    assignment.subject_id,
                    assignment.day,
                    demand.preferred_days.iter().join(", ")
                ),
            });
        }
        if !demand.preferred_times.is_empty() && !demand.prefers_start(assignment.start) {
            unmet.push(UnmetSoftConstraint {
                constraint_type: "Preferred Time".to_string(),
                description: format!(
                    "Subject {} starts at {}, preferred windows are {}.",
                    assignment.subject_id,
                    format_minute(assignment.start),
                    demand
                        .preferred_times
                        .iter()
                        .map(|r| format!("{}-{}", format_minute(r.start), format_minute(r.end)))
                        .join(", ")
                ),
            });
        }
    }

    unmet
}

// first demand wins on duplicate ids
fn demand_lookup(demands: &[SubjectDemand]) -> HashMap<SubjectId, &SubjectDemand> {
    let mut map = HashMap::with_capacity(demands.len());
    for demand in demands {
        map.entry(demand.id).or_insert(demand);
    }
    map
}
