use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SchedulingConfig;

// Type aliases for clarity
pub type SubjectId = u32;
pub type LecturerId = u32;
pub type VenueId = u32;
/// Minutes since midnight.
pub type Minute = u32;

/// Day of the week. Declaration order is the day index used for slot ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const WEEKDAYS: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    /// Zero-based index, Monday = 0.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, Day::Saturday | Day::Sunday)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Formats a minute-of-day as `HH:MM`.
pub fn format_minute(minute: Minute) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// A half-open time range `[start, end)` in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeRange {
    pub start: Minute,
    pub end: Minute,
}

impl TimeRange {
    pub fn new(start: Minute, end: Minute) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn contains(&self, minute: Minute) -> bool {
        self.start <= minute && minute < self.end
    }
}

/// Kind of teaching venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueType {
    Lecture,
    Tutorial,
    Lab,
}

/// One entry of a subject's acceptable venue types. `"any"` lifts the restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueTypeFilter {
    Any,
    #[serde(untagged)]
    Only(VenueType),
}

/// A physical teaching venue.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueResource {
    pub id: VenueId,
    pub venue_type: VenueType,
    /// Not enforced by the search.
    #[serde(default)]
    pub capacity: u32,
}

/// One teaching obligation to schedule for a student group.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDemand {
    pub id: SubjectId,
    pub lecturer_id: LecturerId,
    /// Higher is placed first.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub preferred_days: Vec<Day>,
    #[serde(default)]
    pub preferred_times: Vec<TimeRange>,
    #[serde(default)]
    pub venue_types: Vec<VenueTypeFilter>,
    #[serde(default)]
    pub department: Option<String>,
}

impl SubjectDemand {
    pub fn new(id: SubjectId, lecturer_id: LecturerId) -> Self {
        Self {
            id,
            lecturer_id,
            priority: 0,
            duration_minutes: None,
            preferred_days: Vec::new(),
            preferred_times: Vec::new(),
            venue_types: Vec::new(),
            department: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_preferred_days(mut self, days: Vec<Day>) -> Self {
        self.preferred_days = days;
        self
    }

    pub fn with_preferred_time(mut self, start: Minute, end: Minute) -> Self {
        self.preferred_times.push(TimeRange::new(start, end));
        self
    }

    pub fn with_venue_types(mut self, filters: Vec<VenueTypeFilter>) -> Self {
        self.venue_types = filters;
        self
    }

    /// Whether `venue_type` satisfies this demand's venue restriction.
    pub fn accepts_venue(&self, venue_type: VenueType) -> bool {
        self.venue_types.is_empty()
            || self.venue_types.iter().any(|f| match f {
                VenueTypeFilter::Any => true,
                VenueTypeFilter::Only(t) => *t == venue_type,
            })
    }

    /// Whether the search may use `slot` for this demand.
    pub fn accepts_slot(&self, slot: &CandidateSlot) -> bool {
        if let Some(duration) = self.duration_minutes {
            if slot.duration() != duration {
                return false;
            }
        }
        self.preferred_days.is_empty() || self.preferred_days.contains(&slot.day)
    }

    pub fn prefers_day(&self, day: Day) -> bool {
        self.preferred_days.contains(&day)
    }

    pub fn prefers_start(&self, start: Minute) -> bool {
        self.preferred_times.iter().any(|r| r.contains(start))
    }
}

/// A bookable (day, start, end) window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct CandidateSlot {
    pub day: Day,
    pub start: Minute,
    pub end: Minute,
}

impl CandidateSlot {
    pub fn new(day: Day, start: Minute, end: Minute) -> Self {
        Self { day, start, end }
    }

    pub fn duration(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }
}

impl fmt::Display for CandidateSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.day,
            format_minute(self.start),
            format_minute(self.end)
        )
    }
}

/// A placement of one subject into a venue at a given time.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub day: Day,
    pub start: Minute,
    pub end: Minute,
    pub subject_id: SubjectId,
    pub venue_id: VenueId,
    pub lecturer_id: LecturerId,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub manually_assigned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Assignment {
    pub fn new(
        slot: CandidateSlot,
        subject_id: SubjectId,
        venue_id: VenueId,
        lecturer_id: LecturerId,
    ) -> Self {
        Self {
            day: slot.day,
            start: slot.start,
            end: slot.end,
            subject_id,
            venue_id,
            lecturer_id,
            is_locked: false,
            manually_assigned: false,
            score: None,
        }
    }

    pub fn locked(mut self) -> Self {
        self.is_locked = true;
        self
    }

    pub fn slot(&self) -> CandidateSlot {
        CandidateSlot::new(self.day, self.start, self.end)
    }

    /// Identical (day, start, end).
    #[inline]
    pub fn same_time(&self, other: &Assignment) -> bool {
        self.day == other.day && self.start == other.start && self.end == other.end
    }
}

/// Sub-scores on a 0-10 scale plus their weighted total.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub gap: f64,
    pub distribution: f64,
    pub preference: f64,
    pub total: f64,
}

/// Describes a soft constraint that was not met in the final schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmetSoftConstraint {
    pub constraint_type: String,
    pub description: String,
}

impl fmt::Display for UnmetSoftConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.constraint_type, self.description)
    }
}

/// How the search terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchStatus {
    /// Every pending demand was placed.
    Complete,
    /// The backtrack budget ran out.
    BudgetExhausted,
    /// Every (slot, venue) alternative was tried.
    SpaceExhausted,
}

/// The complete input for scheduling one student group.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub demands: Vec<SubjectDemand>,
    pub venues: Vec<VenueResource>,
    #[serde(default)]
    pub locked: Vec<Assignment>,
    #[serde(default)]
    pub committed_elsewhere: Vec<Assignment>,
    #[serde(default)]
    pub config: SchedulingConfig,
}

/// The final output of the solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub assignments: Vec<Assignment>,
    pub score: ScoreBreakdown,
    pub status: SearchStatus,
    pub complete: bool,
    pub unplaced_subjects: Vec<SubjectId>,
    pub backtracks: usize,
    pub unmet_soft_constraints: Vec<UnmetSoftConstraint>,
}

/// Rescoring request for an existing timetable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub demands: Vec<SubjectDemand>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub score: ScoreBreakdown,
    pub unmet_soft_constraints: Vec<UnmetSoftConstraint>,
}
