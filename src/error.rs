use std::fmt;

use crate::data::SubjectId;

/// Malformed input or configuration. Incomplete schedules are not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    InvalidConfig(String),
    /// The slot generator produced no windows.
    EmptySlotUniverse,
    /// No venue satisfies the subject's venue-type restriction.
    NoEligibleVenue { subject_id: SubjectId },
    /// No candidate slot matches the subject's duration and day preferences.
    NoEligibleSlot { subject_id: SubjectId },
    DuplicateSubject { subject_id: SubjectId },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            ScheduleError::EmptySlotUniverse => {
                write!(f, "no candidate slots fit the configured day window")
            }
            ScheduleError::NoEligibleVenue { subject_id } => {
                write!(f, "subject {} has no venue of an acceptable type", subject_id)
            }
            ScheduleError::NoEligibleSlot { subject_id } => write!(
                f,
                "subject {} has no candidate slot matching its duration and days",
                subject_id
            ),
            ScheduleError::DuplicateSubject { subject_id } => {
                write!(f, "subject {} is demanded more than once", subject_id)
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

impl ScheduleError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ScheduleError::InvalidConfig(_) => "INVALID_CONFIG",
            ScheduleError::EmptySlotUniverse => "EMPTY_SLOT_UNIVERSE",
            ScheduleError::NoEligibleVenue { .. } => "NO_ELIGIBLE_VENUE",
            ScheduleError::NoEligibleSlot { .. } => "NO_ELIGIBLE_SLOT",
            ScheduleError::DuplicateSubject { .. } => "DUPLICATE_SUBJECT",
        }
    }
}
