//! Bounded backtracking assignment of subject demands to (slot, venue) pairs.
//!
//! # Algorithm
//!
//! 1. Stable-sort demands by priority, highest first.
//! 2. Drop demands already covered by a locked assignment.
//! 3. Depth-first search: at depth `i` try every eligible (slot, venue) pair for
//!    demand `i` in slot-generator order then venue input order, place the first
//!    conflict-free pair and descend. A depth with no alternatives left undoes the
//!    parent's placement and resumes the parent where it stopped.
//!
//! Each frame entered counts against `max_backtracks`. When the budget runs out
//! the search stops and returns the assignments as currently accumulated. When
//! the whole space is exhausted it returns the deepest partial assignment it
//! reached. Neither case is an error.
//!
//! The recursion is kept on an explicit stack of cursors, so the call stack does
//! not grow with the number of demands.

use log::{debug, trace};
use std::collections::HashSet;

use crate::conflict::conflicts;
use crate::data::{Assignment, CandidateSlot, SearchStatus, SubjectDemand, SubjectId, VenueResource};
use crate::error::ScheduleError;

/// Receives search events. All methods default to no-ops.
pub trait SearchObserver {
    /// A frame for `demand` was entered at `depth`.
    fn on_enter(&mut self, _depth: usize, _demand: &SubjectDemand) {}
    fn on_place(&mut self, _depth: usize, _assignment: &Assignment) {}
    /// The placement at `depth` was undone.
    fn on_backtrack(&mut self, _depth: usize, _assignment: &Assignment) {}
}

impl SearchObserver for () {}

/// Result of one search run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Locked assignments first, then placements in search order.
    pub assignments: Vec<Assignment>,
    pub status: SearchStatus,
    /// Frames entered; at most `max_backtracks + 1`.
    pub backtracks: usize,
    /// Pending demands without a placement, in priority order.
    pub unplaced: Vec<SubjectId>,
}

impl SearchOutcome {
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }
}

/// Eligible slot and venue indices for one pending demand.
struct Candidates<'a> {
    demand: &'a SubjectDemand,
    slots: Vec<usize>,
    venues: Vec<usize>,
}

/// Position of the next (slot, venue) pair to try within a frame.
#[derive(Debug, Default, Clone, Copy)]
struct Cursor {
    slot: usize,
    venue: usize,
}

/// Mutable state of one search: the backtrack counter and the working list.
struct SearchState {
    assignments: Vec<Assignment>,
    backtracks: usize,
    best: Vec<Assignment>,
}

impl SearchState {
    fn new(locked: &[Assignment]) -> Self {
        Self {
            assignments: locked.to_vec(),
            backtracks: 0,
            best: locked.to_vec(),
        }
    }

    fn remember_if_deeper(&mut self) {
        if self.assignments.len() > self.best.len() {
            self.best = self.assignments.clone();
        }
    }
}

/// Places demands into free (slot, venue) pairs without double-booking venues
/// or lecturers, against both the working list and bookings held elsewhere.
pub struct BacktrackingAssigner<'a> {
    venues: &'a [VenueResource],
    slots: &'a [CandidateSlot],
    committed_elsewhere: &'a [Assignment],
    max_backtracks: usize,
}

impl<'a> BacktrackingAssigner<'a> {
    pub fn new(
        venues: &'a [VenueResource],
        slots: &'a [CandidateSlot],
        committed_elsewhere: &'a [Assignment],
    ) -> Self {
        Self {
            venues,
            slots,
            committed_elsewhere,
            max_backtracks: usize::MAX,
        }
    }

    pub fn with_max_backtracks(mut self, max_backtracks: usize) -> Self {
        self.max_backtracks = max_backtracks;
        self
    }

    pub fn assign(
        &self,
        demands: &[SubjectDemand],
        locked: &[Assignment],
    ) -> Result<SearchOutcome, ScheduleError> {
        self.assign_observed(demands, locked, &mut ())
    }

    pub fn assign_observed(
        &self,
        demands: &[SubjectDemand],
        locked: &[Assignment],
        observer: &mut impl SearchObserver,
    ) -> Result<SearchOutcome, ScheduleError> {
        let pending = self.prepare(demands, locked)?;
        let mut state = SearchState::new(locked);

        if pending.is_empty() {
            debug!("Nothing to place; {} locked assignments kept", locked.len());
            return Ok(self.finish(state.assignments, SearchStatus::Complete, 0, &pending));
        }

        debug!(
            "Searching {} demands over {} slots and {} venues (budget {})",
            pending.len(),
            self.slots.len(),
            self.venues.len(),
            self.max_backtracks
        );

        let status = self.search(&pending, &mut state, observer);
        let assignments = match status {
            SearchStatus::SpaceExhausted => state.best,
            SearchStatus::Complete | SearchStatus::BudgetExhausted => state.assignments,
        };
        Ok(self.finish(assignments, status, state.backtracks, &pending))
    }

    /// Orders, filters and validates the demands still to be placed.
    fn prepare<'d>(
        &self,
        demands: &'d [SubjectDemand],
        locked: &[Assignment],
    ) -> Result<Vec<Candidates<'d>>, ScheduleError> {
        let mut seen = HashSet::new();
        for demand in demands {
            if !seen.insert(demand.id) {
                return Err(ScheduleError::DuplicateSubject {
                    subject_id: demand.id,
                });
            }
        }

        let locked_subjects: HashSet<SubjectId> = locked.iter().map(|a| a.subject_id).collect();
        let mut ordered: Vec<&SubjectDemand> = demands
            .iter()
            .filter(|d| !locked_subjects.contains(&d.id))
            .collect();
        // stable: equal priorities keep input order
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

        if ordered.is_empty() {
            return Ok(Vec::new());
        }
        if self.slots.is_empty() {
            return Err(ScheduleError::EmptySlotUniverse);
        }

        ordered
            .into_iter()
            .map(|demand| {
                let venues: Vec<usize> = self
                    .venues
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| demand.accepts_venue(v.venue_type))
                    .map(|(i, _)| i)
                    .collect();
                if venues.is_empty() {
                    return Err(ScheduleError::NoEligibleVenue {
                        subject_id: demand.id,
                    });
                }
                let slots: Vec<usize> = self
                    .slots
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| demand.accepts_slot(s))
                    .map(|(i, _)| i)
                    .collect();
                if slots.is_empty() {
                    return Err(ScheduleError::NoEligibleSlot {
                        subject_id: demand.id,
                    });
                }
                Ok(Candidates {
                    demand,
                    slots,
                    venues,
                })
            })
            .collect()
    }

    fn search(
        &self,
        pending: &[Candidates<'_>],
        state: &mut SearchState,
        observer: &mut impl SearchObserver,
    ) -> SearchStatus {
        let mut frames: Vec<Cursor> = Vec::with_capacity(pending.len());

        loop {
            // enter a new frame
            let depth = frames.len();
            if depth == pending.len() {
                return SearchStatus::Complete;
            }
            state.backtracks += 1;
            if state.backtracks > self.max_backtracks {
                debug!(
                    "Backtrack budget of {} exhausted at depth {}",
                    self.max_backtracks, depth
                );
                return SearchStatus::BudgetExhausted;
            }
            observer.on_enter(depth, pending[depth].demand);
            frames.push(Cursor::default());

            // advance the top frame until something is placed or the stack empties
            loop {
                let top = frames.len() - 1;
                if let Some(assignment) = self.next_placement(&pending[top], &mut frames[top], state)
                {
                    trace!(
                        "Placed subject {} in venue {} at {}",
                        assignment.subject_id,
                        assignment.venue_id,
                        assignment.slot()
                    );
                    observer.on_place(top, &assignment);
                    state.assignments.push(assignment);
                    state.remember_if_deeper();
                    break;
                }

                frames.pop();
                if frames.is_empty() {
                    return SearchStatus::SpaceExhausted;
                }
                let parent = frames.len() - 1;
                if let Some(undone) = state.assignments.pop() {
                    trace!(
                        "Backtracking subject {} from {}",
                        undone.subject_id,
                        undone.slot()
                    );
                    observer.on_backtrack(parent, &undone);
                }
            }
        }
    }

    /// Scans forward from `cursor` for the next conflict-free pair and leaves
    /// the cursor just past it.
    fn next_placement(
        &self,
        candidates: &Candidates<'_>,
        cursor: &mut Cursor,
        state: &SearchState,
    ) -> Option<Assignment> {
        let demand = candidates.demand;
        while cursor.slot < candidates.slots.len() {
            let slot = self.slots[candidates.slots[cursor.slot]];
            while cursor.venue < candidates.venues.len() {
                let venue = &self.venues[candidates.venues[cursor.venue]];
                cursor.venue += 1;

                let candidate = Assignment::new(slot, demand.id, venue.id, demand.lecturer_id);
                if conflicts(&candidate, &state.assignments)
                    || conflicts(&candidate, self.committed_elsewhere)
                {
                    continue;
                }
                return Some(candidate);
            }
            cursor.slot += 1;
            cursor.venue = 0;
        }
        None
    }

    fn finish(
        &self,
        assignments: Vec<Assignment>,
        status: SearchStatus,
        backtracks: usize,
        pending: &[Candidates<'_>],
    ) -> SearchOutcome {
        let placed: HashSet<SubjectId> = assignments.iter().map(|a| a.subject_id).collect();
        let unplaced = pending
            .iter()
            .map(|c| c.demand.id)
            .filter(|id| !placed.contains(id))
            .collect();
        SearchOutcome {
            assignments,
            status,
            backtracks,
            unplaced,
        }
    }
}

/// Convenience wrapper over [`BacktrackingAssigner`].
pub fn assign(
    demands: &[SubjectDemand],
    venues: &[VenueResource],
    slots: &[CandidateSlot],
    locked: &[Assignment],
    committed_elsewhere: &[Assignment],
    max_backtracks: usize,
) -> Result<SearchOutcome, ScheduleError> {
    BacktrackingAssigner::new(venues, slots, committed_elsewhere)
        .with_max_backtracks(max_backtracks)
        .assign(demands, locked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::find_conflicts;
    use crate::data::{Day, VenueType, VenueTypeFilter};
    use crate::slots::generate_slots;

    fn venue(id: u32, venue_type: VenueType) -> VenueResource {
        VenueResource {
            id,
            venue_type,
            capacity: 40,
        }
    }

    fn monday_nine() -> Vec<CandidateSlot> {
        vec![CandidateSlot::new(Day::Monday, 540, 600)]
    }

    #[derive(Default)]
    struct Recorder {
        entered: Vec<SubjectId>,
        undone: Vec<SubjectId>,
    }

    impl SearchObserver for Recorder {
        fn on_enter(&mut self, _depth: usize, demand: &SubjectDemand) {
            self.entered.push(demand.id);
        }
        fn on_backtrack(&mut self, _depth: usize, assignment: &Assignment) {
            self.undone.push(assignment.subject_id);
        }
    }

    #[test]
    fn no_demands_returns_locked_unchanged() {
        let locked = vec![
            Assignment::new(CandidateSlot::new(Day::Tuesday, 600, 660), 9, 1, 90).locked(),
        ];
        let outcome = assign(&[], &[], &[], &locked, &[], 100).unwrap();
        assert_eq!(outcome.assignments, locked);
        assert_eq!(outcome.status, SearchStatus::Complete);
        assert_eq!(outcome.backtracks, 0);
    }

    #[test]
    fn single_demand_is_placed_without_backtracking() {
        let venues = vec![venue(1, VenueType::Lecture)];
        let demands = vec![SubjectDemand::new(10, 100)];
        let outcome = assign(&demands, &venues, &monday_nine(), &[], &[], 100).unwrap();

        assert_eq!(outcome.assignments.len(), 1);
        let placed = &outcome.assignments[0];
        assert_eq!((placed.subject_id, placed.venue_id, placed.lecturer_id), (10, 1, 100));
        assert_eq!(placed.slot(), monday_nine()[0]);
        assert!(!placed.is_locked);
        assert_eq!(outcome.backtracks, 1);
        assert!(outcome.is_complete());
    }

    #[test]
    fn contested_slot_keeps_higher_priority_subject() {
        let venues = vec![venue(1, VenueType::Lecture)];
        let demands = vec![
            SubjectDemand::new(1, 100).with_priority(1),
            SubjectDemand::new(2, 200).with_priority(5),
        ];
        let outcome = assign(&demands, &venues, &monday_nine(), &[], &[], 100).unwrap();

        assert_eq!(outcome.status, SearchStatus::SpaceExhausted);
        assert_eq!(outcome.assignments.len(), 1);
        assert_eq!(outcome.assignments[0].subject_id, 2);
        assert_eq!(outcome.unplaced, vec![1]);
    }

    #[test]
    fn contested_slot_tie_goes_to_first_in_input() {
        let venues = vec![venue(1, VenueType::Lecture)];
        let demands = vec![SubjectDemand::new(7, 100), SubjectDemand::new(8, 200)];
        let outcome = assign(&demands, &venues, &monday_nine(), &[], &[], 100).unwrap();
        assert_eq!(outcome.assignments.len(), 1);
        assert_eq!(outcome.assignments[0].subject_id, 7);
    }

    #[test]
    fn zero_budget_returns_locked() {
        let venues = vec![venue(1, VenueType::Lecture)];
        let slots = generate_slots(false, 60, 9, 17);
        let locked = vec![Assignment::new(slots[3], 50, 1, 500).locked()];
        let demands = vec![SubjectDemand::new(1, 100), SubjectDemand::new(2, 200)];

        let outcome = assign(&demands, &venues, &slots, &locked, &[], 0).unwrap();
        assert_eq!(outcome.status, SearchStatus::BudgetExhausted);
        assert_eq!(outcome.assignments, locked);
        assert_eq!(outcome.backtracks, 1);
        assert_eq!(outcome.unplaced, vec![1, 2]);
    }

    #[test]
    fn budget_abort_keeps_accumulated_placements() {
        let venues = vec![venue(1, VenueType::Lecture)];
        let slots = generate_slots(false, 60, 9, 17);
        let demands = vec![
            SubjectDemand::new(1, 100),
            SubjectDemand::new(2, 200),
            SubjectDemand::new(3, 300),
        ];
        let outcome = assign(&demands, &venues, &slots, &[], &[], 2).unwrap();
        assert_eq!(outcome.status, SearchStatus::BudgetExhausted);
        assert_eq!(outcome.backtracks, 3);
        let placed: Vec<_> = outcome.assignments.iter().map(|a| a.subject_id).collect();
        assert_eq!(placed, vec![1, 2]);
    }

    #[test]
    fn backtracks_to_free_a_slot_for_a_constrained_subject() {
        let venues = vec![venue(1, VenueType::Lecture)];
        let slots = vec![
            CandidateSlot::new(Day::Monday, 540, 600),
            CandidateSlot::new(Day::Tuesday, 540, 600),
        ];
        let demands = vec![
            SubjectDemand::new(1, 100).with_priority(2),
            SubjectDemand::new(2, 200)
                .with_priority(1)
                .with_preferred_days(vec![Day::Monday]),
        ];
        let mut recorder = Recorder::default();
        let outcome = BacktrackingAssigner::new(&venues, &slots, &[])
            .assign_observed(&demands, &[], &mut recorder)
            .unwrap();

        assert!(outcome.is_complete());
        let first = outcome.assignments.iter().find(|a| a.subject_id == 1).unwrap();
        let second = outcome.assignments.iter().find(|a| a.subject_id == 2).unwrap();
        assert_eq!(first.day, Day::Tuesday);
        assert_eq!(second.day, Day::Monday);
        assert_eq!(recorder.undone, vec![1]);
        assert_eq!(recorder.entered, vec![1, 2, 2]);
    }

    #[test]
    fn higher_priority_is_entered_first() {
        let venues = vec![venue(1, VenueType::Lecture)];
        let slots = generate_slots(false, 60, 9, 12);
        let demands = vec![
            SubjectDemand::new(1, 100).with_priority(1),
            SubjectDemand::new(2, 200).with_priority(3),
            SubjectDemand::new(3, 300).with_priority(2),
        ];
        let mut recorder = Recorder::default();
        BacktrackingAssigner::new(&venues, &slots, &[])
            .assign_observed(&demands, &[], &mut recorder)
            .unwrap();
        assert_eq!(recorder.entered, vec![2, 3, 1]);
    }

    #[test]
    fn locked_subjects_are_not_rescheduled() {
        let venues = vec![venue(1, VenueType::Lecture), venue(2, VenueType::Lecture)];
        let slots = monday_nine();
        let locked = vec![Assignment::new(slots[0], 1, 1, 100).locked()];
        let demands = vec![SubjectDemand::new(1, 100), SubjectDemand::new(2, 200)];

        let outcome = assign(&demands, &venues, &slots, &locked, &[], 100).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.assignments[0], locked[0]);
        assert_eq!(outcome.assignments.len(), 2);
        // venue 1 is held by the locked class
        assert_eq!(outcome.assignments[1].venue_id, 2);
    }

    #[test]
    fn committed_elsewhere_blocks_lecturer_and_venue() {
        let venues = vec![venue(1, VenueType::Lecture), venue(2, VenueType::Lecture)];
        let slots = vec![
            CandidateSlot::new(Day::Monday, 540, 600),
            CandidateSlot::new(Day::Monday, 600, 660),
        ];
        let elsewhere = vec![
            Assignment::new(slots[0], 90, 2, 999),
            Assignment::new(slots[0], 91, 3, 100),
        ];
        let demands = vec![SubjectDemand::new(1, 100)];

        let outcome = assign(&demands, &venues, &slots, &[], &elsewhere, 100).unwrap();
        assert_eq!(outcome.assignments.len(), 1);
        assert_eq!(outcome.assignments[0].slot(), slots[1]);
        assert_eq!(outcome.assignments[0].venue_id, 1);
    }

    #[test]
    fn venue_type_restriction_is_respected() {
        let venues = vec![venue(1, VenueType::Lecture), venue(2, VenueType::Lab)];
        let demands = vec![
            SubjectDemand::new(1, 100).with_venue_types(vec![VenueTypeFilter::Only(VenueType::Lab)]),
            SubjectDemand::new(2, 200).with_venue_types(vec![VenueTypeFilter::Any]),
        ];
        let outcome = assign(&demands, &venues, &monday_nine(), &[], &[], 100).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.assignments[0].venue_id, 2);
        assert_eq!(outcome.assignments[1].venue_id, 1);
    }

    #[test]
    fn duration_must_match_slot_length() {
        let venues = vec![venue(1, VenueType::Lecture)];
        let slots = generate_slots(false, 60, 9, 17);
        let demands = vec![SubjectDemand::new(1, 100).with_duration(90)];
        let err = assign(&demands, &venues, &slots, &[], &[], 100).unwrap_err();
        assert_eq!(err, ScheduleError::NoEligibleSlot { subject_id: 1 });
    }

    #[test]
    fn malformed_inputs_fail_fast() {
        let labs_only = vec![SubjectDemand::new(1, 100)
            .with_venue_types(vec![VenueTypeFilter::Only(VenueType::Lab)])];
        let lecture_halls = vec![venue(1, VenueType::Lecture)];
        assert_eq!(
            assign(&labs_only, &lecture_halls, &monday_nine(), &[], &[], 100).unwrap_err(),
            ScheduleError::NoEligibleVenue { subject_id: 1 }
        );
        assert_eq!(
            assign(&labs_only, &[], &[], &[], &[], 100).unwrap_err(),
            ScheduleError::EmptySlotUniverse
        );
        let saturday_only = vec![SubjectDemand::new(5, 100).with_preferred_days(vec![Day::Saturday])];
        let weekdays = generate_slots(false, 60, 9, 17);
        assert_eq!(
            assign(&saturday_only, &lecture_halls, &weekdays, &[], &[], 100).unwrap_err(),
            ScheduleError::NoEligibleSlot { subject_id: 5 }
        );
        let twice = vec![SubjectDemand::new(4, 100), SubjectDemand::new(4, 100)];
        assert_eq!(
            assign(&twice, &lecture_halls, &monday_nine(), &[], &[], 100).unwrap_err(),
            ScheduleError::DuplicateSubject { subject_id: 4 }
        );
    }

    #[test]
    fn full_week_has_no_double_bookings() {
        let venues = vec![venue(1, VenueType::Lecture), venue(2, VenueType::Tutorial)];
        let slots = generate_slots(false, 60, 9, 11);
        // ten subjects shared between two lecturers
        let demands: Vec<_> = (0..10)
            .map(|i| SubjectDemand::new(i, 100 + i % 2).with_priority((i % 3) as i32))
            .collect();
        let outcome = assign(&demands, &venues, &slots, &[], &[], 10_000).unwrap();
        assert!(outcome.is_complete());
        assert!(find_conflicts(&outcome.assignments).is_empty());
    }
}
