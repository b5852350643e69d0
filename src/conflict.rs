use crate::data::Assignment;

/// True iff some committed assignment occupies the exact same (day, start, end)
/// as `candidate` and shares its venue or its lecturer.
pub fn conflicts(candidate: &Assignment, committed: &[Assignment]) -> bool {
    committed.iter().any(|other| {
        candidate.same_time(other)
            && (candidate.venue_id == other.venue_id || candidate.lecturer_id == other.lecturer_id)
    })
}

/// Every pair of assignments that violates venue or lecturer exclusivity.
pub fn find_conflicts(assignments: &[Assignment]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in assignments.iter().enumerate() {
        for (j, b) in assignments.iter().enumerate().skip(i + 1) {
            if conflicts(a, std::slice::from_ref(b)) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}
