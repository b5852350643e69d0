//! Weekly timetable construction for a student group.
//!
//! Subjects are placed into (day, time, venue) slots by a bounded
//! backtracking search that never double-books a venue or a lecturer, and
//! the result is rated on gaps, weekday spread and subject preferences.
//!
//! - [`slots`] enumerates the bookable windows
//! - [`conflict`] is the exclusivity predicate
//! - [`assigner`] runs the search
//! - [`scorer`] rates a timetable
//! - [`solver`] ties them together; [`server`] exposes that over HTTP

pub mod assigner;
pub mod config;
pub mod conflict;
pub mod data;
pub mod error;
pub mod scorer;
pub mod server;
pub mod slots;
pub mod solver;

pub use assigner::{BacktrackingAssigner, SearchObserver, SearchOutcome, assign};
pub use conflict::conflicts;
pub use error::ScheduleError;
pub use scorer::score;
pub use slots::generate_slots;
