use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::ScheduleError;

/// Knobs for one scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulingConfig {
    pub include_weekends: bool,
    pub session_duration_minutes: u32,
    pub day_start_hour: u32,
    pub day_end_hour: u32,
    pub max_backtracks: usize,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            include_weekends: false,
            session_duration_minutes: 60,
            day_start_hour: 8,
            day_end_hour: 18,
            max_backtracks: 10_000,
        }
    }
}

impl SchedulingConfig {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.session_duration_minutes == 0 {
            return Err(ScheduleError::InvalidConfig(
                "sessionDurationMinutes must be positive".to_string(),
            ));
        }
        if self.day_end_hour > 24 {
            return Err(ScheduleError::InvalidConfig(format!(
                "dayEndHour {} is past midnight",
                self.day_end_hour
            )));
        }
        if self.day_start_hour >= self.day_end_hour {
            return Err(ScheduleError::InvalidConfig(format!(
                "dayStartHour {} must be before dayEndHour {}",
                self.day_start_hour, self.day_end_hour
            )));
        }
        Ok(())
    }
}

/// Process-level settings for the HTTP wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: String,
    pub log_filter: String,
    pub max_concurrent_solves: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            log_filter: "info".to_string(),
            max_concurrent_solves: 4,
        }
    }
}

impl ServerConfig {
    /// Reads `TIMETABLE_ADDR`, `TIMETABLE_LOG` and `TIMETABLE_MAX_CONCURRENT_SOLVES`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let max_concurrent_solves =
            parse_or("TIMETABLE_MAX_CONCURRENT_SOLVES", &lookup, defaults.max_concurrent_solves)
                .max(1);
        Self {
            addr: lookup("TIMETABLE_ADDR").unwrap_or(defaults.addr),
            log_filter: lookup("TIMETABLE_LOG").unwrap_or(defaults.log_filter),
            max_concurrent_solves,
        }
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring unparsable {}={:?}", key, raw);
            default
        }),
        None => default,
    }
}
