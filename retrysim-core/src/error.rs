//! Error types for the simulation engine

use crate::SimTime;
use thiserror::Error;

/// Top-level error type for simulation operations
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

/// Errors related to event scheduling and handling
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event scheduling failed: event at {event_time} is earlier than the clock ({now})")]
    ScheduleInPast { event_time: SimTime, now: SimTime },

    #[error("Event payload type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}
