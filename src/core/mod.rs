//! Core module - the sampling loop that ties the watcher together

mod engine;

pub use engine::Engine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detection::PresenceState;

/// Counters for one run of the watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemState {
    /// Driver loop is active
    pub running: bool,
    /// Last debounced state
    pub presence: PresenceState,
    /// Samples processed
    pub samples: u64,
    /// State changes seen
    pub transitions: u64,
    /// Report rows appended
    pub records_written: u64,
    /// Report rows that could not be appended
    pub log_failures: u64,
    /// Alert episodes launched
    pub episodes_started: u64,
    /// Arrivals inside the cooldown
    pub alerts_suppressed: u64,
    /// Run length in seconds
    pub uptime_seconds: u64,
    /// Time of the last state change
    pub last_transition: Option<DateTime<Utc>>,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            running: false,
            presence: PresenceState::Unknown,
            samples: 0,
            transitions: 0,
            records_written: 0,
            log_failures: 0,
            episodes_started: 0,
            alerts_suppressed: 0,
            uptime_seconds: 0,
            last_transition: None,
        }
    }
}
