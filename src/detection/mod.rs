// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Detection module - presence state and debounced transitions

mod tracker;

pub use tracker::StateTracker;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Presence state derived from a subject count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresenceState {
    /// Nothing has been observed yet. Never re-entered.
    Unknown,
    /// No subject in the last sample
    Absent,
    /// At least one subject in the last sample
    Present,
}

impl PresenceState {
    /// `Present` iff at least one subject was detected
    pub fn from_count(subject_count: u32) -> Self {
        if subject_count > 0 {
            PresenceState::Present
        } else {
            PresenceState::Absent
        }
    }

    /// Lowercase name, as written in the report
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceState::Unknown => "unknown",
            PresenceState::Absent => "absent",
            PresenceState::Present => "present",
        }
    }
}

impl Default for PresenceState {
    fn default() -> Self {
        PresenceState::Unknown
    }
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change of presence state between two consecutive samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// State before the sample
    pub from: PresenceState,
    /// State after the sample
    pub to: PresenceState,
    /// Timestamp of the sample that caused the change
    pub at: DateTime<Utc>,
    /// Subject count of that sample
    pub subject_count: u32,
}

impl StateTransition {
    /// Entering `Present`
    pub fn is_arrival(&self) -> bool {
        self.to == PresenceState::Present
    }
}
