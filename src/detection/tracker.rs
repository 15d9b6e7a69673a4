// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Debounces raw detector output into state transitions

use super::{PresenceState, StateTransition};
use crate::source::DetectionSample;

/// Remembers the last presence state and reports only changes.
///
/// ```text
///            count > 0             count == 0
///  Unknown ────────────► Present ◄──────────► Absent
///     │                                         ▲
///     └─────────────────────────────────────────┘
///                      count == 0
/// ```
#[derive(Debug, Default)]
pub struct StateTracker {
    current: PresenceState,
}

impl StateTracker {
    /// Tracker in the `Unknown` state
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample. Returns a transition only when the state changed.
    pub fn ingest(&mut self, sample: &DetectionSample) -> Option<StateTransition> {
        let to = PresenceState::from_count(sample.subject_count);
        if to == self.current {
            return None;
        }

        let from = std::mem::replace(&mut self.current, to);
        Some(StateTransition {
            from,
            to,
            at: sample.timestamp,
            subject_count: sample.subject_count,
        })
    }

    /// Current debounced state
    pub fn current(&self) -> PresenceState {
        self.current
    }

    /// Forget the last state so the next sample transitions out of `Unknown`
    pub fn reset(&mut self) {
        self.current = PresenceState::Unknown;
    }
}
