// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Alert module - cooldown gating and the voice-then-alarm sequence

mod episode;
mod orchestrator;
mod sink;
mod sound;

pub use episode::{AlertEpisode, EpisodeReport};
pub use orchestrator::{AlertDecision, AlertOrchestrator};
pub use sink::{repeat_for, CommandAlertSink};
pub use sound::AlarmSound;

use std::path::PathBuf;

use async_trait::async_trait;

/// Alert errors
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// Configured sound file does not exist
    #[error("Sound file not found: {0}")]
    SoundMissing(PathBuf),

    /// Sound file exists but cannot be used
    #[error("Could not load sound {path}: {reason}")]
    SoundInvalid {
        /// Offending file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// No usable sound or player
    #[error("Alarm sound is disabled")]
    AlarmDisabled,

    /// No speech command configured
    #[error("Speech is disabled")]
    SpeechDisabled,

    /// Speech command failed
    #[error("Speech failed: {0}")]
    Speech(String),

    /// Player command failed
    #[error("Alarm playback failed: {0}")]
    Playback(String),
}

/// Audio capabilities an alert episode drives.
///
/// Both calls return once the audio has finished. `play_alarm` repeats the
/// alarm until `duration_secs` has elapsed and always plays at least once.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Speak `message` once
    async fn speak(&self, message: &str) -> Result<(), AlertError>;

    /// Sound the alarm for `duration_secs`
    async fn play_alarm(&self, duration_secs: i64) -> Result<(), AlertError>;
}
