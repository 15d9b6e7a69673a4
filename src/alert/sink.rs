// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Alert sink backed by external speech and audio player programs

use std::ffi::OsStr;
use std::future::Future;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{AlarmSound, AlertError, AlertSink};
use crate::config::AlertConfig;

const MIN_REPEAT_INTERVAL: Duration = Duration::from_millis(10);

/// Call `play` repeatedly until `duration_secs` has elapsed, sleeping
/// `interval` between plays. Always plays at least once, so zero or negative
/// durations give a single play. Returns the number of plays.
pub async fn repeat_for<F, Fut, E>(duration_secs: i64, interval: Duration, mut play: F) -> Result<u32, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let interval = interval.max(MIN_REPEAT_INTERVAL);
    let deadline = u64::try_from(duration_secs)
        .ok()
        .filter(|&secs| secs > 0)
        .and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs)));

    let mut plays = 0;
    loop {
        play().await?;
        plays += 1;

        match deadline {
            Some(end) if Instant::now() < end => tokio::time::sleep(interval).await,
            _ => break,
        }
    }
    Ok(plays)
}

/// Speaks through a TTS program (`espeak`, `say`) and plays the alarm
/// through an audio player (`aplay`, `afplay`).
///
/// Capabilities that are unavailable degrade with a single warning: a bad
/// alarm sound is reported once at construction, a failing speech or player
/// program once on first failure.
pub struct CommandAlertSink {
    speech_command: Vec<String>,
    player_command: Vec<String>,
    sound: Option<AlarmSound>,
    repeat_interval: Duration,
    speech_warned: AtomicBool,
    playback_warned: AtomicBool,
}

impl CommandAlertSink {
    /// Build the sink, validating the alarm sound once
    pub fn from_config(config: &AlertConfig) -> Self {
        let sound = match AlarmSound::load(&config.sound_path) {
            Ok(sound) => {
                info!("Alarm sound: {:?}", sound.path());
                Some(sound)
            }
            Err(e) => {
                warn!("{}. Continuing without alarm sound.", e);
                None
            }
        };

        let speech_warned = AtomicBool::new(false);
        if config.speech_command.is_empty() {
            warn!("No speech command configured. Voice warnings disabled.");
            speech_warned.store(true, Ordering::Relaxed);
        }

        let playback_warned = AtomicBool::new(false);
        if sound.is_some() && config.player_command.is_empty() {
            warn!("No audio player configured. Alarm disabled.");
            playback_warned.store(true, Ordering::Relaxed);
        }

        Self {
            speech_command: config.speech_command.clone(),
            player_command: config.player_command.clone(),
            sound,
            repeat_interval: Duration::from_millis(config.alarm_repeat_interval_ms),
            speech_warned,
            playback_warned,
        }
    }

    /// Whether the alarm sound loaded
    pub fn alarm_enabled(&self) -> bool {
        self.sound.is_some() && !self.player_command.is_empty()
    }

    fn warn_once(flag: &AtomicBool, what: &str, err: &AlertError) {
        if flag.swap(true, Ordering::Relaxed) {
            debug!("{} failed again: {}", what, err);
        } else {
            warn!("{} failed: {}. Further failures are logged at debug level.", what, err);
        }
    }
}

async fn run_to_completion(command: &[String], last_arg: &OsStr) -> Result<(), String> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| "no command configured".to_string())?;

    let status = Command::new(program)
        .args(args)
        .arg(last_arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
        .map_err(|e| format!("{}: {}", program, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(format!("{} exited with {}", program, status))
    }
}

#[async_trait]
impl AlertSink for CommandAlertSink {
    async fn speak(&self, message: &str) -> Result<(), AlertError> {
        if self.speech_command.is_empty() {
            return Err(AlertError::SpeechDisabled);
        }

        let result = run_to_completion(&self.speech_command, OsStr::new(message))
            .await
            .map_err(AlertError::Speech);
        if let Err(e) = &result {
            Self::warn_once(&self.speech_warned, "Text-to-speech", e);
        }
        result
    }

    async fn play_alarm(&self, duration_secs: i64) -> Result<(), AlertError> {
        let Some(sound) = self.sound.as_ref().filter(|_| !self.player_command.is_empty()) else {
            return Err(AlertError::AlarmDisabled);
        };

        let player = self.player_command.as_slice();
        let result = repeat_for(duration_secs, self.repeat_interval, || async move {
            run_to_completion(player, sound.path().as_os_str())
                .await
                .map_err(AlertError::Playback)
        })
        .await;

        match result {
            Ok(plays) => {
                debug!("Alarm played {} time(s)", plays);
                Ok(())
            }
            Err(e) => {
                Self::warn_once(&self.playback_warned, "Alarm playback", &e);
                Err(e)
            }
        }
    }
}
