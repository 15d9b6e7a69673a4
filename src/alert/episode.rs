// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! A single alert episode: spoken warnings, then the alarm

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::AlertSink;

/// Parameters of one alert sequence, owned by the task that plays it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertEpisode {
    /// Episode identifier, used in logs
    pub id: Uuid,
    /// Time of the arrival that started it
    pub started_at: DateTime<Utc>,
    /// Spoken warning
    pub message: String,
    /// How many times the warning is spoken
    pub repeat_count: u32,
    /// How long the alarm loops
    pub alarm_duration_secs: i64,
}

/// What an episode managed to play
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeReport {
    /// Episode identifier
    pub id: Uuid,
    /// Warnings spoken successfully
    pub utterances: u32,
    /// Error that ended the speech phase early
    pub speech_error: Option<String>,
    /// Error from the alarm phase
    pub alarm_error: Option<String>,
}

impl AlertEpisode {
    /// New episode with a fresh id
    pub fn new(started_at: DateTime<Utc>, message: &str, repeat_count: u32, alarm_duration_secs: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at,
            message: message.to_string(),
            repeat_count,
            alarm_duration_secs,
        }
    }

    /// Play the episode to completion.
    ///
    /// Phase 1 speaks the message `repeat_count` times, one utterance at a
    /// time. The first speech failure ends phase 1. Phase 2 always runs.
    pub async fn run(self, sink: &dyn AlertSink) -> EpisodeReport {
        let mut utterances = 0;
        let mut speech_error = None;

        for _ in 0..self.repeat_count {
            match sink.speak(&self.message).await {
                Ok(()) => utterances += 1,
                Err(e) => {
                    debug!("Episode {} falling back to alarm only: {}", self.id, e);
                    speech_error = Some(e.to_string());
                    break;
                }
            }
        }

        let alarm_error = sink
            .play_alarm(self.alarm_duration_secs)
            .await
            .err()
            .map(|e| e.to_string());

        EpisodeReport {
            id: self.id,
            utterances,
            speech_error,
            alarm_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::testing::{RecordingSink, SinkEvent};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_speech_completes_before_alarm() {
        let sink = RecordingSink::new().with_speak_delay(Duration::from_secs(2));
        let episode = AlertEpisode::new(Utc::now(), "Warning! Intruder detected!", 2, 5);

        let report = episode.run(&sink).await;
        assert_eq!(report.utterances, 2);
        assert!(report.speech_error.is_none());
        assert!(report.alarm_error.is_none());

        let msg = "Warning! Intruder detected!".to_string();
        assert_eq!(
            sink.events(),
            vec![
                SinkEvent::SpeakStarted(msg.clone()),
                SinkEvent::SpeakFinished,
                SinkEvent::SpeakStarted(msg),
                SinkEvent::SpeakFinished,
                SinkEvent::AlarmStarted(5),
                SinkEvent::AlarmFinished,
            ]
        );

        let timed = sink.timed_events();
        assert!(timed[2].0 - timed[0].0 >= Duration::from_secs(2));
        assert!(timed[4].0 - timed[0].0 >= Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_speech_failure_still_sounds_alarm() {
        let sink = RecordingSink::new().failing_speech();
        let episode = AlertEpisode::new(Utc::now(), "Warning!", 3, 30);

        let report = episode.run(&sink).await;
        assert_eq!(report.utterances, 0);
        assert!(report.speech_error.is_some());
        assert_eq!(sink.alarm_calls(), 1);
        assert_eq!(sink.events().last(), Some(&SinkEvent::AlarmFinished));
    }

    #[tokio::test]
    async fn test_zero_repeats_goes_straight_to_alarm() {
        let sink = RecordingSink::new();
        let report = AlertEpisode::new(Utc::now(), "Warning!", 0, 0).run(&sink).await;
        assert_eq!(report.utterances, 0);
        assert_eq!(sink.events(), vec![SinkEvent::AlarmStarted(0), SinkEvent::AlarmFinished]);
    }
}
