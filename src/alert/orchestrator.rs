// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Cooldown-gated alert orchestration

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{AlertEpisode, AlertSink, EpisodeReport};
use crate::config::AlertConfig;
use crate::detection::{PresenceState, StateTransition};

/// Outcome of offering a transition to the orchestrator
#[derive(Debug)]
pub enum AlertDecision {
    /// Not an arrival
    Ignored,
    /// Arrival inside the cooldown window
    Suppressed,
    /// A new episode is playing in the background
    Started(JoinHandle<EpisodeReport>),
}

impl AlertDecision {
    /// True if an episode was launched
    pub fn is_started(&self) -> bool {
        matches!(self, AlertDecision::Started(_))
    }
}

/// Starts alert episodes on arrivals, at most one per cooldown window.
///
/// Episodes run as detached tokio tasks; `on_transition` never waits for
/// playback. The cooldown limits how often an episode may *start*, so
/// episodes longer than the cooldown can overlap.
pub struct AlertOrchestrator {
    sink: Arc<dyn AlertSink>,
    cooldown: Duration,
    message: String,
    repeat_count: u32,
    alarm_duration_secs: i64,

    last_alert_started_at: Option<DateTime<Utc>>,
    episodes_started: u64,
    suppressed: u64,
}

impl AlertOrchestrator {
    /// Create an orchestrator that has never alerted
    pub fn new(config: &AlertConfig, sink: Arc<dyn AlertSink>) -> Self {
        // chrono panics above i64::MAX milliseconds
        let cooldown_secs = config.cooldown_secs.min(i64::MAX as u64 / 1000) as i64;

        Self {
            sink,
            cooldown: Duration::seconds(cooldown_secs),
            message: config.voice_message.clone(),
            repeat_count: config.speak_repeat_count,
            alarm_duration_secs: config.alert_duration_secs,
            last_alert_started_at: None,
            episodes_started: 0,
            suppressed: 0,
        }
    }

    /// React to a presence transition.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn on_transition(&mut self, transition: &StateTransition) -> AlertDecision {
        if transition.to != PresenceState::Present {
            return AlertDecision::Ignored;
        }

        if !self.cooldown_elapsed(transition.at) {
            self.suppressed += 1;
            return AlertDecision::Suppressed;
        }

        // Claim the window before the episode exists so the next arrival
        // sees this start time even while playback is still running.
        self.last_alert_started_at = Some(transition.at);
        self.episodes_started += 1;

        let episode = AlertEpisode::new(
            transition.at,
            &self.message,
            self.repeat_count,
            self.alarm_duration_secs,
        );
        info!(
            "Alert episode {} started ({} subject(s), {}x voice, {}s alarm)",
            episode.id, transition.subject_count, episode.repeat_count, episode.alarm_duration_secs
        );

        AlertDecision::Started(self.launch(episode))
    }

    fn cooldown_elapsed(&self, at: DateTime<Utc>) -> bool {
        match self.last_alert_started_at {
            None => true,
            Some(last) => at - last >= self.cooldown,
        }
    }

    fn launch(&self, episode: AlertEpisode) -> JoinHandle<EpisodeReport> {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let report = episode.run(sink.as_ref()).await;
            debug!(
                "Alert episode {} finished: {} utterance(s), speech error: {:?}, alarm error: {:?}",
                report.id, report.utterances, report.speech_error, report.alarm_error
            );
            report
        })
    }

    /// Start time of the most recent episode
    pub fn last_alert_started_at(&self) -> Option<DateTime<Utc>> {
        self.last_alert_started_at
    }

    /// Episodes launched so far
    pub fn episodes_started(&self) -> u64 {
        self.episodes_started
    }

    /// Arrivals suppressed by the cooldown
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Forget the last episode so the next arrival alerts immediately
    pub fn reset(&mut self) {
        self.last_alert_started_at = None;
    }
}
