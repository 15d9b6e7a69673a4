// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Driver loop - pulls samples and dispatches transitions

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use super::SystemState;
use crate::alert::{AlertDecision, AlertOrchestrator, AlertSink};
use crate::config::{Config, WriteErrorPolicy};
use crate::detection::{PresenceState, StateTracker, StateTransition};
use crate::report::EventLogger;
use crate::source::{DetectionSample, SampleSource};
use crate::ui::StatusConsole;

/// Main watcher engine.
///
/// Runs sequentially on the caller's task. Alert playback happens on
/// detached tasks spawned by the orchestrator, so nothing here waits on
/// audio. Episodes still playing when the run ends are abandoned when the
/// runtime shuts down.
pub struct Engine<W: Write = std::io::Stdout> {
    /// Active configuration
    pub config: Arc<Config>,
    tracker: StateTracker,
    logger: EventLogger,
    orchestrator: AlertOrchestrator,
    console: StatusConsole<W>,
    state: SystemState,
    start_time: Option<Instant>,
}

impl Engine<std::io::Stdout> {
    /// Build an engine that prints status lines to stdout
    pub fn new(config: Config, sink: Arc<dyn AlertSink>) -> Result<Self> {
        let console = StatusConsole::stdout(&config.ui);
        Self::with_console(config, sink, console)
    }
}

impl<W: Write> Engine<W> {
    /// Build the engine, creating the report (with header) if needed
    pub fn with_console(config: Config, sink: Arc<dyn AlertSink>, console: StatusConsole<W>) -> Result<Self> {
        let logger = EventLogger::open(&config.report.path)?;
        let orchestrator = AlertOrchestrator::new(&config.alert, sink);

        Ok(Self {
            config: Arc::new(config),
            tracker: StateTracker::new(),
            logger,
            orchestrator,
            console,
            state: SystemState::default(),
            start_time: None,
        })
    }

    /// Run until the source ends, fails, or `shutdown` fires.
    ///
    /// The source is closed on every exit path. Read failures are returned
    /// after closing.
    pub async fn run(
        &mut self,
        source: &mut dyn SampleSource,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<SystemState> {
        source
            .open()
            .await
            .with_context(|| format!("Cannot open source {}", source.id()))?;

        info!("Watching {} (cooldown {}s)", source.id(), self.config.alert.cooldown_secs);
        self.console.banner(source.id(), self.config.ui.quit_key);
        self.start_time = Some(Instant::now());
        self.state.running = true;

        let outcome = self.drive(source, &mut shutdown).await;

        self.state.running = false;
        self.state.uptime_seconds = self.uptime();
        self.console.quitting();
        if let Err(e) = source.close().await {
            warn!("Error closing {}: {}", source.id(), e);
        }

        outcome?;
        Ok(self.state.clone())
    }

    async fn drive(&mut self, source: &mut dyn SampleSource, shutdown: &mut broadcast::Receiver<()>) -> Result<()> {
        loop {
            tokio::select! {
                next = source.next_sample() => {
                    match next.with_context(|| format!("Failed to read from {}", source.id()))? {
                        Some(sample) => self.process(&sample)?,
                        None => {
                            info!("Source {} ended", source.id());
                            return Ok(());
                        }
                    }
                }
                Ok(()) = shutdown.recv() => {
                    info!("Shutdown requested");
                    return Ok(());
                }
            }
        }
    }

    /// Handle one sample: debounce, log arrivals, offer to the alerter
    pub fn process(&mut self, sample: &DetectionSample) -> Result<()> {
        self.state.samples += 1;
        self.console.sample(sample);

        let Some(transition) = self.tracker.ingest(sample) else {
            return Ok(());
        };

        self.state.transitions += 1;
        self.state.presence = transition.to;
        self.state.last_transition = Some(transition.at);
        self.console.transition(&transition);
        match transition.to {
            PresenceState::Present => info!("Presence detected ({} subject(s))", transition.subject_count),
            _ => info!("Scene clear"),
        }

        self.record(&transition)?;

        match self.orchestrator.on_transition(&transition) {
            AlertDecision::Started(_) => self.state.episodes_started += 1,
            AlertDecision::Suppressed => self.state.alerts_suppressed += 1,
            AlertDecision::Ignored => {}
        }

        Ok(())
    }

    fn record(&mut self, transition: &StateTransition) -> Result<()> {
        match self.logger.record(transition) {
            Ok(Some(_)) => self.state.records_written += 1,
            Ok(None) => {}
            Err(e) => {
                self.state.log_failures += 1;
                match self.config.report.on_error {
                    WriteErrorPolicy::Abort => return Err(e.into()),
                    WriteErrorPolicy::Continue => error!("{}. Record lost, continuing.", e),
                }
            }
        }
        Ok(())
    }

    /// Counters so far
    pub fn state(&self) -> &SystemState {
        &self.state
    }

    /// Seconds since `run` started
    pub fn uptime(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    /// Take back the console writer
    pub fn into_console(self) -> StatusConsole<W> {
        self.console
    }
}
