// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Terminal console - status lines and the quit key

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::UiConfig;
use crate::detection::{PresenceState, StateTransition};
use crate::report::format_timestamp;
use crate::source::DetectionSample;

/// Prints what the watcher sees to a terminal (or any writer)
pub struct StatusConsole<W: Write = std::io::Stdout> {
    out: W,
    show_samples: bool,
}

impl StatusConsole<std::io::Stdout> {
    /// Console on stdout
    pub fn stdout(config: &UiConfig) -> Self {
        Self::new(std::io::stdout(), config.show_samples)
    }
}

impl<W: Write> StatusConsole<W> {
    /// Console over any writer
    pub fn new(out: W, show_samples: bool) -> Self {
        Self { out, show_samples }
    }

    /// Startup line naming the source and quit key
    pub fn banner(&mut self, source_id: &str, quit_key: char) {
        self.line(format_args!(
            "Watching {}. Type '{}' and press Enter (or Ctrl+C) to quit.",
            source_id, quit_key
        ));
    }

    /// Per-sample line, only when enabled
    pub fn sample(&mut self, sample: &DetectionSample) {
        if self.show_samples {
            self.line(format_args!(
                "{}    subjects: {}",
                format_timestamp(&sample.timestamp),
                sample.subject_count
            ));
        }
    }

    /// Timestamped state change line
    pub fn transition(&mut self, transition: &StateTransition) {
        let stamp = format_timestamp(&transition.at);
        match transition.to {
            PresenceState::Present => self.line(format_args!(
                "{} -> PRESENT (subjects: {})",
                stamp, transition.subject_count
            )),
            PresenceState::Absent => self.line(format_args!("{} -> ABSENT", stamp)),
            PresenceState::Unknown => {}
        }
    }

    /// Shutdown line
    pub fn quitting(&mut self) {
        self.line(format_args!("Quitting..."));
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        // A closed terminal must not stop the watcher
        if let Err(e) = writeln!(self.out, "{}", args).and_then(|_| self.out.flush()) {
            debug!("Console write failed: {}", e);
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Watch stdin for a line consisting of `quit_key` and fire `shutdown`.
///
/// The task ends quietly when stdin closes.
pub fn spawn_quit_watcher(quit_key: char, shutdown: broadcast::Sender<()>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if is_quit_line(&line, quit_key) {
                let _ = shutdown.send(());
                break;
            }
        }
        debug!("Quit watcher finished");
    })
}

fn is_quit_line(line: &str, quit_key: char) -> bool {
    let mut chars = line.trim().chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.eq_ignore_ascii_case(&quit_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn output(console: StatusConsole<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_transition_lines() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 22, 0, 0).unwrap();
        let mut console = StatusConsole::new(Vec::new(), false);

        console.transition(&StateTransition {
            from: PresenceState::Absent,
            to: PresenceState::Present,
            at,
            subject_count: 2,
        });
        console.transition(&StateTransition {
            from: PresenceState::Present,
            to: PresenceState::Absent,
            at,
            subject_count: 0,
        });

        let stamp = format_timestamp(&at);
        assert_eq!(
            output(console),
            format!("{stamp} -> PRESENT (subjects: 2)\n{stamp} -> ABSENT\n")
        );
    }

    #[test]
    fn test_samples_hidden_by_default() {
        let mut console = StatusConsole::new(Vec::new(), false);
        console.sample(&DetectionSample::now(1));
        assert!(output(console).is_empty());

        let mut console = StatusConsole::new(Vec::new(), true);
        console.sample(&DetectionSample::now(1));
        assert!(output(console).contains("subjects: 1"));
    }

    #[test]
    fn test_quit_line_matching() {
        assert!(is_quit_line("q", 'q'));
        assert!(is_quit_line("  Q \n", 'q'));
        assert!(!is_quit_line("quit", 'q'));
        assert!(!is_quit_line("", 'q'));
    }
}
