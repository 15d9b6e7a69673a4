// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Append-only CSV audit log of arrivals

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::detection::{PresenceState, StateTransition};

/// Header row of the audit log
pub const REPORT_HEADER: &str = "timestamp,detection_state,subject_count,notes";

/// Timestamp layout of the `timestamp` column (local time)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const PRESENT_NOTES: &str = "presence detected";

/// Report errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Report could not be created or opened
    #[error("Cannot open report {path}: {source}")]
    Open {
        /// Report location
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A row could not be written
    #[error("Cannot append to report {path}: {source}")]
    Append {
        /// Report location
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// One row of the audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// Transition time, clamped to be non-decreasing
    pub timestamp: DateTime<Utc>,
    /// `detection_state` column
    pub state: String,
    /// Subjects at the transition
    pub subject_count: u32,
    /// Free-text notes column
    pub notes: String,
}

impl LogRecord {
    /// Render as a CSV line without the trailing newline
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{}",
            format_timestamp(&self.timestamp),
            csv_field(&self.state),
            self.subject_count,
            csv_field(&self.notes)
        )
    }
}

/// Format a timestamp the way the `timestamp` column stores it
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Writes one row per arrival into the report CSV.
///
/// Each row is a single unbuffered `write_all`. A row that fails to append
/// is dropped and never reaches the file later.
pub struct EventLogger {
    path: PathBuf,
    writer: Box<dyn Write + Send>,
    last_timestamp: Option<DateTime<Utc>>,
    records_written: u64,
}

impl EventLogger {
    /// Open the report for appending, writing the header if the file is new
    /// or empty. Existing content is never rewritten.
    pub fn open(path: &Path) -> Result<Self, ReportError> {
        let open_err = |source: std::io::Error| ReportError::Open { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(open_err)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_err)?;
        if file.metadata().map_err(open_err)?.len() == 0 {
            file.write_all(format!("{}\n", REPORT_HEADER).as_bytes()).map_err(open_err)?;
            info!("Created report {:?}", path);
        } else {
            debug!("Appending to existing report {:?}", path);
        }

        Ok(Self::with_writer(path, file))
    }

    /// Log into an already opened writer. No header is written.
    pub(crate) fn with_writer<W: Write + Send + 'static>(path: &Path, writer: W) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: Box::new(writer),
            last_timestamp: None,
            records_written: 0,
        }
    }

    /// Append a row for a transition into `Present`.
    ///
    /// Any other transition is ignored and returns `Ok(None)`. Rows are
    /// flushed before returning.
    pub fn record(&mut self, transition: &StateTransition) -> Result<Option<LogRecord>, ReportError> {
        if transition.to != PresenceState::Present {
            return Ok(None);
        }

        let timestamp = match self.last_timestamp {
            Some(last) if transition.at < last => {
                warn!(
                    "Transition at {} predates last report row at {}, clamping",
                    transition.at, last
                );
                last
            }
            _ => transition.at,
        };

        let record = LogRecord {
            timestamp,
            state: PresenceState::Present.as_str().to_string(),
            subject_count: transition.subject_count,
            notes: PRESENT_NOTES.to_string(),
        };

        let append_err = |source: std::io::Error| ReportError::Append { path: self.path.clone(), source };
        let line = format!("{}\n", record.to_csv_line());
        self.writer.write_all(line.as_bytes()).map_err(append_err)?;
        self.writer.flush().map_err(append_err)?;

        self.last_timestamp = Some(timestamp);
        self.records_written += 1;
        Ok(Some(record))
    }

    /// Report location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended by this logger
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use parking_lot::Mutex;
    use std::io::{self, Write};
    use std::sync::Arc;

    /// In-memory report target whose first writes fail
    #[derive(Clone, Default)]
    pub struct FlakyWriter {
        failures_left: Arc<Mutex<usize>>,
        written: Arc<Mutex<Vec<u8>>>,
    }

    impl FlakyWriter {
        pub fn failing(failures: usize) -> Self {
            Self {
                failures_left: Arc::new(Mutex::new(failures)),
                written: Arc::default(),
            }
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.written.lock()).into_owned()
        }
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut failures = self.failures_left.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"));
            }
            self.written.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FlakyWriter;
    use super::*;
    use crate::detection::StateTracker;
    use crate::source::DetectionSample;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn arrival(at: DateTime<Utc>, subject_count: u32) -> StateTransition {
        StateTransition {
            from: PresenceState::Absent,
            to: PresenceState::Present,
            at,
            subject_count,
        }
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 22, 0, 0).unwrap()
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_new_report_gets_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("report.csv");

        EventLogger::open(&path).unwrap();
        assert_eq!(read_lines(&path), vec![REPORT_HEADER.to_string()]);
    }

    #[test]
    fn test_header_written_once_across_reopens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");

        let mut logger = EventLogger::open(&path).unwrap();
        logger.record(&arrival(base_time(), 1)).unwrap();
        drop(logger);

        let mut logger = EventLogger::open(&path).unwrap();
        logger.record(&arrival(base_time() + Duration::seconds(10), 2)).unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().filter(|l| l.as_str() == REPORT_HEADER).count(), 1);
    }

    #[test]
    fn test_arrival_row_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        let mut logger = EventLogger::open(&path).unwrap();

        let record = logger.record(&arrival(base_time(), 2)).unwrap().unwrap();
        assert_eq!(record.state, "present");
        assert_eq!(record.notes, "presence detected");

        let lines = read_lines(&path);
        assert_eq!(
            lines[1],
            format!("{},present,2,presence detected", format_timestamp(&base_time()))
        );
    }

    #[test]
    fn test_departures_are_not_logged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        let mut logger = EventLogger::open(&path).unwrap();

        let departure = StateTransition {
            from: PresenceState::Present,
            to: PresenceState::Absent,
            at: base_time(),
            subject_count: 0,
        };
        assert!(logger.record(&departure).unwrap().is_none());
        assert_eq!(logger.records_written(), 0);
        assert_eq!(read_lines(&path).len(), 1);
    }

    #[test]
    fn test_walkthrough_logs_single_arrival() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        let mut logger = EventLogger::open(&path).unwrap();
        let mut tracker = StateTracker::new();

        for (i, count) in [0u32, 0, 2, 2, 0].into_iter().enumerate() {
            let sample = DetectionSample::new(base_time() + Duration::seconds(i as i64), count);
            if let Some(t) = tracker.ingest(&sample) {
                logger.record(&t).unwrap();
            }
        }

        assert_eq!(logger.records_written(), 1);
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains(",present,2,"));
    }

    #[test]
    fn test_timestamps_never_go_backwards() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        let mut logger = EventLogger::open(&path).unwrap();

        logger.record(&arrival(base_time(), 1)).unwrap();
        let late = logger
            .record(&arrival(base_time() - Duration::seconds(30), 1))
            .unwrap()
            .unwrap();
        assert_eq!(late.timestamp, base_time());
    }

    #[test]
    fn test_open_failure_is_surfaced() {
        let dir = TempDir::new().unwrap();
        let err = EventLogger::open(dir.path()).err().unwrap();
        assert!(matches!(err, ReportError::Open { .. }));
    }

    #[test]
    fn test_failed_append_never_lands_later() {
        let writer = FlakyWriter::failing(1);
        let mut logger = EventLogger::with_writer(Path::new("report.csv"), writer.clone());

        let err = logger.record(&arrival(base_time(), 7)).unwrap_err();
        assert!(matches!(err, ReportError::Append { .. }));
        assert_eq!(logger.records_written(), 0);

        logger.record(&arrival(base_time() + Duration::seconds(10), 9)).unwrap();
        let contents = writer.contents();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains(",present,9,"));
        assert!(!contents.contains(",present,7,"));
        assert_eq!(logger.records_written(), 1);
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
