// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Replay source - feeds a fixed list of subject counts

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use super::{DetectionSample, SampleSource, SourceStatus};

/// Plays back recorded subject counts with evenly spaced timestamps.
///
/// Timestamps are synthesized as `start + i * spacing`, so replays are
/// deterministic and never sleep.
#[derive(Debug)]
pub struct ReplaySource {
    id: String,
    counts: Vec<u32>,
    position: usize,
    start: DateTime<Utc>,
    spacing: Duration,
    status: SourceStatus,
}

impl ReplaySource {
    /// Replay `counts`, the first stamped at `start`
    pub fn new(counts: Vec<u32>, start: DateTime<Utc>, spacing: Duration) -> Self {
        Self {
            id: "replay".to_string(),
            counts,
            position: 0,
            start,
            spacing,
            status: SourceStatus::Closed,
        }
    }

    /// Load counts from a text file, one integer per line.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn from_file(path: &Path, spacing: Duration) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay file {:?}", path))?;
        let counts = parse_counts(&content)
            .with_context(|| format!("Malformed replay file {:?}", path))?;

        let mut source = Self::new(counts, Utc::now(), spacing);
        source.id = format!("replay:{}", path.display());
        Ok(source)
    }

    /// Samples not yet delivered
    pub fn remaining(&self) -> usize {
        self.counts.len().saturating_sub(self.position)
    }
}

fn parse_counts(content: &str) -> Result<Vec<u32>> {
    let mut counts = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<u32>() {
            Ok(count) => counts.push(count),
            Err(e) => bail!("line {}: {:?} is not a subject count ({})", line_no + 1, line, e),
        }
    }
    Ok(counts)
}

#[async_trait]
impl SampleSource for ReplaySource {
    fn id(&self) -> &str { &self.id }
    fn status(&self) -> SourceStatus { self.status }

    async fn open(&mut self) -> Result<()> {
        self.status = SourceStatus::Open;
        info!("Replaying {} samples from {}", self.counts.len(), self.id);
        Ok(())
    }

    async fn next_sample(&mut self) -> Result<Option<DetectionSample>> {
        if self.status != SourceStatus::Open {
            bail!("source {} is not open", self.id);
        }

        let Some(&count) = self.counts.get(self.position) else {
            self.status = SourceStatus::Exhausted;
            return Ok(None);
        };

        let offset = u32::try_from(self.position)
            .ok()
            .and_then(|n| self.spacing.checked_mul(n))
            .and_then(|d| chrono::Duration::from_std(d).ok())
            .context("replay offset out of range")?;
        self.position += 1;

        Ok(Some(DetectionSample::new(self.start + offset, count)))
    }

    async fn close(&mut self) -> Result<()> {
        if self.status != SourceStatus::Exhausted {
            self.status = SourceStatus::Closed;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_replay_spacing_and_exhaustion() {
        let start = Utc::now();
        let mut source = ReplaySource::new(vec![0, 3], start, Duration::from_secs(2));
        source.open().await.unwrap();

        let first = source.next_sample().await.unwrap().unwrap();
        let second = source.next_sample().await.unwrap().unwrap();
        assert_eq!(first, DetectionSample::new(start, 0));
        assert_eq!(second.subject_count, 3);
        assert_eq!(second.timestamp - first.timestamp, chrono::Duration::seconds(2));

        assert!(source.next_sample().await.unwrap().is_none());
        assert_eq!(source.status(), SourceStatus::Exhausted);
    }

    #[tokio::test]
    async fn test_read_before_open_fails() {
        let mut source = ReplaySource::new(vec![1], Utc::now(), Duration::from_secs(1));
        assert!(source.next_sample().await.is_err());
    }

    #[test]
    fn test_from_file_skips_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# hallway, evening").unwrap();
        writeln!(file, "0").unwrap();
        writeln!(file).unwrap();
        writeln!(file, " 2 ").unwrap();

        let source = ReplaySource::from_file(file.path(), Duration::from_millis(100)).unwrap();
        assert_eq!(source.counts, vec![0, 2]);
        assert_eq!(source.remaining(), 2);
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1").unwrap();
        writeln!(file, "two").unwrap();

        let err = ReplaySource::from_file(file.path(), Duration::from_secs(1)).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[tokio::test]
    async fn test_oversized_spacing_is_an_error() {
        let mut source = ReplaySource::new(vec![0, 1], Utc::now(), Duration::MAX);
        source.open().await.unwrap();

        assert!(source.next_sample().await.unwrap().is_some());
        let err = source.next_sample().await.unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
