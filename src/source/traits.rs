// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Sample source traits and common types

use async_trait::async_trait;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One detection reading: how many subjects the detector saw at `timestamp`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSample {
    /// When the frame was captured
    pub timestamp: DateTime<Utc>,
    /// Subjects found in the frame
    pub subject_count: u32,
}

impl DetectionSample {
    /// Create a sample
    pub fn new(timestamp: DateTime<Utc>, subject_count: u32) -> Self {
        Self { timestamp, subject_count }
    }

    /// Sample stamped with the current wall clock
    pub fn now(subject_count: u32) -> Self {
        Self::new(Utc::now(), subject_count)
    }
}

/// Source operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceStatus {
    /// Not acquired
    Closed,
    /// Delivering samples
    Open,
    /// Ran out of samples
    Exhausted,
    /// Failed while reading
    Error,
}

/// Trait for anything that produces detection samples.
///
/// `next_sample` blocks the caller until a sample is ready. `Ok(None)` means
/// the source has ended normally; `Err` is a fatal read failure.
/// Implementations must be cancel safe in `next_sample`: the driver races it
/// against the shutdown signal.
#[async_trait]
pub trait SampleSource: Send {
    /// Human readable identifier
    fn id(&self) -> &str;

    /// Get current status
    fn status(&self) -> SourceStatus;

    /// Acquire the underlying device or process
    async fn open(&mut self) -> Result<()>;

    /// Pull the next sample
    async fn next_sample(&mut self) -> Result<Option<DetectionSample>>;

    /// Release the underlying device or process
    async fn close(&mut self) -> Result<()>;
}
