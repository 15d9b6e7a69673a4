// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Detector simulator for demo/testing

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use rand::prelude::*;
use rand_distr::Exp1;

use super::{DetectionSample, SampleSource, SourceStatus};

/// Simulates a face detector watching a doorway.
///
/// Output alternates between runs of empty frames and runs of frames with
/// one or more subjects. Run lengths are exponentially distributed, and the
/// subject count jitters inside a presence run the way a real cascade
/// detector flickers between 1 and 2 faces.
pub struct DetectorSimulator {
    id: String,
    status: SourceStatus,
    rng: rand::rngs::StdRng,
    interval: Duration,
    sequence: u64,

    // Simulation state
    mean_absent_samples: f64,
    mean_present_samples: f64,
    max_subjects: u32,
    present: bool,
    remaining_in_run: u32,
}

impl DetectorSimulator {
    /// Simulator seeded from entropy, one sample per `interval`
    pub fn new(interval: Duration) -> Self {
        Self::with_rng(interval, rand::rngs::StdRng::from_entropy())
    }

    /// Deterministic simulator for tests
    pub fn with_seed(interval: Duration, seed: u64) -> Self {
        Self::with_rng(interval, rand::rngs::StdRng::seed_from_u64(seed))
    }

    fn with_rng(interval: Duration, rng: rand::rngs::StdRng) -> Self {
        Self {
            id: "simulator".to_string(),
            status: SourceStatus::Closed,
            rng,
            interval,
            sequence: 0,
            mean_absent_samples: 120.0,
            mean_present_samples: 45.0,
            max_subjects: 3,
            present: true,
            remaining_in_run: 0,
        }
    }

    /// Mean length, in samples, of absent and present runs
    pub fn with_run_lengths(mut self, mean_absent: f64, mean_present: f64) -> Self {
        self.mean_absent_samples = mean_absent.max(1.0);
        self.mean_present_samples = mean_present.max(1.0);
        self
    }

    /// Upper bound on subjects in a present frame
    pub fn with_max_subjects(mut self, max_subjects: u32) -> Self {
        self.max_subjects = max_subjects.max(1);
        self
    }

    /// Samples produced since creation
    pub fn samples_generated(&self) -> u64 {
        self.sequence
    }

    fn draw_run_length(&mut self, mean: f64) -> u32 {
        let scale: f64 = self.rng.sample(Exp1);
        (mean * scale).ceil().clamp(1.0, u32::MAX as f64) as u32
    }

    fn generate_count(&mut self) -> u32 {
        if self.remaining_in_run == 0 {
            self.present = !self.present;
            let mean = if self.present {
                self.mean_present_samples
            } else {
                self.mean_absent_samples
            };
            self.remaining_in_run = self.draw_run_length(mean);
        }
        self.remaining_in_run -= 1;

        if self.present {
            self.rng.gen_range(1..=self.max_subjects)
        } else {
            0
        }
    }
}

#[async_trait]
impl SampleSource for DetectorSimulator {
    fn id(&self) -> &str { &self.id }
    fn status(&self) -> SourceStatus { self.status }

    async fn open(&mut self) -> Result<()> {
        self.status = SourceStatus::Open;
        Ok(())
    }

    async fn next_sample(&mut self) -> Result<Option<DetectionSample>> {
        if self.status != SourceStatus::Open {
            bail!("source {} is not open", self.id);
        }

        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }

        self.sequence += 1;
        let count = self.generate_count();
        Ok(Some(DetectionSample::now(count)))
    }

    async fn close(&mut self) -> Result<()> {
        self.status = SourceStatus::Closed;
        Ok(())
    }
}
