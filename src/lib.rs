// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Watchpost - presence watch with debounced logging and alerts
//!
//! Turns a stream of per-frame subject counts from a face/person detector
//! into:
//! - debounced presence transitions (one per change, never per frame)
//! - an append-only CSV report with one row per arrival
//! - a non-blocking alert episode (spoken warning, then a looping alarm)
//!   gated by a cooldown so a flickering detector cannot flood the room
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Watchpost Engine                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────────┐   ┌──────────────────────┐  │
//! │  │  Sample  │ → │ StateTracker │ → │ EventLogger (CSV)    │  │
//! │  │  Source  │   │  (debounce)  │   ├──────────────────────┤  │
//! │  └──────────┘   └──────────────┘   │ AlertOrchestrator    │  │
//! │                                    │  (cooldown)          │  │
//! │                                    └──────────┬───────────┘  │
//! │                                               ↓ spawn        │
//! │                                    ┌──────────────────────┐  │
//! │                                    │ AlertEpisode task    │  │
//! │                                    │ speak × N → alarm    │  │
//! │                                    └──────────┬───────────┘  │
//! │                                               ↓              │
//! │                                    ┌──────────────────────┐  │
//! │                                    │ AlertSink (TTS/WAV)  │  │
//! │                                    └──────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod core;
pub mod source;
pub mod detection;
pub mod report;
pub mod alert;
pub mod config;
pub mod ui;

// Re-exports for convenience
pub use config::Config;
pub use core::{Engine, SystemState};
pub use source::{DetectionSample, SampleSource};
pub use detection::{PresenceState, StateTracker, StateTransition};
pub use report::{EventLogger, LogRecord, ReportError};
pub use alert::{AlertDecision, AlertEpisode, AlertError, AlertOrchestrator, AlertSink, CommandAlertSink};

/// Watchpost version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Watchpost name
pub const NAME: &str = "Watchpost";
