// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Configuration module

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level
    pub log_level: String,

    /// Enable demo mode (simulated detector)
    pub demo_mode: bool,

    /// Sample source configuration
    pub source: SourceConfig,

    /// Alert configuration
    pub alert: AlertConfig,

    /// Report (audit log) configuration
    pub report: ReportConfig,

    /// Console configuration
    pub ui: UiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            demo_mode: false,
            source: SourceConfig::default(),
            alert: AlertConfig::default(),
            report: ReportConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            // Create parent directories
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("watchpost"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Sample source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Camera the detector should open
    pub camera_index: u32,

    /// Smallest subject (width, height) in pixels the detector reports.
    /// Handed to the detector untouched.
    pub min_subject_size: [u32; 2],

    /// Detector program and leading arguments
    pub detector_command: Vec<String>,

    /// Replay subject counts from a file instead of a detector
    pub replay_path: Option<PathBuf>,

    /// Pacing for simulated and replayed samples
    pub sample_interval_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            min_subject_size: [30, 30],
            detector_command: vec!["watchpost-detector".to_string()],
            replay_path: None,
            sample_interval_ms: 33,
        }
    }
}

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Alarm sound (WAV)
    pub sound_path: PathBuf,

    /// Minimum seconds between the start of two alert episodes
    pub cooldown_secs: u64,

    /// How long the alarm keeps repeating per episode
    pub alert_duration_secs: i64,

    /// Spoken warning
    pub voice_message: String,

    /// Utterances before the alarm starts
    pub speak_repeat_count: u32,

    /// Gap between alarm plays
    pub alarm_repeat_interval_ms: u64,

    /// Text-to-speech program; the message is appended as the last argument
    pub speech_command: Vec<String>,

    /// Audio player program; the sound path is appended as the last argument
    pub player_command: Vec<String>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            sound_path: PathBuf::from("alert.wav"),
            cooldown_secs: 5,
            alert_duration_secs: 30,
            voice_message: "Warning! Intruder detected!".to_string(),
            speak_repeat_count: 2,
            alarm_repeat_interval_ms: 1000,
            speech_command: default_speech_command(),
            player_command: default_player_command(),
        }
    }
}

fn default_speech_command() -> Vec<String> {
    if cfg!(target_os = "macos") {
        vec!["say".to_string()]
    } else {
        vec!["espeak".to_string()]
    }
}

fn default_player_command() -> Vec<String> {
    if cfg!(target_os = "macos") {
        vec!["afplay".to_string()]
    } else {
        vec!["aplay".to_string(), "-q".to_string()]
    }
}

/// What the driver does when an audit log append fails
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WriteErrorPolicy {
    /// Stop the run with the I/O error
    Abort,
    /// Report the failure and keep watching
    Continue,
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// CSV audit log
    pub path: PathBuf,

    /// What to do when a row cannot be appended
    pub on_error: WriteErrorPolicy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("report.csv"),
            on_error: WriteErrorPolicy::Continue,
        }
    }
}

/// Console configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Key (followed by Enter) that stops the run
    pub quit_key: char,

    /// Print every sample, not only transitions
    pub show_samples: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            quit_key: 'q',
            show_samples: false,
        }
    }
}
