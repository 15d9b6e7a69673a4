// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Alarm sound resource

use std::path::{Path, PathBuf};

use tracing::debug;

use super::AlertError;

/// A WAV file that has been checked to exist and carry a RIFF/WAVE header.
/// Decoding is left to the player.
#[derive(Debug, Clone)]
pub struct AlarmSound {
    path: PathBuf,
    size_bytes: u64,
}

impl AlarmSound {
    /// Check that `path` is a readable RIFF/WAVE file
    pub fn load(path: &Path) -> Result<Self, AlertError> {
        if !path.exists() {
            return Err(AlertError::SoundMissing(path.to_path_buf()));
        }

        let invalid = |reason: String| AlertError::SoundInvalid {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = std::fs::read(path).map_err(|e| invalid(e.to_string()))?;
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(invalid("not a RIFF/WAVE file".to_string()));
        }

        debug!("Loaded alarm sound {:?} ({} bytes)", path, bytes.len());
        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: bytes.len() as u64,
        })
    }

    /// Location of the sound file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}
