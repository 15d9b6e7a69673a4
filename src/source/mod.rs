//! Sample sources - detector process, replay files and simulation

mod traits;
mod process;
mod replay;
mod simulator;

pub use traits::{DetectionSample, SampleSource, SourceStatus};
pub use process::DetectorProcess;
pub use replay::ReplaySource;
pub use simulator::DetectorSimulator;

use std::time::Duration;

use anyhow::{bail, Result};
use tracing::info;

use crate::config::Config;

/// Pick the sample source the configuration asks for.
///
/// A replay file wins over demo mode, which wins over the detector command.
pub fn from_config(config: &Config) -> Result<Box<dyn SampleSource>> {
    let source = &config.source;
    let interval = Duration::from_millis(source.sample_interval_ms);

    if let Some(path) = &source.replay_path {
        info!("Using replay source {:?}", path);
        return Ok(Box::new(ReplaySource::from_file(path, interval)?));
    }

    if config.demo_mode {
        info!("Using simulated detector (demo mode)");
        return Ok(Box::new(DetectorSimulator::new(interval)));
    }

    if source.detector_command.is_empty() {
        bail!(
            "No detector configured for camera index {}: set source.detector_command or run with --demo",
            source.camera_index
        );
    }

    Ok(Box::new(DetectorProcess::new(source)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_detector_is_an_error() {
        let mut config = Config::default();
        config.demo_mode = false;
        config.source.detector_command.clear();
        let err = from_config(&config).err().unwrap();
        assert!(err.to_string().contains("camera index 0"));
    }

    #[test]
    fn test_demo_mode_uses_simulator() {
        let mut config = Config::default();
        config.demo_mode = true;
        let source = from_config(&config).unwrap();
        assert_eq!(source.id(), "simulator");
    }

    #[test]
    fn test_replay_wins_over_demo() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "0\n1\n").unwrap();

        let mut config = Config::default();
        config.demo_mode = true;
        config.source.replay_path = Some(file.path().to_path_buf());
        let source = from_config(&config).unwrap();
        assert!(source.id().starts_with("replay:"));
    }
}
