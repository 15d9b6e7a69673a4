// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! External detector process - reads subject counts from a child's stdout

use std::process::Stdio;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info, warn};

use super::{DetectionSample, SampleSource, SourceStatus};
use crate::config::SourceConfig;

/// Runs the configured detector command for one camera.
///
/// The child is started with `--camera-index N --min-size WxH` appended to
/// its argv and must print one non-negative integer per processed frame.
/// End of output ends the run.
pub struct DetectorProcess {
    id: String,
    program: String,
    args: Vec<String>,
    status: SourceStatus,
    child: Option<Child>,
    lines: Option<Lines<BufReader<ChildStdout>>>,
}

impl DetectorProcess {
    /// Prepare the detector command; nothing is spawned until `open`
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let (program, rest) = config
            .detector_command
            .split_first()
            .ok_or_else(|| anyhow!("detector_command is empty"))?;

        let mut args = rest.to_vec();
        args.push("--camera-index".to_string());
        args.push(config.camera_index.to_string());
        args.push("--min-size".to_string());
        args.push(format!("{}x{}", config.min_subject_size[0], config.min_subject_size[1]));

        Ok(Self {
            id: format!("camera-{}", config.camera_index),
            program: program.clone(),
            args,
            status: SourceStatus::Closed,
            child: None,
            lines: None,
        })
    }
}

#[async_trait]
impl SampleSource for DetectorProcess {
    fn id(&self) -> &str { &self.id }
    fn status(&self) -> SourceStatus { self.status }

    async fn open(&mut self) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Cannot open {}: failed to start {:?}", self.id, self.program))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("detector stdout was not captured"))?;

        self.lines = Some(BufReader::new(stdout).lines());
        self.child = Some(child);
        self.status = SourceStatus::Open;
        info!("Started detector {:?} for {}", self.program, self.id);
        Ok(())
    }

    async fn next_sample(&mut self) -> Result<Option<DetectionSample>> {
        let Some(lines) = self.lines.as_mut() else {
            bail!("source {} is not open", self.id);
        };

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Detector output for {} ended", self.id);
                    self.status = SourceStatus::Exhausted;
                    return Ok(None);
                }
                Err(e) => {
                    self.status = SourceStatus::Error;
                    return Err(anyhow!(e).context(format!("Failed to read frame result from {}", self.id)));
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            return match line.parse::<u32>() {
                Ok(count) => Ok(Some(DetectionSample::now(count))),
                Err(_) => {
                    self.status = SourceStatus::Error;
                    Err(anyhow!("{} produced malformed output: {:?}", self.id, line))
                }
            };
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.lines = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!("Error stopping detector for {}: {}", self.id, e);
            }
        }
        if self.status == SourceStatus::Open {
            self.status = SourceStatus::Closed;
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell_config(script: &str) -> SourceConfig {
        SourceConfig {
            detector_command: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            ..SourceConfig::default()
        }
    }

    #[test]
    fn test_passes_camera_arguments() {
        let config = SourceConfig {
            camera_index: 2,
            min_subject_size: [40, 48],
            detector_command: vec!["detect-faces".to_string(), "--cascade".to_string(), "frontal".to_string()],
            ..SourceConfig::default()
        };
        let source = DetectorProcess::new(&config).unwrap();
        assert_eq!(source.program, "detect-faces");
        assert_eq!(
            source.args,
            vec!["--cascade", "frontal", "--camera-index", "2", "--min-size", "40x48"]
        );
        assert_eq!(source.id(), "camera-2");
    }

    #[test]
    fn test_empty_command_rejected() {
        let config = SourceConfig { detector_command: vec![], ..SourceConfig::default() };
        assert!(DetectorProcess::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_reads_counts_until_eof() {
        let mut source = DetectorProcess::new(&shell_config("printf '0\\n\\n2\\n'")).unwrap();
        source.open().await.unwrap();

        assert_eq!(source.next_sample().await.unwrap().unwrap().subject_count, 0);
        assert_eq!(source.next_sample().await.unwrap().unwrap().subject_count, 2);
        assert!(source.next_sample().await.unwrap().is_none());
        assert_eq!(source.status(), SourceStatus::Exhausted);

        source.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_output_is_fatal() {
        let mut source = DetectorProcess::new(&shell_config("echo faces")).unwrap();
        source.open().await.unwrap();
        assert!(source.next_sample().await.is_err());
        assert_eq!(source.status(), SourceStatus::Error);
        source.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_open() {
        let config = SourceConfig {
            detector_command: vec!["/nonexistent/watchpost-detector".to_string()],
            ..SourceConfig::default()
        };
        let mut source = DetectorProcess::new(&config).unwrap();
        assert!(source.open().await.is_err());
    }
}
