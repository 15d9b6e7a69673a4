// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/watchpost

//! Watchpost - presence watch with debounced logging and alerts
//!
//! Reads subject counts from a detector, logs every arrival to a CSV report
//! and plays a voice warning followed by an alarm, at most once per cooldown.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use watchpost::{source, ui, CommandAlertSink, Config, Engine, VERSION};

/// Watchpost - presence watch with debounced logging and alerts
#[derive(Parser, Debug)]
#[command(name = "watchpost")]
#[command(author = "Watchpost Project")]
#[command(version = VERSION)]
#[command(about = "Debounced presence logging with voice and alarm alerts")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Demo mode with a simulated detector
    #[arg(long)]
    demo: bool,

    /// Replay subject counts from a file (one per line)
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Camera index handed to the detector
    #[arg(long)]
    camera_index: Option<u32>,

    /// CSV report path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Seconds between alert episodes
    #[arg(long)]
    cooldown: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Watchpost v{}", VERSION);

    // Override with command line args
    if args.demo {
        config.demo_mode = true;
    }
    if let Some(replay) = args.replay {
        config.source.replay_path = Some(replay);
    }
    if let Some(index) = args.camera_index {
        config.source.camera_index = index;
    }
    if let Some(report) = args.report {
        config.report.path = report;
    }
    if let Some(cooldown) = args.cooldown {
        config.alert.cooldown_secs = cooldown;
    }

    info!("Configuration loaded from {:?}", config_path);
    info!("Report: {:?}", config.report.path);

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(run(config));
    // Abandons detached alert episodes and the blocking stdin reader
    rt.shutdown_background();

    if let Err(e) = &result {
        error!("Fatal: {:#}", e);
    }
    result
}

async fn run(config: Config) -> Result<()> {
    let mut source = source::from_config(&config)?;
    let sink = Arc::new(CommandAlertSink::from_config(&config.alert));
    let quit_key = config.ui.quit_key;
    let mut engine = Engine::new(config, sink)?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    ui::spawn_quit_watcher(quit_key, shutdown_tx.clone());

    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = ctrl_c_tx.send(());
        }
    });

    let state = engine.run(source.as_mut(), shutdown_rx).await?;

    info!(
        "Watchpost stopped after {}s: {} samples, {} transitions, {} report rows, {} alerts ({} suppressed)",
        state.uptime_seconds,
        state.samples,
        state.transitions,
        state.records_written,
        state.episodes_started,
        state.alerts_suppressed
    );
    if state.log_failures > 0 {
        error!("{} report row(s) could not be written", state.log_failures);
    }

    Ok(())
}
