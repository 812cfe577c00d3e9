//! # RTSP Audio Recorder - Main Application Entry Point
//!
//! Binary entry point for the recorder. It wires the core together and owns
//! process-level concerns only:
//!
//! ## Application Architecture:
//! - **config**: layered configuration (TOML file + environment variables)
//! - **error**: the recorder's error taxonomy
//! - **state**: the shared segment-ID counter and connection registry
//! - **notify**: the outbound notifier boundary and its provided sinks
//! - **audio**: codec expansion, segment buffering, container serialization
//! - **server**: the listener and per-connection session handlers
//!
//! Everything above the notifier boundary (connection lists, playback,
//! history browsing) is a separate consumer and not part of this binary;
//! here the events simply land in the structured log.

mod audio;
mod config;
mod error;
mod notify;
mod server;
mod state;

use anyhow::Result;
use config::AppConfig;
use notify::{LogNotifier, Notify};
use server::listener::Recorder;
use state::SegmentCounter;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Entry point.
///
/// ## Startup order:
/// 1. Load environment variables from .env (if present)
/// 2. Set up structured logging
/// 3. Load and validate configuration
/// 4. Start the recorder (binds the listening socket)
/// 5. Wait for SIGINT/SIGTERM, then stop so open segments get flushed
#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting rtsp-recorder v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: {}:{}, recordings in {:?}",
        config.server.host, config.server.port, config.recording.directory
    );

    let notifier: Arc<dyn Notify> = Arc::new(LogNotifier);

    // The segment-ID counter is seeded here and only here. A deployment that
    // keeps its history scans the recordings directory at startup and passes
    // the highest ID it finds; a fresh start begins at zero.
    let counter = Arc::new(SegmentCounter::new(0));

    let recorder = Recorder::new(config, counter, notifier)?;
    let addr = recorder.start().await?;
    info!(%addr, "recorder accepting connections");

    wait_for_signal().await;

    info!("Shutdown signal received, stopping recorder...");
    recorder.stop();

    // connection tasks flush their open segments on the way out; give them a
    // moment before the runtime is torn down
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;

    info!("Recorder stopped gracefully");
    Ok(())
}

/// Initialize the tracing (logging) system.
///
/// ## Environment Variables:
/// - `RUST_LOG`: controls what gets logged (e.g. "debug", "rtsp_recorder=debug")
/// - If not set, defaults to "rtsp_recorder=debug"
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rtsp_recorder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

/// Block until the process is asked to terminate.
///
/// Listens for SIGTERM (system shutdown) and SIGINT (Ctrl+C); whichever
/// arrives first wins.
async fn wait_for_signal() {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("Failed to install SIGTERM handler");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM");
        }
    }
}
