//! # Configuration Management
//!
//! This module handles loading and managing application configuration from
//! multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Environment variables (APP_SERVER_PORT, APP_RECORDING_DIRECTORY, etc.)
//! 2. Configuration file (config.toml)
//! 3. Default values (defined in the Default impl)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration that contains all settings.
///
/// ## Why separate config structs:
/// Breaking configuration into logical groups (server, recording, audio)
/// keeps each concern readable and lets environment overrides map cleanly
/// onto nested keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub recording: RecordingConfig,
    pub audio: AudioConfig,
}

/// Server-specific configuration settings.
///
/// ## Fields:
/// - `host`: address to bind the listener to ("0.0.0.0" accepts senders from
///   any interface, which is what IP cameras on the local network need)
/// - `port`: TCP port the RTSP-style senders connect to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Recording storage and session behavior.
///
/// ## Fields:
/// - `directory`: where finished WAV files are written
/// - `idle_timeout_secs`: if a connection sends nothing for this long, it is
///   treated as disconnected (the original senders push audio continuously,
///   so silence means the peer is gone)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    pub directory: String,
    pub idle_timeout_secs: u64,
}

/// Audio format of the persisted container.
///
/// The protocol carries G.711 A-law, which always expands to 8000 Hz mono
/// 16-bit PCM. The values live in configuration so the WAV writer and the
/// validation logic share a single source of truth, but `validate()` rejects
/// anything other than the fixed format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8554, // conventional alternative RTSP port
            },
            recording: RecordingConfig {
                directory: "recordings".to_string(),
                idle_timeout_secs: 6,
            },
            audio: AudioConfig {
                sample_rate: 8000,
                channels: 1,
                bits_per_sample: 16,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from config.toml (if it exists)
    /// 3. Override with environment variables prefixed with APP_
    /// 4. Handle special cases for HOST and PORT environment variables
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER_PORT=8554`: Override listener port
    /// - `APP_RECORDING_DIRECTORY=/var/spool/recorder`: Override output dir
    /// - `HOST=0.0.0.0` / `PORT=8554`: Special cases for deployment platforms
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("_"));

        // Deployment platforms commonly inject these without the APP_ prefix
        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## What this checks:
    /// - Server port is not 0 (the listener needs a real port; tests construct
    ///   their config directly and may use 0 for an OS-assigned port)
    /// - Recording directory is not empty
    /// - Idle timeout is non-zero (a zero deadline would drop every connection
    ///   on its first read)
    /// - Audio format is the fixed 8000 Hz / mono / 16-bit the codec produces
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.recording.directory.is_empty() {
            return Err(anyhow::anyhow!("Recording directory cannot be empty"));
        }

        if self.recording.idle_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Idle timeout must be greater than 0"));
        }

        if self.audio.sample_rate != 8000 || self.audio.channels != 1 || self.audio.bits_per_sample != 16
        {
            return Err(anyhow::anyhow!(
                "Unsupported audio format: only 8000 Hz mono 16-bit PCM is supported"
            ));
        }

        Ok(())
    }
}
