//! Configuration data model and validation

use crate::bridge::BridgeTarget;
use crate::types::{AppError, PayloadProfile, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the speed-test server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Duration budget for each of the download and upload probes
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,

    /// Number of sequential latency round trips
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,

    /// Concurrent workers per throughput probe
    #[serde(default = "default_parallel_streams")]
    pub parallel_streams: usize,

    /// Preset for download size and upload chunk size
    #[serde(default = "default_payload_profile")]
    pub payload_profile: PayloadProfile,

    /// Explicit download size, overriding the profile
    #[serde(default)]
    pub download_size: Option<u64>,

    /// Explicit upload chunk size, overriding the profile
    #[serde(default)]
    pub upload_chunk_size: Option<usize>,

    /// Submit results to `/log_results` after a completed run
    #[serde(default = "default_log_results")]
    pub log_results: bool,

    /// Where completed results are handed off
    #[serde(default)]
    pub bridge: BridgeTarget,

    /// Connection-type hint such as `4g` or `wifi`
    #[serde(default)]
    pub network_type: Option<String>,

    /// Number of runs in one session
    #[serde(default = "default_repeat")]
    pub repeat: u32,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Echo the event log while running
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            duration_secs: default_duration_secs(),
            ping_count: default_ping_count(),
            parallel_streams: default_parallel_streams(),
            payload_profile: default_payload_profile(),
            download_size: None,
            upload_chunk_size: None,
            log_results: default_log_results(),
            bridge: BridgeTarget::default(),
            network_type: None,
            repeat: default_repeat(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe duration budget
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Bytes requested per download stream
    pub fn effective_download_size(&self) -> u64 {
        self.download_size
            .unwrap_or_else(|| self.payload_profile.download_size())
    }

    /// Bytes sent per upload POST
    pub fn effective_upload_chunk_size(&self) -> usize {
        self.upload_chunk_size
            .unwrap_or_else(|| self.payload_profile.upload_chunk_size())
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.server_url.is_empty() {
            return Err(AppError::config("Server URL cannot be empty"));
        }

        match url::Url::parse(&self.server_url) {
            Ok(parsed) => {
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(AppError::config(format!(
                        "Server URL must use http or https: {}",
                        self.server_url
                    )));
                }
                if parsed.host_str().is_none() {
                    return Err(AppError::config(format!(
                        "Server URL must have a host: {}",
                        self.server_url
                    )));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!(
                    "Invalid server URL '{}': {}",
                    self.server_url, e
                )));
            }
        }

        if self.duration_secs == 0 {
            return Err(AppError::config("Test duration must be greater than 0"));
        }

        if self.duration_secs > crate::defaults::MAX_TEST_DURATION_SECS {
            return Err(AppError::config(format!(
                "Test duration cannot exceed {} seconds",
                crate::defaults::MAX_TEST_DURATION_SECS
            )));
        }

        if self.ping_count == 0 || self.ping_count > crate::defaults::MAX_PING_COUNT {
            return Err(AppError::config(format!(
                "Ping count must be between 1 and {}",
                crate::defaults::MAX_PING_COUNT
            )));
        }

        if self.parallel_streams == 0
            || self.parallel_streams > crate::defaults::MAX_PARALLEL_STREAMS
        {
            return Err(AppError::config(format!(
                "Parallel streams must be between 1 and {}",
                crate::defaults::MAX_PARALLEL_STREAMS
            )));
        }

        let download_size = self.effective_download_size();
        if download_size == 0 || download_size > crate::defaults::MAX_DOWNLOAD_SIZE {
            return Err(AppError::config(format!(
                "Download size must be between 1 and {} bytes, got {}",
                crate::defaults::MAX_DOWNLOAD_SIZE,
                download_size
            )));
        }

        let chunk_size = self.effective_upload_chunk_size();
        if chunk_size == 0 || chunk_size > crate::defaults::MAX_UPLOAD_CHUNK_SIZE {
            return Err(AppError::config(format!(
                "Upload chunk size must be between 1 and {} bytes, got {}",
                crate::defaults::MAX_UPLOAD_CHUNK_SIZE,
                chunk_size
            )));
        }

        if self.repeat == 0 {
            return Err(AppError::config("Repeat count must be greater than 0"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(server) = std::env::var("SPEEDTEST_SERVER") {
            let server = server.trim();
            if !server.is_empty() {
                self.server_url = server.to_string();
            }
        }

        if let Ok(duration) = std::env::var("TEST_DURATION") {
            self.duration_secs = duration.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid TEST_DURATION value '{}': {}", duration, e))
            })?;
        }

        if let Ok(count) = std::env::var("PING_COUNT") {
            self.ping_count = count.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid PING_COUNT value '{}': {}", count, e))
            })?;
        }

        if let Ok(streams) = std::env::var("PARALLEL_STREAMS") {
            self.parallel_streams = streams.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid PARALLEL_STREAMS value '{}': {}", streams, e))
            })?;
        }

        if let Ok(profile) = std::env::var("PAYLOAD_PROFILE") {
            self.payload_profile = profile.parse()?;
        }

        if let Ok(size) = std::env::var("DOWNLOAD_SIZE") {
            self.download_size = Some(size.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid DOWNLOAD_SIZE value '{}': {}", size, e))
            })?);
        }

        if let Ok(size) = std::env::var("UPLOAD_CHUNK_SIZE") {
            self.upload_chunk_size = Some(size.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid UPLOAD_CHUNK_SIZE value '{}': {}", size, e))
            })?);
        }

        if let Ok(log_results) = std::env::var("LOG_RESULTS") {
            self.log_results = log_results.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid LOG_RESULTS value '{}': {}", log_results, e))
            })?;
        }

        if let Ok(bridge) = std::env::var("HOST_BRIDGE") {
            self.bridge = bridge.parse()?;
        }

        if let Ok(network_type) = std::env::var("NETWORK_TYPE") {
            let network_type = network_type.trim();
            if !network_type.is_empty() {
                self.network_type = Some(network_type.to_string());
            }
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e))
            })?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_server_url() -> String {
    crate::defaults::DEFAULT_SERVER_URL.to_string()
}

fn default_duration_secs() -> u64 {
    crate::defaults::DEFAULT_TEST_DURATION_SECS
}

fn default_ping_count() -> u32 {
    crate::defaults::DEFAULT_PING_COUNT
}

fn default_parallel_streams() -> usize {
    crate::defaults::DEFAULT_PARALLEL_STREAMS
}

fn default_payload_profile() -> PayloadProfile {
    PayloadProfile::Standard
}

fn default_log_results() -> bool {
    crate::defaults::DEFAULT_LOG_RESULTS
}

fn default_repeat() -> u32 {
    crate::defaults::DEFAULT_REPEAT
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
