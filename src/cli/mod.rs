//! Command-line interface

use crate::bridge::BridgeTarget;
use crate::types::PayloadProfile;
use clap::Parser;
use std::path::PathBuf;

/// Network Speed Tester - measure latency, download and upload throughput against a speed-test server
#[derive(Parser, Debug, Clone)]
#[command(name = "nst")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Speed-test server base URL (e.g. http://localhost:8000)
    #[arg(short, long, value_name = "URL")]
    pub server: Option<String>,

    /// Duration of each throughput phase in seconds (1-60)
    #[arg(short, long, value_name = "SECS", value_parser = parse_duration)]
    pub duration: Option<u64>,

    /// Number of sequential pings
    #[arg(short = 'p', long = "pings", value_name = "N", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub pings: Option<u32>,

    /// Concurrent download/upload workers (1-16)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..=16))]
    pub streams: Option<u64>,

    /// Payload preset: standard (4 MiB / 1 MiB) or granular (8 MiB / 256 KiB)
    #[arg(long, value_name = "PROFILE", value_parser = parse_profile)]
    pub profile: Option<PayloadProfile>,

    /// Requested download payload size in bytes, overrides the profile
    #[arg(long, value_name = "BYTES")]
    pub download_size: Option<u64>,

    /// Upload chunk size in bytes, overrides the profile
    #[arg(long = "upload-chunk", value_name = "BYTES")]
    pub upload_chunk: Option<usize>,

    /// Where to hand the JSON result: stdout, none, or file:<path>
    #[arg(long, value_name = "TARGET", value_parser = parse_bridge)]
    pub bridge: Option<BridgeTarget>,

    /// Connection-type hint shown as network info (e.g. 4g, wifi)
    #[arg(long, value_name = "TYPE")]
    pub network_type: Option<String>,

    /// Do not submit results to the server's logging endpoint
    #[arg(long)]
    pub no_log_results: bool,

    /// Run the test this many times
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub repeat: Option<u32>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// List supported environment variables and exit
    #[arg(long)]
    pub env_help: bool,

    /// Write an example .env file to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub write_env_example: Option<PathBuf>,
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }
        if self.download_size == Some(0) {
            return Err("--download-size must be greater than 0".to_string());
        }
        if self.upload_chunk == Some(0) {
            return Err("--upload-chunk must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Explicit color choice, `None` when neither flag was given
    pub fn color_override(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            None
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        self.color_override().unwrap_or_else(supports_color)
    }

    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Command-line overrides:\n");
        if let Some(ref server) = self.server {
            summary.push_str(&format!("  Server: {}\n", server));
        }
        if let Some(duration) = self.duration {
            summary.push_str(&format!("  Duration: {}s\n", duration));
        }
        if let Some(pings) = self.pings {
            summary.push_str(&format!("  Pings: {}\n", pings));
        }
        if let Some(streams) = self.streams {
            summary.push_str(&format!("  Streams: {}\n", streams));
        }
        if let Some(profile) = self.profile {
            summary.push_str(&format!("  Payload profile: {}\n", profile));
        }
        if let Some(ref bridge) = self.bridge {
            summary.push_str(&format!("  Bridge: {}\n", bridge));
        }
        if self.no_log_results {
            summary.push_str("  Result logging: disabled\n");
        }
        summary.push_str(&format!("  Colored output: {}\n", self.use_colors()));
        summary.push_str(&format!("  Verbose mode: {}\n", self.verbose));
        summary.push_str(&format!("  Debug mode: {}\n", self.debug));

        summary
    }
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > crate::defaults::MAX_TEST_DURATION_SECS {
                Err(format!(
                    "Duration cannot exceed {} seconds",
                    crate::defaults::MAX_TEST_DURATION_SECS
                ))
            } else {
                Ok(secs)
            }
        })
}

fn parse_profile(s: &str) -> Result<PayloadProfile, String> {
    s.parse().map_err(|e: crate::error::AppError| e.to_string())
}

fn parse_bridge(s: &str) -> Result<BridgeTarget, String> {
    s.parse().map_err(|e: crate::error::AppError| e.to_string())
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}
