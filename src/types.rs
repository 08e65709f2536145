//! Type definitions shared across the probes, controller and display

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Lifecycle of a single speed-test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestState {
    Idle,
    PingRunning,
    DownloadRunning,
    UploadRunning,
    Completed,
    /// Only reachable from `PingRunning`
    Aborted,
}

impl TestState {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(self, next: TestState) -> bool {
        matches!(
            (self, next),
            (TestState::Idle, TestState::PingRunning)
                | (TestState::PingRunning, TestState::DownloadRunning)
                | (TestState::PingRunning, TestState::Aborted)
                | (TestState::DownloadRunning, TestState::UploadRunning)
                | (TestState::UploadRunning, TestState::Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TestState::Completed | TestState::Aborted)
    }

    /// Phase being measured in this state, if any
    pub fn phase(self) -> Option<Phase> {
        match self {
            TestState::PingRunning => Some(Phase::Ping),
            TestState::DownloadRunning => Some(Phase::Download),
            TestState::UploadRunning => Some(Phase::Upload),
            _ => None,
        }
    }
}

/// One measurement phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Ping,
    Download,
    Upload,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Ping, Phase::Download, Phase::Upload];

    /// 1-based position in the run, used for the progress indicator
    pub fn step(self) -> u32 {
        match self {
            Phase::Ping => 1,
            Phase::Download => 2,
            Phase::Upload => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Ping => "Ping",
            Phase::Download => "Download",
            Phase::Upload => "Upload",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// State of the start control exposed to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartControl {
    /// Enabled, no finished run to show
    Ready,
    /// Disabled while a run is in flight
    Running,
    /// Enabled, last run completed
    Completed,
}

impl StartControl {
    pub fn is_enabled(self) -> bool {
        !matches!(self, StartControl::Running)
    }
}

/// Display slots updated by the controller and info fetchers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayField {
    Ping,
    Download,
    Upload,
    ClientInfo,
    ServerInfo,
    NetworkInfo,
}

impl DisplayField {
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Ping => DisplayField::Ping,
            Phase::Download => DisplayField::Download,
            Phase::Upload => DisplayField::Upload,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayField::Ping => "Ping",
            DisplayField::Download => "Download",
            DisplayField::Upload => "Upload",
            DisplayField::ClientInfo => "Client",
            DisplayField::ServerInfo => "Server",
            DisplayField::NetworkInfo => "Network",
        }
    }
}

/// Value shown in a display slot
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayValue {
    /// Reset state, rendered as `-`
    Placeholder,
    Testing,
    Error,
    /// Average latency in milliseconds
    Latency(f64),
    /// Bits per second
    Throughput(f64),
    Text(String),
}

/// Colour band for latency readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl LatencyBand {
    pub fn from_ms(latency_ms: f64) -> Self {
        if latency_ms < 30.0 {
            Self::Excellent
        } else if latency_ms < 80.0 {
            Self::Good
        } else if latency_ms < 200.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// Colour band for throughput readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThroughputBand {
    Fast,
    Moderate,
    Slow,
    Crawling,
}

impl ThroughputBand {
    pub fn from_bps(bits_per_second: f64) -> Self {
        if bits_per_second >= 100e6 {
            Self::Fast
        } else if bits_per_second >= 25e6 {
            Self::Moderate
        } else if bits_per_second >= 1e6 {
            Self::Slow
        } else {
            Self::Crawling
        }
    }
}

/// Preset pairs of download size and upload chunk size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadProfile {
    /// 4 MiB downloads, 1 MiB upload chunks
    Standard,
    /// 8 MiB downloads, 256 KiB upload chunks
    Granular,
}

impl PayloadProfile {
    pub fn download_size(self) -> u64 {
        match self {
            PayloadProfile::Standard => 4 * 1024 * 1024,
            PayloadProfile::Granular => 8 * 1024 * 1024,
        }
    }

    pub fn upload_chunk_size(self) -> usize {
        match self {
            PayloadProfile::Standard => 1024 * 1024,
            PayloadProfile::Granular => 256 * 1024,
        }
    }
}

impl FromStr for PayloadProfile {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(PayloadProfile::Standard),
            "granular" => Ok(PayloadProfile::Granular),
            other => Err(AppError::parse(format!(
                "Unknown payload profile '{}' (expected 'standard' or 'granular')",
                other
            ))),
        }
    }
}

impl fmt::Display for PayloadProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadProfile::Standard => f.write_str("standard"),
            PayloadProfile::Granular => f.write_str("granular"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        assert!(TestState::Idle.can_transition_to(TestState::PingRunning));
        assert!(TestState::PingRunning.can_transition_to(TestState::DownloadRunning));
        assert!(TestState::PingRunning.can_transition_to(TestState::Aborted));
        assert!(TestState::DownloadRunning.can_transition_to(TestState::UploadRunning));
        assert!(TestState::UploadRunning.can_transition_to(TestState::Completed));

        assert!(!TestState::Idle.can_transition_to(TestState::DownloadRunning));
        assert!(!TestState::DownloadRunning.can_transition_to(TestState::Aborted));
        assert!(!TestState::UploadRunning.can_transition_to(TestState::Aborted));
        assert!(!TestState::Completed.can_transition_to(TestState::PingRunning));
    }

    #[test]
    fn test_terminal_states() {
        assert!(TestState::Completed.is_terminal());
        assert!(TestState::Aborted.is_terminal());
        assert!(!TestState::UploadRunning.is_terminal());
        assert_eq!(TestState::DownloadRunning.phase(), Some(Phase::Download));
        assert_eq!(TestState::Idle.phase(), None);
    }

    #[test]
    fn test_start_control() {
        assert!(StartControl::Ready.is_enabled());
        assert!(StartControl::Completed.is_enabled());
        assert!(!StartControl::Running.is_enabled());
    }

    #[test]
    fn test_bands() {
        assert_eq!(LatencyBand::from_ms(12.0), LatencyBand::Excellent);
        assert_eq!(LatencyBand::from_ms(45.0), LatencyBand::Good);
        assert_eq!(LatencyBand::from_ms(150.0), LatencyBand::Fair);
        assert_eq!(LatencyBand::from_ms(900.0), LatencyBand::Poor);

        assert_eq!(ThroughputBand::from_bps(250e6), ThroughputBand::Fast);
        assert_eq!(ThroughputBand::from_bps(40e6), ThroughputBand::Moderate);
        assert_eq!(ThroughputBand::from_bps(4_194_304.0), ThroughputBand::Slow);
        assert_eq!(ThroughputBand::from_bps(0.0), ThroughputBand::Crawling);
    }

    #[test]
    fn test_payload_profiles() {
        assert_eq!(PayloadProfile::Standard.download_size(), 4_194_304);
        assert_eq!(PayloadProfile::Standard.upload_chunk_size(), 1_048_576);
        assert_eq!(PayloadProfile::Granular.download_size(), 8_388_608);
        assert_eq!(PayloadProfile::Granular.upload_chunk_size(), 262_144);

        assert_eq!("GRANULAR".parse::<PayloadProfile>().unwrap(), PayloadProfile::Granular);
        assert!("huge".parse::<PayloadProfile>().is_err());
        assert_eq!(PayloadProfile::Standard.to_string(), "standard");
    }
}
