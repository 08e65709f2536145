//! Host bridge: hands completed results to the enclosing application shell
//!
//! The hand-off is synchronous and fire-and-forget. Callers log a failure and
//! move on; nothing is retried.

use crate::error::{AppError, Result};
use crate::models::ResultReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Data channel back to the host
pub trait HostBridge: Send + Sync {
    /// Deliver a JSON payload
    fn send_data(&self, payload: &str) -> Result<()>;
}

/// Serialise the report and hand it to the bridge
pub fn send_report(bridge: &dyn HostBridge, report: &ResultReport) -> Result<()> {
    let payload = serde_json::to_string(report)?;
    bridge.send_data(&payload)
}

/// Configured bridge destination
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BridgeTarget {
    /// One JSON line on stdout
    #[default]
    Stdout,
    /// One JSON line appended to a file
    File(PathBuf),
    /// Discard
    None,
}

impl BridgeTarget {
    pub fn build(&self) -> Box<dyn HostBridge> {
        match self {
            BridgeTarget::Stdout => Box::new(StdoutBridge),
            BridgeTarget::File(path) => Box::new(FileBridge::new(path.clone())),
            BridgeTarget::None => Box::new(NullBridge),
        }
    }
}

impl FromStr for BridgeTarget {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "stdout" => Ok(BridgeTarget::Stdout),
            "none" | "off" => Ok(BridgeTarget::None),
            _ => match s.strip_prefix("file:") {
                Some(path) if !path.trim().is_empty() => Ok(BridgeTarget::File(PathBuf::from(path.trim()))),
                _ => Err(AppError::config(format!(
                    "Invalid bridge target '{}' (expected 'stdout', 'none' or 'file:<path>')",
                    s
                ))),
            },
        }
    }
}

impl fmt::Display for BridgeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeTarget::Stdout => f.write_str("stdout"),
            BridgeTarget::File(path) => write!(f, "file:{}", path.display()),
            BridgeTarget::None => f.write_str("none"),
        }
    }
}

/// Writes each payload as a line on stdout
pub struct StdoutBridge;

impl HostBridge for StdoutBridge {
    fn send_data(&self, payload: &str) -> Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", payload)
            .and_then(|_| handle.flush())
            .map_err(|e| AppError::bridge(format!("stdout: {}", e)))
    }
}

/// Appends each payload as a line to a file
pub struct FileBridge {
    path: PathBuf,
}

impl FileBridge {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl HostBridge for FileBridge {
    fn send_data(&self, payload: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::bridge(format!("{}: {}", self.path.display(), e)))?;
        writeln!(file, "{}", payload)
            .map_err(|e| AppError::bridge(format!("{}: {}", self.path.display(), e)))
    }
}

pub struct NullBridge;

impl HostBridge for NullBridge {
    fn send_data(&self, _payload: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn report() -> ResultReport {
        ResultReport {
            ping: "25.00 ms".to_string(),
            download: "4.19 Mbps".to_string(),
            upload: "1.05 Mbps".to_string(),
        }
    }

    #[test]
    fn test_parse_targets() {
        assert_eq!("stdout".parse::<BridgeTarget>().unwrap(), BridgeTarget::Stdout);
        assert_eq!("none".parse::<BridgeTarget>().unwrap(), BridgeTarget::None);
        assert_eq!(
            "file:/tmp/results.jsonl".parse::<BridgeTarget>().unwrap(),
            BridgeTarget::File(PathBuf::from("/tmp/results.jsonl"))
        );
        assert!("file:".parse::<BridgeTarget>().is_err());
        assert!("telegram".parse::<BridgeTarget>().is_err());
    }

    #[test]
    fn test_target_display_round_trip() {
        for target in ["stdout", "none", "file:out.jsonl"] {
            let parsed: BridgeTarget = target.parse().unwrap();
            assert_eq!(parsed.to_string(), target);
        }
    }

    #[test]
    fn test_file_bridge_appends_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.jsonl");
        let bridge = FileBridge::new(path.clone());

        send_report(&bridge, &report()).unwrap();
        send_report(&bridge, &report()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: ResultReport = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, report());
    }

    #[test]
    fn test_file_bridge_reports_unwritable_path() {
        let dir = TempDir::new().unwrap();
        let bridge = FileBridge::new(dir.path().join("missing").join("results.jsonl"));
        let error = send_report(&bridge, &report()).unwrap_err();
        assert_eq!(error.category(), "BRIDGE");
    }

    #[test]
    fn test_null_bridge_accepts_everything() {
        assert!(send_report(&NullBridge, &report()).is_ok());
    }
}
