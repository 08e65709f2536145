//! Measurement results produced by the probes

use crate::types::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Bits per second, computed from a byte count and elapsed wall time
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Throughput(f64);

impl Throughput {
    pub const ZERO: Throughput = Throughput(0.0);

    pub fn from_bits_per_second(bps: f64) -> Self {
        if bps.is_finite() && bps > 0.0 {
            Self(bps)
        } else {
            Self::ZERO
        }
    }

    /// `8 * bytes / elapsed`, zero when no time has elapsed
    pub fn from_transfer(bytes: u64, elapsed: Duration) -> Self {
        Self::from_bits_per_second(throughput_bps(bytes, elapsed.as_secs_f64()))
    }

    pub fn bits_per_second(self) -> f64 {
        self.0
    }

}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_speed(self.0))
    }
}

/// Throughput in bits per second; a zero, negative or non-finite elapsed time yields 0
pub fn throughput_bps(total_bytes: u64, elapsed_secs: f64) -> f64 {
    if !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
        return 0.0;
    }
    let bps = (total_bytes as f64 * 8.0) / elapsed_secs;
    if bps.is_finite() { bps } else { 0.0 }
}

/// Kbps below one megabit, Mbps above, two decimals
pub fn format_speed(bits_per_second: f64) -> String {
    let bps = if bits_per_second.is_finite() && bits_per_second > 0.0 {
        bits_per_second
    } else {
        0.0
    };

    if bps < 1e6 {
        format!("{:.2} Kbps", bps / 1e3)
    } else {
        format!("{:.2} Mbps", bps / 1e6)
    }
}

/// Arithmetic mean of the latencies, `None` for an empty slice
pub fn mean_latency(latencies_ms: &[f64]) -> Option<f64> {
    if latencies_ms.is_empty() {
        return None;
    }
    Some(latencies_ms.iter().sum::<f64>() / latencies_ms.len() as f64)
}

/// What a single observation measured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleValue {
    Latency(Duration),
    Bytes(u64),
}

/// A single latency or byte-count observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSample {
    pub value: SampleValue,
    pub recorded_at: DateTime<Utc>,
}

impl ProbeSample {
    pub fn latency(elapsed: Duration) -> Self {
        Self {
            value: SampleValue::Latency(elapsed),
            recorded_at: Utc::now(),
        }
    }

    pub fn bytes(count: u64) -> Self {
        Self {
            value: SampleValue::Bytes(count),
            recorded_at: Utc::now(),
        }
    }

    pub fn latency_ms(&self) -> Option<f64> {
        match self.value {
            SampleValue::Latency(elapsed) => Some(elapsed.as_secs_f64() * 1000.0),
            SampleValue::Bytes(_) => None,
        }
    }

    pub fn byte_count(&self) -> Option<u64> {
        match self.value {
            SampleValue::Bytes(count) => Some(count),
            SampleValue::Latency(_) => None,
        }
    }
}

/// Successful latency probe
#[derive(Debug, Clone)]
pub struct PingSummary {
    pub samples: Vec<ProbeSample>,
    pub average_ms: f64,
}

impl PingSummary {
    /// Builds a summary; `None` when there are no latency samples
    pub fn from_samples(samples: Vec<ProbeSample>) -> Option<Self> {
        let latencies: Vec<f64> = samples.iter().filter_map(ProbeSample::latency_ms).collect();
        let average_ms = mean_latency(&latencies)?;
        Some(Self { samples, average_ms })
    }

    /// Whole milliseconds for the live display
    pub fn display_ms(&self) -> i64 {
        self.average_ms.round() as i64
    }

    /// Two-decimal string used in reports, e.g. `25.00 ms`
    pub fn report(&self) -> String {
        format_latency(self.average_ms)
    }
}

pub fn format_latency(latency_ms: f64) -> String {
    format!("{:.2} ms", latency_ms)
}

/// Outcome of the latency probe; failure is a sentinel, never a number
#[derive(Debug, Clone)]
pub enum PingOutcome {
    Completed(PingSummary),
    Failed(String),
}

impl PingOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, PingOutcome::Failed(_))
    }

    pub fn average_ms(&self) -> Option<f64> {
        match self {
            PingOutcome::Completed(summary) => Some(summary.average_ms),
            PingOutcome::Failed(_) => None,
        }
    }
}

/// Aggregate of one download or upload probe
#[derive(Debug, Clone)]
pub struct TransferSummary {
    pub phase: Phase,
    pub total_bytes: u64,
    pub elapsed: Duration,
    pub throughput: Throughput,
    pub workers: usize,
    pub failed_workers: usize,
}

impl TransferSummary {
    pub fn new(phase: Phase, total_bytes: u64, elapsed: Duration, workers: usize, failed_workers: usize) -> Self {
        Self {
            phase,
            total_bytes,
            elapsed,
            throughput: Throughput::from_transfer(total_bytes, elapsed),
            workers,
            failed_workers,
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub ping_ms: f64,
    pub download: Throughput,
    pub upload: Throughput,
    pub completed_at: DateTime<Utc>,
}

impl MeasurementResult {
    pub fn new(ping_ms: f64, download: Throughput, upload: Throughput) -> Self {
        Self {
            ping_ms,
            download,
            upload,
            completed_at: Utc::now(),
        }
    }

    /// Payload handed to the host bridge
    pub fn to_report(&self) -> ResultReport {
        ResultReport {
            ping: format_latency(self.ping_ms),
            download: self.download.to_string(),
            upload: self.upload.to_string(),
        }
    }

    /// Payload posted to the logging endpoint
    pub fn to_submission(&self, client_info: &str, full_log: &str) -> LogSubmission {
        let report = self.to_report();
        LogSubmission {
            ping: report.ping,
            download: report.download,
            upload: report.upload,
            client_info: client_info.to_string(),
            full_log: full_log.to_string(),
        }
    }
}

/// Everything one completed run measured, for the final summary
#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: MeasurementResult,
    pub ping: PingSummary,
    pub download: TransferSummary,
    pub upload: TransferSummary,
}

impl RunReport {
    pub fn new(ping: PingSummary, download: TransferSummary, upload: TransferSummary) -> Self {
        Self {
            result: MeasurementResult::new(ping.average_ms, download.throughput, upload.throughput),
            ping,
            download,
            upload,
        }
    }

    /// Total workers that stopped early across both transfer phases
    pub fn failed_workers(&self) -> usize {
        self.download.failed_workers + self.upload.failed_workers
    }
}

/// `{ ping, download, upload }` as display strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultReport {
    pub ping: String,
    pub download: String,
    pub upload: String,
}

/// Body of `POST /log_results`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSubmission {
    pub ping: String,
    pub download: String,
    pub upload: String,
    pub client_info: String,
    pub full_log: String,
}
