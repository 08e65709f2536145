//! Network Speed Tester
//!
//! A command-line speed test that measures round-trip latency, download
//! throughput and upload throughput against a speed-test server, renders live
//! progress, and reports the results to a host bridge and a logging endpoint.

pub mod bridge;
pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod info;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, MeasurementResult, Throughput};
pub use controller::{SpeedTestController, RunOutcome};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
    pub const DEFAULT_TEST_DURATION_SECS: u64 = 10;
    pub const MAX_TEST_DURATION_SECS: u64 = 60;
    pub const DEFAULT_PING_COUNT: u32 = 5;
    pub const MAX_PING_COUNT: u32 = 100;
    pub const DEFAULT_PARALLEL_STREAMS: usize = 4;
    pub const MAX_PARALLEL_STREAMS: usize = 16;
    /// Largest payload the server will generate for `/download`
    pub const MAX_DOWNLOAD_SIZE: u64 = 16 * 1024 * 1024;
    pub const MAX_UPLOAD_CHUNK_SIZE: usize = 16 * 1024 * 1024;
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    pub const DEFAULT_LOG_RESULTS: bool = true;
    pub const DEFAULT_REPEAT: u32 = 1;
}
