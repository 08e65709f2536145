//! Data models and structures for the network speed tester

pub mod config;
pub mod info;
pub mod measurement;

// Re-export main model types
pub use config::Config;
pub use info::{ClientInfo, GeoInfo, GeoLocation, ServerInfo};
pub use measurement::{
    format_latency, format_speed, mean_latency, throughput_bps, LogSubmission, MeasurementResult,
    PingOutcome, PingSummary, ProbeSample, ResultReport, RunReport, SampleValue, Throughput, TransferSummary,
};
