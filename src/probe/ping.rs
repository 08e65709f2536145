//! Latency probe: sequential round trips to the ping endpoint

use super::ProbeContext;
use crate::{
    models::{format_latency, PingOutcome, PingSummary, ProbeSample},
    types::{DisplayField, DisplayValue},
};
use tokio::time::Instant;

/// Sequential, no-retry latency measurement
#[derive(Debug, Clone, Copy)]
pub struct PingProbe {
    count: u32,
}

impl PingProbe {
    pub fn new(count: u32) -> Self {
        Self { count: count.max(1) }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Run `count` pings. The first transport failure ends the probe with
    /// [`PingOutcome::Failed`]; remaining pings are not attempted.
    pub async fn run(&self, ctx: &ProbeContext) -> PingOutcome {
        ctx.record("Starting ping test...");
        ctx.show(DisplayField::Ping, DisplayValue::Testing);

        let mut samples = Vec::with_capacity(self.count as usize);
        for attempt in 1..=self.count {
            let started = Instant::now();
            match ctx.client.ping().await {
                Ok(()) => {
                    let sample = ProbeSample::latency(started.elapsed());
                    let latency_ms = sample.latency_ms().unwrap_or_default();
                    ctx.record(&format!("Ping {}/{}: {}", attempt, self.count, format_latency(latency_ms)));
                    samples.push(sample);
                }
                Err(error) => {
                    ctx.record(&format!("Ping test failed: {}", error));
                    ctx.show(DisplayField::Ping, DisplayValue::Error);
                    return PingOutcome::Failed(error.to_string());
                }
            }
        }

        match PingSummary::from_samples(samples) {
            Some(summary) => {
                ctx.show(DisplayField::Ping, DisplayValue::Latency(summary.average_ms));
                ctx.record(&format!(
                    "Ping test finished. Average latency: {}",
                    summary.report()
                ));
                PingOutcome::Completed(summary)
            }
            None => {
                ctx.show(DisplayField::Ping, DisplayValue::Error);
                PingOutcome::Failed("no latency samples".to_string())
            }
        }
    }
}
