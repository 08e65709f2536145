//! Upload probe: parallel POST loops against a deadline

use super::{run_workers, ProbeContext, TransferStep};
use crate::{
    client::SpeedTestClient,
    error::Result,
    models::TransferSummary,
    types::{DisplayField, DisplayValue, Phase},
};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// N concurrent workers POSTing fixed-size chunks until the deadline
#[derive(Debug, Clone, Copy)]
pub struct UploadProbe {
    duration: Duration,
    workers: usize,
    chunk_size: usize,
}

impl UploadProbe {
    pub fn new(duration: Duration, workers: usize, chunk_size: usize) -> Self {
        Self {
            duration,
            workers: workers.max(1),
            chunk_size,
        }
    }

    pub async fn run(&self, ctx: &ProbeContext) -> TransferSummary {
        ctx.record(&format!(
            "Starting upload test for {} seconds...",
            self.duration.as_secs()
        ));
        ctx.show(DisplayField::Upload, DisplayValue::Testing);

        let client = ctx.client.clone();
        // One zero-filled buffer for every POST of every worker
        let chunk = Bytes::from(vec![0u8; self.chunk_size]);
        let summary = run_workers(ctx, Phase::Upload, self.duration, self.workers, move |_| {
            UploadLoop {
                client: client.clone(),
                chunk: chunk.clone(),
            }
        })
        .await;

        ctx.show(
            DisplayField::Upload,
            DisplayValue::Throughput(summary.throughput.bits_per_second()),
        );
        ctx.record(&format!("Upload test finished. Speed: {}", summary.throughput));
        summary
    }
}

struct UploadLoop {
    client: Arc<dyn SpeedTestClient>,
    chunk: Bytes,
}

#[async_trait]
impl TransferStep for UploadLoop {
    // Counts the whole chunk once the POST resolves, whatever the server did with it
    async fn next_transfer(&mut self) -> Result<Option<u64>> {
        self.client.upload(self.chunk.clone()).await?;
        Ok(Some(self.chunk.len() as u64))
    }
}
