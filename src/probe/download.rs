//! Download probe: parallel streamed reads against a deadline

use super::{run_workers, ProbeContext, TransferStep};
use crate::{
    client::{ChunkStream, SpeedTestClient},
    error::Result,
    models::TransferSummary,
    types::{DisplayField, DisplayValue, Phase},
};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

/// N concurrent streamed downloads sharing one deadline
#[derive(Debug, Clone, Copy)]
pub struct DownloadProbe {
    duration: Duration,
    streams: usize,
    payload_size: u64,
}

impl DownloadProbe {
    pub fn new(duration: Duration, streams: usize, payload_size: u64) -> Self {
        Self {
            duration,
            streams: streams.max(1),
            payload_size,
        }
    }

    pub async fn run(&self, ctx: &ProbeContext) -> TransferSummary {
        ctx.record(&format!(
            "Starting download test for {} seconds...",
            self.duration.as_secs()
        ));
        ctx.show(DisplayField::Download, DisplayValue::Testing);

        let client = ctx.client.clone();
        let size = self.payload_size;
        let summary = run_workers(ctx, Phase::Download, self.duration, self.streams, move |_| {
            DownloadStream::new(client.clone(), size)
        })
        .await;

        ctx.show(
            DisplayField::Download,
            DisplayValue::Throughput(summary.throughput.bits_per_second()),
        );
        ctx.record(&format!("Download test finished. Speed: {}", summary.throughput));
        summary
    }
}

/// One worker: a single request whose body is read chunk by chunk
struct DownloadStream {
    client: Arc<dyn SpeedTestClient>,
    size: u64,
    body: Option<ChunkStream>,
}

impl DownloadStream {
    fn new(client: Arc<dyn SpeedTestClient>, size: u64) -> Self {
        Self {
            client,
            size,
            body: None,
        }
    }
}

#[async_trait]
impl TransferStep for DownloadStream {
    async fn next_transfer(&mut self) -> Result<Option<u64>> {
        if self.body.is_none() {
            self.body = Some(self.client.open_download(self.size).await?);
        }

        match self.body.as_mut() {
            Some(body) => match body.next().await {
                Some(chunk) => Ok(Some(chunk? as u64)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }
}
