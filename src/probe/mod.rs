//! Measurement probes
//!
//! Download and upload share one deadline-checked loop: every worker is a
//! [`TransferStep`] driven by [`run_until_deadline`] until the probe's
//! [`DeadlineClock`] closes. Workers are spawned as independent tasks and
//! joined as a barrier; their byte counts meet in a [`TransferMeter`].

pub mod download;
pub mod ping;
pub mod upload;

pub use download::DownloadProbe;
pub use ping::PingProbe;
pub use upload::UploadProbe;

use crate::{
    client::SpeedTestClient,
    error::Result,
    logging::EventLog,
    models::{throughput_bps, ProbeSample, TransferSummary},
    output::ProgressObserver,
    types::{DisplayField, DisplayValue, Phase},
};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Collaborators shared by every probe of a run
#[derive(Clone)]
pub struct ProbeContext {
    pub client: Arc<dyn SpeedTestClient>,
    pub observer: Arc<dyn ProgressObserver>,
    pub events: EventLog,
}

impl ProbeContext {
    pub fn new(client: Arc<dyn SpeedTestClient>, observer: Arc<dyn ProgressObserver>, events: EventLog) -> Self {
        Self {
            client,
            observer,
            events,
        }
    }

    /// Append a line to the visible log and forward it to the observer
    pub fn record(&self, message: &str) {
        let line = self.events.record(message);
        self.observer.on_log(&line);
    }

    pub fn show(&self, field: DisplayField, value: DisplayValue) {
        self.observer.on_display(field, value);
    }
}

/// Wall-clock window of one probe
#[derive(Debug, Clone, Copy)]
pub struct DeadlineClock {
    started: Instant,
    deadline: Instant,
}

impl DeadlineClock {
    pub fn start(budget: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: started + budget,
        }
    }

    /// True while new reads or writes may still be issued
    pub fn is_open(&self) -> bool {
        Instant::now() < self.deadline
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Shared byte total for the workers of one probe
pub struct TransferMeter {
    phase: Phase,
    clock: DeadlineClock,
    total_bytes: AtomicU64,
    observer: Arc<dyn ProgressObserver>,
}

impl TransferMeter {
    pub fn new(phase: Phase, clock: DeadlineClock, observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            phase,
            clock,
            total_bytes: AtomicU64::new(0),
            observer,
        }
    }

    pub fn clock(&self) -> &DeadlineClock {
        &self.clock
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::SeqCst)
    }

    /// Add a completed transfer and publish the live aggregate throughput.
    /// Latency samples carry no bytes and leave the total unchanged.
    pub fn record(&self, sample: &ProbeSample) -> u64 {
        let bytes = sample.byte_count().unwrap_or(0);
        let total = self.total_bytes.fetch_add(bytes, Ordering::SeqCst) + bytes;
        let bps = throughput_bps(total, self.clock.elapsed().as_secs_f64());
        self.observer
            .on_display(DisplayField::for_phase(self.phase), DisplayValue::Throughput(bps));
        total
    }

    /// Final figures over the whole probe window
    pub fn summary(&self, workers: usize, failed_workers: usize) -> TransferSummary {
        TransferSummary::new(
            self.phase,
            self.total_bytes(),
            self.clock.elapsed(),
            workers,
            failed_workers,
        )
    }
}

/// One worker's unit of transfer
#[async_trait]
pub trait TransferStep: Send {
    /// Move one chunk. `Ok(None)` means the worker has nothing left to transfer.
    async fn next_transfer(&mut self) -> Result<Option<u64>>;
}

/// Drive a step until the deadline passes, it runs dry, or it fails.
/// Bytes recorded before a failure stay in the meter.
pub async fn run_until_deadline<S>(step: &mut S, meter: &TransferMeter) -> Result<u64>
where
    S: TransferStep + ?Sized,
{
    let mut worker_bytes = 0u64;
    while meter.clock().is_open() {
        match step.next_transfer().await? {
            Some(bytes) => {
                worker_bytes += bytes;
                meter.record(&ProbeSample::bytes(bytes));
            }
            None => break,
        }
    }
    Ok(worker_bytes)
}

/// Spawn `workers` tasks built by `make_step`, wait for all of them, and
/// summarise. A failing worker is logged and does not cancel its siblings.
pub async fn run_workers<S, F>(
    ctx: &ProbeContext,
    phase: Phase,
    budget: Duration,
    workers: usize,
    make_step: F,
) -> TransferSummary
where
    S: TransferStep + 'static,
    F: Fn(usize) -> S,
{
    let meter = Arc::new(TransferMeter::new(
        phase,
        DeadlineClock::start(budget),
        ctx.observer.clone(),
    ));

    let handles: Vec<_> = (0..workers)
        .map(|worker_id| {
            let meter = meter.clone();
            let ctx = ctx.clone();
            let mut step = make_step(worker_id);
            tokio::spawn(async move {
                let outcome = run_until_deadline(&mut step, &meter).await;
                if let Err(error) = &outcome {
                    ctx.record(&format!("{} test error: {}", phase.label(), error));
                }
                outcome
            })
        })
        .collect();

    let mut failed_workers = 0;
    for joined in join_all(handles).await {
        match joined {
            Ok(Ok(_)) => {}
            Ok(Err(_)) => failed_workers += 1,
            Err(join_error) => {
                failed_workers += 1;
                ctx.record(&format!("{} test error: {}", phase.label(), join_error));
            }
        }
    }

    meter.summary(workers, failed_workers)
}

#[cfg(test)]
pub(crate) mod testing;
