//! Test orchestration
//!
//! [`SpeedTestController`] drives one run through
//! `Idle → PingRunning → DownloadRunning → UploadRunning → Completed`, with
//! `Aborted` reachable only when the ping phase fails. Per-run bookkeeping
//! lives in a [`TestRun`] that is dropped when the run ends, so repeated runs
//! never share counters.

use crate::{
    bridge::{send_report, HostBridge},
    error::{AppError, Result},
    info::SharedInfo,
    logging::Logger,
    models::{Config, PingOutcome, RunReport},
    probe::{DownloadProbe, PingProbe, ProbeContext, UploadProbe},
    types::{DisplayField, DisplayValue, Phase, StartControl, TestState},
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Probe parameters for a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub ping_count: u32,
    pub duration: Duration,
    pub streams: usize,
    pub download_size: u64,
    pub upload_chunk_size: usize,
    pub log_results: bool,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ping_count: config.ping_count,
            duration: config.duration(),
            streams: config.parallel_streams,
            download_size: config.effective_download_size(),
            upload_chunk_size: config.effective_upload_chunk_size(),
            log_results: config.log_results,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(RunReport),
    /// Ping failed; carries the failure reason
    Aborted(String),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            RunOutcome::Aborted(_) => None,
        }
    }
}

/// Progress after `phase` completes, in percent
pub fn phase_progress(phase: Phase) -> f64 {
    phase.step() as f64 / Phase::ALL.len() as f64 * 100.0
}

/// State of a single in-flight run
pub struct TestRun<'a> {
    ctx: &'a ProbeContext,
    state: TestState,
    /// Correlation id for diagnostic log entries of this run
    id: String,
}

impl<'a> TestRun<'a> {
    fn new(ctx: &'a ProbeContext) -> Self {
        Self {
            ctx,
            state: TestState::Idle,
            id: Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn state(&self) -> TestState {
        self.state
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn transition(&mut self, next: TestState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(AppError::internal(format!(
                "Illegal test state transition {:?} -> {:?}",
                self.state, next
            )));
        }
        self.state = next;
        self.ctx.observer.on_state(next);

        if next == TestState::PingRunning {
            for phase in Phase::ALL {
                self.ctx
                    .show(DisplayField::for_phase(phase), DisplayValue::Placeholder);
            }
            self.ctx.observer.on_progress(0.0);
        }
        Ok(())
    }

    fn finish_phase(&self, phase: Phase) {
        self.ctx.observer.on_progress(phase_progress(phase));
    }
}

/// Orchestrates runs and hands results to the sinks
pub struct SpeedTestController {
    ctx: ProbeContext,
    bridge: Box<dyn HostBridge>,
    info: SharedInfo,
    settings: RunSettings,
    logger: Arc<Logger>,
    control: StartControl,
}

impl SpeedTestController {
    pub fn new(
        ctx: ProbeContext,
        bridge: Box<dyn HostBridge>,
        info: SharedInfo,
        settings: RunSettings,
        logger: Arc<Logger>,
    ) -> Self {
        ctx.observer.on_start_control(StartControl::Ready);
        Self {
            ctx,
            bridge,
            info,
            settings,
            logger,
            control: StartControl::Ready,
        }
    }

    pub fn start_control(&self) -> StartControl {
        self.control
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn context(&self) -> &ProbeContext {
        &self.ctx
    }

    fn set_control(&mut self, control: StartControl) {
        self.control = control;
        self.ctx.observer.on_start_control(control);
    }

    /// Execute one full run. Only an internal inconsistency is an `Err`;
    /// a failed ping yields [`RunOutcome::Aborted`].
    pub async fn run(&mut self) -> Result<RunOutcome> {
        if !self.control.is_enabled() {
            return Err(AppError::test_execution("A test is already running"));
        }
        self.set_control(StartControl::Running);

        self.ctx.events.clear();
        self.ctx.observer.on_log_cleared();
        self.ctx.record("Starting new speed test...");

        let outcome = self.execute().await;
        match &outcome {
            Ok(RunOutcome::Completed(_)) => {}
            _ => self.set_control(StartControl::Ready),
        }
        outcome
    }

    async fn execute(&mut self) -> Result<RunOutcome> {
        let ctx = self.ctx.clone();
        let mut run = TestRun::new(&ctx);
        self.logger
            .info("Speed test started")
            .correlation_id(run.id())
            .field("duration_secs", self.settings.duration.as_secs())
            .field("streams", self.settings.streams)
            .field("ping_count", self.settings.ping_count)
            .log();

        run.transition(TestState::PingRunning)?;
        let ping = PingProbe::new(self.settings.ping_count).run(&ctx).await;
        run.finish_phase(Phase::Ping);

        let ping = match ping {
            PingOutcome::Completed(summary) => summary,
            PingOutcome::Failed(reason) => {
                ctx.record("Test aborted due to ping failure.");
                run.transition(TestState::Aborted)?;
                self.logger
                    .warn("Speed test aborted")
                    .correlation_id(run.id())
                    .field("reason", &reason)
                    .log();
                return Ok(RunOutcome::Aborted(reason));
            }
        };

        run.transition(TestState::DownloadRunning)?;
        let download = DownloadProbe::new(
            self.settings.duration,
            self.settings.streams,
            self.settings.download_size,
        )
        .run(&ctx)
        .await;
        run.finish_phase(Phase::Download);
        self.logger
            .info("Download finished")
            .correlation_id(run.id())
            .transfer(&download)
            .log();

        run.transition(TestState::UploadRunning)?;
        let upload = UploadProbe::new(
            self.settings.duration,
            self.settings.streams,
            self.settings.upload_chunk_size,
        )
        .run(&ctx)
        .await;
        run.finish_phase(Phase::Upload);
        self.logger
            .info("Upload finished")
            .correlation_id(run.id())
            .transfer(&upload)
            .log();

        run.transition(TestState::Completed)?;
        ctx.record("All tests completed.");
        self.set_control(StartControl::Completed);

        let report = RunReport::new(ping, download, upload);
        self.deliver(&report, run.id()).await;
        Ok(RunOutcome::Completed(report))
    }

    /// Best-effort hand-off to the host bridge and the logging endpoint
    async fn deliver(&self, report: &RunReport, run_id: &str) {
        if let Err(error) = send_report(self.bridge.as_ref(), &report.result.to_report()) {
            self.ctx
                .record(&format!("Failed to send results to host: {}", error));
            self.logger
                .warn("Host bridge hand-off failed")
                .correlation_id(run_id)
                .error_info(&error)
                .log();
        }

        if !self.settings.log_results {
            return;
        }

        let submission = report
            .result
            .to_submission(&self.info.client_info(), &self.ctx.events.full_text());
        match self.ctx.client.log_results(&submission).await {
            Ok(()) => self.ctx.record("Results successfully logged on the server."),
            Err(error) => {
                self.ctx
                    .record(&format!("Failed to log results to server: {}", error));
                self.logger
                    .warn("Result submission failed")
                    .correlation_id(run_id)
                    .error_info(&error)
                    .log();
            }
        }
    }

    /// Run `times` tests back to back; every run starts from a clean slate
    pub async fn run_repeated(&mut self, times: u32) -> Result<Vec<RunOutcome>> {
        let mut outcomes = Vec::with_capacity(times as usize);
        for _ in 0..times.max(1) {
            outcomes.push(self.run().await?);
        }
        Ok(outcomes)
    }
}
