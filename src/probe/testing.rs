//! Scripted server and recording observer for probe and controller tests

use super::ProbeContext;
use crate::{
    client::{ChunkStream, SpeedTestClient},
    error::{AppError, Result},
    logging::EventLog,
    models::{GeoInfo, LogSubmission},
    output::ProgressObserver,
    types::{DisplayField, DisplayValue, StartControl, TestState},
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted reply for one ping
#[derive(Debug, Clone)]
pub enum PingReply {
    After(Duration),
    Fail(&'static str),
}

/// Body served to every download worker
#[derive(Debug, Clone)]
pub struct DownloadScript {
    pub chunks: usize,
    pub chunk_size: usize,
    pub pause: Duration,
}

/// In-process stand-in for the speed-test server. Time is driven by tokio
/// sleeps so tests can run on a paused clock.
pub struct ScriptedClient {
    pings: Mutex<VecDeque<PingReply>>,
    download: DownloadScript,
    failing_download_opens: usize,
    upload_pause: Duration,
    failing_upload_after: Option<usize>,
    geo: Option<GeoInfo>,
    log_failure: Option<&'static str>,
    pub ping_calls: AtomicUsize,
    pub download_opens: AtomicUsize,
    pub upload_calls: AtomicUsize,
    /// Distinct `(address, length)` pairs of uploaded buffers
    pub upload_buffers: Mutex<HashSet<(usize, usize)>>,
    pub submissions: Mutex<Vec<LogSubmission>>,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self {
            pings: Mutex::new(VecDeque::new()),
            download: DownloadScript {
                chunks: 1,
                chunk_size: 1024,
                pause: Duration::from_millis(10),
            },
            failing_download_opens: 0,
            upload_pause: Duration::from_millis(100),
            failing_upload_after: None,
            geo: None,
            log_failure: None,
            ping_calls: AtomicUsize::new(0),
            download_opens: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            upload_buffers: Mutex::new(HashSet::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedClient {
    pub fn with_pings(self, replies: impl IntoIterator<Item = PingReply>) -> Self {
        *self.pings.lock().unwrap() = replies.into_iter().collect();
        self
    }

    pub fn with_ping_millis(self, millis: &[u64]) -> Self {
        self.with_pings(millis.iter().map(|ms| PingReply::After(Duration::from_millis(*ms))))
    }

    pub fn with_download(mut self, script: DownloadScript) -> Self {
        self.download = script;
        self
    }

    /// The first `count` download requests fail before any byte arrives
    pub fn with_failing_download_opens(mut self, count: usize) -> Self {
        self.failing_download_opens = count;
        self
    }

    pub fn with_upload_pause(mut self, pause: Duration) -> Self {
        self.upload_pause = pause;
        self
    }

    /// Every upload after the first `successes` fails
    pub fn with_failing_uploads_after(mut self, successes: usize) -> Self {
        self.failing_upload_after = Some(successes);
        self
    }

    pub fn with_geo(mut self, geo: GeoInfo) -> Self {
        self.geo = Some(geo);
        self
    }

    pub fn with_log_failure(mut self, reason: &'static str) -> Self {
        self.log_failure = Some(reason);
        self
    }
}

#[async_trait]
impl SpeedTestClient for ScriptedClient {
    async fn ping(&self) -> Result<()> {
        self.ping_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .pings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PingReply::After(Duration::from_millis(10)));
        match reply {
            PingReply::After(latency) => {
                tokio::time::sleep(latency).await;
                Ok(())
            }
            PingReply::Fail(reason) => Err(AppError::network(reason)),
        }
    }

    async fn open_download(&self, _size: u64) -> Result<ChunkStream> {
        let open = self.download_opens.fetch_add(1, Ordering::SeqCst);
        if open < self.failing_download_opens {
            return Err(AppError::network("connection refused"));
        }

        let script = self.download.clone();
        Ok(stream::unfold(script.chunks, move |remaining| async move {
            if remaining == 0 {
                return None;
            }
            tokio::time::sleep(script.pause).await;
            Some((Ok(script.chunk_size), remaining - 1))
        })
        .boxed())
    }

    async fn upload(&self, chunk: Bytes) -> Result<()> {
        let call = self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.upload_buffers
            .lock()
            .unwrap()
            .insert((chunk.as_ptr() as usize, chunk.len()));
        tokio::time::sleep(self.upload_pause).await;
        match self.failing_upload_after {
            Some(successes) if call >= successes => Err(AppError::network("broken pipe")),
            _ => Ok(()),
        }
    }

    async fn geo_info(&self) -> Result<GeoInfo> {
        self.geo
            .clone()
            .ok_or_else(|| AppError::http_request("geo lookup unavailable"))
    }

    async fn log_results(&self, submission: &LogSubmission) -> Result<()> {
        if let Some(reason) = self.log_failure {
            return Err(AppError::network(reason));
        }
        self.submissions.lock().unwrap().push(submission.clone());
        Ok(())
    }
}

/// Everything an observer was told, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    State(TestState),
    Progress(f64),
    Display(DisplayField, DisplayValue),
    Control(StartControl),
    Log(String),
    LogCleared,
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Observed>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Observed> {
        self.events.lock().unwrap().clone()
    }

    pub fn states(&self) -> Vec<TestState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Observed::State(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Observed::Progress(percent) => Some(percent),
                _ => None,
            })
            .collect()
    }

    pub fn controls(&self) -> Vec<StartControl> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Observed::Control(control) => Some(control),
                _ => None,
            })
            .collect()
    }

    /// Latest value shown in `field`
    pub fn last_display(&self, field: DisplayField) -> Option<DisplayValue> {
        self.events().into_iter().rev().find_map(|e| match e {
            Observed::Display(f, value) if f == field => Some(value),
            _ => None,
        })
    }

    pub fn displays(&self, field: DisplayField) -> Vec<DisplayValue> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Observed::Display(f, value) if f == field => Some(value),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Observed) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_state(&self, state: TestState) {
        self.push(Observed::State(state));
    }

    fn on_progress(&self, percent: f64) {
        self.push(Observed::Progress(percent));
    }

    fn on_display(&self, field: DisplayField, value: DisplayValue) {
        self.push(Observed::Display(field, value));
    }

    fn on_start_control(&self, control: StartControl) {
        self.push(Observed::Control(control));
    }

    fn on_log(&self, line: &str) {
        self.push(Observed::Log(line.to_string()));
    }

    fn on_log_cleared(&self) {
        self.push(Observed::LogCleared);
    }
}

pub fn context(client: Arc<ScriptedClient>) -> ProbeContext {
    ProbeContext::new(client, Arc::new(RecordingObserver::default()), EventLog::new())
}

pub fn observed_context(client: Arc<ScriptedClient>) -> (ProbeContext, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    (ProbeContext::new(client, observer.clone(), EventLog::new()), observer)
}

/// Strip the `[HH:MM:SS] ` prefix from event log lines
pub fn messages(events: &EventLog) -> Vec<String> {
    events
        .lines()
        .into_iter()
        .map(|line| match line.split_once("] ") {
            Some((_, message)) => message.to_string(),
            None => line,
        })
        .collect()
}
