//! Live terminal display driven by controller and probe notifications

use super::{OutputFormatter, ProgressObserver};
use crate::types::{DisplayField, DisplayValue, TestState};
use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Minimum spacing between rewrites of a live throughput line
pub const LIVE_UPDATE_INTERVAL: Duration = Duration::from_millis(200);

struct DisplayState {
    writer: Box<dyn Write + Send>,
    last_live: Option<Instant>,
    pending_live: Option<String>,
    live_line_open: bool,
}

impl DisplayState {
    fn rewrite_live(&mut self, line: &str) {
        let _ = write!(self.writer, "\r{}\x1b[K", line);
        let _ = self.writer.flush();
        self.live_line_open = true;
        self.last_live = Some(Instant::now());
    }

    /// Flush a throttled live value and end its line
    fn close_live(&mut self) {
        if let Some(line) = self.pending_live.take() {
            self.rewrite_live(&line);
        }
        if self.live_line_open {
            let _ = writeln!(self.writer);
            self.live_line_open = false;
        }
    }

    fn line(&mut self, text: &str) {
        self.close_live();
        let _ = writeln!(self.writer, "{}", text);
        let _ = self.writer.flush();
    }
}

/// Terminal observer. Live throughput is rewritten in place when the output
/// is a terminal and suppressed otherwise; the event log carries final values.
pub struct TerminalDisplay {
    formatter: Box<dyn OutputFormatter>,
    state: Mutex<DisplayState>,
    live_updates: bool,
    show_events: bool,
}

impl TerminalDisplay {
    /// Display on stderr; stdout stays free for the host bridge
    pub fn stderr(formatter: Box<dyn OutputFormatter>) -> Self {
        let live_updates = io::stderr().is_terminal();
        Self::with_writer(formatter, Box::new(io::stderr()), live_updates)
    }

    pub fn with_writer(formatter: Box<dyn OutputFormatter>, writer: Box<dyn Write + Send>, live_updates: bool) -> Self {
        Self {
            formatter,
            state: Mutex::new(DisplayState {
                writer,
                last_live: None,
                pending_live: None,
                live_line_open: false,
            }),
            live_updates,
            show_events: true,
        }
    }

    /// Hide event log lines
    pub fn quiet_events(mut self) -> Self {
        self.show_events = false;
        self
    }

    pub fn formatter(&self) -> &dyn OutputFormatter {
        self.formatter.as_ref()
    }

    /// Print a block of text, closing any live line first
    pub fn print_block(&self, text: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.line(text);
        }
    }
}

impl ProgressObserver for TerminalDisplay {
    fn on_state(&self, state: TestState) {
        if state == TestState::Aborted {
            if let Ok(message) = self.formatter.format_error("Test aborted") {
                self.print_block(&message);
            }
        }
    }

    fn on_progress(&self, percent: f64) {
        self.print_block(&self.formatter.format_progress(percent));
    }

    fn on_display(&self, field: DisplayField, value: DisplayValue) {
        let line = self.formatter.format_display(field, &value);
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        match value {
            DisplayValue::Throughput(_) => {
                if !self.live_updates {
                    return;
                }
                let due = state
                    .last_live
                    .map_or(true, |at| at.elapsed() >= LIVE_UPDATE_INTERVAL);
                if due {
                    state.pending_live = None;
                    state.rewrite_live(&line);
                } else {
                    state.pending_live = Some(line);
                }
            }
            _ => state.line(&line),
        }
    }

    fn on_log(&self, line: &str) {
        if self.show_events {
            self.print_block(line);
        }
    }
}
