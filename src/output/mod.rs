//! Output formatting and display system
//!
//! The controller and probes report through [`ProgressObserver`]; the
//! terminal implementation renders those notifications with a plain or
//! colored [`OutputFormatter`].

mod colored;
mod formatter;
mod terminal;

pub use colored::{BandStyle, ColorScheme, ColoredFormatter};
pub use formatter::{
    display_text, Alignment, Column, FormattingOptions, OutputFormatter, PlainFormatter, RowData,
};
pub use terminal::{TerminalDisplay, LIVE_UPDATE_INTERVAL};

use crate::types::{DisplayField, DisplayValue, StartControl, TestState};

/// Receives run progress. Every method defaults to doing nothing.
pub trait ProgressObserver: Send + Sync {
    fn on_state(&self, _state: TestState) {}

    /// Overall progress in percent
    fn on_progress(&self, _percent: f64) {}

    fn on_display(&self, _field: DisplayField, _value: DisplayValue) {}

    fn on_start_control(&self, _control: StartControl) {}

    /// A line appended to the visible event log
    fn on_log(&self, _line: &str) {}

    /// The visible event log was cleared for a new run
    fn on_log_cleared(&self) {}
}

/// Observer that ignores everything
pub struct NullObserver;

impl ProgressObserver for NullObserver {}

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            ..FormattingOptions::default()
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, true)
    }
}
