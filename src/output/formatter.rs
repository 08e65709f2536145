//! Core formatting traits and the plain text implementation

use crate::{
    error::{AppError, Result},
    info::InfoPanel,
    models::{format_latency, format_speed, RunReport, TransferSummary},
    types::{DisplayField, DisplayValue, LatencyBand, ThroughputBand},
};
use std::fmt::Write as _;

/// Rendering of results and live display values
pub trait OutputFormatter: Send + Sync {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Client, server and network lines
    fn format_info(&self, info: &InfoPanel) -> Result<String>;

    /// Final table for a completed run
    fn format_run_report(&self, report: &RunReport) -> Result<String>;

    /// One display slot, e.g. `Download: 94.50 Mbps`
    fn format_display(&self, field: DisplayField, value: &DisplayValue) -> String;

    /// Progress bar for a percentage in `0..=100`
    fn format_progress(&self, percent: f64) -> String;

    fn format_error(&self, error: &str) -> Result<String>;

    fn format_warning(&self, warning: &str) -> Result<String>;

    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    pub enable_color: bool,
    /// Adds byte counts and worker failures to the summary
    pub verbose_mode: bool,
    pub table_borders: bool,
    /// Width of the progress bar in cells
    pub progress_width: usize,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
            progress_width: 30,
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone)]
pub enum Alignment {
    Left,
    Right,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
}

impl Column {
    pub fn new(header: &str, alignment: Alignment) -> Self {
        Self {
            header: header.to_string(),
            alignment,
            min_width: header.len(),
        }
    }
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// Value text shared by every formatter
pub fn display_text(value: &DisplayValue) -> String {
    match value {
        DisplayValue::Placeholder => "-".to_string(),
        DisplayValue::Testing => "Testing...".to_string(),
        DisplayValue::Error => "Error".to_string(),
        DisplayValue::Latency(ms) => format!("{} ms", ms.round() as i64),
        DisplayValue::Throughput(bps) => format_speed(*bps),
        DisplayValue::Text(text) => text.clone(),
    }
}

pub fn latency_rating(band: LatencyBand) -> &'static str {
    match band {
        LatencyBand::Excellent => "Excellent",
        LatencyBand::Good => "Good",
        LatencyBand::Fair => "Fair",
        LatencyBand::Poor => "Poor",
    }
}

pub fn throughput_rating(band: ThroughputBand) -> &'static str {
    match band {
        ThroughputBand::Fast => "Fast",
        ThroughputBand::Moderate => "Moderate",
        ThroughputBand::Slow => "Slow",
        ThroughputBand::Crawling => "Crawling",
    }
}

fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f = bytes as f64;
    if bytes_f >= GIB {
        format!("{:.2} GiB", bytes_f / GIB)
    } else if bytes_f >= MIB {
        format!("{:.1} MiB", bytes_f / MIB)
    } else if bytes_f >= KIB {
        format!("{:.1} KiB", bytes_f / KIB)
    } else {
        format!("{} B", bytes)
    }
}

/// Rows of the summary table: metric, result, rating and, in verbose mode, detail
pub fn report_rows(report: &RunReport, verbose: bool) -> Vec<RowData> {
    let transfer_detail = |summary: &TransferSummary| {
        let mut detail = format!(
            "{} in {:.1}s",
            format_bytes(summary.total_bytes),
            summary.elapsed.as_secs_f64()
        );
        if summary.failed_workers > 0 {
            let _ = write!(detail, ", {}/{} workers failed", summary.failed_workers, summary.workers);
        }
        detail
    };

    let mut rows = vec![
        vec![
            "Ping".to_string(),
            format_latency(report.ping.average_ms),
            latency_rating(LatencyBand::from_ms(report.ping.average_ms)).to_string(),
            format!("{} samples", report.ping.samples.len()),
        ],
        vec![
            "Download".to_string(),
            report.download.throughput.to_string(),
            throughput_rating(ThroughputBand::from_bps(report.download.throughput.bits_per_second())).to_string(),
            transfer_detail(&report.download),
        ],
        vec![
            "Upload".to_string(),
            report.upload.throughput.to_string(),
            throughput_rating(ThroughputBand::from_bps(report.upload.throughput.bits_per_second())).to_string(),
            transfer_detail(&report.upload),
        ],
    ];

    if !verbose {
        for row in &mut rows {
            row.truncate(3);
        }
    }
    rows
}

/// Line under a compact table when some workers failed; verbose tables show it per row
pub fn failed_workers_note(report: &RunReport, verbose: bool) -> Option<String> {
    let failed = report.failed_workers();
    if verbose || failed == 0 {
        return None;
    }
    Some(format!(
        "{} transfer worker{} failed; rerun with --verbose for details",
        failed,
        if failed == 1 { "" } else { "s" }
    ))
}

pub fn report_columns(verbose: bool) -> Vec<Column> {
    let mut columns = vec![
        Column::new("Metric", Alignment::Left),
        Column::new("Result", Alignment::Right),
        Column::new("Rating", Alignment::Left),
    ];
    if verbose {
        columns.push(Column::new("Detail", Alignment::Left));
    }
    columns
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    pub(crate) fn options(&self) -> &FormattingOptions {
        &self.options
    }

    /// Render rows under the given columns
    pub(crate) fn create_table(&self, columns: &[Column], rows: &[RowData]) -> String {
        if rows.is_empty() {
            return String::new();
        }

        let widths = Self::column_widths(columns, rows);
        let borders = self.options.table_borders;
        let mut output = String::new();

        if borders {
            output.push_str(&Self::horizontal_border(&widths));
            output.push('\n');
        }
        let headers: Vec<String> = columns.iter().map(|c| c.header.clone()).collect();
        output.push_str(&self.create_row(&headers, &widths, columns));
        output.push('\n');
        if borders {
            output.push_str(&Self::horizontal_border(&widths));
            output.push('\n');
        }

        for row in rows {
            output.push_str(&self.create_row(row, &widths, columns));
            output.push('\n');
        }

        if borders {
            output.push_str(&Self::horizontal_border(&widths));
        }
        output
    }

    fn column_widths(columns: &[Column], rows: &[RowData]) -> Vec<usize> {
        columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                rows.iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .fold(column.min_width, usize::max)
            })
            .collect()
    }

    fn create_row(&self, data: &[String], widths: &[usize], columns: &[Column]) -> String {
        let borders = self.options.table_borders;
        let mut row = String::new();
        if borders {
            row.push('|');
        }

        for ((cell, &width), column) in data.iter().zip(widths).zip(columns) {
            if borders {
                row.push(' ');
            }
            row.push_str(&Self::align_text(cell, width, &column.alignment));
            if borders {
                row.push_str(" |");
            } else {
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    fn horizontal_border(widths: &[usize]) -> String {
        let mut border = String::from("+");
        for &width in widths {
            border.push_str(&"-".repeat(width + 2));
            border.push('+');
        }
        border
    }

    fn align_text(text: &str, width: usize, alignment: &Alignment) -> String {
        let len = text.chars().count();
        if len >= width {
            return text.to_string();
        }
        let padding = " ".repeat(width - len);
        match alignment {
            Alignment::Left => format!("{}{}", text, padding),
            Alignment::Right => format!("{}{}", padding, text),
        }
    }

    pub(crate) fn progress_cells(&self, percent: f64) -> (usize, usize) {
        let width = self.options.progress_width.max(1);
        let percent = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
        let filled = ((percent / 100.0) * width as f64).round() as usize;
        (filled.min(width), width - filled.min(width))
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);

        writeln!(output, "{}", border)
            .map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;
        writeln!(output, "  {}  ", title)
            .map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;
        write!(output, "{}", border)
            .map_err(|e| AppError::io(format!("Failed to format header: {}", e)))?;

        Ok(output)
    }

    fn format_info(&self, info: &InfoPanel) -> Result<String> {
        let mut output = String::new();
        let lines = [
            (DisplayField::ClientInfo, &info.client),
            (DisplayField::ServerInfo, &info.server),
            (DisplayField::NetworkInfo, &info.network),
        ];
        for (field, value) in lines {
            let text = value.as_deref().unwrap_or("-");
            writeln!(output, "{:<8} {}", format!("{}:", field.label()), text)
                .map_err(|e| AppError::io(format!("Failed to format info: {}", e)))?;
        }
        Ok(output.trim_end().to_string())
    }

    fn format_run_report(&self, report: &RunReport) -> Result<String> {
        let verbose = self.options.verbose_mode;
        let mut output = self.create_table(&report_columns(verbose), &report_rows(report, verbose));
        if let Some(note) = failed_workers_note(report, verbose) {
            output.push('\n');
            output.push_str(&note);
        }
        Ok(output)
    }

    fn format_display(&self, field: DisplayField, value: &DisplayValue) -> String {
        format!("{}: {}", field.label(), display_text(value))
    }

    fn format_progress(&self, percent: f64) -> String {
        let (filled, empty) = self.progress_cells(percent);
        format!("[{}{}] {:>3.0}%", "#".repeat(filled), ".".repeat(empty), percent.clamp(0.0, 100.0))
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("SUCCESS: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PingSummary, ProbeSample};
    use crate::types::Phase;
    use std::time::Duration;

    fn report() -> RunReport {
        let ping = PingSummary::from_samples(
            [20, 30, 25, 22, 28]
                .iter()
                .map(|ms| ProbeSample::latency(Duration::from_millis(*ms)))
                .collect(),
        )
        .unwrap();
        RunReport::new(
            ping,
            TransferSummary::new(Phase::Download, 4 * 1_048_576, Duration::from_secs(8), 4, 0),
            TransferSummary::new(Phase::Upload, 1_048_576, Duration::from_secs(8), 4, 1),
        )
    }

    fn plain(verbose: bool) -> PlainFormatter {
        PlainFormatter::new(FormattingOptions {
            enable_color: false,
            verbose_mode: verbose,
            ..FormattingOptions::default()
        })
    }

    #[test]
    fn test_display_text() {
        assert_eq!(display_text(&DisplayValue::Placeholder), "-");
        assert_eq!(display_text(&DisplayValue::Testing), "Testing...");
        assert_eq!(display_text(&DisplayValue::Latency(24.6)), "25 ms");
        assert_eq!(display_text(&DisplayValue::Throughput(4_194_304.0)), "4.19 Mbps");
        assert_eq!(display_text(&DisplayValue::Text("~4g".into())), "~4g");
    }

    #[test]
    fn test_run_report_table() {
        let table = plain(false).format_run_report(&report()).unwrap();
        assert!(table.contains("| Ping     |"));
        assert!(table.contains("25.00 ms"));
        assert!(table.contains("4.19 Mbps"));
        assert!(table.contains("Excellent"));
        assert!(table.contains("Slow"));
        assert!(!table.contains("Detail"));
        assert!(table.starts_with('+'));
        assert!(table.ends_with("1 transfer worker failed; rerun with --verbose for details"));
    }

    #[test]
    fn test_failed_workers_note() {
        let mut clean = report();
        clean.upload.failed_workers = 0;
        assert_eq!(failed_workers_note(&clean, false), None);

        let mut degraded = report();
        degraded.download.failed_workers = 2;
        assert_eq!(degraded.failed_workers(), 3);
        assert_eq!(
            failed_workers_note(&degraded, false).as_deref(),
            Some("3 transfer workers failed; rerun with --verbose for details")
        );
        assert_eq!(failed_workers_note(&degraded, true), None);
    }

    #[test]
    fn test_verbose_report_includes_details() {
        let table = plain(true).format_run_report(&report()).unwrap();
        assert!(table.contains("Detail"));
        assert!(table.contains("4.0 MiB in 8.0s"));
        assert!(table.contains("1/4 workers failed"));
        assert!(table.contains("5 samples"));
        assert!(!table.contains("rerun with --verbose"));
    }

    #[test]
    fn test_progress_bar() {
        let formatter = PlainFormatter::new(FormattingOptions {
            progress_width: 3,
            ..FormattingOptions::default()
        });
        assert_eq!(formatter.format_progress(0.0), "[...]   0%");
        assert_eq!(formatter.format_progress(100.0 / 3.0), "[#..]  33%");
        assert_eq!(formatter.format_progress(100.0), "[###] 100%");
    }

    #[test]
    fn test_info_lines() {
        let info = InfoPanel {
            client: Some("Berlin, Germany (IP: 203.0.113.7)".into()),
            server: None,
            network: Some("~Wifi".into()),
        };
        let text = plain(false).format_info(&info).unwrap();
        assert_eq!(
            text,
            "Client:  Berlin, Germany (IP: 203.0.113.7)\nServer:  -\nNetwork: ~Wifi"
        );
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(4 * 1_048_576), "4.0 MiB");
    }
}
