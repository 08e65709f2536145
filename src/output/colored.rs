//! Colored formatter implementation with terminal color support

use super::formatter::{
    display_text, failed_workers_note, latency_rating, report_columns, report_rows, throughput_rating,
    FormattingOptions,
    OutputFormatter, PlainFormatter,
};
use crate::{
    error::Result,
    info::InfoPanel,
    models::RunReport,
    types::{DisplayField, DisplayValue, LatencyBand, ThroughputBand},
};
use colored::*;

/// Colour and symbol for a rating band
pub trait BandStyle {
    fn color(&self) -> Color;
    fn symbol(&self) -> &'static str;
}

impl BandStyle for LatencyBand {
    fn color(&self) -> Color {
        match self {
            LatencyBand::Excellent => Color::Green,
            LatencyBand::Good => Color::Cyan,
            LatencyBand::Fair => Color::Yellow,
            LatencyBand::Poor => Color::Red,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            LatencyBand::Excellent => "●",
            LatencyBand::Good => "●",
            LatencyBand::Fair => "◐",
            LatencyBand::Poor => "○",
        }
    }
}

impl BandStyle for ThroughputBand {
    fn color(&self) -> Color {
        match self {
            ThroughputBand::Fast => Color::Green,
            ThroughputBand::Moderate => Color::Cyan,
            ThroughputBand::Slow => Color::Yellow,
            ThroughputBand::Crawling => Color::Red,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            ThroughputBand::Fast => "▲",
            ThroughputBand::Moderate => "▲",
            ThroughputBand::Slow => "▼",
            ThroughputBand::Crawling => "▼",
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
    pub progress: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
            progress: Color::Green,
        }
    }
}

/// Colored formatter: the plain layout with bands and status colours applied
pub struct ColoredFormatter {
    plain: PlainFormatter,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self {
            plain: PlainFormatter::new(options),
            color_scheme,
        }
    }

    fn enabled(&self) -> bool {
        self.plain.options().enable_color
    }

    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.enabled() {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.enabled() {
            text.bold()
        } else {
            text.normal()
        }
    }

    /// Band colour for a live or final reading; non-numeric values get status colours
    fn value_color(&self, value: &DisplayValue) -> Color {
        match value {
            DisplayValue::Latency(ms) => LatencyBand::from_ms(*ms).color(),
            DisplayValue::Throughput(bps) => ThroughputBand::from_bps(*bps).color(),
            DisplayValue::Error => self.color_scheme.error,
            DisplayValue::Testing => self.color_scheme.info,
            DisplayValue::Placeholder => self.color_scheme.muted,
            DisplayValue::Text(_) => Color::White,
        }
    }

    fn rating_cell(&self, rating: &str) -> String {
        let band_color = match rating {
            "Excellent" | "Fast" => LatencyBand::Excellent.color(),
            "Good" | "Moderate" => LatencyBand::Good.color(),
            "Fair" | "Slow" => LatencyBand::Fair.color(),
            _ => LatencyBand::Poor.color(),
        };
        self.colorize(rating, band_color).to_string()
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let border = "═".repeat(title.chars().count() + 4);
        Ok(format!(
            "{}\n  {}  \n{}",
            self.colorize(&border, self.color_scheme.header),
            self.bold(title),
            self.colorize(&border, self.color_scheme.header)
        ))
    }

    fn format_info(&self, info: &InfoPanel) -> Result<String> {
        let lines = [
            (DisplayField::ClientInfo, &info.client),
            (DisplayField::ServerInfo, &info.server),
            (DisplayField::NetworkInfo, &info.network),
        ];
        let rendered: Vec<String> = lines
            .iter()
            .map(|(field, value)| {
                let label = format!("{:<8}", format!("{}:", field.label()));
                let text = value.as_deref().unwrap_or("-");
                format!("{} {}", self.colorize(&label, self.color_scheme.muted), text)
            })
            .collect();
        Ok(rendered.join("\n"))
    }

    fn format_run_report(&self, report: &RunReport) -> Result<String> {
        if !self.enabled() {
            return self.plain.format_run_report(report);
        }

        let verbose = self.plain.options().verbose_mode;
        let table = self
            .plain
            .create_table(&report_columns(verbose), &report_rows(report, verbose));

        // Colour the rating cells after layout so ANSI codes do not skew widths
        let ping_band = LatencyBand::from_ms(report.ping.average_ms);
        let download_band = ThroughputBand::from_bps(report.download.throughput.bits_per_second());
        let upload_band = ThroughputBand::from_bps(report.upload.throughput.bits_per_second());
        let mut colored_table = String::new();
        for line in table.lines() {
            let mut line = line.to_string();
            for rating in [
                latency_rating(ping_band),
                throughput_rating(download_band),
                throughput_rating(upload_band),
            ] {
                let padded = format!(" {} ", rating);
                if line.contains(&padded) && !line.contains(&format!(" {} ", "Rating")) {
                    line = line.replacen(&padded, &format!(" {} ", self.rating_cell(rating)), 1);
                    break;
                }
            }
            colored_table.push_str(&line);
            colored_table.push('\n');
        }
        if let Some(note) = failed_workers_note(report, verbose) {
            colored_table.push_str(&note.yellow().to_string());
        }
        Ok(colored_table.trim_end().to_string())
    }

    fn format_display(&self, field: DisplayField, value: &DisplayValue) -> String {
        let symbol = match value {
            DisplayValue::Latency(ms) => format!(" {}", LatencyBand::from_ms(*ms).symbol()),
            DisplayValue::Throughput(bps) => format!(" {}", ThroughputBand::from_bps(*bps).symbol()),
            _ => String::new(),
        };
        let text = format!("{}{}", display_text(value), symbol);
        format!(
            "{}: {}",
            self.bold(field.label()),
            self.colorize(&text, self.value_color(value))
        )
    }

    fn format_progress(&self, percent: f64) -> String {
        let (filled, empty) = self.plain.progress_cells(percent);
        format!(
            "[{}{}] {:>3.0}%",
            self.colorize(&"█".repeat(filled), self.color_scheme.progress),
            self.colorize(&"░".repeat(empty), self.color_scheme.muted),
            percent.clamp(0.0, 100.0)
        )
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!(
            "{} {}",
            self.colorize("✗", self.color_scheme.error),
            self.colorize(error, self.color_scheme.error)
        ))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!(
            "{} {}",
            self.colorize("!", self.color_scheme.warning),
            self.colorize(warning, self.color_scheme.warning)
        ))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!(
            "{} {}",
            self.colorize("✓", self.color_scheme.success),
            self.colorize(message, self.color_scheme.success)
        ))
    }
}
