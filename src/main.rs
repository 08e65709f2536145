//! Network Speed Tester - Main CLI Application
//!
//! Measures latency, download and upload throughput against a speed-test
//! server. Human-readable output goes to stderr; stdout carries only the
//! JSON result handed to the host bridge.

use clap::Parser;
use net_speed_tester::{
    cli::Cli,
    client::NetworkClient,
    config::{display_config_summary, load_config, EnvManager},
    controller::{RunSettings, SpeedTestController},
    error::{AppError, Result},
    info::{GeoInfoFetcher, NetworkInfo, SharedInfo},
    logging::{EventLog, LoggerFactory},
    output::{OutputFormatterFactory, TerminalDisplay},
    probe::ProbeContext,
    RunOutcome, BUILD_TIME, GIT_COMMIT, PKG_NAME, VERSION,
};
use std::error::Error;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

/// How long startup waits for geo info before the first run begins
const GEO_INFO_WAIT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        process::exit(1);
    }

    if cli.env_help {
        print!("{}", EnvManager::display_env_help());
        return;
    }

    if let Some(path) = &cli.write_env_example {
        match EnvManager::save_example_env_file(path) {
            Ok(()) => println!("Wrote example configuration to {}", path.display()),
            Err(e) => {
                eprintln!("{}", e.format_for_console(cli.use_colors()));
                process::exit(e.exit_code());
            }
        }
        return;
    }

    let use_color = cli.use_colors();
    let verbose = cli.verbose;
    if let Err(e) = run_application(cli).await {
        if verbose {
            eprintln!("{}", e.user_friendly_message());
        } else {
            eprintln!("{}", e.format_for_console(use_color));
        }

        if let Some(source) = e.source() {
            eprintln!("Caused by: {}", source);
        }

        print_error_suggestions(&e);

        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    if cli.debug {
        eprintln!("{} v{} ({}, built {})", PKG_NAME, VERSION, GIT_COMMIT, BUILD_TIME);
        eprintln!("Debug mode enabled");
        eprint!("{}", cli.get_config_summary());
        if let Some(warnings) = EnvManager::check_env_file(Path::new(".env"))? {
            for warning in warnings {
                eprintln!("Warning: .env {}", warning);
            }
        }
        eprintln!();
    }

    let config = load_config(cli)?;
    colored::control::set_override(config.enable_color);

    if config.debug {
        eprintln!("Configuration loaded successfully:");
        for line in display_config_summary(&config).lines() {
            eprintln!("  {}", line);
        }
        eprintln!();
    }

    let logger_factory = LoggerFactory::new(config.clone());
    let logger = Arc::new(logger_factory.create_logger("speedtest"));

    let client = Arc::new(NetworkClient::new(&config.server_url)?);
    let formatter = OutputFormatterFactory::create_formatter(config.enable_color, config.verbose);
    let display = Arc::new(TerminalDisplay::stderr(formatter));
    let events = EventLog::new().with_mirror(logger.clone());
    let ctx = ProbeContext::new(client, display.clone(), events);
    let info = SharedInfo::new();

    display.print_block(&display.formatter().format_header("Network Speed Tester")?);
    ctx.record("Application initialized. Click \"Start\" to begin.");

    let geo = GeoInfoFetcher::spawn(ctx.clone(), info.clone());
    NetworkInfo::apply(&ctx, &info, config.network_type.as_deref());

    if tokio::time::timeout(GEO_INFO_WAIT, geo).await.is_err() {
        logger
            .warn("Geo info lookup still pending, starting without it")
            .log();
    }
    display.print_block(&display.formatter().format_info(&info.panel())?);

    let mut controller = SpeedTestController::new(
        ctx,
        config.bridge.build(),
        info,
        RunSettings::from_config(&config),
        logger.clone(),
    );

    let outcomes = controller.run_repeated(config.repeat).await?;

    let mut aborted = 0;
    for (index, outcome) in outcomes.iter().enumerate() {
        match outcome {
            RunOutcome::Completed(report) => {
                if outcomes.len() > 1 {
                    display.print_block(
                        &display
                            .formatter()
                            .format_header(&format!("Run {} of {}", index + 1, outcomes.len()))?,
                    );
                }
                display.print_block(&display.formatter().format_run_report(report)?);
            }
            RunOutcome::Aborted(reason) => {
                aborted += 1;
                display.print_block(
                    &display
                        .formatter()
                        .format_warning(&format!("Run {} aborted: {}", index + 1, reason))?,
                );
            }
        }
    }

    if aborted > 0 {
        return Err(AppError::test_execution(format!(
            "{} of {} runs aborted due to ping failure",
            aborted,
            outcomes.len()
        )));
    }

    Ok(())
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format");
            eprintln!("  - Server URLs must start with http:// or https://");
            eprintln!("  - Durations are limited to 1-60 seconds, streams to 1-16");
        }
        e if e.is_network_related() || matches!(e, AppError::TestExecution(_)) => {
            eprintln!();
            eprintln!("Network troubleshooting:");
            eprintln!("  - Check that the speed-test server is running and reachable");
            eprintln!("  - Verify the --server URL and port");
            eprintln!("  - Verify firewall settings");
        }
        _ => {}
    }
}
