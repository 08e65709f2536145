//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::Cli, config::env::EnvManager, error::Result, models::Config};
use std::path::PathBuf;

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
    env_file: PathBuf,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            env_file: PathBuf::from(".env"),
        }
    }

    /// Read variables from a different `.env` path
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = path.into();
        self
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file(&self.env_file, self.cli.debug)?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    pub fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(ref server) = cli.server {
            config.server_url = server.clone();
        }
        if let Some(duration) = cli.duration {
            config.duration_secs = duration;
        }
        if let Some(pings) = cli.pings {
            config.ping_count = pings;
        }
        if let Some(streams) = cli.streams {
            config.parallel_streams = streams as usize;
        }
        if let Some(profile) = cli.profile {
            config.payload_profile = profile;
        }
        if let Some(size) = cli.download_size {
            config.download_size = Some(size);
        }
        if let Some(size) = cli.upload_chunk {
            config.upload_chunk_size = Some(size);
        }
        if let Some(ref bridge) = cli.bridge {
            config.bridge = bridge.clone();
        }
        if let Some(ref network_type) = cli.network_type {
            config.network_type = Some(network_type.clone());
        }
        if cli.no_log_results {
            config.log_results = false;
        }
        if let Some(repeat) = cli.repeat {
            config.repeat = repeat;
        }
        if let Some(enable_color) = cli.color_override() {
            config.enable_color = enable_color;
        }

        // CLI-only flags
        config.verbose = cli.verbose;
        config.debug = cli.debug;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Server: {}", config.server_url));
    summary.push(format!("Duration: {}s", config.duration_secs));
    summary.push(format!("Pings: {}", config.ping_count));
    summary.push(format!("Streams: {}", config.parallel_streams));
    summary.push(format!(
        "Payload: {} (download {} bytes, upload chunk {} bytes)",
        config.payload_profile,
        config.effective_download_size(),
        config.effective_upload_chunk_size()
    ));
    summary.push(format!("Bridge: {}", config.bridge));
    summary.push(format!("Log results: {}", config.log_results));
    summary.push(format!("Repeat: {}", config.repeat));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeTarget;
    use crate::types::PayloadProfile;
    use clap::Parser;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Tests below touch process-wide environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 11] = [
        "SPEEDTEST_SERVER",
        "TEST_DURATION",
        "PING_COUNT",
        "PARALLEL_STREAMS",
        "PAYLOAD_PROFILE",
        "DOWNLOAD_SIZE",
        "UPLOAD_CHUNK_SIZE",
        "LOG_RESULTS",
        "HOST_BRIDGE",
        "NETWORK_TYPE",
        "ENABLE_COLOR",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn missing_env_file() -> PathBuf {
        PathBuf::from("definitely-missing.env")
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "nst",
            "--server", "https://speed.example.com",
            "--duration", "20",
            "--streams", "2",
            "--profile", "granular",
            "--bridge", "none",
            "--no-log-results",
            "--no-color",
            "--verbose",
        ]);
        let mut config = Config::default();
        ConfigParser::new(cli).apply_cli_overrides(&mut config);

        assert_eq!(config.server_url, "https://speed.example.com");
        assert_eq!(config.duration_secs, 20);
        assert_eq!(config.parallel_streams, 2);
        assert_eq!(config.payload_profile, PayloadProfile::Granular);
        assert_eq!(config.effective_upload_chunk_size(), 256 * 1024);
        assert_eq!(config.bridge, BridgeTarget::None);
        assert!(!config.log_results);
        assert!(!config.enable_color);
        assert!(config.verbose);
    }

    #[test]
    fn test_absent_flags_keep_existing_values() {
        let mut config = Config::default();
        config.duration_secs = 30;
        config.network_type = Some("4g".to_string());

        ConfigParser::new(Cli::parse_from(["nst"])).apply_cli_overrides(&mut config);

        assert_eq!(config.duration_secs, 30);
        assert_eq!(config.network_type.as_deref(), Some("4g"));
        assert!(config.log_results);
    }

    #[test]
    fn test_cli_overrides_env_vars() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("TEST_DURATION", "8");
        env::set_var("PARALLEL_STREAMS", "6");

        let cli = Cli::parse_from(["nst", "--duration", "12"]);
        let config = ConfigParser::new(cli)
            .with_env_file(missing_env_file())
            .parse()
            .unwrap();

        assert_eq!(config.duration_secs, 12);
        assert_eq!(config.parallel_streams, 6);
        clear_env();
    }

    #[test]
    fn test_env_file_values_are_loaded() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "SPEEDTEST_SERVER=http://10.0.0.5:8080").unwrap();
        writeln!(file, "NETWORK_TYPE=wifi").unwrap();
        writeln!(file, "HOST_BRIDGE=none").unwrap();

        let config = ConfigParser::new(Cli::parse_from(["nst"]))
            .with_env_file(file.path())
            .parse()
            .unwrap();

        assert_eq!(config.server_url, "http://10.0.0.5:8080");
        assert_eq!(config.network_type.as_deref(), Some("wifi"));
        assert_eq!(config.bridge, BridgeTarget::None);
        clear_env();
    }

    #[test]
    fn test_invalid_final_config_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("DOWNLOAD_SIZE", "999999999");

        let result = ConfigParser::new(Cli::parse_from(["nst"]))
            .with_env_file(missing_env_file())
            .parse();

        assert!(matches!(result, Err(crate::error::AppError::Config(_))));
        clear_env();
    }

    #[test]
    fn test_config_summary() {
        let summary = display_config_summary(&Config::default());
        assert!(summary.contains("Server: http://localhost:8000"));
        assert!(summary.contains("Duration: 10s"));
        assert!(summary.contains("download 4194304 bytes"));
        assert!(summary.contains("Bridge: stdout"));
    }
}
