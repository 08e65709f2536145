//! Environment variable handling and .env file management

use crate::bridge::BridgeTarget;
use crate::error::{AppError, Result};
use crate::types::PayloadProfile;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load an env file if it exists; variables already set are not overwritten
    pub fn load_env_file(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path).map_err(|e| {
                AppError::config(format!("Failed to load {}: {}", path.display(), e))
            })?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Network Speed Tester Configuration
#
# Values here act as defaults and can be overridden by real environment
# variables and command-line arguments.

# Speed-test server base URL
# SPEEDTEST_SERVER=http://localhost:8000

# Seconds spent on each of the download and upload phases (1-60)
# TEST_DURATION=10

# Number of sequential pings (1-100)
# PING_COUNT=5

# Concurrent download/upload workers (1-16)
# PARALLEL_STREAMS=4

# Payload preset: standard (4 MiB downloads, 1 MiB upload chunks)
# or granular (8 MiB downloads, 256 KiB upload chunks)
# PAYLOAD_PROFILE=standard

# Explicit sizes in bytes, overriding the preset (max 16 MiB)
# DOWNLOAD_SIZE=4194304
# UPLOAD_CHUNK_SIZE=1048576

# Submit results to the server's /log_results endpoint (true/false)
# LOG_RESULTS=true

# Host bridge target: stdout, none, or file:<path>
# HOST_BRIDGE=stdout

# Connection-type hint shown as network info (e.g. 4g, wifi)
# NETWORK_TYPE=wifi

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))
    }

    fn parse_bounded<T>(key: &str, value: &str, min: T, max: T) -> Result<()>
    where
        T: std::str::FromStr + PartialOrd + std::fmt::Display,
        T::Err: std::fmt::Display,
    {
        let parsed: T = value
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
        if parsed < min || parsed > max {
            return Err(AppError::config(format!(
                "{} must be between {} and {}, got: {}",
                key, min, max, parsed
            )));
        }
        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        use crate::defaults::*;

        match key {
            "SPEEDTEST_SERVER" => {
                let parsed = url::Url::parse(value.trim())
                    .map_err(|e| AppError::config(format!("Invalid SPEEDTEST_SERVER '{}': {}", value, e)))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(AppError::config(format!(
                        "SPEEDTEST_SERVER must use http or https: {}",
                        value
                    )));
                }
            }
            "TEST_DURATION" => Self::parse_bounded::<u64>(key, value, 1, MAX_TEST_DURATION_SECS)?,
            "PING_COUNT" => Self::parse_bounded::<u32>(key, value, 1, MAX_PING_COUNT)?,
            "PARALLEL_STREAMS" => Self::parse_bounded::<usize>(key, value, 1, MAX_PARALLEL_STREAMS)?,
            "DOWNLOAD_SIZE" => Self::parse_bounded::<u64>(key, value, 1, MAX_DOWNLOAD_SIZE)?,
            "UPLOAD_CHUNK_SIZE" => Self::parse_bounded::<usize>(key, value, 1, MAX_UPLOAD_CHUNK_SIZE)?,
            "PAYLOAD_PROFILE" => {
                value.parse::<PayloadProfile>()?;
            }
            "HOST_BRIDGE" => {
                value.parse::<BridgeTarget>()?;
            }
            "LOG_RESULTS" | "ENABLE_COLOR" => {
                value.trim().parse::<bool>().map_err(|e| {
                    AppError::config(format!("Invalid {} value '{}': {}", key, value, e))
                })?;
            }
            _ => {
                // NETWORK_TYPE is free-form; unknown keys are ignored
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("SPEEDTEST_SERVER", "Speed-test server base URL", "http://localhost:8000"),
            ("TEST_DURATION", "Seconds per throughput phase (1-60)", "10"),
            ("PING_COUNT", "Number of sequential pings (1-100)", "5"),
            ("PARALLEL_STREAMS", "Concurrent transfer workers (1-16)", "4"),
            ("PAYLOAD_PROFILE", "Payload preset: standard or granular", "standard"),
            ("DOWNLOAD_SIZE", "Download payload size in bytes", "4194304"),
            ("UPLOAD_CHUNK_SIZE", "Upload chunk size in bytes", "1048576"),
            ("LOG_RESULTS", "Submit results to /log_results", "true"),
            ("HOST_BRIDGE", "Result hand-off: stdout, none, file:<path>", "stdout"),
            ("NETWORK_TYPE", "Connection-type hint", "4g"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<18} {}\n", var, description));
            help.push_str(&format!("  {:<18} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate the lines of an env file without loading it
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let warnings = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let (key, value) = line.split_once('=')?;
                Self::validate_env_var(key.trim(), value.trim())
                    .err()
                    .map(|e| format!("Line '{}': {}", line, e))
            })
            .collect();

        Ok(Some(warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_example_content_lists_every_variable() {
        let content = EnvManager::create_example_env_content();
        for (var, _, _) in EnvManager::get_supported_env_vars() {
            assert!(content.contains(&format!("{}=", var)), "missing {}", var);
        }
    }

    #[test]
    fn test_save_example_file() {
        let temp_file = NamedTempFile::new().unwrap();
        EnvManager::save_example_env_file(temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("Network Speed Tester Configuration"));
    }

    #[test]
    fn test_validate_env_var() {
        assert!(EnvManager::validate_env_var("SPEEDTEST_SERVER", "http://localhost:8000").is_ok());
        assert!(EnvManager::validate_env_var("TEST_DURATION", "60").is_ok());
        assert!(EnvManager::validate_env_var("PARALLEL_STREAMS", "16").is_ok());
        assert!(EnvManager::validate_env_var("PAYLOAD_PROFILE", "Granular").is_ok());
        assert!(EnvManager::validate_env_var("HOST_BRIDGE", "file:/tmp/x.jsonl").is_ok());
        assert!(EnvManager::validate_env_var("LOG_RESULTS", "false").is_ok());
        assert!(EnvManager::validate_env_var("NETWORK_TYPE", "anything").is_ok());

        assert!(EnvManager::validate_env_var("SPEEDTEST_SERVER", "ws://localhost").is_err());
        assert!(EnvManager::validate_env_var("TEST_DURATION", "0").is_err());
        assert!(EnvManager::validate_env_var("TEST_DURATION", "61").is_err());
        assert!(EnvManager::validate_env_var("PING_COUNT", "101").is_err());
        assert!(EnvManager::validate_env_var("PARALLEL_STREAMS", "17").is_err());
        assert!(EnvManager::validate_env_var("DOWNLOAD_SIZE", "16777217").is_err());
        assert!(EnvManager::validate_env_var("PAYLOAD_PROFILE", "tiny").is_err());
        assert!(EnvManager::validate_env_var("HOST_BRIDGE", "telegram").is_err());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "maybe").is_err());
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();
        assert!(help.contains("Supported Environment Variables:"));
        assert!(help.contains("SPEEDTEST_SERVER"));
        assert!(help.contains("Configuration Priority"));
    }

    #[test]
    fn test_check_env_file_reports_bad_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "TEST_DURATION=90").unwrap();
        writeln!(file, "PING_COUNT=5").unwrap();

        let warnings = EnvManager::check_env_file(file.path()).unwrap().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Line 'TEST_DURATION=90'"));

        assert!(EnvManager::check_env_file(Path::new("no-such.env")).unwrap().is_none());
    }
}
