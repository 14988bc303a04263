// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Logging setup for cf-console.
//!
//! The console command hands the controlling terminal to an interactive child
//! process, so anything written to stdout/stderr while that child runs ends up
//! interleaved with the remote shell. By default we therefore log to a file and
//! only fall back to the console when the caller asks for it.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use clap;
pub use tracing::Level;

/// Output format for log messages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable plaintext format
    #[default]
    Plaintext,
    /// Structured JSON format
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Plaintext => write!(f, "plaintext"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plaintext" => Ok(LogFormat::Plaintext),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!(
                "Invalid log format: {}. Use 'plaintext' or 'json'",
                s
            )),
        }
    }
}

/// Log level accepted on the command line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliLogLevel {
    /// Only error conditions
    Error,
    /// Errors and warnings
    Warn,
    /// Errors, warnings, and informational messages
    #[default]
    Info,
    /// All above plus debug information
    Debug,
    /// All above plus detailed tracing
    Trace,
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliLogLevel::Error => write!(f, "error"),
            CliLogLevel::Warn => write!(f, "warn"),
            CliLogLevel::Info => write!(f, "info"),
            CliLogLevel::Debug => write!(f, "debug"),
            CliLogLevel::Trace => write!(f, "trace"),
        }
    }
}

/// Logging flags shared by every cf-console binary.
///
/// Use with `#[command(flatten)]`.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CliLoggingArgs {
    /// Log verbosity level
    #[arg(long, value_enum, global = true, help = "Log verbosity level (default: info)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<CliLogLevel>,

    /// Log output format
    #[arg(long, value_enum, global = true, help = "Log output format (default: plaintext)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<LogFormat>,

    /// Directory for log files
    #[arg(long, global = true, help = "Directory for log files (default: platform specific)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Log filename
    #[arg(long, global = true, help = "Log filename")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,

    /// Log to stderr instead of a file
    #[arg(long, global = true, help = "Write logs to stderr instead of a log file")]
    #[serde(default)]
    pub log_to_stderr: bool,
}

impl CliLoggingArgs {
    /// Initialize logging from the parsed arguments.
    ///
    /// `owns_terminal` marks binaries that give the terminal to a child
    /// process; those log to a file unless `--log-to-stderr` is set. Other
    /// binaries log to stderr unless a file option is present.
    pub fn init(self, component: &str, owns_terminal: bool) -> anyhow::Result<()> {
        let level = self.log_level.unwrap_or_default().into();
        let format = self.log_format.unwrap_or_default();

        if self.should_log_to_file(owns_terminal) {
            let log_path = self.resolve_log_path(component);
            init_to_file(component, level, format, &log_path)
        } else {
            init(component, level, format)
        }
    }

    fn should_log_to_file(&self, owns_terminal: bool) -> bool {
        if self.log_to_stderr {
            return false;
        }
        owns_terminal || self.log_file.is_some() || self.log_dir.is_some()
    }

    /// Resolve the log file path.
    ///
    /// 1. An absolute `log_file` is used as-is.
    /// 2. A relative `log_file` is joined onto `log_dir` when present.
    /// 3. Without `log_file`, `<log_dir>/<component>.log` or the platform default.
    pub fn resolve_log_path(&self, component: &str) -> PathBuf {
        match (&self.log_file, &self.log_dir) {
            (Some(file), _) if Path::new(file).is_absolute() => PathBuf::from(file),
            (Some(file), Some(dir)) => Path::new(dir).join(file),
            (Some(file), None) if Path::new(file).parent().is_some_and(|p| !p.as_os_str().is_empty()) => {
                PathBuf::from(file)
            }
            (Some(file), None) => standard_log_dir().join(file),
            (None, Some(dir)) => Path::new(dir).join(format!("{}.log", component)),
            (None, None) => standard_log_path_for_component(component),
        }
    }
}

/// Platform-specific directory for cf-console log files
///
/// - macOS: ~/Library/Logs/cf-console
/// - Linux: ~/.local/share/cf-console
/// - Windows: %APPDATA%\cf-console
pub fn standard_log_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
        path.push("Library");
        path.push("Logs");
        path.push("cf-console");
        path
    }

    #[cfg(not(target_os = "macos"))]
    {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(std::env::temp_dir);
        path.push("cf-console");
        path
    }
}

/// Standard log file path for a component, e.g. `<log dir>/cf-console.log`
pub fn standard_log_path_for_component(component: &str) -> PathBuf {
    standard_log_dir().join(format!("{}.log", component))
}

/// Initialize logging to stderr
pub fn init(component: &str, default_level: Level, format: LogFormat) -> anyhow::Result<()> {
    init_with_writer(component, default_level, format, io::stderr)
}

/// Initialize logging to a file, creating parent directories as needed
pub fn init_to_file(
    component: &str,
    default_level: Level,
    format: LogFormat,
    log_path: &Path,
) -> anyhow::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let log_file = std::fs::OpenOptions::new().create(true).append(true).open(log_path)?;

    init_with_writer(component, default_level, format, log_file)
}

/// Initialize logging with a custom writer
///
/// `RUST_LOG` takes precedence over `default_level` when set.
pub fn init_with_writer<W>(
    component: &str,
    default_level: Level,
    format: LogFormat,
    writer: W,
) -> anyhow::Result<()>
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(component, default_level)));

    match format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).json();
            #[cfg(debug_assertions)]
            let layer = layer.with_file(true).with_line_number(true);

            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
        LogFormat::Plaintext => {
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
            #[cfg(debug_assertions)]
            let layer = layer.with_file(true).with_line_number(true);

            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
    }

    Ok(())
}

// Crate targets use underscores even when the component name has dashes.
fn default_filter(component: &str, level: Level) -> String {
    format!("{},{}={}", level, component.replace('-', "_"), level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_log_level_conversion() {
        assert_eq!(Level::from(CliLogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(CliLogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(CliLogLevel::Info), Level::INFO);
        assert_eq!(Level::from(CliLogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(CliLogLevel::Trace), Level::TRACE);
        assert_eq!(CliLogLevel::default(), CliLogLevel::Info);
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("plaintext".parse::<LogFormat>().unwrap(), LogFormat::Plaintext);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_terminal_owner_logs_to_file_by_default() {
        let args = CliLoggingArgs::default();
        assert!(args.should_log_to_file(true));
        assert!(!args.should_log_to_file(false));

        let stderr = CliLoggingArgs {
            log_to_stderr: true,
            log_file: Some("x.log".into()),
            ..Default::default()
        };
        assert!(!stderr.should_log_to_file(true));
    }

    #[test]
    fn test_resolve_log_path() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_string_lossy().to_string();

        let args = CliLoggingArgs {
            log_dir: Some(dir_str.clone()),
            ..Default::default()
        };
        assert_eq!(args.resolve_log_path("cf-console"), dir.path().join("cf-console.log"));

        let args = CliLoggingArgs {
            log_dir: Some(dir_str),
            log_file: Some("custom.log".into()),
            ..Default::default()
        };
        assert_eq!(args.resolve_log_path("cf-console"), dir.path().join("custom.log"));

        let absolute = dir.path().join("abs.log");
        let args = CliLoggingArgs {
            log_file: Some(absolute.to_string_lossy().to_string()),
            ..Default::default()
        };
        assert_eq!(args.resolve_log_path("cf-console"), absolute);
    }

    #[test]
    fn test_standard_log_path_for_component() {
        let path = standard_log_path_for_component("cf-console");
        assert!(path.to_string_lossy().ends_with("cf-console.log"));
        assert!(path.parent().unwrap().ends_with("cf-console"));
    }

    #[test]
    fn test_default_filter_uses_crate_target() {
        assert_eq!(default_filter("cf-console", Level::DEBUG), "DEBUG,cf_console=DEBUG");
    }
}
