// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-test log files.
//!
//! Every test writes its full trace to a unique file under
//! `target/test-logs/<date>/` and prints a single line on completion.

use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TestLogError {
    #[error("failed to create test log: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write to test log file: {path}")]
    Write { path: PathBuf },

    #[error("invalid test name: {name}")]
    InvalidTestName { name: String },
}

pub struct TestLogger {
    log_path: PathBuf,
    writer: BufWriter<File>,
    test_name: String,
    start_time: DateTime<Utc>,
}

impl TestLogger {
    pub fn new(test_name: &str) -> Result<Self, TestLogError> {
        validate_test_name(test_name)?;

        let log_path = create_unique_test_log(test_name)?;
        let file = OpenOptions::new().create(true).write(true).truncate(true).open(&log_path)?;

        let mut logger = Self {
            log_path,
            writer: BufWriter::new(file),
            test_name: test_name.to_string(),
            start_time: Utc::now(),
        };
        logger.write_header()?;
        Ok(logger)
    }

    pub fn log(&mut self, message: &str) -> Result<(), TestLogError> {
        let timestamp = Utc::now().format("%H:%M:%S%.3f");
        writeln!(self.writer, "[{timestamp}] {message}").map_err(|_| self.write_error())?;
        self.writer.flush().map_err(|_| self.write_error())
    }

    /// Log structured data as pretty JSON under `label`.
    pub fn log_json<T: serde::Serialize>(&mut self, label: &str, data: &T) -> Result<(), TestLogError> {
        let json = serde_json::to_string_pretty(data).map_err(|_| self.write_error())?;
        self.log(&format!("{label}: {json}"))
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn finish_success(mut self) -> Result<PathBuf, TestLogError> {
        let elapsed = self.elapsed_secs();
        self.log(&format!("Test completed successfully in {elapsed:.3}s"))?;
        self.writer.flush().map_err(|_| self.write_error())?;
        println!("✅ {} passed", self.test_name);
        Ok(self.log_path)
    }

    /// Print the log location and size so the failure can be inspected.
    pub fn finish_failure(mut self, error_message: &str) -> Result<PathBuf, TestLogError> {
        let elapsed = self.elapsed_secs();
        self.log(&format!("Test failed after {elapsed:.3}s: {error_message}"))?;
        self.writer.flush().map_err(|_| self.write_error())?;

        match fs::metadata(&self.log_path) {
            Ok(metadata) => println!(
                "❌ {} failed - Log: {} ({} bytes)",
                self.test_name,
                self.log_path.display(),
                metadata.len()
            ),
            Err(_) => println!("❌ {} failed - Log: {}", self.test_name, self.log_path.display()),
        }
        Ok(self.log_path)
    }

    fn elapsed_secs(&self) -> f64 {
        Utc::now().signed_duration_since(self.start_time).num_milliseconds() as f64 / 1000.0
    }

    fn write_error(&self) -> TestLogError {
        TestLogError::Write {
            path: self.log_path.clone(),
        }
    }

    fn write_header(&mut self) -> Result<(), TestLogError> {
        writeln!(self.writer, "=== cf-console Test Log ===")?;
        writeln!(self.writer, "Test: {}", self.test_name)?;
        writeln!(self.writer, "Started: {}", self.start_time.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(self.writer, "Process: {}", std::process::id())?;
        if let Some(thread_name) = std::thread::current().name() {
            writeln!(self.writer, "Thread: {thread_name}")?;
        }
        writeln!(self.writer, "=== Log Output ===")?;
        writeln!(self.writer)?;
        self.writer.flush().map_err(|_| self.write_error())
    }
}

/// Unique log path `target/test-logs/YYYY-MM-DD/<name>-HH-MM-SS-<uuid>.log`.
pub fn create_unique_test_log(test_name: &str) -> Result<PathBuf, TestLogError> {
    let now = Utc::now();
    let log_dir = find_workspace_root()
        .join("target")
        .join("test-logs")
        .join(now.format("%Y-%m-%d").to_string());
    fs::create_dir_all(&log_dir)?;

    let filename = format!(
        "{}-{}-{}.log",
        sanitize_filename(test_name),
        now.format("%H-%M-%S"),
        Uuid::new_v4()
    );
    Ok(log_dir.join(filename))
}

fn find_workspace_root() -> PathBuf {
    let Ok(current_dir) = env::current_dir() else {
        return env::temp_dir();
    };

    let mut dir = current_dir.as_path();
    loop {
        let cargo_toml = dir.join("Cargo.toml");
        if fs::read_to_string(&cargo_toml).is_ok_and(|content| content.contains("[workspace]")) {
            return dir.to_path_buf();
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return current_dir,
        }
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' => c,
            _ => '_',
        })
        .collect()
}

fn validate_test_name(name: &str) -> Result<(), TestLogError> {
    if name.is_empty() || name.len() > 200 {
        return Err(TestLogError::InvalidTestName {
            name: name.chars().take(40).collect(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test_normal"), "test_normal");
        assert_eq!(sanitize_filename("test with spaces"), "test_with_spaces");
        assert_eq!(sanitize_filename("mod::test/name"), "mod__test_name");
    }

    #[test]
    fn test_validate_test_name() {
        assert!(validate_test_name("valid_test").is_ok());
        assert!(validate_test_name("").is_err());
        assert!(validate_test_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_unique_paths_and_success_flow() {
        let first = create_unique_test_log("unique_one").unwrap();
        let second = create_unique_test_log("unique_one").unwrap();
        assert_ne!(first, second);

        let mut logger = TestLogger::new("test_unique_paths_and_success_flow").unwrap();
        logger.log("step").unwrap();
        logger.log_json("payload", &serde_json::json!({"instances": 3})).unwrap();
        let path = logger.finish_success().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("=== cf-console Test Log ==="));
        assert!(content.contains("\"instances\": 3"));
        fs::remove_file(path).unwrap();
    }
}
