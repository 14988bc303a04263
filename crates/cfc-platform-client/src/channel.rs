// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Command channel to the host platform CLI

use crate::error::{PlatformError, PlatformResult};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, trace};

/// Executes one host CLI invocation and returns its stdout lines.
///
/// The host CLI carries authentication and targeting, so every platform
/// call goes through this seam.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    async fn run(&self, args: &[String]) -> PlatformResult<Vec<String>>;
}

/// Spawns the `cf` binary for each call
#[derive(Debug, Clone)]
pub struct CfCliChannel {
    binary: String,
    timeout: Duration,
}

impl CfCliChannel {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

#[async_trait]
impl CommandChannel for CfCliChannel {
    async fn run(&self, args: &[String]) -> PlatformResult<Vec<String>> {
        let rendered = args.join(" ");
        debug!(binary = %self.binary, command = %rendered, "invoking host CLI");

        let child = Command::new(&self.binary)
            .args(args)
            .env("CF_COLOR", "false")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PlatformError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| PlatformError::Spawn {
                binary: self.binary.clone(),
                source,
            })?,
            Err(_) => {
                return Err(PlatformError::Timeout {
                    command: rendered,
                    timeout: self.timeout,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<String> = stdout.lines().map(str::to_string).collect();
        trace!(command = %rendered, lines = lines.len(), "host CLI returned");

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = failure_message(&stderr, &lines);
            return Err(PlatformError::CommandFailed {
                command: rendered,
                status: output.status.code().unwrap_or(-1),
                message,
            });
        }

        Ok(lines)
    }
}

/// The cf CLI prints most failures on stdout, so fall back to its tail.
fn failure_message(stderr: &str, stdout_lines: &[String]) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let tail: Vec<&str> = stdout_lines
        .iter()
        .rev()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .take(3)
        .collect();
    if tail.is_empty() {
        "no output".to_string()
    } else {
        tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
    }
}
