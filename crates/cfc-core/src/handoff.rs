// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Interactive hand-off to the discovered endpoint

use crate::log_scanner::Endpoint;
use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for {binary}: {source}")]
    Wait {
        binary: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffExit {
    /// The interactive program exited on its own
    Finished,
    /// Cancellation arrived first and the program was terminated
    Cancelled,
}

/// Gives the user's terminal to an interactive program connected to `endpoint`.
#[async_trait]
pub trait SessionHandoff: Send + Sync {
    async fn connect(&self, endpoint: &Endpoint, cancel: &CancellationToken) -> Result<HandoffExit, HandoffError>;
}

/// Runs `<binary> [args...] <endpoint>` on the inherited terminal
#[derive(Debug, Clone)]
pub struct SshHandoff {
    binary: String,
    args: Vec<String>,
}

impl SshHandoff {
    pub fn new(binary: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
        }
    }

    pub fn command_line(&self, endpoint: &Endpoint) -> Vec<String> {
        let mut line = Vec::with_capacity(self.args.len() + 2);
        line.push(self.binary.clone());
        line.extend(self.args.iter().cloned());
        line.push(endpoint.address.clone());
        line
    }
}

#[async_trait]
impl SessionHandoff for SshHandoff {
    async fn connect(&self, endpoint: &Endpoint, cancel: &CancellationToken) -> Result<HandoffExit, HandoffError> {
        debug!(command = ?self.command_line(endpoint), "starting interactive hand-off");

        let mut child = Command::new(&self.binary)
            .args(&self.args)
            .arg(&endpoint.address)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| HandoffError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|source| HandoffError::Wait {
                    binary: self.binary.clone(),
                    source,
                })?;
                debug!(status = ?status.code(), "hand-off exited");
                Ok(HandoffExit::Finished)
            }
            _ = cancel.cancelled() => {
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to terminate hand-off");
                }
                Ok(HandoffExit::Cancelled)
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn endpoint() -> Endpoint {
        Endpoint {
            address: "abc@nyc1.tmate.io".into(),
            instance_index: 0,
            observed_at: "2016-06-14T13:00:00.00-0700".parse().unwrap(),
        }
    }

    #[test]
    fn test_command_line_places_endpoint_last() {
        let handoff = SshHandoff::new("ssh", vec!["-o".into(), "StrictHostKeyChecking=no".into()]);
        assert_eq!(
            handoff.command_line(&endpoint()),
            vec!["ssh", "-o", "StrictHostKeyChecking=no", "abc@nyc1.tmate.io"]
        );
    }

    #[tokio::test]
    async fn test_exit_status_is_not_inspected() {
        let handoff = SshHandoff::new("false", vec![]);
        let exit = handoff.connect(&endpoint(), &CancellationToken::new()).await.unwrap();
        assert_eq!(exit, HandoffExit::Finished);
    }

    #[tokio::test]
    async fn test_cancellation_terminates_child() {
        // The endpoint lands in $0 of the shell script.
        let handoff = SshHandoff::new("sh", vec!["-c".into(), "sleep 30".into()]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let exit = tokio::time::timeout(Duration::from_secs(10), handoff.connect(&endpoint(), &cancel))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(exit, HandoffExit::Cancelled);
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let handoff = SshHandoff::new("/nonexistent/ssh", vec![]);
        let err = handoff.connect(&endpoint(), &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, HandoffError::Spawn { .. }));
    }
}
