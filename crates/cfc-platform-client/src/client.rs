// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! `PlatformApi` over a command channel

use crate::api::PlatformApi;
use crate::channel::{CfCliChannel, CommandChannel};
use crate::error::{PlatformError, PlatformResult};
use crate::types::{ApiErrorEnvelope, AppEntity, AppSearchResults, AppSummary};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const BACKOFF_MIN: Duration = Duration::from_millis(250);
const BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Retry schedule for transport-level failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            initial_backoff: BACKOFF_MIN,
            max_backoff: BACKOFF_MAX,
        }
    }
}

impl RetryPolicy {
    pub fn with_retries(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    pub fn no_retries() -> Self {
        Self::with_retries(0)
    }

    /// Delay before retry number `attempt` (1-based), doubling up to the cap.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// Platform client that speaks to the API through the host CLI
#[derive(Debug, Clone)]
pub struct PlatformClient<C = CfCliChannel> {
    channel: C,
    retry: RetryPolicy,
}

impl PlatformClient<CfCliChannel> {
    /// Client spawning `binary` with a per-call timeout.
    pub fn from_cli(binary: impl Into<String>, call_timeout: Duration, retry: RetryPolicy) -> Self {
        Self::new(CfCliChannel::new(binary, call_timeout), retry)
    }
}

impl<C: CommandChannel> PlatformClient<C> {
    pub fn new(channel: C, retry: RetryPolicy) -> Self {
        Self { channel, retry }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    async fn run_with_retry(&self, args: Vec<String>) -> PlatformResult<Vec<String>> {
        let mut attempt = 0;
        loop {
            match self.channel.run(&args).await {
                Ok(lines) => return Ok(lines),
                Err(err) if err.is_retryable() && attempt < self.retry.retries => {
                    attempt += 1;
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        operation = %args.join(" "),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "platform call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn curl_get<T: DeserializeOwned>(&self, path: &str) -> PlatformResult<T> {
        let args = vec!["curl".to_string(), path.to_string()];
        let lines = self.run_with_retry(args).await?;
        decode_json(&format!("curl {path}"), &lines)
    }

    async fn curl_put<B: Serialize>(&self, path: &str, body: &B) -> PlatformResult<()> {
        let command = format!("curl {path} -X PUT");
        let body = serde_json::to_string(body).map_err(|e| PlatformError::Decode {
            command: command.clone(),
            reason: format!("cannot encode request body: {e}"),
        })?;
        let args = vec![
            "curl".to_string(),
            path.to_string(),
            "-X".to_string(),
            "PUT".to_string(),
            "-d".to_string(),
            body,
        ];
        let lines = self.run_with_retry(args).await?;
        let _: serde_json::Value = decode_json(&command, &lines)?;
        Ok(())
    }
}

/// Decode a `cf curl` response, surfacing platform error envelopes.
fn decode_json<T: DeserializeOwned>(command: &str, lines: &[String]) -> PlatformResult<T> {
    let body = lines.join("\n");
    if body.trim().is_empty() {
        return Err(PlatformError::Decode {
            command: command.to_string(),
            reason: "empty response".to_string(),
        });
    }

    let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| PlatformError::Decode {
        command: command.to_string(),
        reason: e.to_string(),
    })?;

    if let Some(envelope) = ApiErrorEnvelope::detect(&value) {
        return Err(PlatformError::Api {
            command: command.to_string(),
            code: envelope.code(),
            description: envelope.description(),
        });
    }

    serde_json::from_value(value).map_err(|e| PlatformError::Decode {
        command: command.to_string(),
        reason: e.to_string(),
    })
}

fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[derive(Serialize)]
struct InstancesUpdate {
    instances: u32,
}

#[derive(Serialize)]
struct CommandUpdate<'a> {
    command: &'a str,
}

#[async_trait]
impl<C: CommandChannel> PlatformApi for PlatformClient<C> {
    async fn lookup_app(&self, space_guid: &str, name: &str) -> PlatformResult<(String, AppEntity)> {
        let path = format!(
            "/v2/spaces/{space_guid}/apps?q=name:{}&inline-relations-depth=1",
            encode_query_value(name)
        );
        let results: AppSearchResults = self.curl_get(&path).await?;

        let mut resources = results.resources.into_iter();
        let Some(first) = resources.next() else {
            return Err(PlatformError::AppNotFound {
                name: name.to_string(),
                space: space_guid.to_string(),
            });
        };
        let extra = resources.count();
        if extra > 0 {
            warn!(app = name, matches = extra + 1, "name lookup matched several apps, using the first");
        }

        debug!(app = name, guid = %first.metadata.guid, instances = first.entity.instances, "resolved application");
        Ok((first.metadata.guid, first.entity))
    }

    async fn get_summary(&self, guid: &str) -> PlatformResult<AppSummary> {
        self.curl_get(&format!("/v2/apps/{guid}/summary")).await
    }

    async fn set_instance_count(&self, guid: &str, instances: u32) -> PlatformResult<()> {
        debug!(guid, instances, "updating instance count");
        self.curl_put(&format!("/v2/apps/{guid}"), &InstancesUpdate { instances }).await
    }

    async fn set_start_command(&self, guid: &str, command: &str) -> PlatformResult<()> {
        debug!(guid, command, "updating start command");
        self.curl_put(&format!("/v2/apps/{guid}"), &CommandUpdate { command }).await
    }

    async fn fetch_recent_logs(&self, app_name: &str) -> PlatformResult<Vec<String>> {
        let args = vec!["logs".to_string(), app_name.to_string(), "--recent".to_string()];
        self.run_with_retry(args).await
    }
}
