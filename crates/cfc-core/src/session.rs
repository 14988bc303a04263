// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-session state and the one-shot restoration of the app's settings

use crate::log_scanner::Endpoint;
use cfc_platform_client::{AppEntity, BackendKind, PlatformApi};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::OnceCell;
use tracing::{error, info};

/// What a console session changed and found. Never persisted.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub app_name: String,
    pub guid: String,
    pub backend: BackendKind,
    pub original_instances: u32,
    /// Explicit start command as configured, possibly empty
    pub original_command: String,
    /// Command the app effectively runs, used when chaining the bootstrap
    pub effective_command: String,
    pub target_index: u32,
    pub provisioned: bool,
    pub endpoint: Option<Endpoint>,
}

impl SessionState {
    pub fn new(app_name: &str, guid: String, entity: &AppEntity, backend: BackendKind, target_index: u32) -> Self {
        Self {
            app_name: app_name.to_string(),
            guid,
            backend,
            original_instances: entity.instances,
            original_command: entity.command.clone(),
            effective_command: entity.effective_start_command().to_string(),
            target_index,
            provisioned: false,
            endpoint: None,
        }
    }
}

/// Result of writing back the original settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreReport {
    /// Nothing was mutated, so nothing was written
    NotNeeded,
    Restored,
    Failed {
        instances_error: Option<String>,
        command_error: Option<String>,
    },
}

impl RestoreReport {
    pub fn is_failure(&self) -> bool {
        matches!(self, RestoreReport::Failed { .. })
    }
}

impl std::fmt::Display for RestoreReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreReport::NotNeeded => write!(f, "nothing to restore"),
            RestoreReport::Restored => write!(f, "original settings restored"),
            RestoreReport::Failed {
                instances_error,
                command_error,
            } => {
                let mut parts = Vec::new();
                if let Some(e) = instances_error {
                    parts.push(format!("instance count: {e}"));
                }
                if let Some(e) = command_error {
                    parts.push(format!("start command: {e}"));
                }
                write!(f, "restoration failed ({})", parts.join("; "))
            }
        }
    }
}

/// Writes the original instance count and start command back at most once.
///
/// Every exit path may call [`Restorer::restore`]; only the first call
/// touches the platform and later calls return the first outcome.
#[derive(Debug)]
pub struct Restorer {
    guid: String,
    instances: u32,
    command: String,
    armed: AtomicBool,
    outcome: OnceCell<RestoreReport>,
}

impl Restorer {
    pub fn new(state: &SessionState) -> Self {
        Self {
            guid: state.guid.clone(),
            instances: state.original_instances,
            command: state.original_command.clone(),
            armed: AtomicBool::new(false),
            outcome: OnceCell::new(),
        }
    }

    /// Must be called before the first mutation.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub async fn restore<P>(&self, platform: &P) -> RestoreReport
    where
        P: PlatformApi + ?Sized,
    {
        self.outcome
            .get_or_init(|| async {
                if !self.is_armed() {
                    return RestoreReport::NotNeeded;
                }
                self.write_back(platform).await
            })
            .await
            .clone()
    }

    async fn write_back<P>(&self, platform: &P) -> RestoreReport
    where
        P: PlatformApi + ?Sized,
    {
        let instances_error = platform
            .set_instance_count(&self.guid, self.instances)
            .await
            .err()
            .map(|e| e.to_string());
        let command_error = platform
            .set_start_command(&self.guid, &self.command)
            .await
            .err()
            .map(|e| e.to_string());

        if instances_error.is_none() && command_error.is_none() {
            info!(guid = %self.guid, instances = self.instances, "restored original settings");
            RestoreReport::Restored
        } else {
            error!(
                guid = %self.guid,
                instances_error = instances_error.as_deref().unwrap_or("-"),
                command_error = command_error.as_deref().unwrap_or("-"),
                "failed to restore original settings"
            );
            RestoreReport::Failed {
                instances_error,
                command_error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_report_lists_both_parts() {
        let report = RestoreReport::Failed {
            instances_error: Some("timed out".into()),
            command_error: None,
        };
        assert!(report.is_failure());
        assert_eq!(report.to_string(), "restoration failed (instance count: timed out)");
        assert!(!RestoreReport::Restored.is_failure());
    }

    #[test]
    fn test_state_keeps_explicit_and_effective_commands() {
        let entity = AppEntity {
            name: "foo".into(),
            instances: 2,
            command: String::new(),
            detected_start_command: "bundle exec rackup".into(),
            ..AppEntity::default()
        };
        let state = SessionState::new("foo", "guid".into(), &entity, BackendKind::Legacy, 2);
        assert_eq!(state.original_command, "");
        assert_eq!(state.effective_command, "bundle exec rackup");
        assert!(!state.provisioned);
    }
}
