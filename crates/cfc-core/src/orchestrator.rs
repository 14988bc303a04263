// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Console session lifecycle.
//!
//! ```text
//! Init -> Resolving -> Provisioning | SkipProvisioning -> MarkingHighWater
//!      -> Waiting -> Connected -> Restoring -> Done
//! ```
//!
//! `Interrupted` is entered from any phase after resolution when the
//! cancellation token fires and always leads to `Restoring`. Failures before
//! the first mutation return without touching the app.

use crate::bootstrap::bootstrap_command;
use crate::error::ConsoleError;
use crate::handoff::{HandoffExit, SessionHandoff};
use crate::log_scanner::{LogPattern, LogScanner, ScanError};
use crate::session::{RestoreReport, Restorer, SessionState};
use crate::status::StatusReporter;
use cfc_config::{ConsoleSettings, InstanceIndexPolicy};
use cfc_platform_client::{AppEntity, BackendKind, HostSession, PlatformApi};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Resolving,
    Provisioning,
    SkipProvisioning,
    MarkingHighWater,
    Waiting,
    Connected,
    Interrupted,
    Restoring,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::Resolving => "resolving",
            Phase::Provisioning => "provisioning",
            Phase::SkipProvisioning => "skip-provisioning",
            Phase::MarkingHighWater => "marking-high-water",
            Phase::Waiting => "waiting",
            Phase::Connected => "connected",
            Phase::Interrupted => "interrupted",
            Phase::Restoring => "restoring",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The interactive session ran and ended on its own
    Completed,
    /// The user cancelled; restoration still ran
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub state: SessionState,
    pub phases: Vec<Phase>,
    pub restore: RestoreReport,
}

/// Per-session knobs derived from the settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleOptions {
    pub bootstrap_url: String,
    pub legacy_index: InstanceIndexPolicy,
    pub next_gen_index: InstanceIndexPolicy,
}

impl ConsoleOptions {
    pub fn from_settings(settings: &ConsoleSettings) -> Self {
        Self {
            bootstrap_url: settings.bootstrap_url.clone(),
            legacy_index: settings.legacy_instance_index,
            next_gen_index: settings.next_gen_instance_index,
        }
    }

    pub fn index_policy(&self, backend: BackendKind) -> InstanceIndexPolicy {
        match backend {
            BackendKind::Legacy => self.legacy_index,
            BackendKind::NextGeneration => self.next_gen_index,
        }
    }
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self::from_settings(&ConsoleSettings::default())
    }
}

pub struct ConsoleOrchestrator<P, H> {
    platform: P,
    handoff: H,
    scanner: LogScanner,
    options: ConsoleOptions,
    status: StatusReporter,
}

impl<P, H> ConsoleOrchestrator<P, H>
where
    P: PlatformApi,
    H: SessionHandoff,
{
    pub fn new(platform: P, handoff: H, scanner: LogScanner, options: ConsoleOptions) -> Self {
        Self {
            platform,
            handoff,
            scanner,
            options,
            status: StatusReporter::default(),
        }
    }

    pub fn from_settings(platform: P, handoff: H, settings: &ConsoleSettings) -> Result<Self, ConsoleError> {
        let pattern = LogPattern::new(&settings.endpoint_domain)?;
        let scanner = LogScanner::new(pattern, settings.poll_interval(), settings.max_wait());
        Ok(Self::new(platform, handoff, scanner, ConsoleOptions::from_settings(settings)))
    }

    pub fn with_status(mut self, status: StatusReporter) -> Self {
        self.status = status;
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn handoff(&self) -> &H {
        &self.handoff
    }

    /// Open a console to `app_name` in the host session's space.
    pub async fn run(
        &self,
        host: &HostSession,
        app_name: &str,
        cancel: &CancellationToken,
    ) -> Result<SessionReport, ConsoleError> {
        let mut phases = vec![Phase::Init];

        self.enter(&mut phases, Phase::Resolving);
        self.status.step(&format!(
            "Looking up {app_name} in {} / {}",
            host.organization.name, host.space.name
        ));
        let (guid, entity) = self
            .platform
            .lookup_app(&host.space.guid, app_name)
            .await
            .map_err(|e| ConsoleError::platform("application lookup", e))?;
        let summary = self
            .platform
            .get_summary(&guid)
            .await
            .map_err(|e| ConsoleError::platform("application summary", e))?;

        let backend = summary.backend_kind();
        let target_index = self.options.index_policy(backend).resolve(entity.instances);
        let mut state = SessionState::new(app_name, guid, &entity, backend, target_index);
        self.status.step(&describe_app(app_name, &entity, backend));
        info!(
            app = app_name,
            guid = %state.guid,
            instances = state.original_instances,
            backend = %backend,
            index = target_index,
            "resolved application"
        );

        let restorer = Restorer::new(&state);
        let result = if cancel.is_cancelled() {
            self.enter(&mut phases, Phase::Interrupted);
            Ok(SessionOutcome::Interrupted)
        } else {
            restorer.arm();
            self.drive(&mut state, &mut phases, cancel).await
        };

        let restore = if restorer.is_armed() {
            self.enter(&mut phases, Phase::Restoring);
            if state.provisioned {
                self.status.step(&format!(
                    "Restoring {} instance(s) and the original start command",
                    state.original_instances
                ));
            } else {
                self.status.step("Confirming the original instance count and start command");
            }
            restorer.restore(&self.platform).await
        } else {
            RestoreReport::NotNeeded
        };
        self.enter(&mut phases, Phase::Done);

        if restore.is_failure() {
            self.status.failure(&restore.to_string());
        }

        match result {
            Ok(_) if restore.is_failure() => Err(ConsoleError::Restore(restore)),
            Ok(outcome) => Ok(SessionReport {
                outcome,
                state,
                phases,
                restore,
            }),
            Err(err) => Err(err),
        }
    }

    async fn drive(
        &self,
        state: &mut SessionState,
        phases: &mut Vec<Phase>,
        cancel: &CancellationToken,
    ) -> Result<SessionOutcome, ConsoleError> {
        match state.backend {
            BackendKind::Legacy => {
                self.enter(phases, Phase::Provisioning);
                let command = bootstrap_command(&self.options.bootstrap_url, &state.effective_command);
                self.status.step(&format!("Updating app start command to '{command}'"));
                self.platform
                    .set_start_command(&state.guid, &command)
                    .await
                    .map_err(|e| ConsoleError::platform("start command update", e))?;
                state.provisioned = true;

                let scaled = state.original_instances + 1;
                self.status.step(&format!("Changing instance count to {scaled}"));
                self.platform
                    .set_instance_count(&state.guid, scaled)
                    .await
                    .map_err(|e| ConsoleError::platform("instance count update", e))?;
            }
            BackendKind::NextGeneration => {
                self.enter(phases, Phase::SkipProvisioning);
                self.status.step("Next-generation backend, no extra instance needed");
            }
        }

        if cancel.is_cancelled() {
            return Ok(self.interrupted(phases));
        }

        self.enter(phases, Phase::MarkingHighWater);
        self.status.step("Checking app log timestamps");
        let mark = self.scanner.latest_timestamp(&self.platform, &state.app_name).await?;

        self.enter(phases, Phase::Waiting);
        self.status.step("Waiting for the remote endpoint");
        let endpoint = match self
            .scanner
            .await_new_endpoint(
                &self.platform,
                &state.app_name,
                state.backend,
                state.target_index,
                &mark,
                cancel,
            )
            .await
        {
            Ok(endpoint) => endpoint,
            Err(ScanError::Cancelled) => return Ok(self.interrupted(phases)),
            Err(err) => return Err(err.into()),
        };
        state.endpoint = Some(endpoint.clone());

        if cancel.is_cancelled() {
            return Ok(self.interrupted(phases));
        }

        self.enter(phases, Phase::Connected);
        self.status.step(&format!("Connecting to {endpoint}"));
        match self.handoff.connect(&endpoint, cancel).await? {
            HandoffExit::Finished => Ok(SessionOutcome::Completed),
            HandoffExit::Cancelled => Ok(self.interrupted(phases)),
        }
    }

    fn interrupted(&self, phases: &mut Vec<Phase>) -> SessionOutcome {
        self.enter(phases, Phase::Interrupted);
        self.status.warning("Interrupted");
        SessionOutcome::Interrupted
    }

    fn enter(&self, phases: &mut Vec<Phase>, phase: Phase) {
        debug!(from = ?phases.last(), to = %phase, "session phase");
        phases.push(phase);
    }
}

fn describe_app(app_name: &str, entity: &AppEntity, backend: BackendKind) -> String {
    match entity.buildpack_info() {
        "" => format!("Found {app_name} on the {backend} backend"),
        buildpack => format!("Found {app_name} ({buildpack}) on the {backend} backend"),
    }
}
