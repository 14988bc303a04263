// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! In-memory platform used by orchestration tests

use async_trait::async_trait;
use cfc_platform_client::{AppEntity, AppSummary, PlatformApi, PlatformError, PlatformResult};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Operations a failure can be injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LookupApp,
    GetSummary,
    SetInstanceCount,
    SetStartCommand,
    FetchRecentLogs,
}

/// One recorded platform call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    LookupApp { space: String, name: String },
    GetSummary { guid: String },
    SetInstanceCount { guid: String, instances: u32 },
    SetStartCommand { guid: String, command: String },
    FetchRecentLogs { app: String },
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Call::SetInstanceCount { .. } | Call::SetStartCommand { .. })
    }
}

#[derive(Debug, Clone)]
struct FakeApp {
    space: String,
    guid: String,
    entity: AppEntity,
    diego: bool,
}

#[derive(Default)]
struct FakeState {
    apps: Vec<FakeApp>,
    log_windows: VecDeque<Vec<String>>,
    journal: Vec<Call>,
    failures: HashMap<Operation, VecDeque<PlatformError>>,
    fetches: usize,
    cancel_on_fetch: Option<(usize, CancellationToken)>,
    fetch_delay: Option<Duration>,
}

/// Platform fake with app state, scripted log windows and a call journal.
///
/// Each log fetch consumes the next scripted window; the last window is
/// repeated once the script runs out.
#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app(self, space: &str, guid: &str, entity: AppEntity, diego: bool) -> Self {
        self.lock().apps.push(FakeApp {
            space: space.to_string(),
            guid: guid.to_string(),
            entity,
            diego,
        });
        self
    }

    pub fn with_log_window<S: AsRef<str>>(self, lines: &[S]) -> Self {
        self.push_log_window(lines);
        self
    }

    pub fn push_log_window<S: AsRef<str>>(&self, lines: &[S]) {
        let window = lines.iter().map(|l| l.as_ref().to_string()).collect();
        self.lock().log_windows.push_back(window);
    }

    /// Hold every log fetch for `delay` before it is served.
    pub fn with_fetch_delay(self, delay: Duration) -> Self {
        self.lock().fetch_delay = Some(delay);
        self
    }

    /// Make the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: Operation, error: PlatformError) {
        self.lock().failures.entry(operation).or_default().push_back(error);
    }

    /// Cancel `token` while serving the `nth` log fetch (1-based).
    pub fn cancel_on_fetch(&self, nth: usize, token: CancellationToken) {
        self.lock().cancel_on_fetch = Some((nth, token));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().journal.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.lock().journal.iter().filter(|c| c.is_mutation()).cloned().collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    /// Current `(instances, command)` of the app with `guid`.
    pub fn app_settings(&self, guid: &str) -> Option<(u32, String)> {
        self.lock()
            .apps
            .iter()
            .find(|a| a.guid == guid)
            .map(|a| (a.entity.instances, a.entity.command.clone()))
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self, operation: Operation, call: Call) -> PlatformResult<MutexGuard<'_, FakeState>> {
        let mut state = self.lock();
        state.journal.push(call);
        if let Some(error) = state.failures.get_mut(&operation).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        Ok(state)
    }
}

fn unknown_guid(guid: &str) -> PlatformError {
    PlatformError::Api {
        command: format!("curl /v2/apps/{guid}"),
        code: "CF-AppNotFound".to_string(),
        description: format!("The app could not be found: {guid}"),
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn lookup_app(&self, space_guid: &str, name: &str) -> PlatformResult<(String, AppEntity)> {
        let call = Call::LookupApp {
            space: space_guid.to_string(),
            name: name.to_string(),
        };
        let state = self.begin(Operation::LookupApp, call)?;
        state
            .apps
            .iter()
            .find(|a| a.space == space_guid && a.entity.name == name)
            .map(|a| (a.guid.clone(), a.entity.clone()))
            .ok_or_else(|| PlatformError::AppNotFound {
                name: name.to_string(),
                space: space_guid.to_string(),
            })
    }

    async fn get_summary(&self, guid: &str) -> PlatformResult<AppSummary> {
        let state = self.begin(Operation::GetSummary, Call::GetSummary { guid: guid.to_string() })?;
        let app = state.apps.iter().find(|a| a.guid == guid).ok_or_else(|| unknown_guid(guid))?;
        Ok(AppSummary {
            guid: app.guid.clone(),
            name: app.entity.name.clone(),
            diego: app.diego,
        })
    }

    async fn set_instance_count(&self, guid: &str, instances: u32) -> PlatformResult<()> {
        let call = Call::SetInstanceCount {
            guid: guid.to_string(),
            instances,
        };
        let mut state = self.begin(Operation::SetInstanceCount, call)?;
        let app = state.apps.iter_mut().find(|a| a.guid == guid).ok_or_else(|| unknown_guid(guid))?;
        app.entity.instances = instances;
        Ok(())
    }

    async fn set_start_command(&self, guid: &str, command: &str) -> PlatformResult<()> {
        let call = Call::SetStartCommand {
            guid: guid.to_string(),
            command: command.to_string(),
        };
        let mut state = self.begin(Operation::SetStartCommand, call)?;
        let app = state.apps.iter_mut().find(|a| a.guid == guid).ok_or_else(|| unknown_guid(guid))?;
        app.entity.command = command.to_string();
        Ok(())
    }

    async fn fetch_recent_logs(&self, app_name: &str) -> PlatformResult<Vec<String>> {
        let delay = self.lock().fetch_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let call = Call::FetchRecentLogs {
            app: app_name.to_string(),
        };
        let mut state = self.begin(Operation::FetchRecentLogs, call)?;
        state.fetches += 1;
        if let Some((nth, token)) = &state.cancel_on_fetch {
            if *nth == state.fetches {
                token.cancel();
            }
        }
        let window = if state.log_windows.len() > 1 {
            state.log_windows.pop_front().unwrap_or_default()
        } else {
            state.log_windows.front().cloned().unwrap_or_default()
        };
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foo() -> AppEntity {
        AppEntity {
            name: "foo".into(),
            instances: 2,
            command: "node app.js".into(),
            ..AppEntity::default()
        }
    }

    #[tokio::test]
    async fn test_mutations_are_journaled_and_applied() {
        let platform = FakePlatform::new().with_app("space", "foo-guid", foo(), false);

        platform.set_instance_count("foo-guid", 3).await.unwrap();
        platform.set_start_command("foo-guid", "sleep 1").await.unwrap();

        assert_eq!(platform.app_settings("foo-guid"), Some((3, "sleep 1".to_string())));
        assert_eq!(platform.mutations().len(), 2);
    }

    #[tokio::test]
    async fn test_windows_advance_then_repeat() {
        let platform = FakePlatform::new().with_log_window(&["a"]).with_log_window(&["b"]);

        assert_eq!(platform.fetch_recent_logs("foo").await.unwrap(), vec!["a"]);
        assert_eq!(platform.fetch_recent_logs("foo").await.unwrap(), vec!["b"]);
        assert_eq!(platform.fetch_recent_logs("foo").await.unwrap(), vec!["b"]);
        assert_eq!(platform.fetch_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_delay_holds_the_window() {
        let platform = FakePlatform::new()
            .with_log_window(&["a"])
            .with_fetch_delay(Duration::from_secs(30));

        let started = tokio::time::Instant::now();
        assert_eq!(platform.fetch_recent_logs("foo").await.unwrap(), vec!["a"]);
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let platform = FakePlatform::new().with_app("space", "foo-guid", foo(), false);
        platform.fail_next(
            Operation::GetSummary,
            PlatformError::CommandFailed {
                command: "curl".into(),
                status: 1,
                message: "boom".into(),
            },
        );

        assert!(platform.get_summary("foo-guid").await.is_err());
        assert!(!platform.get_summary("foo-guid").await.unwrap().diego);
    }
}
