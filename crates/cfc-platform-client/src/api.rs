// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::error::PlatformResult;
use crate::types::{AppEntity, AppSummary};
use async_trait::async_trait;

/// Platform operations needed to run a console session.
///
/// Every operation is idempotent: reads, or writes of absolute values.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Find an application by name inside a space.
    async fn lookup_app(&self, space_guid: &str, name: &str) -> PlatformResult<(String, AppEntity)>;

    async fn get_summary(&self, guid: &str) -> PlatformResult<AppSummary>;

    async fn set_instance_count(&self, guid: &str, instances: u32) -> PlatformResult<()>;

    async fn set_start_command(&self, guid: &str, command: &str) -> PlatformResult<()>;

    /// Recent log window of an application, oldest line first.
    async fn fetch_recent_logs(&self, app_name: &str) -> PlatformResult<Vec<String>>;
}
