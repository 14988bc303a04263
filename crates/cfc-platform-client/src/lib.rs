// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Cloud Foundry platform access for cf-console.
//!
//! Calls go through the host `cf` CLI, which already holds the user's
//! authentication and target.

pub mod api;
pub mod channel;
pub mod client;
pub mod error;
pub mod session;
pub mod types;

pub use api::PlatformApi;
pub use channel::{CfCliChannel, CommandChannel};
pub use client::{PlatformClient, RetryPolicy};
pub use error::{PlatformError, PlatformResult};
pub use session::{HostSession, SessionError, TargetRef};
pub use types::{AppEntity, AppSummary, BackendKind};
