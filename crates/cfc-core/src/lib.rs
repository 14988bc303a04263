// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Console sessions against a Cloud Foundry application.
//!
//! A session temporarily rewires the app's start command to launch a
//! remote-access helper, scales an extra instance on legacy backends,
//! discovers the helper's endpoint in the app logs and hands the terminal to
//! an interactive program. The app's original settings are written back on
//! every exit path once mutation has begun.

pub mod bootstrap;
pub mod error;
pub mod handoff;
pub mod log_scanner;
pub mod orchestrator;
pub mod session;
pub mod status;
pub mod timestamp;

pub use error::{exit_code, ConsoleError};
pub use handoff::{HandoffError, HandoffExit, SessionHandoff, SshHandoff};
pub use log_scanner::{source_tag, Announcement, Endpoint, LogPattern, LogScanner, ScanError};
pub use orchestrator::{ConsoleOptions, ConsoleOrchestrator, Phase, SessionOutcome, SessionReport};
pub use session::{RestoreReport, Restorer, SessionState};
pub use status::StatusReporter;
pub use timestamp::Timestamp;
