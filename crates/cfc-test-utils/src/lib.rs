// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! cf-console test utilities

pub mod handoff;
pub mod logging;
pub mod platform;

pub use handoff::RecordingHandoff;
pub use logging::{create_unique_test_log, TestLogError, TestLogger};
pub use platform::{Call, FakePlatform, Operation};
