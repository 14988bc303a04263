// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for platform calls

use std::time::Duration;
use thiserror::Error;

pub type PlatformResult<T> = Result<T, PlatformError>;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("failed to launch {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("`{command}` exited with status {status}: {message}")]
    CommandFailed {
        command: String,
        status: i32,
        message: String,
    },

    #[error("malformed response to `{command}`: {reason}")]
    Decode { command: String, reason: String },

    #[error("platform rejected `{command}`: {description} ({code})")]
    Api {
        command: String,
        code: String,
        description: String,
    },

    #[error("no application named '{name}' in space {space}")]
    AppNotFound { name: String, space: String },
}

impl PlatformError {
    /// Failures worth another attempt: the call may not have reached the
    /// platform, and every call we issue is safe to repeat.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlatformError::Timeout { .. } | PlatformError::CommandFailed { .. })
    }

    pub fn is_lookup(&self) -> bool {
        matches!(self, PlatformError::AppNotFound { .. })
    }
}
