// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::handoff::HandoffError;
use crate::log_scanner::ScanError;
use crate::session::RestoreReport;
use cfc_platform_client::PlatformError;
use thiserror::Error;

/// Process exit codes reported by the console command
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const CONFIGURATION: i32 = 2;
    pub const LOOKUP: i32 = 3;
    pub const TRANSPORT: i32 = 4;
    pub const TIMEOUT: i32 = 5;
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("{0}")]
    Lookup(#[source] PlatformError),

    #[error("{operation} failed: {source}")]
    Platform {
        operation: &'static str,
        #[source]
        source: PlatformError,
    },

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Handoff(#[from] HandoffError),

    #[error("invalid endpoint pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The session itself succeeded but the app was left modified
    #[error("{0}")]
    Restore(RestoreReport),
}

impl ConsoleError {
    pub fn platform(operation: &'static str, source: PlatformError) -> Self {
        if source.is_lookup() {
            ConsoleError::Lookup(source)
        } else {
            ConsoleError::Platform { operation, source }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ConsoleError::Lookup(_) => exit_code::LOOKUP,
            ConsoleError::Platform { .. } => exit_code::TRANSPORT,
            ConsoleError::Scan(ScanError::Timeout { .. }) => exit_code::TIMEOUT,
            ConsoleError::Scan(ScanError::Platform(_))
            | ConsoleError::Scan(ScanError::EmptyLogs { .. })
            | ConsoleError::Scan(ScanError::NoTimestamp { .. }) => exit_code::TRANSPORT,
            ConsoleError::Pattern(_) => exit_code::CONFIGURATION,
            ConsoleError::Scan(ScanError::Cancelled)
            | ConsoleError::Handoff(_)
            | ConsoleError::Restore(_) => exit_code::FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_exit_codes() {
        let missing = ConsoleError::platform(
            "lookup",
            PlatformError::AppNotFound {
                name: "foo".into(),
                space: "s".into(),
            },
        );
        assert_eq!(missing.exit_code(), exit_code::LOOKUP);

        let transport = ConsoleError::platform(
            "summary",
            PlatformError::Timeout {
                command: "curl".into(),
                timeout: Duration::from_secs(1),
            },
        );
        assert_eq!(transport.exit_code(), exit_code::TRANSPORT);

        let timeout = ConsoleError::Scan(ScanError::Timeout {
            app: "foo".into(),
            index: 2,
            waited: Duration::from_secs(600),
        });
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);

        let restore = ConsoleError::Restore(RestoreReport::Failed {
            instances_error: Some("boom".into()),
            command_error: None,
        });
        assert_eq!(restore.exit_code(), exit_code::FAILURE);
    }
}
