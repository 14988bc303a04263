// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! User-facing progress lines, printed to stderr and mirrored to the log

use crossterm::style::Stylize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct StatusReporter {
    enabled: bool,
}

impl StatusReporter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn silent() -> Self {
        Self::new(false)
    }

    pub fn step(&self, message: &str) {
        info!(status = message);
        if self.enabled {
            eprintln!("{} {}", ">".blue().bold(), message);
        }
    }

    pub fn warning(&self, message: &str) {
        warn!(status = message);
        if self.enabled {
            eprintln!("{} {}", ">".yellow().bold(), message.yellow());
        }
    }

    pub fn failure(&self, message: &str) {
        error!(status = message);
        if self.enabled {
            eprintln!("{} {}", ">".red().bold(), message.red());
        }
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new(true)
    }
}
