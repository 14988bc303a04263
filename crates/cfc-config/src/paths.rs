// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration file path discovery

use std::path::PathBuf;

/// Configuration file locations, lowest precedence first
#[derive(Debug, Clone)]
pub struct Paths {
    pub system: PathBuf,
    pub user: PathBuf,
    pub cli_config: Option<PathBuf>,
}

impl Paths {
    pub fn with_cli_config(mut self, path: Option<PathBuf>) -> Self {
        self.cli_config = path;
        self
    }
}

/// Discover configuration file paths for the current environment
pub fn discover_paths() -> Paths {
    Paths {
        system: system_config_path(),
        user: user_config_path(),
        cli_config: None,
    }
}

fn system_config_path() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/Library/Application Support/cf-console/config.toml")
    } else if cfg!(target_os = "windows") {
        PathBuf::from(std::env::var("ProgramData").unwrap_or_else(|_| "C:\\ProgramData".into()))
            .join("cf-console")
            .join("config.toml")
    } else {
        PathBuf::from("/etc/cf-console/config.toml")
    }
}

/// User configuration path, honouring `CF_CONSOLE_HOME` and `XDG_CONFIG_HOME`
fn user_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("CF_CONSOLE_HOME") {
        return PathBuf::from(home).join("config.toml");
    }

    let home = || PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".into()));

    if cfg!(target_os = "macos") {
        home().join("Library").join("Application Support").join("cf-console").join("config.toml")
    } else if cfg!(target_os = "windows") {
        PathBuf::from(std::env::var("APPDATA").unwrap_or_else(|_| "C:\\".into()))
            .join("cf-console")
            .join("config.toml")
    } else {
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home().join(".config"))
            .join("cf-console")
            .join("config.toml")
    }
}
