// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Targeting information stored by the host CLI

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot determine the host CLI home directory")]
    NoHome,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed host CLI configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no {0} targeted; run `cf target` first")]
    NotTargeted(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRef {
    pub guid: String,
    pub name: String,
}

/// Where the host CLI is pointed: API endpoint, organization and space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSession {
    pub api_endpoint: String,
    pub organization: TargetRef,
    pub space: TargetRef,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(rename = "Target", default)]
    target: String,
    #[serde(rename = "OrganizationFields", default)]
    organization: RawFields,
    #[serde(rename = "SpaceFields", default)]
    space: RawFields,
}

#[derive(Debug, Default, Deserialize)]
struct RawFields {
    #[serde(rename = "GUID", default)]
    guid: String,
    #[serde(rename = "Name", default)]
    name: String,
}

impl RawFields {
    fn into_target(self, what: &'static str) -> Result<TargetRef, SessionError> {
        if self.guid.is_empty() {
            return Err(SessionError::NotTargeted(what));
        }
        Ok(TargetRef {
            guid: self.guid,
            name: self.name,
        })
    }
}

impl HostSession {
    /// Load from `$CF_HOME/.cf/config.json`, falling back to `~/.cf/config.json`.
    pub fn load() -> Result<Self, SessionError> {
        Self::load_from(&host_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    fn parse(path: &Path, text: &str) -> Result<Self, SessionError> {
        let raw: RawConfig = serde_json::from_str(text).map_err(|source| SessionError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            api_endpoint: raw.target,
            organization: raw.organization.into_target("organization")?,
            space: raw.space.into_target("space")?,
        })
    }
}

/// Location of the host CLI configuration file.
pub fn host_config_path() -> Result<PathBuf, SessionError> {
    let home = match std::env::var_os("CF_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => dirs::home_dir().ok_or(SessionError::NoHome)?,
    };
    Ok(home.join(".cf").join("config.json"))
}
