// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Layered configuration for cf-console.
//!
//! Sources are read into `serde_json::Value`, validated against a schema
//! generated from [`ConsoleSettings`], deep-merged in precedence order and
//! finally extracted into the typed settings.

pub mod env;
pub mod extract;
pub mod loader;
pub mod merge;
pub mod paths;
pub mod schema;
pub mod settings;

pub use paths::{discover_paths, Paths};
pub use settings::{ConsoleSettings, IndexRule, InstanceIndexPolicy, DEFAULT_BOOTSTRAP_URL, DEFAULT_ENDPOINT_DOMAIN};

use anyhow::Result;
use serde_json::Value as J;
use tracing::debug;

/// Configuration sources, lowest precedence first
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Scope {
    System,
    User,
    Env,
    CliConfig,
    Flags,
}

/// Merged configuration before typed extraction
#[derive(Debug)]
pub struct Resolved {
    pub json: J,
    /// Scopes that contributed at least one layer
    pub scopes: Vec<Scope>,
}

impl Resolved {
    pub fn settings(&self) -> Result<ConsoleSettings> {
        extract::get(&self.json)
    }
}

/// Load and merge all layers from the process environment.
///
/// Precedence order: system < user < env < cli-config < flags
pub fn load_all(paths: &Paths, flags: &[(&str, J)]) -> Result<Resolved> {
    let env_layer = env::env_overlay()?;
    merge_layers(paths, env_layer, flags)
}

/// Same as [`load_all`] with an explicit environment overlay.
pub fn merge_layers(paths: &Paths, env_layer: J, flags: &[(&str, J)]) -> Result<Resolved> {
    use Scope::*;

    let system = paths
        .system
        .exists()
        .then(|| loader::read_layer_from_file(&paths.system, System))
        .transpose()?;
    let user = paths
        .user
        .exists()
        .then(|| loader::read_layer_from_file(&paths.user, User))
        .transpose()?;
    // An explicitly requested file must exist.
    let cli_config = paths
        .cli_config
        .as_ref()
        .map(|p| loader::read_layer_from_file(p, CliConfig))
        .transpose()?;
    let flags_layer = env::flags_overlay(flags);

    let layers = [
        (system.map(|l| l.json), System),
        (user.map(|l| l.json), User),
        (Some(env_layer), Env),
        (cli_config.map(|l| l.json), CliConfig),
        (Some(flags_layer), Flags),
    ];

    let mut json = serde_json::json!({});
    let mut scopes = Vec::new();
    for (layer, scope) in layers {
        let Some(layer) = layer else { continue };
        if layer.as_object().is_some_and(|m| m.is_empty()) {
            continue;
        }
        debug!(scope = ?scope, "applying configuration layer");
        merge::merge_two_json(&mut json, layer);
        scopes.push(scope);
    }

    schema::validate(&json)?;

    Ok(Resolved { json, scopes })
}

/// Convenience wrapper returning the typed settings
pub fn load_settings(paths: &Paths, flags: &[(&str, J)]) -> Result<ConsoleSettings> {
    load_all(paths, flags)?.settings()
}
