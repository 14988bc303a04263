// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Environment and flag overlays

use anyhow::Result;
use serde_json::Value as J;
use std::collections::HashMap;

pub const ENV_PREFIX: &str = "CF_CONSOLE";

// Variables under the prefix that locate config rather than configure the tool.
const RESERVED_KEYS: &[&str] = &["home"];

/// Overlay built from `CF_CONSOLE_*` variables of the current process
pub fn env_overlay() -> Result<J> {
    env_overlay_from(None)
}

/// Overlay built from an explicit variable map, or the process environment
/// when `source` is `None`.
///
/// `CF_CONSOLE_POLL_INTERVAL_MS=500` becomes `{"poll-interval-ms": 500}`.
pub fn env_overlay_from(source: Option<HashMap<String, String>>) -> Result<J> {
    let built = config::Config::builder()
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .convert_case(config::Case::Kebab)
                .try_parsing(true)
                .source(source),
        )
        .build()?;

    let mut map = built.try_deserialize::<serde_json::Map<String, J>>()?;
    for key in RESERVED_KEYS {
        map.remove(*key);
    }
    Ok(J::Object(map))
}

/// Overlay built from CLI flag key/value pairs
pub fn flags_overlay(pairs: &[(&str, J)]) -> J {
    let mut root = serde_json::json!({});
    for (k, v) in pairs {
        crate::merge::insert_dotted(&mut root, k, v.clone());
    }
    root
}
