// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Typed extraction from the merged JSON configuration

use serde::de::DeserializeOwned;
use serde_json::Value as J;

/// Deserialize the merged document; errors name the offending key path.
pub fn get<T: DeserializeOwned>(root: &J) -> anyhow::Result<T> {
    serde_path_to_error::deserialize(root.clone())
        .map_err(|e| anyhow::anyhow!("invalid setting at '{}': {}", e.path(), e.inner()))
}
