// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! JSON schema for configuration layers, generated from [`ConsoleSettings`].

use anyhow::Result;
use jsonschema::{Draft, JSONSchema};
use serde_json::Value as J;
use std::sync::OnceLock;

use crate::settings::ConsoleSettings;

/// The schema every file layer and the merged result must satisfy
pub type SchemaRoot = ConsoleSettings;

/// Schema generated from [`ConsoleSettings`], built once
pub fn schema_json() -> &'static J {
    static SCHEMA: OnceLock<J> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let root = schemars::schema_for!(SchemaRoot);
        serde_json::to_value(root).unwrap_or(J::Bool(true))
    })
}

/// Validate a JSON document against the configuration schema
pub fn validate(v: &J) -> Result<()> {
    static VALIDATOR: OnceLock<Option<JSONSchema>> = OnceLock::new();
    let validator = VALIDATOR.get_or_init(|| {
        JSONSchema::options().with_draft(Draft::Draft202012).compile(schema_json()).ok()
    });

    let Some(validator) = validator else {
        anyhow::bail!("configuration schema failed to compile");
    };

    if let Err(errors) = validator.validate(v) {
        let error_msg = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("\n  - ");
        anyhow::bail!("Config schema validation failed:\n  - {}", error_msg);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_document_passes() {
        let doc = json!({
            "poll-interval-ms": 500,
            "ssh-args": ["-o", "ServerAliveInterval=30"],
            "next-gen-instance-index": 0,
            "legacy-instance-index": "new-instance"
        });
        assert!(validate(&doc).is_ok());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = validate(&json!({"poll-intervall-ms": 500})).unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        assert!(validate(&json!({"max-wait-secs": "forever"})).is_err());
        assert!(validate(&json!({"legacy-instance-index": "somewhere"})).is_err());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        assert!(validate(&json!({"poll-interval-ms": 0})).is_err());
    }
}
