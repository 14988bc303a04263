// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! TOML loading for file layers

use anyhow::{Context, Result};
use serde_json::Value as J;
use std::path::Path;

use crate::Scope;

/// A configuration layer read from one source
#[derive(Debug, Clone)]
pub struct Layer {
    pub scope: Scope,
    pub json: J,
}

/// Parse a TOML document into JSON so it can be validated and merged
pub fn parse_toml_to_json(toml_str: &str) -> Result<J> {
    let toml: toml::Value = toml_str.parse::<toml::Value>()?;
    Ok(serde_json::to_value(toml)?)
}

/// Read, parse and validate a file layer
pub fn read_layer_from_file(path: &Path, scope: Scope) -> Result<Layer> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {:?} config file {:?}", scope, path))?;

    let json = parse_toml_to_json(&content)
        .with_context(|| format!("parsing {:?} config file {:?}", scope, path))?;
    crate::schema::validate(&json)
        .with_context(|| format!("validating {:?} config file {:?}", scope, path))?;

    Ok(Layer { scope, json })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_parsing() {
        let json = parse_toml_to_json(
            r#"
            cf-binary = "cf8"
            ssh-args = ["-o", "LogLevel=ERROR"]
            max-wait-secs = 120
        "#,
        )
        .unwrap();
        assert_eq!(json["cf-binary"], "cf8");
        assert_eq!(json["ssh-args"][1], "LogLevel=ERROR");
        assert_eq!(json["max-wait-secs"], 120);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "bogus-key = 1\n").unwrap();

        let err = read_layer_from_file(&path, Scope::User).unwrap_err();
        assert!(format!("{:#}", err).contains("config.toml"));
    }
}
