// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! JSON envelopes returned by the v2 API

use serde::{Deserialize, Deserializer, Serialize};

/// Result of `GET /v2/spaces/:guid/apps?q=name:...`
#[derive(Debug, Clone, Deserialize)]
pub struct AppSearchResults {
    #[serde(default)]
    pub total_results: Option<u32>,
    #[serde(default)]
    pub resources: Vec<AppResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppResource {
    pub metadata: AppMetadata,
    pub entity: AppEntity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    pub guid: String,
    #[serde(default)]
    pub url: String,
}

/// Application fields the console cares about.
///
/// The API sends `null` for unset strings; those decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntity {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    pub instances: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub command: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub detected_start_command: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub buildpack: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub detected_buildpack: String,
}

impl AppEntity {
    /// Command the app runs today: the explicit one, else the detected one.
    pub fn effective_start_command(&self) -> &str {
        if self.command.trim().is_empty() {
            self.detected_start_command.trim()
        } else {
            self.command.trim()
        }
    }

    pub fn buildpack_info(&self) -> &str {
        if self.buildpack.is_empty() {
            &self.detected_buildpack
        } else {
            &self.buildpack
        }
    }
}

/// Result of `GET /v2/apps/:guid/summary`
#[derive(Debug, Clone, Deserialize)]
pub struct AppSummary {
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub diego: bool,
}

impl AppSummary {
    pub fn backend_kind(&self) -> BackendKind {
        if self.diego {
            BackendKind::NextGeneration
        } else {
            BackendKind::Legacy
        }
    }
}

/// Runtime scheduler behind an app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// DEA backend: needs an extra instance to reach a fresh process
    Legacy,
    /// Diego backend
    NextGeneration,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Legacy => write!(f, "legacy (DEA)"),
            BackendKind::NextGeneration => write!(f, "next-generation (Diego)"),
        }
    }
}

/// Error body of a rejected v2 call
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ApiErrorEnvelope {
    /// Recognise an error body; successful bodies never carry `error_code`.
    pub fn detect(value: &serde_json::Value) -> Option<Self> {
        if value.get("error_code").is_none() && value.get("errors").is_none() {
            return None;
        }
        if let Some(first) = value.get("errors").and_then(|e| e.get(0)) {
            return Some(Self {
                code: first.get("code").cloned(),
                error_code: first.get("title").and_then(|t| t.as_str()).map(str::to_string),
                description: first.get("detail").and_then(|d| d.as_str()).map(str::to_string),
            });
        }
        serde_json::from_value(value.clone()).ok()
    }

    pub fn code(&self) -> String {
        match (&self.error_code, &self.code) {
            (Some(error_code), _) => error_code.clone(),
            (None, Some(code)) => code.to_string(),
            (None, None) => "unknown".to_string(),
        }
    }

    pub fn description(&self) -> String {
        self.description.clone().unwrap_or_else(|| "no description".to_string())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_nulls_decode_as_empty() {
        let entity: AppEntity = serde_json::from_value(json!({
            "name": "foo",
            "instances": 2,
            "command": null,
            "detected_start_command": "node app.js",
            "buildpack": null,
            "detected_buildpack": "nodejs"
        }))
        .unwrap();

        assert_eq!(entity.command, "");
        assert_eq!(entity.effective_start_command(), "node app.js");
        assert_eq!(entity.buildpack_info(), "nodejs");
    }

    #[test]
    fn test_backend_kind_from_summary() {
        let legacy: AppSummary = serde_json::from_value(json!({"guid": "g", "name": "foo"})).unwrap();
        let diego: AppSummary =
            serde_json::from_value(json!({"guid": "g", "name": "foo", "diego": true})).unwrap();
        assert_eq!(legacy.backend_kind(), BackendKind::Legacy);
        assert_eq!(diego.backend_kind(), BackendKind::NextGeneration);
    }

    #[test]
    fn test_error_envelope_detection() {
        let v2 = json!({"code": 100004, "description": "The app could not be found: x", "error_code": "CF-AppNotFound"});
        let envelope = ApiErrorEnvelope::detect(&v2).unwrap();
        assert_eq!(envelope.code(), "CF-AppNotFound");
        assert!(envelope.description().contains("could not be found"));

        let v3 = json!({"errors": [{"code": 10010, "title": "CF-ResourceNotFound", "detail": "App not found"}]});
        assert_eq!(ApiErrorEnvelope::detect(&v3).unwrap().code(), "CF-ResourceNotFound");

        assert!(ApiErrorEnvelope::detect(&json!({"metadata": {"guid": "g"}})).is_none());
    }
}
