// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Plugin metadata advertised to the host CLI

use serde::Serialize;

pub const PLUGIN_NAME: &str = "Console";
pub const COMMAND_NAME: &str = "console";
pub const COMMAND_HELP: &str = "Start a live console";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginMetadata {
    pub name: String,
    pub version: PluginVersion,
    pub commands: Vec<PluginCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginCommand {
    pub name: String,
    pub help_text: String,
    pub usage: String,
}

pub fn plugin_metadata() -> PluginMetadata {
    PluginMetadata {
        name: PLUGIN_NAME.to_string(),
        version: PluginVersion {
            major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            build: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        },
        commands: vec![PluginCommand {
            name: COMMAND_NAME.to_string(),
            help_text: COMMAND_HELP.to_string(),
            usage: format!("cf {COMMAND_NAME} APP_NAME"),
        }],
    }
}

impl PluginMetadata {
    pub fn render_text(&self) -> String {
        let mut out = format!(
            "{} {}.{}.{}\n",
            self.name, self.version.major, self.version.minor, self.version.build
        );
        for command in &self.commands {
            out.push_str(&format!("  {:<10} {}\n  usage: {}\n", command.name, command.help_text, command.usage));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_names_the_console_command() {
        let metadata = plugin_metadata();
        assert_eq!(metadata.name, "Console");
        assert_eq!(metadata.commands.len(), 1);
        assert_eq!(metadata.commands[0].name, "console");
        assert_eq!(metadata.commands[0].help_text, "Start a live console");
    }

    #[test]
    fn test_json_uses_plugin_field_names() {
        let json = serde_json::to_value(plugin_metadata()).unwrap();
        assert_eq!(json["Name"], "Console");
        assert_eq!(json["Commands"][0]["HelpText"], "Start a live console");
        assert!(json["Version"]["Major"].is_u64());
    }

    #[test]
    fn test_text_rendering() {
        let text = plugin_metadata().render_text();
        assert!(text.starts_with("Console 0.1.0"));
        assert!(text.contains("usage: cf console APP_NAME"));
    }
}
