// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use cfc_logging::CliLoggingArgs;
use clap::{Args, Subcommand};
use serde_json::Value as J;
use std::path::PathBuf;

pub mod app;
pub mod metadata;
pub mod signals;

pub use clap::Parser;

#[derive(clap::Parser, Debug)]
#[command(
    name = "cf-console",
    about = "Open a live console to a Cloud Foundry application",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Additional configuration file, applied above the system and user files
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub logging: CliLoggingArgs,

    /// Delay between log polls while waiting for the endpoint
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: Option<u64>,

    /// Give up on endpoint discovery after this many seconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_wait_secs: Option<u64>,

    /// Program used for the interactive session
    #[arg(long, global = true)]
    pub ssh_binary: Option<String>,

    /// Host platform CLI
    #[arg(long, global = true)]
    pub cf_binary: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a live console
    Console(ConsoleArgs),
    /// Print plugin metadata
    Metadata(MetadataArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConsoleArgs {
    /// Name of the application in the targeted space
    #[arg(value_name = "APP_NAME")]
    pub app_name: String,
}

#[derive(Args, Debug, Clone)]
pub struct MetadataArgs {
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Settings overrides given on the command line, keyed like the config files.
    pub fn flag_overrides(&self) -> Vec<(&'static str, J)> {
        let mut overrides = Vec::new();
        if let Some(ms) = self.poll_interval_ms {
            overrides.push(("poll-interval-ms", J::from(ms)));
        }
        if let Some(secs) = self.max_wait_secs {
            overrides.push(("max-wait-secs", J::from(secs)));
        }
        if let Some(ssh) = &self.ssh_binary {
            overrides.push(("ssh-binary", J::from(ssh.as_str())));
        }
        if let Some(cf) = &self.cf_binary {
            overrides.push(("cf-binary", J::from(cf.as_str())));
        }
        overrides
    }

    /// The console hands the terminal to another program.
    pub fn owns_terminal(&self) -> bool {
        matches!(self.command, Commands::Console(_))
    }
}
