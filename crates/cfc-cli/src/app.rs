// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Command execution and exit-code mapping

use crate::metadata::plugin_metadata;
use crate::signals::spawn_signal_listener;
use crate::{Cli, Commands, MetadataArgs};
use anyhow::Context;
use cfc_config::{discover_paths, ConsoleSettings};
use cfc_core::{
    exit_code, ConsoleError, ConsoleOrchestrator, SessionHandoff, SessionOutcome, SshHandoff, StatusReporter,
};
use cfc_platform_client::{HostSession, PlatformApi, PlatformClient, RetryPolicy};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Run the parsed command and return the process exit code.
pub async fn run(cli: Cli) -> i32 {
    match &cli.command {
        Commands::Metadata(args) => print_metadata(args),
        Commands::Console(args) => run_console(&cli, &args.app_name).await,
    }
}

fn print_metadata(args: &MetadataArgs) -> i32 {
    let metadata = plugin_metadata();
    if args.json {
        match serde_json::to_string_pretty(&metadata) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!(error = %e, "failed to encode metadata");
                return exit_code::FAILURE;
            }
        }
    } else {
        print!("{}", metadata.render_text());
    }
    exit_code::SUCCESS
}

/// Resolve settings from every configuration layer plus command-line flags.
pub fn load_settings(cli: &Cli) -> anyhow::Result<ConsoleSettings> {
    let paths = discover_paths().with_cli_config(cli.config.clone());
    cfc_config::load_settings(&paths, &cli.flag_overrides()).context("failed to load configuration")
}

async fn run_console(cli: &Cli, app_name: &str) -> i32 {
    let status = StatusReporter::default();

    let settings = match load_settings(cli) {
        Ok(settings) => settings,
        Err(e) => {
            status.failure(&format!("{e:#}"));
            return exit_code::CONFIGURATION;
        }
    };
    let host = match HostSession::load() {
        Ok(host) => host,
        Err(e) => {
            status.failure(&e.to_string());
            return exit_code::CONFIGURATION;
        }
    };
    info!(api = %host.api_endpoint, org = %host.organization.name, space = %host.space.name, "host session loaded");

    let platform = PlatformClient::from_cli(
        settings.cf_binary.clone(),
        settings.call_timeout(),
        RetryPolicy::with_retries(settings.call_retries),
    );
    let handoff = SshHandoff::new(settings.ssh_binary.clone(), settings.ssh_args.clone());
    let console = match ConsoleOrchestrator::from_settings(platform, handoff, &settings) {
        Ok(console) => console.with_status(status),
        Err(e) => {
            status.failure(&e.to_string());
            return e.exit_code();
        }
    };

    let cancel = CancellationToken::new();
    let listener = spawn_signal_listener(cancel.clone());
    let code = execute(&console, &host, app_name, &cancel, status).await;
    listener.abort();
    code
}

/// Drive one session and translate its result into an exit code.
pub async fn execute<P, H>(
    console: &ConsoleOrchestrator<P, H>,
    host: &HostSession,
    app_name: &str,
    cancel: &CancellationToken,
    status: StatusReporter,
) -> i32
where
    P: PlatformApi,
    H: SessionHandoff,
{
    match console.run(host, app_name, cancel).await {
        Ok(report) => {
            match report.outcome {
                SessionOutcome::Completed => status.step("Console session ended"),
                SessionOutcome::Interrupted => status.step("Console session interrupted"),
            }
            exit_code::SUCCESS
        }
        Err(e) => {
            // Restoration failures were already reported by the orchestrator.
            if !matches!(e, ConsoleError::Restore(_)) {
                status.failure(&e.to_string());
            }
            e.exit_code()
        }
    }
}
