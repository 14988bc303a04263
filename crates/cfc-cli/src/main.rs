// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use cfc_cli::{app, Cli, Parser};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The console hands the terminal over, so its logs go to a file.
    let owns_terminal = cli.owns_terminal();
    cli.logging.clone().init("cf-console", owns_terminal)?;

    let code = app::run(cli).await;
    std::process::exit(code);
}
