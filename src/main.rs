// Copyright 2026 Ritual Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ritual::cli;

#[derive(Parser)]
#[command(
    name = "ritual",
    about = "Ritual — per-account daily-task automation for websites",
    version,
    after_help = "Run 'ritual <command> --help' for details on each command."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured daily tasks for every account
    Run {
        /// Path to the site config file (TOML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Path to the site accounts file (TOML or JSON)
        #[arg(long)]
        accounts: Option<PathBuf>,
        /// Restrict the run to these site names (repeatable)
        #[arg(long = "site")]
        sites: Vec<String>,
    },
    /// Inspect resolved configuration without running anything
    Check {
        /// Path to the site config file (TOML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Path to the site accounts file (TOML or JSON)
        #[arg(long)]
        accounts: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            accounts,
            sites,
        } => cli::run_cmd::run(config.as_deref(), accounts.as_deref(), &sites, cli.verbose).await,
        Commands::Check { config, accounts } => {
            cli::check::run(config.as_deref(), accounts.as_deref()).await
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    result
}
