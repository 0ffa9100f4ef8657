// Copyright 2026 Cardprobe Contributors
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code, unused_imports)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod auth;
mod batch;
mod checker;
mod classify;
mod cli;
mod config;
mod input;
mod output;
mod probe;
mod record;
mod renderer;
mod retry;
mod sequencer;

#[derive(Parser)]
#[command(
    name = "cardprobe",
    about = "Cardprobe — headless-browser gift card balance checker",
    version,
    after_help = "Run 'cardprobe <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up balances for one or more gift card codes
    Check(cli::RunOptions),
    /// Redeem codes into the signed-in storefront account
    Redeem(cli::RunOptions),
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var("CARDPROBE_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("CARDPROBE_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("CARDPROBE_VERBOSE", "1");
    }

    init_tracing(cli.verbose, cli.json);

    let result = match cli.command {
        Commands::Check(options) => cli::check_cmd::run(&options).await,
        Commands::Redeem(options) => cli::redeem_cmd::run(&options).await,
        Commands::Doctor => cli::doctor::run().await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "cardprobe", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !cli::output::is_quiet() && !cli::output::is_json() {
            eprintln!("  Error: {e:#}");
        }
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        }
        std::process::exit(1);
    }

    result
}

/// Logging goes to stderr so stdout stays clean for JSON output.
fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "cardprobe=debug"
    } else {
        "cardprobe=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
