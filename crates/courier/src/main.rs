// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - asynchronous multi-provider SMS dispatch service.
//!
//! This is the binary entry point for the Courier service.

mod serve;
mod shutdown;
mod wiring;

use clap::{Parser, Subcommand};

/// Courier - asynchronous multi-provider SMS dispatch service.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    /// Path to a config file (overrides the XDG lookup).
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Courier dispatch service.
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => courier_config::load_config_from_path(path),
        None => courier_config::load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("courier: failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("courier serve: {e}");
                std::process::exit(1);
            }
        }
        None => {
            println!("courier: use --help for available commands");
        }
    }
}
