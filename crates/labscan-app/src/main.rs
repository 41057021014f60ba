// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Labscan — read printed lab reports into indicator values.
//
// Entry point. Initialises logging, parses the command line and runs the
// chosen command.

mod commands;
mod services;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use labscan_core::human_errors::humanize_error;

#[derive(Debug, Parser)]
#[command(name = "labscan", version, about = "Scan lab report photos into indicator values")]
struct Cli {
    /// Data directory holding config.json (default: $XDG_DATA_HOME/labscan).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a capture session over a photo of a report.
    Scan(commands::ScanArgs),
    /// Extract indicators from already recognized text (file or stdin).
    Extract {
        file: Option<PathBuf>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// List the known indicators in presentation order.
    Indicators,
    /// Print the effective configuration.
    Config {
        /// Write the default configuration to the data directory.
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(services::data_dir::data_dir);
    tracing::debug!(data_dir = %data_dir.display(), "Labscan starting");

    let result = match cli.command {
        Command::Scan(args) => commands::scan(&data_dir, args).await,
        Command::Extract { file, json } => commands::extract(&data_dir, file.as_deref(), json),
        Command::Indicators => commands::indicators(),
        Command::Config { init } => commands::config(&data_dir, init),
    };

    if let Err(err) = result {
        let human = humanize_error(&err);
        tracing::error!(error = %err, "Command failed");
        eprintln!("error: {}", human.message);
        eprintln!("  {}", human.suggestion);
        std::process::exit(1);
    }
}
