// SPDX-License-Identifier: GPL-3.0-only

use ayurtrace_scanner::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "ayurtrace-scanner")]
#[command(about = "Scan AyurTrace herb provenance QR codes with a camera")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/ayurtrace-scanner/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Scan a QR code with the camera (default)
    Scan {
        /// Give up after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Decode a QR code from an image file
    Decode {
        /// Image containing the QR code
        path: PathBuf,
    },

    /// Show the provenance record for a product code
    Trace {
        /// Product code, e.g. AYR-ASH-2024-001
        code: String,
    },

    /// Show the active configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=ayurtrace_scanner=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.or_else(Config::default_path);
    let config = match config_path.as_deref() {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Some(Commands::List) => cli::list_cameras().await?,
        Some(Commands::Scan { timeout }) => cli::scan(&config, timeout).await?,
        Some(Commands::Decode { path }) => cli::decode_file(&config, &path).await?,
        Some(Commands::Trace { code }) => cli::print_trace(&code)?,
        Some(Commands::Config { init }) => cli::show_config(&config, config_path.as_deref(), init)?,
        None => cli::scan(&config, None).await?,
    }

    Ok(())
}
