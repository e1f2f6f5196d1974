//! Clipline CLI: render timeline requests from the command line.
//!
//! Usage:
//!   clipline render <REQUEST>     Render a request (`-` reads stdin)
//!   clipline plan <REQUEST>       Show what a request would render
//!   clipline check                Check ffmpeg, font and output directory
//!   clipline init-config          Write a default configuration file

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use clipline_common::config::ServiceConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "clipline",
    about = "Render declarative video timelines into preview, final and segment media",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the standard location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a request and print the result JSON
    Render {
        /// Request JSON file, or `-` for stdin
        request: PathBuf,

        /// Also write the response body to this file
        #[arg(long)]
        out_json: Option<PathBuf>,
    },

    /// Show the plan, segment window and per-entry strategies without rendering
    Plan {
        /// Request JSON file, or `-` for stdin
        request: PathBuf,
    },

    /// Check system capabilities
    Check,

    /// Write a default configuration file
    InitConfig {
        /// Target path (defaults to the standard location)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServiceConfig> {
    match path {
        Some(path) => {
            let mut config = ServiceConfig::load_from(path)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;
            config.apply_env();
            Ok(config)
        }
        None => Ok(ServiceConfig::load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;

    // Initialize logging
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    clipline_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Render { request, out_json } => {
            commands::render::run(config, request, out_json).await
        }
        Commands::Plan { request } => commands::plan::run(config, request),
        Commands::Check => commands::check::run(config).await,
        Commands::InitConfig { path, force } => commands::init_config::run(path, force),
    }
}
