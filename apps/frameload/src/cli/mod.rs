//! # frameload CLI Module
//!
//! ## Available Commands
//!
//! - `run` - Load (and by default unload) every asset in a manifest
//! - `check` - Validate a manifest without loading anything
//! - `init` - Write a starter manifest

mod commands;

use clap::{Parser, Subcommand};
use frameload::AppError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// frameload - frame-sliced asset loading
///
/// Gathers assets on background workers and finalizes them a little at a
/// time, one bounded step per frame.
#[derive(Parser, Debug)]
#[command(name = "frameload")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner and progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the assets listed in a manifest
    Run {
        /// Path to the manifest
        #[arg(short, long)]
        manifest: PathBuf,

        /// Load everything in one blocking sweep
        #[arg(long)]
        quick: bool,

        /// Keep gathered data after processing
        #[arg(long)]
        no_clean: bool,

        /// Override the manifest's frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Skip the unload session
        #[arg(long)]
        keep_loaded: bool,
    },

    /// Validate a manifest
    Check {
        /// Path to the manifest
        #[arg(short, long)]
        manifest: PathBuf,
    },

    /// Write a starter manifest
    Init {
        /// Output file path
        #[arg(short, long, default_value = "frameload.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Run {
            manifest,
            quick,
            no_clean,
            fps,
            keep_loaded,
        } => {
            let overrides = RunOverrides {
                quick,
                no_clean,
                fps,
                keep_loaded,
                quiet: cli.quiet,
            };
            cmd_run(&manifest, &overrides, json_mode).await
        }
        Commands::Check { manifest } => cmd_check(&manifest, json_mode),
        Commands::Init { output, force } => cmd_init(&output, force),
    }
}
