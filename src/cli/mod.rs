//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Blobport using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Blobport - MongoDB to Azure Blob Storage CSV export
#[derive(Parser, Debug)]
#[command(name = "blobport")]
#[command(version, about, long_about = None)]
#[command(author = "Blobport Contributors")]
pub struct Cli {
    /// Path to an optional configuration file
    ///
    /// Without it the configuration comes from the host environment alone.
    #[arg(short, long, env = "BLOBPORT_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "BLOBPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run exports on the configured cron schedule until interrupted
    Schedule(commands::schedule::ScheduleArgs),

    /// Run a single export invocation now
    Export(commands::export::ExportArgs),

    /// Validate configuration
    ValidateConfig(commands::validate::ValidateArgs),
}
