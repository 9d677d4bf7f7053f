//! CLI argument definitions for harvester.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Follow a growing log file and stream new bytes to stdout.
///
/// Keeps reading past end of file, backing off while the file is idle,
/// and reopens the path when the file is truncated or rotated.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(version, about, long_about = None)]
pub struct HarvesterCli {
    /// Path to harvester.toml configuration file.
    ///
    /// Built-in defaults are used when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Start at the current end of the file instead of the beginning.
    ///
    /// Only applies to the first open; reopened files are read from the start.
    #[arg(long)]
    pub from_end: bool,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without reading anything.
    #[arg(long)]
    pub validate: bool,

    /// File to follow, or `-` for standard input.
    #[arg(required_unless_present = "validate")]
    pub path: Option<PathBuf>,
}
