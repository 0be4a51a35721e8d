//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Cairn - SQL schema migrations
#[derive(Parser, Debug)]
#[command(name = "cairn")]
#[command(version)]
#[command(about = "Cairn - SQL schema migrations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file (defaults to ./cairn.toml)
    #[arg(short, long, global = true, env = "CAIRN_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database URL or path
    #[arg(short, long, global = true, env = "CAIRN_URL")]
    pub url: Option<String>,

    /// Migration location, e.g. filesystem:db/migrations (repeatable)
    #[arg(
        short,
        long = "location",
        global = true,
        env = "CAIRN_LOCATIONS",
        value_delimiter = ','
    )]
    pub locations: Vec<String>,

    /// Ignore pattern <type>:<state>, e.g. repeatable:missing (repeatable)
    #[arg(
        short,
        long = "ignore",
        global = true,
        env = "CAIRN_IGNORE_MIGRATIONS",
        value_delimiter = ','
    )]
    pub ignore: Vec<String>,

    /// Schema history table name
    #[arg(long, global = true, env = "CAIRN_TABLE")]
    pub table: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply all outstanding migrations
    Migrate,

    /// Check discovered migrations against the schema history
    Validate,

    /// Show the state of every migration
    Info(InfoArgs),

    /// Display version information
    Version,
}

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
