//! Cairn CLI - Command-line interface for Cairn schema migrations.
//!
//! This crate provides the `cairn` binary: it resolves configuration from
//! `cairn.toml`, flags and `CAIRN_*` environment variables, opens the SQLite
//! history store and runs the migration engine.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

use crate::cli::{Cli, Command};
use crate::error::CliResult;

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> CliResult<()> {
    match &cli.command {
        Command::Migrate => commands::migrate::run(&cli),
        Command::Validate => commands::validate::run(&cli),
        Command::Info(args) => commands::info::run(&cli, args),
        Command::Version => commands::version::run(),
    }
}
