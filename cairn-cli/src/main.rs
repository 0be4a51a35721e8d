//! Cairn CLI - Command-line interface for Cairn schema migrations.

use clap::Parser;
use miette::Diagnostic;

use cairn_cli::cli::Cli;
use cairn_cli::{logging, output};

fn main() {
    logging::init();

    // Run the CLI and handle errors
    if let Err(e) = cairn_cli::run(Cli::parse()) {
        output::newline();
        output::error(&e.to_string());
        if let Some(help) = e.help() {
            output::dim_err(&format!("help: {}", help));
        }
        if let Some(code) = e.code() {
            output::dim_err(&format!("code: {}", code));
        }
        std::process::exit(1);
    }
}
