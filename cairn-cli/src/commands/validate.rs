//! `cairn validate` command - Check migrations against the schema history.

use cairn_migrate::StageStatus;

use crate::cli::Cli;
use crate::commands::open_engine;
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the validate command
pub fn run(cli: &Cli) -> CliResult<()> {
    output::header("Validate Migrations");

    let mut engine = open_engine(cli, true)?;
    let report = engine.validate()?;

    for outcome in &report.stages {
        let status = match outcome.status {
            StageStatus::Passed => "passed",
            StageStatus::Skipped => "skipped",
        };
        output::list_item(&format!("{}: {}", outcome.stage, status));
    }

    output::newline();
    success(&format!(
        "Successfully validated {} migrations ({}ms)",
        report.validated,
        report.elapsed.as_millis()
    ));

    Ok(())
}
