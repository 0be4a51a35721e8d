//! `cairn info` command - Show the state of every migration.

use cairn_migrate::ReconcileSummary;

use crate::cli::{Cli, InfoArgs};
use crate::commands::open_engine;
use crate::error::CliResult;
use crate::output;

/// Run the info command
pub fn run(cli: &Cli, args: &InfoArgs) -> CliResult<()> {
    if args.json {
        let mut engine = open_engine(cli, false)?;
        let migrations = engine.info()?;
        println!("{}", serde_json::to_string_pretty(&migrations)?);
        return Ok(());
    }

    output::header("Migration Info");

    let mut engine = open_engine(cli, true)?;
    let migrations = engine.info()?;

    if migrations.is_empty() {
        output::info("No migrations found");
        return Ok(());
    }

    output::migration_table(&migrations);

    let summary = ReconcileSummary::of(&migrations);
    output::newline();
    output::kv("Applied", &summary.applied.to_string());
    output::kv("Pending", &summary.pending.to_string());
    output::kv("Missing", &summary.missing.to_string());

    Ok(())
}
