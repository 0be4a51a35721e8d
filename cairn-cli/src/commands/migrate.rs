//! `cairn migrate` command - Apply outstanding migrations.

use std::time::Duration;

use cairn_migrate::{
    ApplyOutcome, ApplyResult, MigrationError, MigrationListener, PendingMigration,
};
use owo_colors::OwoColorize;

use crate::cli::Cli;
use crate::commands::open_engine;
use crate::error::CliResult;
use crate::output::{self, success};

/// Prints one line per migration as the batch runs.
#[derive(Debug, Default)]
pub struct ConsoleListener {
    total: usize,
    current: usize,
}

impl MigrationListener for ConsoleListener {
    fn on_batch_start(&mut self, count: usize) {
        self.total = count;
        self.current = 0;
    }

    fn on_migration_start(&mut self, _migration: &PendingMigration) {
        self.current += 1;
    }

    fn on_migration_outcome(
        &mut self,
        migration: &PendingMigration,
        outcome: &ApplyOutcome,
        elapsed: Duration,
    ) {
        let detail = match outcome {
            ApplyOutcome::NoOp => "unchanged".dimmed().to_string(),
            ApplyOutcome::Inserted { installed_rank } => {
                format!("applied (rank {})", installed_rank).green().to_string()
            }
            ApplyOutcome::UpdatedInPlace { installed_rank } => {
                format!("re-applied (rank {})", installed_rank)
                    .yellow()
                    .to_string()
            }
        };
        output::step(
            self.current,
            self.total,
            &format!(
                "{} {} {}",
                migration.file_name,
                detail,
                format!("{}ms", elapsed.as_millis()).dimmed()
            ),
        );
    }

    fn on_batch_rolled_back(&mut self, _error: &MigrationError) {
        output::newline();
        output::error("Migration batch rolled back; no changes were made");
    }
}

/// Run the migrate command
pub fn run(cli: &Cli) -> CliResult<()> {
    output::header("Migrate");

    let mut engine = open_engine(cli, true)?;
    let mut listener = ConsoleListener::default();
    let result: ApplyResult = engine.migrate(&mut listener)?;

    output::newline();
    if result.has_changes() {
        success(&format!(
            "{} in {}ms",
            result.summary(),
            result.elapsed.as_millis()
        ));
    } else {
        success("Schema is up to date");
    }

    Ok(())
}
