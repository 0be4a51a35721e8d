//! CLI command implementations.

pub mod info;
pub mod migrate;
pub mod validate;
pub mod version;

use cairn_migrate::MigrationEngine;
use cairn_sqlite::{SqliteConfig, SqliteDatabase};

use crate::cli::Cli;
use crate::config::Config;
use crate::error::CliResult;
use crate::output;

/// Resolve configuration and open an engine on the configured database.
///
/// With `announce`, the database and locations are printed first.
pub(crate) fn open_engine(
    cli: &Cli,
    announce: bool,
) -> CliResult<MigrationEngine<SqliteDatabase>> {
    let cwd = std::env::current_dir()?;
    let config = Config::discover(&cwd, cli.config.as_deref())?.with_overrides(cli);

    let url = config.database_url()?;
    let migration_config = config.migration_config()?;

    if announce {
        output::kv("Database", url);
        for location in migration_config.locations() {
            output::kv("Location", &location.to_string());
        }
        output::newline();
    }

    let db = SqliteDatabase::open(&SqliteConfig::from_url(url)?)?;
    Ok(MigrationEngine::new(migration_config, db))
}
