//! CLI configuration handling.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use cairn_migrate::MigrationConfig;

use crate::cli::Cli;
use crate::error::{CliError, CliResult};

/// Default config file name (lives in project root)
pub const CONFIG_FILE_NAME: &str = "cairn.toml";

/// Cairn CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Migration configuration
    pub migrations: MigrationsConfig,
}

/// Database configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite URL or path
    pub url: Option<String>,
}

/// Migration configuration. Unset fields fall back to engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Locations to scan, e.g. `filesystem:db/migrations`
    pub locations: Option<Vec<String>>,
    /// Prefix of versioned scripts
    pub migration_prefix: Option<String>,
    /// Prefix of repeatable scripts
    pub repeatable_migration_prefix: Option<String>,
    /// Prefix of undo scripts
    pub undo_migration_prefix: Option<String>,
    /// Separator between version and description
    pub migration_separator: Option<String>,
    /// Accepted file suffixes
    pub migration_suffixes: Option<Vec<String>>,
    /// Schema holding the history table
    pub default_schema: Option<String>,
    /// History table name
    pub schema_table: Option<String>,
    /// Value recorded in `installed_by`
    pub installed_by: Option<String>,
    /// Ignore patterns, `<type>:<state>`
    pub ignore_migrations: Vec<String>,
    /// File-name match budget in milliseconds
    pub match_timeout_ms: Option<u64>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `explicit` if given, else `cairn.toml` in `dir` if present, else defaults.
    pub fn discover(dir: &Path, explicit: Option<&Path>) -> CliResult<Self> {
        match explicit {
            Some(path) if !path.exists() => Err(CliError::Config(format!(
                "Config file not found: {}",
                path.display()
            ))),
            Some(path) => Self::load(path),
            None => {
                let default: PathBuf = dir.join(CONFIG_FILE_NAME);
                if default.exists() {
                    Self::load(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply command-line and environment overrides.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.url {
            self.database.url = Some(url.clone());
        }
        if !cli.locations.is_empty() {
            self.migrations.locations = Some(cli.locations.clone());
        }
        if !cli.ignore.is_empty() {
            self.migrations.ignore_migrations = cli.ignore.clone();
        }
        if let Some(table) = &cli.table {
            self.migrations.schema_table = Some(table.clone());
        }
        self
    }

    /// The database URL, which must be set somewhere.
    pub fn database_url(&self) -> CliResult<&str> {
        self.database.url.as_deref().ok_or_else(|| {
            CliError::Config(
                "no database URL; set [database] url, pass --url or set CAIRN_URL".to_string(),
            )
        })
    }

    /// Build the engine configuration.
    pub fn migration_config(&self) -> CliResult<MigrationConfig> {
        let m = &self.migrations;
        let mut builder = MigrationConfig::builder().ignore_migrations(m.ignore_migrations.iter());

        if let Some(locations) = &m.locations {
            builder = builder.locations(locations.iter());
        }
        if let Some(prefix) = &m.migration_prefix {
            builder = builder.migration_prefix(prefix);
        }
        if let Some(prefix) = &m.repeatable_migration_prefix {
            builder = builder.repeatable_migration_prefix(prefix);
        }
        if let Some(prefix) = &m.undo_migration_prefix {
            builder = builder.undo_migration_prefix(prefix);
        }
        if let Some(separator) = &m.migration_separator {
            builder = builder.migration_separator(separator);
        }
        if let Some(suffixes) = &m.migration_suffixes {
            builder = builder.migration_suffixes(suffixes.iter());
        }
        if let Some(schema) = &m.default_schema {
            builder = builder.default_schema(schema);
        }
        if let Some(table) = &m.schema_table {
            builder = builder.schema_table(table);
        }
        if let Some(installed_by) = &m.installed_by {
            builder = builder.installed_by(installed_by);
        }
        if let Some(ms) = m.match_timeout_ms {
            builder = builder.match_timeout(Duration::from_millis(ms));
        }

        Ok(builder.build()?)
    }
}
