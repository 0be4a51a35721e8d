//! Migration discovery.
//!
//! File names follow
//!
//! ```text
//! <prefix><version>?<separator><description><suffix>
//! V2023.01.12.4343__create_users_table.sql
//! R__refresh_views.sql
//! ```
//!
//! where the prefix selects the migration type and the version is a run of
//! dot-separated digit groups.

use std::path::Path;
use std::time::{Duration, Instant};

use regex_lite::Regex;
use tracing::{debug, trace, warn};

use crate::config::{Location, MigrationConfig};
use crate::error::{ConfigurationError, DiscoveryError, MigrateResult};
use crate::migration::{MigrationType, PendingMigration};
use crate::source::{LocalFiles, SourceFiles};

/// Pieces of a migration file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Type selected by the prefix.
    pub migration_type: MigrationType,
    /// Version digits, if any.
    pub version: Option<String>,
    /// Description between separator and suffix.
    pub description: String,
}

/// Compiled file-name matcher for one configuration.
#[derive(Debug, Clone)]
pub struct FileNamePattern {
    regex: Regex,
    repeatable_prefix: String,
    undo_prefix: String,
    budget: Duration,
}

impl FileNamePattern {
    /// Compile the matcher for `config`.
    pub fn new(config: &MigrationConfig) -> Result<Self, ConfigurationError> {
        let prefixes = [
            config.migration_prefix(),
            config.repeatable_migration_prefix(),
            config.undo_migration_prefix(),
        ]
        .map(regex_lite::escape)
        .join("|");

        let suffixes = config
            .migration_suffixes()
            .iter()
            .map(|s| regex_lite::escape(s))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = format!(
            r"^({})([0-9]+(?:\.[0-9]+)*)?{}(.+)(?:{})$",
            prefixes,
            regex_lite::escape(config.migration_separator()),
            suffixes
        );

        let regex = Regex::new(&pattern).map_err(|e| {
            ConfigurationError::invalid(format!("cannot build migration file pattern: {}", e))
        })?;

        Ok(Self {
            regex,
            repeatable_prefix: config.repeatable_migration_prefix().to_string(),
            undo_prefix: config.undo_migration_prefix().to_string(),
            budget: config.match_timeout(),
        })
    }

    /// Match a file name, returning `None` for names that are not migrations.
    pub fn parse(&self, file_name: &str) -> Option<ParsedName> {
        let caps = self.regex.captures(file_name)?;
        let prefix = caps.get(1)?.as_str();

        let migration_type = if prefix == self.repeatable_prefix {
            MigrationType::Repeatable
        } else if prefix == self.undo_prefix {
            MigrationType::Undo
        } else {
            MigrationType::Versioned
        };

        Some(ParsedName {
            migration_type,
            version: caps.get(2).map(|m| m.as_str().to_string()),
            description: caps.get(3)?.as_str().to_string(),
        })
    }

    /// Match a file name within the time budget.
    pub fn parse_within_budget(
        &self,
        file_name: &str,
        location: &Location,
    ) -> Result<Option<ParsedName>, DiscoveryError> {
        let started = Instant::now();
        let parsed = self.parse(file_name);
        self.check_elapsed(started.elapsed(), file_name, location)?;
        Ok(parsed)
    }

    fn check_elapsed(
        &self,
        elapsed: Duration,
        file_name: &str,
        location: &Location,
    ) -> Result<(), DiscoveryError> {
        if elapsed > self.budget {
            return Err(DiscoveryError::ParseTimeout {
                location: location.to_string(),
                file_name: file_name.to_string(),
                budget: self.budget,
            });
        }
        Ok(())
    }
}

/// Discovers migrations in the configured locations.
pub struct Scanner<'a, F = LocalFiles> {
    config: &'a MigrationConfig,
    files: F,
}

impl<'a> Scanner<'a, LocalFiles> {
    /// Create a scanner reading the local filesystem.
    pub fn new(config: &'a MigrationConfig) -> Self {
        Self {
            config,
            files: LocalFiles,
        }
    }
}

impl<'a, F: SourceFiles> Scanner<'a, F> {
    /// Create a scanner over a custom file source.
    pub fn with_files(config: &'a MigrationConfig, files: F) -> Self {
        Self { config, files }
    }

    /// Find every migration in every location.
    ///
    /// The first failing location aborts the scan. Locations without a
    /// recognised scheme contribute nothing.
    pub fn find(&self) -> MigrateResult<Vec<PendingMigration>> {
        let pattern = FileNamePattern::new(self.config)?;
        let mut migrations = Vec::new();

        for location in self.config.locations() {
            match location {
                Location::Filesystem(path) => {
                    let found = self.scan_location(&pattern, location, path)?;
                    debug!(location = %location, count = found.len(), "Scanned migration location");
                    migrations.extend(found);
                }
                Location::Unsupported(raw) => {
                    warn!(location = %raw, "Ignoring location without a supported scheme");
                }
            }
        }

        migrations.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(migrations)
    }

    fn scan_location(
        &self,
        pattern: &FileNamePattern,
        location: &Location,
        path: &Path,
    ) -> MigrateResult<Vec<PendingMigration>> {
        let files = self
            .files
            .list_files(path, true)
            .map_err(|e| DiscoveryError::from_io(location.to_string(), e))?;

        let mut migrations = Vec::new();
        for file in files {
            let Some(file_name) = file.file_name().and_then(|n| n.to_str()) else {
                trace!(path = %file.display(), "Skipping file with a non UTF-8 name");
                continue;
            };

            let Some(parsed) = pattern.parse_within_budget(file_name, location)? else {
                trace!(file = %file_name, "Skipping file that is not a migration");
                continue;
            };

            let sql = self
                .files
                .read_to_string(&file)
                .map_err(|e| DiscoveryError::from_io(location.to_string(), e))?;

            let migration = PendingMigration::new(
                parsed.migration_type,
                parsed.version,
                parsed.description,
                file_name,
                sql,
            )?
            .with_path(&file);

            trace!(file = %file_name, checksum = %migration.checksum, "Discovered migration");
            migrations.push(migration);
        }

        Ok(migrations)
    }
}
