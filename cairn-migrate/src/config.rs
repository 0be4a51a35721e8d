//! Engine configuration.
//!
//! [`MigrationConfigBuilder`] collects raw settings; [`MigrationConfigBuilder::build`]
//! resolves them once into an immutable [`MigrationConfig`].

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigurationError;
use crate::ignore::IgnorePatterns;

/// Scheme prefix of filesystem locations.
pub const FILESYSTEM_SCHEME: &str = "filesystem:";

/// Default history table name.
pub const DEFAULT_SCHEMA_TABLE: &str = "cairn_schema_history";

/// Default budget for matching one file name.
pub const DEFAULT_MATCH_TIMEOUT: Duration = Duration::from_secs(2);

/// A place migrations are discovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// `filesystem:<path>`
    Filesystem(PathBuf),
    /// Any location without a recognised scheme. Contributes no migrations.
    Unsupported(String),
}

impl Location {
    /// Parse a raw location string.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(FILESYSTEM_SCHEME) {
            Some(path) => Self::Filesystem(PathBuf::from(path)),
            None => Self::Unsupported(raw.to_string()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filesystem(path) => write!(f, "{}{}", FILESYSTEM_SCHEME, path.display()),
            Self::Unsupported(raw) => write!(f, "{}", raw),
        }
    }
}

/// Identifies the schema history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTable {
    /// Schema holding the table, or the connection default.
    pub schema: Option<String>,
    /// Table name.
    pub table: String,
}

impl HistoryTable {
    /// Create a table reference.
    pub fn new(schema: Option<String>, table: impl Into<String>) -> Self {
        Self {
            schema,
            table: table.into(),
        }
    }
}

impl fmt::Display for HistoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

/// Fully resolved engine configuration.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    locations: Vec<Location>,
    migration_prefix: String,
    repeatable_migration_prefix: String,
    undo_migration_prefix: String,
    migration_separator: String,
    migration_suffixes: Vec<String>,
    history_table: HistoryTable,
    installed_by: String,
    ignored_migrations: IgnorePatterns,
    match_timeout: Duration,
}

impl MigrationConfig {
    /// Start building a configuration.
    pub fn builder() -> MigrationConfigBuilder {
        MigrationConfigBuilder::default()
    }

    /// Locations to scan.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Prefix of versioned scripts.
    pub fn migration_prefix(&self) -> &str {
        &self.migration_prefix
    }

    /// Prefix of repeatable scripts.
    pub fn repeatable_migration_prefix(&self) -> &str {
        &self.repeatable_migration_prefix
    }

    /// Prefix of undo scripts.
    pub fn undo_migration_prefix(&self) -> &str {
        &self.undo_migration_prefix
    }

    /// Separator between version and description.
    pub fn migration_separator(&self) -> &str {
        &self.migration_separator
    }

    /// Accepted script suffixes.
    pub fn migration_suffixes(&self) -> &[String] {
        &self.migration_suffixes
    }

    /// The schema history table.
    pub fn history_table(&self) -> &HistoryTable {
        &self.history_table
    }

    /// Identity recorded in `installed_by`.
    pub fn installed_by(&self) -> &str {
        &self.installed_by
    }

    /// Validation exemptions.
    pub fn ignored_migrations(&self) -> &IgnorePatterns {
        &self.ignored_migrations
    }

    /// Budget for matching one file name.
    pub fn match_timeout(&self) -> Duration {
        self.match_timeout
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            locations: vec![Location::Filesystem(PathBuf::from("migrations"))],
            migration_prefix: "V".to_string(),
            repeatable_migration_prefix: "R".to_string(),
            undo_migration_prefix: "U".to_string(),
            migration_separator: "__".to_string(),
            migration_suffixes: vec![".sql".to_string()],
            history_table: HistoryTable::new(None, DEFAULT_SCHEMA_TABLE),
            installed_by: "cairn".to_string(),
            ignored_migrations: IgnorePatterns::new(),
            match_timeout: DEFAULT_MATCH_TIMEOUT,
        }
    }
}

/// Collects raw settings for a [`MigrationConfig`].
///
/// Unset options keep their defaults.
#[derive(Debug, Clone, Default)]
pub struct MigrationConfigBuilder {
    locations: Option<Vec<String>>,
    migration_prefix: Option<String>,
    repeatable_migration_prefix: Option<String>,
    undo_migration_prefix: Option<String>,
    migration_separator: Option<String>,
    migration_suffixes: Option<Vec<String>>,
    default_schema: Option<String>,
    schema_table: Option<String>,
    installed_by: Option<String>,
    ignored_migrations: Vec<String>,
    match_timeout: Option<Duration>,
}

impl MigrationConfigBuilder {
    /// Set the locations, each `filesystem:<path>`.
    pub fn locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = Some(locations.into_iter().map(Into::into).collect());
        self
    }

    /// Set the versioned prefix.
    pub fn migration_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.migration_prefix = Some(prefix.into());
        self
    }

    /// Set the repeatable prefix.
    pub fn repeatable_migration_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.repeatable_migration_prefix = Some(prefix.into());
        self
    }

    /// Set the undo prefix.
    pub fn undo_migration_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.undo_migration_prefix = Some(prefix.into());
        self
    }

    /// Set the version/description separator.
    pub fn migration_separator(mut self, separator: impl Into<String>) -> Self {
        self.migration_separator = Some(separator.into());
        self
    }

    /// Set the accepted suffixes.
    pub fn migration_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.migration_suffixes = Some(suffixes.into_iter().map(Into::into).collect());
        self
    }

    /// Set the schema holding the history table.
    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Set the history table name.
    pub fn schema_table(mut self, table: impl Into<String>) -> Self {
        self.schema_table = Some(table.into());
        self
    }

    /// Set the identity recorded in `installed_by`.
    pub fn installed_by(mut self, installed_by: impl Into<String>) -> Self {
        self.installed_by = Some(installed_by.into());
        self
    }

    /// Add an ignore pattern `<type>:<state>`.
    pub fn ignore_migration(mut self, pattern: impl Into<String>) -> Self {
        self.ignored_migrations.push(pattern.into());
        self
    }

    /// Add several ignore patterns.
    pub fn ignore_migrations<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_migrations
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Set the per-file match budget.
    pub fn match_timeout(mut self, timeout: Duration) -> Self {
        self.match_timeout = Some(timeout);
        self
    }

    /// Resolve the settings.
    pub fn build(self) -> Result<MigrationConfig, ConfigurationError> {
        let defaults = MigrationConfig::default();

        let locations = match self.locations {
            Some(raw) => raw.iter().map(|l| Location::parse(l)).collect(),
            None => defaults.locations,
        };

        let migration_prefix = non_empty(
            "migration_prefix",
            self.migration_prefix,
            defaults.migration_prefix,
        )?;
        let repeatable_migration_prefix = non_empty(
            "repeatable_migration_prefix",
            self.repeatable_migration_prefix,
            defaults.repeatable_migration_prefix,
        )?;
        let undo_migration_prefix = non_empty(
            "undo_migration_prefix",
            self.undo_migration_prefix,
            defaults.undo_migration_prefix,
        )?;
        let migration_separator = non_empty(
            "migration_separator",
            self.migration_separator,
            defaults.migration_separator,
        )?;

        let prefixes = [
            &migration_prefix,
            &repeatable_migration_prefix,
            &undo_migration_prefix,
        ];
        for (i, a) in prefixes.iter().enumerate() {
            for b in &prefixes[i + 1..] {
                if a.starts_with(b.as_str()) || b.starts_with(a.as_str()) {
                    return Err(ConfigurationError::invalid(format!(
                        "migration prefixes '{}' and '{}' overlap",
                        a, b
                    )));
                }
            }
        }

        let migration_suffixes = self
            .migration_suffixes
            .unwrap_or(defaults.migration_suffixes);
        if migration_suffixes.is_empty() || migration_suffixes.iter().any(String::is_empty) {
            return Err(ConfigurationError::invalid(
                "migration_suffixes must list at least one non-empty suffix",
            ));
        }

        let table = non_empty("schema_table", self.schema_table, defaults.history_table.table)?;
        let schema = self.default_schema.filter(|s| !s.is_empty());
        let installed_by = non_empty("installed_by", self.installed_by, defaults.installed_by)?;

        let ignored_migrations = IgnorePatterns::parse(&self.ignored_migrations)?;

        Ok(MigrationConfig {
            locations,
            migration_prefix,
            repeatable_migration_prefix,
            undo_migration_prefix,
            migration_separator,
            migration_suffixes,
            history_table: HistoryTable::new(schema, table),
            installed_by,
            ignored_migrations,
            match_timeout: self.match_timeout.unwrap_or(defaults.match_timeout),
        })
    }
}

fn non_empty(
    name: &str,
    value: Option<String>,
    default: String,
) -> Result<String, ConfigurationError> {
    match value {
        Some(v) if v.is_empty() => Err(ConfigurationError::invalid(format!(
            "{} must not be empty",
            name
        ))),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}
