//! Migration records: discovered scripts, history rows and the merged view.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checksum::checksum;
use crate::error::ConfigurationError;

/// Script type recorded for every migration this engine applies.
pub const SQL_SCRIPT_TYPE: &str = "SQL";

/// Kind of migration script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MigrationType {
    /// One-shot script identified by a version.
    Versioned,
    /// Script re-applied whenever its contents change.
    Repeatable,
    /// Reserved for reverting a versioned script. Never applied automatically.
    Undo,
}

impl fmt::Display for MigrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Versioned => write!(f, "Versioned"),
            Self::Repeatable => write!(f, "Repeatable"),
            Self::Undo => write!(f, "Undo"),
        }
    }
}

/// A migration discovered on disk, not necessarily applied yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMigration {
    /// Version, present only for versioned and undo migrations.
    pub version: Option<String>,
    /// Human-readable description taken from the file name.
    pub description: String,
    /// Kind of migration.
    pub migration_type: MigrationType,
    /// Script contents captured at discovery time.
    pub sql: String,
    /// Lowercase hex MD5 of `sql`.
    pub checksum: String,
    /// Original file name.
    pub file_name: String,
    /// Path the script was read from.
    pub path: PathBuf,
}

impl PendingMigration {
    /// Create a migration, computing its checksum.
    ///
    /// A versioned migration without a version is rejected; a repeatable one
    /// never carries a version.
    pub fn new(
        migration_type: MigrationType,
        version: Option<String>,
        description: impl Into<String>,
        file_name: impl Into<String>,
        sql: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let file_name = file_name.into();
        let version = version.filter(|v| !v.is_empty());

        let version = match migration_type {
            MigrationType::Versioned | MigrationType::Undo if version.is_none() => {
                return Err(ConfigurationError::MissingVersionForVersionedType { file_name });
            }
            MigrationType::Repeatable => None,
            _ => version,
        };

        let sql = sql.into();
        Ok(Self {
            version,
            description: description.into(),
            migration_type,
            checksum: checksum(&sql),
            sql,
            path: PathBuf::from(&file_name),
            file_name,
        })
    }

    /// Set the path this migration was read from.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Whether this script and a history row describe the same applied migration.
    ///
    /// Equality covers version, script file name, script type and checksum.
    pub fn matches(&self, applied: &AppliedMigration) -> bool {
        self.version == applied.version
            && self.file_name == applied.script
            && applied.script_type == SQL_SCRIPT_TYPE
            && self.checksum == applied.checksum
    }
}

/// One row of the persisted schema history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedMigration {
    /// 1-based, strictly increasing ordering key.
    pub installed_rank: i64,
    /// Version, `None` for rows recorded by repeatable migrations.
    pub version: Option<String>,
    /// Description of the migration.
    pub description: String,
    /// Script type, always `SQL` for rows this engine writes.
    pub script_type: String,
    /// Script file name.
    pub script: String,
    /// Checksum of the applied contents.
    pub checksum: String,
    /// Identity that applied the migration.
    pub installed_by: String,
    /// When the migration was applied.
    pub installed_on: DateTime<Utc>,
    /// Execution time in milliseconds.
    pub execution_time: f64,
    /// Whether the migration succeeded.
    pub success: bool,
}

impl AppliedMigration {
    /// Build the history row recording a freshly executed migration.
    pub fn record(
        migration: &PendingMigration,
        installed_rank: i64,
        installed_by: impl Into<String>,
        execution_time: f64,
    ) -> Self {
        Self {
            installed_rank,
            version: migration.version.clone(),
            description: migration.description.clone(),
            script_type: SQL_SCRIPT_TYPE.to_string(),
            script: migration.file_name.clone(),
            checksum: migration.checksum.clone(),
            installed_by: installed_by.into(),
            installed_on: Utc::now(),
            execution_time,
            success: true,
        }
    }

    /// Kind of migration that produced this row.
    pub fn migration_type(&self) -> MigrationType {
        if self.version.is_none() {
            MigrationType::Repeatable
        } else {
            MigrationType::Versioned
        }
    }
}

/// Reconciled state of a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MigrationState {
    /// Discovered but not in the history.
    Pending,
    /// In the history and on disk.
    Applied,
    /// In the history but no longer on disk.
    Missing,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Applied => write!(f, "Applied"),
            Self::Missing => write!(f, "Missing"),
        }
    }
}

/// Reporting projection merging discovered and persisted migrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerseMigration {
    /// Kind of migration.
    pub migration_type: MigrationType,
    /// Version if any.
    pub version: Option<String>,
    /// Description.
    pub description: String,
    /// Script type.
    pub script_type: String,
    /// Checksum.
    pub checksum: String,
    /// When it was applied, if it was.
    pub installed_on: Option<DateTime<Utc>>,
    /// Reconciled state.
    pub state: MigrationState,
}

impl TerseMigration {
    /// Project a discovered migration.
    pub fn from_pending(migration: &PendingMigration, state: MigrationState) -> Self {
        Self {
            migration_type: migration.migration_type,
            version: migration.version.clone(),
            description: migration.description.clone(),
            script_type: SQL_SCRIPT_TYPE.to_string(),
            checksum: migration.checksum.clone(),
            installed_on: None,
            state,
        }
    }

    /// Project a history row.
    pub fn from_applied(migration: &AppliedMigration, state: MigrationState) -> Self {
        Self {
            migration_type: migration.migration_type(),
            version: migration.version.clone(),
            description: migration.description.clone(),
            script_type: migration.script_type.clone(),
            checksum: migration.checksum.clone(),
            installed_on: Some(migration.installed_on),
            state,
        }
    }
}
