//! Error types for the migration engine.
//!
//! Errors are grouped by the stage that raises them. Every stage aborts on the
//! first error; nothing here is collected or retried.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

use crate::migration::MigrationType;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Result type alias for persistence port operations.
pub type DbResult<T> = Result<T, DatabaseError>;

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Migration discovery failed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Discovered and persisted migrations disagree.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A migration script failed while being applied.
    #[error(transparent)]
    Applicator(#[from] ApplicatorError),

    /// The configuration is unusable.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The history store failed outside of script execution.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// A version comparison was asked for a migration without a version.
    #[error("Cannot compare versions: {0} version is missing")]
    MissingVersion(&'static str),

    /// No applicator exists for this migration type.
    #[error("Migration type {0} cannot be applied")]
    UnsupportedMigrationType(MigrationType),
}

impl MigrationError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Discovery(e) => e.code(),
            Self::Validation(e) => e.code(),
            Self::Applicator(_) => "applicator::execution_failed",
            Self::Configuration(e) => e.code(),
            Self::Database(_) => "database",
            Self::MissingVersion(_) => "version::missing",
            Self::UnsupportedMigrationType(_) => "applicator::unsupported_type",
        }
    }
}

/// Failures while discovering migration scripts.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The location does not exist.
    #[error("Migration location '{location}' not found")]
    NotFound {
        /// The offending location.
        location: String,
    },

    /// The location cannot be read.
    #[error("Access denied to migration location '{location}'")]
    AccessDenied {
        /// The offending location.
        location: String,
    },

    /// The location path is malformed or too long.
    #[error("Invalid migration location path '{location}'")]
    PathInvalid {
        /// The offending location.
        location: String,
    },

    /// Matching a file name took longer than the configured budget.
    #[error("Timed out after {budget:?} parsing '{file_name}' in migration location '{location}'")]
    ParseTimeout {
        /// The offending location.
        location: String,
        /// File name being matched.
        file_name: String,
        /// Budget that was exceeded.
        budget: Duration,
    },

    /// Any other I/O failure.
    #[error("I/O error reading migration location '{location}': {source}")]
    Io {
        /// The offending location.
        location: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl DiscoveryError {
    /// Map an I/O error onto the discovery taxonomy.
    pub fn from_io(location: impl Into<String>, err: std::io::Error) -> Self {
        let location = location.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { location },
            std::io::ErrorKind::PermissionDenied => Self::AccessDenied { location },
            std::io::ErrorKind::InvalidInput => Self::PathInvalid { location },
            _ if is_name_too_long(&err) => Self::PathInvalid { location },
            _ => Self::Io {
                location,
                source: err,
            },
        }
    }

    /// The location this error is about.
    pub fn location(&self) -> &str {
        match self {
            Self::NotFound { location }
            | Self::AccessDenied { location }
            | Self::PathInvalid { location }
            | Self::ParseTimeout { location, .. }
            | Self::Io { location, .. } => location,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "discovery::not_found",
            Self::AccessDenied { .. } => "discovery::access_denied",
            Self::PathInvalid { .. } => "discovery::path_invalid",
            Self::ParseTimeout { .. } => "discovery::parse_timeout",
            Self::Io { .. } => "discovery::io",
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
const NAME_TOO_LONG: Option<i32> = Some(36);
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd"
))]
const NAME_TOO_LONG: Option<i32> = Some(63);
// ERROR_FILENAME_EXCED_RANGE
#[cfg(windows)]
const NAME_TOO_LONG: Option<i32> = Some(206);
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    windows
)))]
const NAME_TOO_LONG: Option<i32> = None;

fn is_name_too_long(err: &std::io::Error) -> bool {
    NAME_TOO_LONG.is_some() && err.raw_os_error() == NAME_TOO_LONG
}

/// Violations found by the validation pipeline.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Two discovered scripts have identical contents.
    #[error(
        "Validation failed: multiple migrations with equal contents: '{first}' and '{second}' (checksum {checksum})"
    )]
    DuplicateChecksum {
        /// First script carrying the checksum.
        first: String,
        /// Second script carrying the checksum.
        second: String,
        /// The shared checksum.
        checksum: String,
    },

    /// Two discovered versioned scripts share a version.
    #[error("Validation failed: found more than one migration with version {version} ('{first}' and '{second}')")]
    DuplicateVersion {
        /// The duplicated version.
        version: String,
        /// First script carrying the version.
        first: String,
        /// Second script carrying the version.
        second: String,
    },

    /// A discovered script has no matching history row.
    #[error("Validation failed: migration '{script}' has not been applied or differs from the schema history")]
    UnmatchedLocal {
        /// Script file name.
        script: String,
    },

    /// A history row has no matching discovered script.
    #[error("Validation failed: applied migration '{script}' was not found among the discovered migrations")]
    UnmatchedRemote {
        /// Script file name recorded in the history.
        script: String,
    },
}

impl ValidationError {
    /// The script this violation names.
    pub fn script(&self) -> &str {
        match self {
            Self::DuplicateChecksum { second, .. } => second,
            Self::DuplicateVersion { second, .. } => second,
            Self::UnmatchedLocal { script } | Self::UnmatchedRemote { script } => script,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::DuplicateChecksum { .. } => "validation::duplicate_checksum",
            Self::DuplicateVersion { .. } => "validation::duplicate_version",
            Self::UnmatchedLocal { .. } => "validation::unmatched_local",
            Self::UnmatchedRemote { .. } => "validation::unmatched_remote",
        }
    }
}

/// Failures while applying a migration. The batch transaction has been rolled
/// back by the time this is returned.
#[derive(Debug, Error)]
pub enum ApplicatorError {
    /// The database rejected the script.
    #[error("Migration '{file_name}' failed: {source}")]
    ExecutionFailed {
        /// File name of the failing migration.
        file_name: String,
        /// Driver-reported cause.
        #[source]
        source: DatabaseError,
    },
}

impl ApplicatorError {
    /// File name of the failing migration.
    pub fn file_name(&self) -> &str {
        match self {
            Self::ExecutionFailed { file_name, .. } => file_name,
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// An ignore pattern is not of the form `<type>:<state>`.
    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    MalformedIgnorePattern {
        /// The raw pattern.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A versioned migration was constructed without a version.
    #[error("Versioned migration '{file_name}' has no version")]
    MissingVersionForVersionedType {
        /// File name of the migration.
        file_name: String,
    },

    /// Any other unusable setting.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigurationError {
    /// Create an invalid-setting error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MalformedIgnorePattern { .. } => "configuration::malformed_ignore_pattern",
            Self::MissingVersionForVersionedType { .. } => "configuration::missing_version",
            Self::Invalid(_) => "configuration::invalid",
        }
    }
}

/// Driver-neutral error reported by a persistence port implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DatabaseError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl DatabaseError {
    /// Create an error from a message alone.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping a driver error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
