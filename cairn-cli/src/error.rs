//! CLI error types and result alias.

use std::fmt;

use cairn_migrate::{MigrationError, ValidationError};
use cairn_sqlite::SqliteError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] SqliteError),

    /// Migration engine error
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// Output serialization error
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Stable diagnostic code, `cairn::<kind>`.
    pub fn code_str(&self) -> String {
        match self {
            Self::Io(_) => "cairn::io".to_string(),
            Self::Config(_) => "cairn::config".to_string(),
            Self::Database(_) => "cairn::database".to_string(),
            Self::Migration(e) => format!("cairn::{}", e.code()),
            Self::Output(_) => "cairn::output".to_string(),
        }
    }

    fn help_text(&self) -> Option<&'static str> {
        let Self::Migration(err) = self else {
            return match self {
                Self::Config(_) => Some("check cairn.toml and the CAIRN_* environment variables"),
                _ => None,
            };
        };

        match err {
            MigrationError::Validation(ValidationError::UnmatchedRemote { .. }) => Some(
                "restore the script, or ignore it with a pattern such as `versioned:missing`",
            ),
            MigrationError::Validation(ValidationError::UnmatchedLocal { .. }) => {
                Some("run `cairn migrate`, or ignore it with a pattern such as `*:pending`")
            }
            MigrationError::Validation(ValidationError::DuplicateChecksum { .. }) => {
                Some("two scripts have identical contents; remove one of them")
            }
            MigrationError::Validation(ValidationError::DuplicateVersion { .. }) => {
                Some("every versioned script needs a unique version")
            }
            MigrationError::Configuration(_) => {
                Some("ignore patterns look like <versioned|repeatable|*>:<pending|missing|*>")
            }
            MigrationError::Applicator(_) => {
                Some("the whole batch was rolled back; fix the script and run again")
            }
            _ => None,
        }
    }
}

impl Diagnostic for CliError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code_str()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help_text()
            .map(|help| Box::new(help) as Box<dyn fmt::Display + 'a>)
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<cairn_migrate::ConfigurationError> for CliError {
    fn from(err: cairn_migrate::ConfigurationError) -> Self {
        CliError::Migration(err.into())
    }
}
