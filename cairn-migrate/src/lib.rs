//! # cairn-migrate
//!
//! Migration engine for Cairn.
//!
//! This crate provides functionality for:
//! - Discovering SQL migration scripts by file-name convention
//! - Reconciling discovered scripts against the schema history table
//! - Validating that scripts and history agree, with ignore patterns
//! - Applying outstanding migrations in a single transaction
//!
//! ## Architecture
//!
//! The engine never talks to a database driver directly. A backend implements
//! the [`Database`] and [`HistoryTransaction`] traits, and the engine decides
//! what to read, execute and record.
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ Locations    │────▶│ Scanner        │────▶│ Validate    │
//! └──────────────┘     └────────────────┘     └─────────────┘
//!                              │                     │
//!                              ▼                     ▼
//!                      ┌────────────────┐     ┌─────────────┐
//!                      │ Reconcile/Plan │────▶│ Applier     │
//!                      └────────────────┘     └─────────────┘
//!                                                    │
//!                                                    ▼
//!                                            ┌─────────────┐
//!                                            │ History Tbl │
//!                                            └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use cairn_migrate::{MigrationConfig, MigrationEngine, NoopListener};
//!
//! fn run_migrations(db: impl cairn_migrate::Database) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MigrationConfig::builder()
//!         .locations(["filesystem:db/migrations"])
//!         .ignore_migration("repeatable:missing")
//!         .build()?;
//!
//!     let mut engine = MigrationEngine::new(config, db);
//!     engine.validate()?;
//!
//!     let result = engine.migrate(&mut NoopListener)?;
//!     println!("{}", result.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Migration Files
//!
//! ```text
//! db/migrations/
//! ├── V1__create_users.sql        # versioned, applied once
//! ├── V1.1__add_email_index.sql
//! ├── V2__create_posts.sql
//! ├── R__refresh_views.sql        # repeatable, re-applied when edited
//! └── U2__drop_posts.sql          # undo, recognised but never applied
//! ```

pub mod apply;
pub mod checksum;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod ignore;
pub mod listener;
pub mod migration;
pub mod plan;
pub mod reconcile;
pub mod scanner;
pub mod source;
pub mod validate;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use apply::{Applicator, Applier, ApplyOutcome, ApplyResult};
pub use checksum::checksum;
pub use config::{
    DEFAULT_MATCH_TIMEOUT, DEFAULT_SCHEMA_TABLE, FILESYSTEM_SCHEME, HistoryTable, Location,
    MigrationConfig, MigrationConfigBuilder,
};
pub use engine::MigrationEngine;
pub use error::{
    ApplicatorError, ConfigurationError, DatabaseError, DbResult, DiscoveryError, MigrateResult,
    MigrationError, ValidationError,
};
pub use history::{Database, HistoryTransaction};
pub use ignore::{IgnorePattern, IgnorePatterns, IgnoreState, IgnoreType};
pub use listener::{MigrationListener, NoopListener};
pub use migration::{
    AppliedMigration, MigrationState, MigrationType, PendingMigration, SQL_SCRIPT_TYPE,
    TerseMigration,
};
pub use plan::outstanding;
pub use reconcile::{ReconcileSummary, reconcile};
pub use scanner::{FileNamePattern, ParsedName, Scanner};
pub use source::{LocalFiles, SourceFiles};
pub use validate::{Stage, StageOutcome, StageStatus, ValidationContext, ValidationReport, validate};
pub use version::{compare, numeric_cmp};
