//! # Cairn
//!
//! Versioned and repeatable SQL schema migrations.
//!
//! Cairn provides:
//! - Discovery of migration scripts named by convention (`V1__init.sql`, `R__views.sql`)
//! - A schema history table recording what ran, when and with which checksum
//! - A fail-fast validation pipeline with ignore patterns
//! - All-or-nothing application of each migration batch
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cairn::prelude::*;
//! use cairn::sqlite::{SqliteConfig, SqliteDatabase};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = SqliteDatabase::open(&SqliteConfig::from_url("sqlite://app.db")?)?;
//!     let config = MigrationConfig::builder()
//!         .locations(["filesystem:db/migrations"])
//!         .build()?;
//!
//!     let mut engine = MigrationEngine::new(config, db);
//!     engine.validate()?;
//!     engine.migrate(&mut NoopListener)?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Migration engine: discovery, reconciliation, validation and application.
pub mod migrate {
    pub use cairn_migrate::*;
}

/// SQLite schema history store.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    pub use cairn_sqlite::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use cairn_migrate::{
        Database, HistoryTransaction, MigrateResult, MigrationConfig, MigrationEngine,
        MigrationError, MigrationListener, MigrationState, MigrationType, NoopListener,
    };
}

// Re-export key types at the crate root
pub use cairn_migrate::{MigrateResult, MigrationConfig, MigrationEngine, MigrationError};
