//! SQLite schema history store for Cairn.
//!
//! This crate implements the `cairn-migrate` persistence port on top of
//! `rusqlite`. Every migration batch runs inside one SQLite transaction, so a
//! failing script leaves neither schema changes nor history rows behind.
//!
//! # Example
//!
//! ```rust,ignore
//! use cairn_migrate::{MigrationConfig, MigrationEngine, NoopListener};
//! use cairn_sqlite::{SqliteConfig, SqliteDatabase};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = SqliteDatabase::open(&SqliteConfig::from_url("sqlite://app.db")?)?;
//!     let mut engine = MigrationEngine::new(MigrationConfig::default(), db);
//!     let result = engine.migrate(&mut NoopListener)?;
//!     println!("{}", result.summary());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod store;

pub use config::{DatabasePath, SqliteConfig};
pub use error::{SqliteError, SqliteResult};
pub use store::{SqliteDatabase, SqliteTransaction};
