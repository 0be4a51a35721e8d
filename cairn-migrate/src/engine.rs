//! High-level entry point tying discovery, history, validation and
//! application together.

use tracing::{info, instrument};

use crate::apply::{ApplyResult, Applier};
use crate::config::MigrationConfig;
use crate::error::MigrateResult;
use crate::history::Database;
use crate::listener::MigrationListener;
use crate::migration::{AppliedMigration, PendingMigration, TerseMigration};
use crate::plan::outstanding;
use crate::reconcile::reconcile;
use crate::scanner::Scanner;
use crate::source::{LocalFiles, SourceFiles};
use crate::validate::{ValidationReport, validate};

/// Migration engine over one database connection.
pub struct MigrationEngine<D, F = LocalFiles> {
    config: MigrationConfig,
    db: D,
    files: F,
}

impl<D: Database> MigrationEngine<D, LocalFiles> {
    /// Create an engine reading migrations from the local filesystem.
    pub fn new(config: MigrationConfig, db: D) -> Self {
        Self::with_files(config, db, LocalFiles)
    }
}

impl<D: Database, F: SourceFiles> MigrationEngine<D, F> {
    /// Create an engine over a custom file source.
    pub fn with_files(config: MigrationConfig, db: D, files: F) -> Self {
        Self { config, db, files }
    }

    /// The engine configuration.
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// The underlying database.
    pub fn database(&mut self) -> &mut D {
        &mut self.db
    }

    /// Create the history table if it does not exist.
    ///
    /// Returns `true` when the table was created.
    pub fn initialize(&mut self) -> MigrateResult<bool> {
        let table = self.config.history_table();
        if self.db.has_migration_table(table)? {
            return Ok(false);
        }
        self.db.create_schema_history(table)?;
        info!(table = %table, "Created schema history table");
        Ok(true)
    }

    /// Discover migrations in the configured locations.
    pub fn discover(&self) -> MigrateResult<Vec<PendingMigration>> {
        Scanner::with_files(&self.config, &self.files).find()
    }

    /// Read the history. A missing history table reads as empty.
    pub fn history(&mut self) -> MigrateResult<Vec<AppliedMigration>> {
        let table = self.config.history_table();
        if !self.db.has_migration_table(table)? {
            return Ok(Vec::new());
        }
        Ok(self.db.applied_migrations(table)?)
    }

    /// Reconciled view of discovered and applied migrations.
    pub fn info(&mut self) -> MigrateResult<Vec<TerseMigration>> {
        let discovered = self.discover()?;
        let applied = self.history()?;
        Ok(reconcile(&discovered, &applied))
    }

    /// Validate discovered migrations against the history.
    #[instrument(skip(self))]
    pub fn validate(&mut self) -> MigrateResult<ValidationReport> {
        let discovered = self.discover()?;
        let applied = self.history()?;
        let report = validate(&discovered, &applied, self.config.ignored_migrations())?;
        info!(
            validated = report.validated,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Validated migrations"
        );
        Ok(report)
    }

    /// Apply every outstanding migration in one transaction.
    ///
    /// Creates the history table first when needed. Validation is not run;
    /// call [`MigrationEngine::validate`] beforehand for that.
    #[instrument(skip(self, listener))]
    pub fn migrate(&mut self, listener: &mut dyn MigrationListener) -> MigrateResult<ApplyResult> {
        self.initialize()?;
        let discovered = self.discover()?;
        let applied = self.history()?;
        let batch = outstanding(&discovered, &applied);

        Applier::new(&self.config).apply(&mut self.db, &batch, listener)
    }
}
