//! Transactional application of migration batches.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, instrument};

use crate::config::{HistoryTable, MigrationConfig};
use crate::error::{ApplicatorError, MigrateResult, MigrationError};
use crate::history::{Database, HistoryTransaction};
use crate::listener::MigrationListener;
use crate::migration::{AppliedMigration, MigrationType, PendingMigration};

/// What happened to a single migration in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Nothing to do; the same contents were already applied.
    NoOp,
    /// The script ran and a new history row was written.
    Inserted {
        /// Rank of the new row.
        installed_rank: i64,
    },
    /// The script ran again and its existing history row was refreshed.
    UpdatedInPlace {
        /// Rank of the refreshed row.
        installed_rank: i64,
    },
}

impl ApplyOutcome {
    /// Whether the script was executed.
    pub fn executed(&self) -> bool {
        !matches!(self, Self::NoOp)
    }
}

/// Result of a committed batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyResult {
    /// Number of migrations whose script was executed.
    pub applied_count: usize,
    /// Wall-clock time for the whole batch.
    pub elapsed: Duration,
    /// File names of executed migrations, in execution order.
    pub applied_migrations: Vec<String>,
    /// File names of repeatables skipped as unchanged.
    pub skipped_migrations: Vec<String>,
}

impl ApplyResult {
    /// Check if any script was executed.
    pub fn has_changes(&self) -> bool {
        self.applied_count > 0
    }

    /// Get a summary of the result.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if self.applied_count > 0 {
            parts.push(format!("{} applied", self.applied_count));
        }

        if !self.skipped_migrations.is_empty() {
            parts.push(format!("{} unchanged", self.skipped_migrations.len()));
        }

        if parts.is_empty() {
            "No migrations to apply".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Strategy used to apply one migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicator {
    /// Run once, append a history row.
    Versioned,
    /// Run whenever the contents change, keep one history row per file.
    Repeatable,
}

impl Applicator {
    /// Pick the applicator for a migration type.
    pub fn resolve(migration_type: MigrationType) -> MigrateResult<Self> {
        match migration_type {
            MigrationType::Versioned => Ok(Self::Versioned),
            MigrationType::Repeatable => Ok(Self::Repeatable),
            MigrationType::Undo => Err(MigrationError::UnsupportedMigrationType(migration_type)),
        }
    }

    fn apply<T: HistoryTransaction>(
        self,
        tx: &mut T,
        applier: &Applier<'_>,
        migration: &PendingMigration,
    ) -> MigrateResult<ApplyOutcome> {
        match self {
            Self::Versioned => applier.apply_versioned(tx, migration),
            Self::Repeatable => applier.apply_repeatable(tx, migration),
        }
    }
}

/// Applies an ordered batch of migrations inside a single transaction.
///
/// Either every migration in the batch takes effect, history rows included,
/// or none does.
#[derive(Debug, Clone, Copy)]
pub struct Applier<'a> {
    table: &'a HistoryTable,
    installed_by: &'a str,
}

impl<'a> Applier<'a> {
    /// Create an applier writing to the configured history table.
    pub fn new(config: &'a MigrationConfig) -> Self {
        Self {
            table: config.history_table(),
            installed_by: config.installed_by(),
        }
    }

    /// Create an applier with an explicit table and author.
    pub fn with_table(table: &'a HistoryTable, installed_by: &'a str) -> Self {
        Self {
            table,
            installed_by,
        }
    }

    /// Apply `migrations` in order.
    ///
    /// The first failure rolls the transaction back and is returned as is.
    #[instrument(skip_all, fields(count = migrations.len(), table = %self.table))]
    pub fn apply<D: Database>(
        &self,
        db: &mut D,
        migrations: &[PendingMigration],
        listener: &mut dyn MigrationListener,
    ) -> MigrateResult<ApplyResult> {
        let start = Instant::now();
        listener.on_batch_start(migrations.len());

        let mut tx = db.begin()?;
        let mut result = ApplyResult::default();

        for migration in migrations {
            let step = Instant::now();
            listener.on_migration_start(migration);

            let outcome = match Applicator::resolve(migration.migration_type)
                .and_then(|applicator| applicator.apply(&mut tx, self, migration))
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback() {
                        error!(error = %rollback_err, "Failed to roll back migration batch");
                    }
                    error!(
                        file = %migration.file_name,
                        error = %err,
                        "Migration batch rolled back"
                    );
                    listener.on_batch_rolled_back(&err);
                    return Err(err);
                }
            };

            if outcome.executed() {
                result.applied_count += 1;
                result.applied_migrations.push(migration.file_name.clone());
            } else {
                result.skipped_migrations.push(migration.file_name.clone());
            }
            listener.on_migration_outcome(migration, &outcome, step.elapsed());
        }

        tx.commit()?;
        result.elapsed = start.elapsed();

        info!(
            applied = result.applied_count,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "Migration batch committed"
        );
        listener.on_batch_committed(&result);
        Ok(result)
    }

    fn apply_versioned<T: HistoryTransaction>(
        &self,
        tx: &mut T,
        migration: &PendingMigration,
    ) -> MigrateResult<ApplyOutcome> {
        let execution_time = self.execute(tx, migration)?;
        let rank = tx.max_installed_rank(self.table)? + 1;

        let row = AppliedMigration::record(migration, rank, self.installed_by, execution_time);
        let installed_rank = tx.insert_schema_history(self.table, &row)?;

        debug!(file = %migration.file_name, installed_rank, "Applied versioned migration");
        Ok(ApplyOutcome::Inserted { installed_rank })
    }

    fn apply_repeatable<T: HistoryTransaction>(
        &self,
        tx: &mut T,
        migration: &PendingMigration,
    ) -> MigrateResult<ApplyOutcome> {
        let history = tx.applied_migrations(self.table)?;

        if history.iter().any(|row| row.checksum == migration.checksum) {
            debug!(file = %migration.file_name, "Repeatable migration unchanged");
            return Ok(ApplyOutcome::NoOp);
        }

        if let Some(existing) = history.iter().find(|row| row.script == migration.file_name) {
            self.execute(tx, migration)?;

            let mut row = existing.clone();
            row.checksum = migration.checksum.clone();
            row.installed_on = Utc::now();
            tx.update_schema_history(self.table, &row)?;

            debug!(
                file = %migration.file_name,
                installed_rank = row.installed_rank,
                "Re-applied repeatable migration"
            );
            return Ok(ApplyOutcome::UpdatedInPlace {
                installed_rank: row.installed_rank,
            });
        }

        let rank = history.iter().map(|row| row.installed_rank).max().unwrap_or(0) + 1;
        let execution_time = self.execute(tx, migration)?;

        let row = AppliedMigration::record(migration, rank, self.installed_by, execution_time);
        let installed_rank = tx.insert_schema_history(self.table, &row)?;

        debug!(file = %migration.file_name, installed_rank, "Applied repeatable migration");
        Ok(ApplyOutcome::Inserted { installed_rank })
    }

    /// Run the script, returning wall-clock milliseconds.
    fn execute<T: HistoryTransaction>(
        &self,
        tx: &mut T,
        migration: &PendingMigration,
    ) -> MigrateResult<f64> {
        let start = Instant::now();
        let reported = tx
            .execute_migration(&migration.sql)
            .map_err(|source| ApplicatorError::ExecutionFailed {
                file_name: migration.file_name.clone(),
                source,
            })?;
        let elapsed = start.elapsed();

        debug!(
            file = %migration.file_name,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            driver_ms = reported.as_secs_f64() * 1000.0,
            "Executed migration script"
        );
        Ok(elapsed.as_secs_f64() * 1000.0)
    }
}
