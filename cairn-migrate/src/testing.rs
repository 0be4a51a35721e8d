//! In-memory doubles used by unit tests.

use std::time::Duration;

use crate::apply::{ApplyOutcome, ApplyResult};
use crate::config::HistoryTable;
use crate::error::{DatabaseError, DbResult, MigrationError};
use crate::history::{Database, HistoryTransaction};
use crate::listener::MigrationListener;
use crate::migration::{AppliedMigration, MigrationType, PendingMigration};

pub(crate) fn pending(version: &str, file_name: &str, sql: &str) -> PendingMigration {
    PendingMigration::new(
        MigrationType::Versioned,
        Some(version.to_string()),
        file_name,
        file_name,
        sql,
    )
    .unwrap()
}

pub(crate) fn repeatable(file_name: &str, sql: &str) -> PendingMigration {
    PendingMigration::new(MigrationType::Repeatable, None, file_name, file_name, sql).unwrap()
}

/// History store kept in memory. Transactions work on a copy that replaces
/// the committed state on commit.
#[derive(Debug, Default)]
pub(crate) struct MemoryDatabase {
    history: Option<Vec<AppliedMigration>>,
    executed: Vec<String>,
    fail_on: Option<String>,
    commits: usize,
    rollbacks: usize,
}

impl MemoryDatabase {
    pub(crate) fn with_table() -> Self {
        Self {
            history: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Make any script containing `needle` fail.
    pub(crate) fn fail_on(&mut self, needle: &str) {
        self.fail_on = Some(needle.to_string());
    }

    pub(crate) fn rows(&self) -> Vec<AppliedMigration> {
        self.history.clone().unwrap_or_default()
    }

    pub(crate) fn executed(&self) -> &[String] {
        &self.executed
    }

    pub(crate) fn commits(&self) -> usize {
        self.commits
    }

    pub(crate) fn rollbacks(&self) -> usize {
        self.rollbacks
    }
}

fn missing_table(table: &HistoryTable) -> DatabaseError {
    DatabaseError::new(format!("no such table: {table}"))
}

impl Database for MemoryDatabase {
    type Transaction<'a> = MemoryTransaction<'a>;

    fn has_migration_table(&mut self, _table: &HistoryTable) -> DbResult<bool> {
        Ok(self.history.is_some())
    }

    fn create_schema_history(&mut self, _table: &HistoryTable) -> DbResult<()> {
        self.history.get_or_insert_with(Vec::new);
        Ok(())
    }

    fn applied_migrations(&mut self, table: &HistoryTable) -> DbResult<Vec<AppliedMigration>> {
        self.history.clone().ok_or_else(|| missing_table(table))
    }

    fn begin(&mut self) -> DbResult<MemoryTransaction<'_>> {
        Ok(MemoryTransaction {
            rows: self.history.clone(),
            executed: Vec::new(),
            db: self,
        })
    }
}

pub(crate) struct MemoryTransaction<'a> {
    db: &'a mut MemoryDatabase,
    rows: Option<Vec<AppliedMigration>>,
    executed: Vec<String>,
}

impl MemoryTransaction<'_> {
    fn rows_mut(&mut self, table: &HistoryTable) -> DbResult<&mut Vec<AppliedMigration>> {
        self.rows.as_mut().ok_or_else(|| missing_table(table))
    }
}

impl HistoryTransaction for MemoryTransaction<'_> {
    fn applied_migrations(&mut self, table: &HistoryTable) -> DbResult<Vec<AppliedMigration>> {
        let mut rows = self.rows_mut(table)?.clone();
        rows.sort_by_key(|r| r.installed_rank);
        Ok(rows)
    }

    fn insert_schema_history(
        &mut self,
        table: &HistoryTable,
        migration: &AppliedMigration,
    ) -> DbResult<i64> {
        let rows = self.rows_mut(table)?;
        if rows.iter().any(|r| r.installed_rank == migration.installed_rank) {
            return Err(DatabaseError::new(format!(
                "UNIQUE constraint failed: installed_rank {}",
                migration.installed_rank
            )));
        }
        rows.push(migration.clone());
        Ok(migration.installed_rank)
    }

    fn update_schema_history(
        &mut self,
        table: &HistoryTable,
        migration: &AppliedMigration,
    ) -> DbResult<()> {
        let rows = self.rows_mut(table)?;
        let row = rows
            .iter_mut()
            .find(|r| r.installed_rank == migration.installed_rank)
            .ok_or_else(|| DatabaseError::new("no row to update"))?;
        *row = migration.clone();
        Ok(())
    }

    fn execute_migration(&mut self, sql: &str) -> DbResult<Duration> {
        if let Some(needle) = &self.db.fail_on {
            if sql.contains(needle.as_str()) {
                return Err(DatabaseError::new(format!("syntax error near \"{needle}\"")));
            }
        }
        self.executed.push(sql.to_string());
        Ok(Duration::from_micros(10))
    }

    fn commit(self) -> DbResult<()> {
        self.db.history = self.rows;
        self.db.executed.extend(self.executed);
        self.db.commits += 1;
        Ok(())
    }

    fn rollback(self) -> DbResult<()> {
        self.db.rollbacks += 1;
        Ok(())
    }
}

/// Listener that records every event as a line of text.
#[derive(Debug, Default)]
pub(crate) struct RecordingListener {
    pub(crate) events: Vec<String>,
}

impl MigrationListener for RecordingListener {
    fn on_batch_start(&mut self, count: usize) {
        self.events.push(format!("start {count}"));
    }

    fn on_migration_start(&mut self, migration: &PendingMigration) {
        self.events.push(format!("migrate {}", migration.file_name));
    }

    fn on_migration_outcome(
        &mut self,
        migration: &PendingMigration,
        outcome: &ApplyOutcome,
        _elapsed: Duration,
    ) {
        self.events
            .push(format!("outcome {} {:?}", migration.file_name, outcome));
    }

    fn on_batch_committed(&mut self, result: &ApplyResult) {
        self.events
            .push(format!("committed {}", result.applied_count));
    }

    fn on_batch_rolled_back(&mut self, error: &MigrationError) {
        self.events.push(format!("rolled back {}", error.code()));
    }
}
