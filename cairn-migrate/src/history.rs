//! Schema history persistence port.
//!
//! The engine never generates dialect SQL for its own bookkeeping. A backend
//! implements [`Database`] and [`HistoryTransaction`]; the engine only decides
//! what to read, execute and record.

use std::time::Duration;

use crate::config::HistoryTable;
use crate::error::DbResult;
use crate::migration::AppliedMigration;

/// Connection-level access to the schema history.
pub trait Database {
    /// Transaction handle borrowed from the connection.
    type Transaction<'a>: HistoryTransaction
    where
        Self: 'a;

    /// Whether the history table exists.
    fn has_migration_table(&mut self, table: &HistoryTable) -> DbResult<bool>;

    /// Create the history table.
    fn create_schema_history(&mut self, table: &HistoryTable) -> DbResult<()>;

    /// Every history row, ordered by `installed_rank`.
    fn applied_migrations(&mut self, table: &HistoryTable) -> DbResult<Vec<AppliedMigration>>;

    /// Open a transaction.
    fn begin(&mut self) -> DbResult<Self::Transaction<'_>>;
}

/// Work performed inside one transaction.
///
/// Dropping a transaction without committing must discard its effects.
pub trait HistoryTransaction {
    /// Every history row visible to this transaction, ordered by `installed_rank`.
    fn applied_migrations(&mut self, table: &HistoryTable) -> DbResult<Vec<AppliedMigration>>;

    /// Insert a history row, returning its rank.
    fn insert_schema_history(
        &mut self,
        table: &HistoryTable,
        migration: &AppliedMigration,
    ) -> DbResult<i64>;

    /// Overwrite the history row with the same `installed_rank`.
    fn update_schema_history(
        &mut self,
        table: &HistoryTable,
        migration: &AppliedMigration,
    ) -> DbResult<()>;

    /// Run a migration script, returning how long the driver spent on it.
    fn execute_migration(&mut self, sql: &str) -> DbResult<Duration>;

    /// Highest rank in the history, `0` when empty.
    fn max_installed_rank(&mut self, table: &HistoryTable) -> DbResult<i64> {
        Ok(self
            .applied_migrations(table)?
            .iter()
            .map(|m| m.installed_rank)
            .max()
            .unwrap_or(0))
    }

    /// Make the transaction's effects permanent.
    fn commit(self) -> DbResult<()>;

    /// Discard the transaction's effects.
    fn rollback(self) -> DbResult<()>;
}
