//! Schema history table stored in SQLite.

use std::time::{Duration, Instant};

use cairn_migrate::{AppliedMigration, Database, DbResult, HistoryTable, HistoryTransaction};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use tracing::{debug, trace};

use crate::config::SqliteConfig;
use crate::error::{SqliteError, SqliteResult};

const COLUMNS: &str = "installed_rank, version, description, type, script, checksum, \
                       installed_by, installed_on, execution_time, success";

/// Quote an identifier, doubling embedded quotes.
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn qualified(table: &HistoryTable) -> String {
    match &table.schema {
        Some(schema) => format!("{}.{}", quote(schema), quote(&table.table)),
        None => quote(&table.table),
    }
}

fn master_table(table: &HistoryTable) -> String {
    match &table.schema {
        Some(schema) => format!("{}.sqlite_master", quote(schema)),
        None => "sqlite_master".to_string(),
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<AppliedMigration> {
    let installed_on: String = row.get(7)?;
    let installed_on = DateTime::parse_from_rfc3339(&installed_on)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(AppliedMigration {
        installed_rank: row.get(0)?,
        version: row.get(1)?,
        description: row.get(2)?,
        script_type: row.get(3)?,
        script: row.get(4)?,
        checksum: row.get(5)?,
        installed_by: row.get(6)?,
        installed_on,
        execution_time: row.get(8)?,
        success: row.get(9)?,
    })
}

fn table_exists(conn: &Connection, table: &HistoryTable) -> SqliteResult<bool> {
    let sql = format!(
        "SELECT 1 FROM {} WHERE type = 'table' AND name = ?1",
        master_table(table)
    );
    let found = conn
        .query_row(&sql, params![table.table], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn create_table(conn: &Connection, table: &HistoryTable) -> SqliteResult<()> {
    let index = format!("{}_s_idx", table.table);
    let index = match &table.schema {
        Some(schema) => format!("{}.{}", quote(schema), quote(&index)),
        None => quote(&index),
    };

    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            installed_rank INTEGER PRIMARY KEY,
            version TEXT NULL,
            description TEXT NOT NULL,
            type TEXT NOT NULL,
            script TEXT NOT NULL,
            checksum TEXT NOT NULL,
            installed_by TEXT NOT NULL,
            installed_on TEXT NOT NULL,
            execution_time REAL NOT NULL,
            success INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS {index} ON {name} (success);",
        table = qualified(table),
        index = index,
        name = quote(&table.table),
    );
    conn.execute_batch(&sql)?;
    Ok(())
}

fn read_history(conn: &Connection, table: &HistoryTable) -> SqliteResult<Vec<AppliedMigration>> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY installed_rank",
        COLUMNS,
        qualified(table)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    trace!(table = %table, count = rows.len(), "Read schema history");
    Ok(rows)
}

fn insert_row(
    conn: &Connection,
    table: &HistoryTable,
    migration: &AppliedMigration,
) -> SqliteResult<i64> {
    let sql = format!(
        "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        qualified(table),
        COLUMNS
    );
    conn.execute(
        &sql,
        params![
            migration.installed_rank,
            migration.version,
            migration.description,
            migration.script_type,
            migration.script,
            migration.checksum,
            migration.installed_by,
            timestamp(&migration.installed_on),
            migration.execution_time,
            migration.success,
        ],
    )?;
    Ok(migration.installed_rank)
}

fn update_row(
    conn: &Connection,
    table: &HistoryTable,
    migration: &AppliedMigration,
) -> SqliteResult<()> {
    let sql = format!(
        "UPDATE {} SET version = ?2, description = ?3, type = ?4, script = ?5, checksum = ?6, \
         installed_by = ?7, installed_on = ?8, execution_time = ?9, success = ?10 \
         WHERE installed_rank = ?1",
        qualified(table)
    );
    let changed = conn.execute(
        &sql,
        params![
            migration.installed_rank,
            migration.version,
            migration.description,
            migration.script_type,
            migration.script,
            migration.checksum,
            migration.installed_by,
            timestamp(&migration.installed_on),
            migration.execution_time,
            migration.success,
        ],
    )?;
    if changed == 0 {
        return Err(SqliteError::RowNotFound(migration.installed_rank));
    }
    Ok(())
}

/// SQLite-backed [`Database`].
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Open a database from configuration.
    pub fn open(config: &SqliteConfig) -> SqliteResult<Self> {
        debug!(path = ?config.path, "Opening SQLite database");
        Ok(Self::from_connection(config.connect()?))
    }

    /// Open a fresh in-memory database.
    pub fn open_in_memory() -> SqliteResult<Self> {
        Self::open(&SqliteConfig::memory())
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Database for SqliteDatabase {
    type Transaction<'a> = SqliteTransaction<'a>;

    fn has_migration_table(&mut self, table: &HistoryTable) -> DbResult<bool> {
        Ok(table_exists(&self.conn, table)?)
    }

    fn create_schema_history(&mut self, table: &HistoryTable) -> DbResult<()> {
        Ok(create_table(&self.conn, table)?)
    }

    fn applied_migrations(&mut self, table: &HistoryTable) -> DbResult<Vec<AppliedMigration>> {
        Ok(read_history(&self.conn, table)?)
    }

    fn begin(&mut self) -> DbResult<SqliteTransaction<'_>> {
        let tx = self.conn.transaction().map_err(SqliteError::from)?;
        Ok(SqliteTransaction { tx })
    }
}

/// A transaction on a [`SqliteDatabase`]. Rolls back when dropped uncommitted.
pub struct SqliteTransaction<'a> {
    tx: Transaction<'a>,
}

impl HistoryTransaction for SqliteTransaction<'_> {
    fn applied_migrations(&mut self, table: &HistoryTable) -> DbResult<Vec<AppliedMigration>> {
        Ok(read_history(&self.tx, table)?)
    }

    fn insert_schema_history(
        &mut self,
        table: &HistoryTable,
        migration: &AppliedMigration,
    ) -> DbResult<i64> {
        Ok(insert_row(&self.tx, table, migration)?)
    }

    fn update_schema_history(
        &mut self,
        table: &HistoryTable,
        migration: &AppliedMigration,
    ) -> DbResult<()> {
        Ok(update_row(&self.tx, table, migration)?)
    }

    fn execute_migration(&mut self, sql: &str) -> DbResult<Duration> {
        let start = Instant::now();
        self.tx.execute_batch(sql).map_err(SqliteError::from)?;
        Ok(start.elapsed())
    }

    fn max_installed_rank(&mut self, table: &HistoryTable) -> DbResult<i64> {
        let sql = format!(
            "SELECT COALESCE(MAX(installed_rank), 0) FROM {}",
            qualified(table)
        );
        let rank = self
            .tx
            .query_row(&sql, [], |row| row.get(0))
            .map_err(SqliteError::from)?;
        Ok(rank)
    }

    fn commit(self) -> DbResult<()> {
        self.tx.commit().map_err(SqliteError::from)?;
        Ok(())
    }

    fn rollback(self) -> DbResult<()> {
        self.tx.rollback().map_err(SqliteError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote() {
        assert_eq!(quote("history"), "\"history\"");
        assert_eq!(quote("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn test_qualified() {
        assert_eq!(
            qualified(&HistoryTable::new(Some("audit".into()), "history")),
            "\"audit\".\"history\""
        );
        assert_eq!(qualified(&HistoryTable::new(None, "history")), "\"history\"");
    }

    #[test]
    fn test_create_table_twice() {
        let mut db = SqliteDatabase::open_in_memory().unwrap();
        let table = HistoryTable::new(None, "cairn_schema_history");

        assert!(!db.has_migration_table(&table).unwrap());
        db.create_schema_history(&table).unwrap();
        db.create_schema_history(&table).unwrap();
        assert!(db.has_migration_table(&table).unwrap());
        assert!(db.applied_migrations(&table).unwrap().is_empty());
    }

    #[test]
    fn test_attached_schema() {
        let mut db = SqliteDatabase::open_in_memory().unwrap();
        db.connection()
            .execute_batch("ATTACH DATABASE ':memory:' AS audit;")
            .unwrap();
        let table = HistoryTable::new(Some("audit".into()), "history");

        db.create_schema_history(&table).unwrap();
        assert!(db.has_migration_table(&table).unwrap());
        assert!(!db
            .has_migration_table(&HistoryTable::new(None, "history"))
            .unwrap());
    }
}
