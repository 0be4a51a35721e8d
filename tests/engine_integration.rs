//! Integration tests running the migration engine against SQLite.
//!
//! These tests exercise discovery, validation and application end to end,
//! with real scripts on disk and a real database file.

use std::fs;
use std::path::Path;

use cairn::migrate::{
    MigrationState, MigrationType, NoopListener, Stage, StageStatus, ValidationError,
};
use cairn::prelude::*;
use cairn::sqlite::SqliteDatabase;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("cairn_migrate=debug")
        .with_test_writer()
        .try_init();
}

fn write(dir: &Path, name: &str, sql: &str) {
    fs::write(dir.join(name), sql).expect("Failed to write migration");
}

fn engine(dir: &Path, ignore: &[&str]) -> MigrationEngine<SqliteDatabase> {
    init_tracing();
    let config = MigrationConfig::builder()
        .locations([format!("filesystem:{}", dir.join("migrations").display())])
        .ignore_migrations(ignore.iter().copied())
        .installed_by("integration")
        .build()
        .expect("Failed to build config");
    let db = SqliteDatabase::open(&cairn::sqlite::SqliteConfig::file(dir.join("app.db")))
        .expect("Failed to open database");
    MigrationEngine::new(config, db)
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let migrations = dir.path().join("migrations");
    fs::create_dir_all(migrations.join("nested")).unwrap();
    write(
        &migrations,
        "V1__create_users.sql",
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
    );
    write(
        &migrations.join("nested"),
        "V3__add_email.sql",
        "ALTER TABLE users ADD COLUMN email TEXT;",
    );
    write(
        &migrations,
        "V2__create_posts.sql",
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users(id));",
    );
    write(
        &migrations,
        "R__user_emails.sql",
        "DROP VIEW IF EXISTS user_emails; CREATE VIEW user_emails AS SELECT email FROM users;",
    );
    dir
}

fn count_objects(db: &Path, name: &str) -> i64 {
    let conn = rusqlite::Connection::open(db).unwrap();
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE name = ?1",
        [name],
        |row| row.get(0),
    )
    .unwrap()
}

/// Test a full migrate, then a no-op rerun
#[test]
fn test_migrate_end_to_end() {
    let dir = project();
    let mut engine = engine(dir.path(), &[]);

    let result = engine.migrate(&mut NoopListener).unwrap();
    assert_eq!(
        result.applied_migrations,
        vec![
            "V1__create_users.sql",
            "V2__create_posts.sql",
            "V3__add_email.sql",
            "R__user_emails.sql",
        ]
    );

    let history = engine.history().unwrap();
    let ranks: Vec<_> = history.iter().map(|r| r.installed_rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
    assert!(history.iter().all(|r| r.installed_by == "integration"));
    assert_eq!(history[3].migration_type(), MigrationType::Repeatable);

    let rerun = engine.migrate(&mut NoopListener).unwrap();
    assert_eq!(rerun.applied_count, 0);
    assert_eq!(engine.history().unwrap().len(), 4);

    assert_eq!(count_objects(&dir.path().join("app.db"), "user_emails"), 1);
}

/// Test validation of a consistent project
#[test]
fn test_validate_consistent_project() {
    let dir = project();
    let mut engine = engine(dir.path(), &[]);
    engine.migrate(&mut NoopListener).unwrap();

    let report = engine.validate().unwrap();
    assert_eq!(report.validated, 4);
    assert_eq!(report.stages.len(), 4);
    assert!(report.stages.iter().all(|s| s.status == StageStatus::Passed));
}

/// Test that editing a repeatable script re-applies it in place
#[test]
fn test_edited_repeatable() {
    let dir = project();
    let mut engine = engine(dir.path(), &[]);
    engine.migrate(&mut NoopListener).unwrap();
    let before = engine.history().unwrap();

    write(
        &dir.path().join("migrations"),
        "R__user_emails.sql",
        "DROP VIEW IF EXISTS user_emails; CREATE VIEW user_emails AS SELECT email, name FROM users;",
    );

    // The old row no longer matches anything on disk.
    let info = engine.info().unwrap();
    let states: Vec<_> = info.iter().map(|m| m.state).collect();
    assert!(states.contains(&MigrationState::Missing));
    assert!(states.contains(&MigrationState::Pending));

    let result = engine.migrate(&mut NoopListener).unwrap();
    assert_eq!(result.applied_migrations, vec!["R__user_emails.sql"]);

    let after = engine.history().unwrap();
    assert_eq!(after.len(), 4);
    assert_eq!(after[3].installed_rank, before[3].installed_rank);
    assert_ne!(after[3].checksum, before[3].checksum);

    engine.validate().unwrap();
}

/// Test that a failing script leaves nothing behind
#[test]
fn test_failed_batch_is_atomic() {
    let dir = project();
    write(&dir.path().join("migrations"), "V4__broken.sql", "CREATE TABLE (;");
    let mut engine = engine(dir.path(), &[]);

    let err = engine.migrate(&mut NoopListener).unwrap_err();
    assert_eq!(err.code(), "applicator::execution_failed");

    assert!(engine.history().unwrap().is_empty());
    assert_eq!(count_objects(&dir.path().join("app.db"), "users"), 0);
    assert_eq!(count_objects(&dir.path().join("app.db"), "posts"), 0);
}

/// Test that validation fails fast on duplicate versions
#[test]
fn test_duplicate_versions() {
    let dir = project();
    write(&dir.path().join("migrations"), "V2__other.sql", "SELECT 2;");
    let mut engine = engine(dir.path(), &[]);

    match engine.validate().unwrap_err() {
        MigrationError::Validation(ValidationError::DuplicateVersion { version, .. }) => {
            assert_eq!(version, "2");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Test ignore patterns on an unmigrated project
#[test]
fn test_ignore_pending() {
    let dir = project();

    let mut strict = engine(dir.path(), &[]);
    assert!(strict.validate().is_err());

    let mut lenient = engine(dir.path(), &["*:pending"]);
    let report = lenient.validate().unwrap();
    assert_eq!(
        report.stage(Stage::Local).map(|s| s.status),
        Some(StageStatus::Skipped)
    );
}
