//! Integration tests for the Cairn CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get the cairn binary
#[allow(deprecated)]
fn cairn_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cairn").unwrap();
    cmd.current_dir(dir)
        .env_remove("CAIRN_CONFIG")
        .env_remove("CAIRN_URL")
        .env_remove("CAIRN_LOCATIONS")
        .env_remove("CAIRN_IGNORE_MIGRATIONS")
        .env_remove("CAIRN_TABLE")
        .env_remove("CAIRN_LOG");
    cmd
}

/// A project directory with a `migrations/` folder and a `cairn.toml`.
fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let migrations = dir.path().join("migrations");
    fs::create_dir_all(&migrations).unwrap();
    for (name, sql) in files {
        fs::write(migrations.join(name), sql).unwrap();
    }
    fs::write(
        dir.path().join("cairn.toml"),
        "[database]\nurl = \"app.db\"\n",
    )
    .unwrap();
    dir
}

fn info_json(dir: &Path) -> serde_json::Value {
    let output = cairn_cmd(dir).args(["info", "--json"]).output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

const USERS: (&str, &str) = (
    "V1__create_users.sql",
    "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);",
);
const POSTS: (&str, &str) = (
    "V2__create_posts.sql",
    "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER);",
);
const VIEWS: (&str, &str) = (
    "R__user_names.sql",
    "DROP VIEW IF EXISTS user_names; CREATE VIEW user_names AS SELECT name FROM users;",
);

#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    cairn_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cairn - SQL schema migrations"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("info"));
}

#[test]
fn test_version_command() {
    let dir = TempDir::new().unwrap();
    cairn_cmd(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("Version"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_migrate_applies_all() {
    let dir = project(&[USERS, POSTS, VIEWS]);

    cairn_cmd(dir.path())
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("V1__create_users.sql"))
        .stdout(predicate::str::contains("V2__create_posts.sql"))
        .stdout(predicate::str::contains("R__user_names.sql"))
        .stdout(predicate::str::contains("3 applied"));

    cairn_cmd(dir.path())
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Schema is up to date"));

    let info = info_json(dir.path());
    let entries = info.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e["state"] == "Applied"));
}

#[test]
fn test_validate_after_migrate() {
    let dir = project(&[USERS, POSTS]);
    cairn_cmd(dir.path()).arg("migrate").assert().success();

    cairn_cmd(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully validated 2 migrations"));
}

#[test]
fn test_validate_detects_removed_script() {
    let dir = project(&[USERS, POSTS]);
    cairn_cmd(dir.path()).arg("migrate").assert().success();
    fs::remove_file(dir.path().join("migrations").join(POSTS.0)).unwrap();

    cairn_cmd(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("V2__create_posts.sql"))
        .stderr(predicate::str::contains("cairn::validation::unmatched_remote"));

    cairn_cmd(dir.path())
        .args(["validate", "--ignore", "versioned:missing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully validated 1 migrations"));
}

#[test]
fn test_validate_reports_pending() {
    let dir = project(&[USERS]);

    cairn_cmd(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cairn::validation::unmatched_local"));
}

#[test]
fn test_failed_script_rolls_back_batch() {
    let dir = project(&[USERS, ("V2__broken.sql", "CREATE TABLE (;"), POSTS]);
    fs::rename(
        dir.path().join("migrations").join(POSTS.0),
        dir.path().join("migrations").join("V3__create_posts.sql"),
    )
    .unwrap();

    cairn_cmd(dir.path())
        .arg("migrate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("V2__broken.sql"))
        .stderr(predicate::str::contains("cairn::applicator::execution_failed"));

    let info = info_json(dir.path());
    let entries = info.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e["state"] == "Pending"));
}

#[test]
fn test_missing_location() {
    let dir = project(&[]);

    cairn_cmd(dir.path())
        .args(["info", "--location", "filesystem:does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cairn::discovery::not_found"));
}

#[test]
fn test_missing_database_url() {
    let dir = TempDir::new().unwrap();

    cairn_cmd(dir.path())
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cairn::config"));
}

#[test]
fn test_malformed_ignore_pattern() {
    let dir = project(&[USERS]);

    cairn_cmd(dir.path())
        .args(["validate", "--ignore", "versioned"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "cairn::configuration::malformed_ignore_pattern",
        ));
}

#[test]
fn test_info_table() {
    let dir = project(&[USERS, POSTS]);

    cairn_cmd(dir.path())
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("create_users"))
        .stdout(predicate::str::contains("Pending"));
}
