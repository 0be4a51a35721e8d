//! Merge of discovered migrations and the schema history into one report.
//!
//! Records are matched by checksum alone. A repeatable script edited in place
//! therefore shows up twice: its old history row as `Missing` and its new
//! contents as `Pending`.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::migration::{AppliedMigration, MigrationState, PendingMigration, TerseMigration};

/// Counts per reconciled state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Discovered, not applied.
    pub pending: usize,
    /// Applied and discovered.
    pub applied: usize,
    /// Applied, no longer discovered.
    pub missing: usize,
}

impl ReconcileSummary {
    /// Count the states in a reconciled list.
    pub fn of(migrations: &[TerseMigration]) -> Self {
        migrations
            .iter()
            .fold(Self::default(), |mut acc, m| {
                match m.state {
                    MigrationState::Pending => acc.pending += 1,
                    MigrationState::Applied => acc.applied += 1,
                    MigrationState::Missing => acc.missing += 1,
                }
                acc
            })
    }
}

/// Reconcile discovered migrations against the persisted history.
///
/// The result is ordered by `installed_on` (unapplied last), ties broken by
/// version in plain string order.
pub fn reconcile(
    discovered: &[PendingMigration],
    applied: &[AppliedMigration],
) -> Vec<TerseMigration> {
    let discovered_checksums: HashSet<&str> =
        discovered.iter().map(|m| m.checksum.as_str()).collect();
    let applied_checksums: HashSet<&str> = applied.iter().map(|m| m.checksum.as_str()).collect();

    let mut merged = Vec::with_capacity(discovered.len() + applied.len());

    for row in applied {
        let state = if discovered_checksums.contains(row.checksum.as_str()) {
            MigrationState::Applied
        } else {
            MigrationState::Missing
        };
        merged.push(TerseMigration::from_applied(row, state));
    }

    // A script already in the history is reported through its row.
    merged.extend(
        discovered
            .iter()
            .filter(|m| !applied_checksums.contains(m.checksum.as_str()))
            .map(|m| TerseMigration::from_pending(m, MigrationState::Pending)),
    );

    merged.sort_by(report_order);
    merged
}

fn report_order(a: &TerseMigration, b: &TerseMigration) -> Ordering {
    let by_installed = match (a.installed_on, b.installed_on) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_installed.then_with(|| {
        a.version
            .as_deref()
            .unwrap_or("")
            .cmp(b.version.as_deref().unwrap_or(""))
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::migration::MigrationType;

    fn pending(version: Option<&str>, file_name: &str, sql: &str) -> PendingMigration {
        let migration_type = if version.is_some() {
            MigrationType::Versioned
        } else {
            MigrationType::Repeatable
        };
        PendingMigration::new(
            migration_type,
            version.map(String::from),
            file_name,
            file_name,
            sql,
        )
        .unwrap()
    }

    fn applied_row(migration: &PendingMigration, rank: i64) -> AppliedMigration {
        let mut row = AppliedMigration::record(migration, rank, "tester", 1.0);
        row.installed_on =
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(rank);
        row
    }

    #[test]
    fn test_only_discovered_is_pending() {
        let m = pending(Some("1"), "V1__a.sql", "C1");
        let result = reconcile(&[m.clone()], &[]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].checksum, m.checksum);
        assert_eq!(result[0].state, MigrationState::Pending);
        assert_eq!(result[0].installed_on, None);
    }

    #[test]
    fn test_both_sides_is_applied() {
        let m = pending(Some("1"), "V1__a.sql", "C1");
        let row = applied_row(&m, 1);
        let result = reconcile(&[m], &[row.clone()]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].state, MigrationState::Applied);
        assert_eq!(result[0].installed_on, Some(row.installed_on));
    }

    #[test]
    fn test_only_persisted_is_missing() {
        let m = pending(Some("2"), "V2__b.sql", "C2");
        let row = applied_row(&m, 1);
        let result = reconcile(&[], &[row]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].state, MigrationState::Missing);
    }

    #[test]
    fn test_edited_repeatable_is_missing_and_pending() {
        let old = pending(None, "R__views.sql", "CREATE VIEW v AS SELECT 1;");
        let new = pending(None, "R__views.sql", "CREATE VIEW v AS SELECT 2;");
        let row = applied_row(&old, 1);

        let result = reconcile(&[new], &[row]);
        let states: Vec<_> = result.iter().map(|m| m.state).collect();
        assert_eq!(states, vec![MigrationState::Missing, MigrationState::Pending]);
    }

    #[test]
    fn test_ordering() {
        let v1 = pending(Some("1"), "V1__a.sql", "A");
        let v2 = pending(Some("2"), "V2__b.sql", "B");
        let v10 = pending(Some("10"), "V10__c.sql", "C");
        let v3 = pending(Some("3"), "V3__d.sql", "D");

        let rows = vec![applied_row(&v2, 2), applied_row(&v1, 1)];
        let result = reconcile(&[v1, v2, v10, v3], &rows);

        let versions: Vec<_> = result.iter().map(|m| m.version.clone().unwrap()).collect();
        // Unapplied entries sort by plain string order, so "10" precedes "3".
        assert_eq!(versions, vec!["1", "2", "10", "3"]);
        assert_eq!(
            ReconcileSummary::of(&result),
            ReconcileSummary {
                pending: 2,
                applied: 2,
                missing: 0
            }
        );
    }

    #[test]
    fn test_every_history_row_is_reported() {
        let a = pending(Some("1"), "V1__a.sql", "SELECT 1;");
        let b = pending(Some("2"), "V2__b.sql", "SELECT 1;");
        let rows = vec![applied_row(&a, 1), applied_row(&b, 2)];

        let result = reconcile(&[a, b], &rows);
        let versions: Vec<_> = result.iter().map(|m| m.version.clone().unwrap()).collect();
        assert_eq!(versions, vec!["1", "2"]);
        assert!(result.iter().all(|m| m.state == MigrationState::Applied));

        let orphaned = reconcile(&[], &rows);
        assert_eq!(
            ReconcileSummary::of(&orphaned),
            ReconcileSummary {
                pending: 0,
                applied: 0,
                missing: 2
            }
        );
    }

    #[test]
    fn test_every_unapplied_script_is_reported() {
        let a = pending(Some("1"), "V1__a.sql", "SAME");
        let b = pending(Some("2"), "V2__b.sql", "SAME");
        let result = reconcile(&[a, b], &[]);

        let names: Vec<_> = result.iter().map(|m| m.version.clone().unwrap()).collect();
        assert_eq!(names, vec!["1", "2"]);
        assert!(result.iter().all(|m| m.state == MigrationState::Pending));
    }

    #[test]
    fn test_applied_checksum_hides_identical_script() {
        let a = pending(Some("1"), "V1__a.sql", "SAME");
        let b = pending(Some("2"), "V2__b.sql", "SAME");
        let rows = vec![applied_row(&a, 1)];

        let result = reconcile(&[a, b], &rows);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].state, MigrationState::Applied);
        assert_eq!(result[0].version.as_deref(), Some("1"));
    }
}
