//! Selection and ordering of the migrations a run should apply.

use std::collections::HashSet;

use crate::migration::{AppliedMigration, MigrationType, PendingMigration};
use crate::version::numeric_cmp;

/// Migrations to hand to the applier.
///
/// Versioned migrations whose version is not in the history come first, in
/// ascending numeric version order. Every repeatable follows, ordered by
/// description; the applier skips the unchanged ones. Undo migrations are
/// never selected.
pub fn outstanding(
    discovered: &[PendingMigration],
    applied: &[AppliedMigration],
) -> Vec<PendingMigration> {
    let applied_versions: HashSet<&str> = applied
        .iter()
        .filter_map(|row| row.version.as_deref())
        .collect();

    let mut versioned: Vec<PendingMigration> = discovered
        .iter()
        .filter(|m| m.migration_type == MigrationType::Versioned)
        .filter(|m| {
            m.version
                .as_deref()
                .is_some_and(|v| !applied_versions.contains(v))
        })
        .cloned()
        .collect();
    versioned.sort_by(|a, b| {
        numeric_cmp(
            a.version.as_deref().unwrap_or_default(),
            b.version.as_deref().unwrap_or_default(),
        )
        .then_with(|| a.description.cmp(&b.description))
    });

    let mut repeatable: Vec<PendingMigration> = discovered
        .iter()
        .filter(|m| m.migration_type == MigrationType::Repeatable)
        .cloned()
        .collect();
    repeatable.sort_by(|a, b| {
        a.description
            .cmp(&b.description)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });

    versioned.extend(repeatable);
    versioned
}
