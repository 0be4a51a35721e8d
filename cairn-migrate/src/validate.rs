//! Validation of discovered migrations against the schema history.
//!
//! Stages run in a fixed order and the first violation ends the run:
//!
//! 1. distinct checksums among discovered migrations
//! 2. distinct versions among discovered versioned migrations
//! 3. every history row matches a discovered migration (`missing` exemptions)
//! 4. every discovered migration matches a history row (`pending` exemptions)

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::ValidationError;
use crate::ignore::IgnorePatterns;
use crate::migration::{AppliedMigration, MigrationState, MigrationType, PendingMigration};

/// A validation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// No two discovered migrations share a checksum.
    DistinctChecksum,
    /// No two discovered versioned migrations share a version.
    DistinctVersion,
    /// Every history row has a discovered counterpart.
    Remote,
    /// Every discovered migration has a history counterpart.
    Local,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DistinctChecksum => write!(f, "distinct-checksum"),
            Self::DistinctVersion => write!(f, "distinct-version"),
            Self::Remote => write!(f, "remote"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Whether a stage ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// The stage ran and found nothing wrong.
    Passed,
    /// A wildcard ignore pattern disabled the stage.
    Skipped,
}

/// Outcome of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageOutcome {
    /// The stage.
    pub stage: Stage,
    /// Whether it ran.
    pub status: StageStatus,
    /// Time spent in the stage.
    pub elapsed: Duration,
}

/// Result of a successful validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Number of discovered migrations validated.
    pub validated: usize,
    /// Time spent in all stages so far.
    pub elapsed: Duration,
    /// Per-stage outcomes in evaluation order.
    pub stages: Vec<StageOutcome>,
}

impl ValidationReport {
    fn with_stage(mut self, stage: Stage, status: StageStatus, elapsed: Duration) -> Self {
        self.elapsed += elapsed;
        self.stages.push(StageOutcome {
            stage,
            status,
            elapsed,
        });
        self
    }

    /// Outcome of `stage`, if it ran.
    pub fn stage(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages.iter().find(|o| o.stage == stage)
    }
}

/// Inputs shared by every stage.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Migrations found on disk.
    pub discovered: &'a [PendingMigration],
    /// Rows of the schema history.
    pub applied: &'a [AppliedMigration],
    /// Configured exemptions.
    pub ignored: &'a IgnorePatterns,
}

type StageCheck = fn(&ValidationContext<'_>) -> Result<StageStatus, ValidationError>;

const PIPELINE: [(Stage, StageCheck); 4] = [
    (Stage::DistinctChecksum, distinct_checksums),
    (Stage::DistinctVersion, distinct_versions),
    (Stage::Remote, remote_matches),
    (Stage::Local, local_matches),
];

/// Run every stage, stopping at the first violation.
pub fn validate(
    discovered: &[PendingMigration],
    applied: &[AppliedMigration],
    ignored: &IgnorePatterns,
) -> Result<ValidationReport, ValidationError> {
    let ctx = ValidationContext {
        discovered,
        applied,
        ignored,
    };

    let report = PIPELINE
        .iter()
        .try_fold(ValidationReport::default(), |report, &(stage, check)| {
            let started = Instant::now();
            let status = check(&ctx)?;
            let elapsed = started.elapsed();
            debug!(stage = %stage, ?status, ?elapsed, "Validation stage finished");
            Ok::<_, ValidationError>(report.with_stage(stage, status, elapsed))
        })?;

    Ok(ValidationReport {
        validated: discovered.len(),
        ..report
    })
}

fn distinct_checksums(ctx: &ValidationContext<'_>) -> Result<StageStatus, ValidationError> {
    let mut seen: HashMap<&str, &PendingMigration> = HashMap::new();
    for migration in ctx.discovered {
        if let Some(first) = seen.insert(migration.checksum.as_str(), migration) {
            return Err(ValidationError::DuplicateChecksum {
                first: first.file_name.clone(),
                second: migration.file_name.clone(),
                checksum: migration.checksum.clone(),
            });
        }
    }
    Ok(StageStatus::Passed)
}

fn distinct_versions(ctx: &ValidationContext<'_>) -> Result<StageStatus, ValidationError> {
    let mut seen: HashMap<&str, &PendingMigration> = HashMap::new();
    let versioned = ctx
        .discovered
        .iter()
        .filter(|m| m.migration_type == MigrationType::Versioned);

    for migration in versioned {
        let Some(version) = migration.version.as_deref() else {
            continue;
        };
        if let Some(first) = seen.insert(version, migration) {
            return Err(ValidationError::DuplicateVersion {
                version: version.to_string(),
                first: first.file_name.clone(),
                second: migration.file_name.clone(),
            });
        }
    }
    Ok(StageStatus::Passed)
}

fn remote_matches(ctx: &ValidationContext<'_>) -> Result<StageStatus, ValidationError> {
    if ctx.ignored.ignores_all(MigrationState::Missing) {
        return Ok(StageStatus::Skipped);
    }

    for row in ctx.applied {
        if ctx
            .ignored
            .is_ignored(row.migration_type(), MigrationState::Missing)
        {
            continue;
        }
        if !ctx.discovered.iter().any(|m| m.matches(row)) {
            return Err(ValidationError::UnmatchedRemote {
                script: row.script.clone(),
            });
        }
    }
    Ok(StageStatus::Passed)
}

fn local_matches(ctx: &ValidationContext<'_>) -> Result<StageStatus, ValidationError> {
    if ctx.ignored.ignores_all(MigrationState::Pending) {
        return Ok(StageStatus::Skipped);
    }

    let checked = ctx
        .discovered
        .iter()
        .filter(|m| m.migration_type != MigrationType::Undo);

    for migration in checked {
        if ctx
            .ignored
            .is_ignored(migration.migration_type, MigrationState::Pending)
        {
            continue;
        }
        if !ctx.applied.iter().any(|row| migration.matches(row)) {
            return Err(ValidationError::UnmatchedLocal {
                script: migration.file_name.clone(),
            });
        }
    }
    Ok(StageStatus::Passed)
}
