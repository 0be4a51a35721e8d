//! Progress callbacks for migration runs.
//!
//! The engine never prints. Front ends implement [`MigrationListener`] to
//! report progress however they like.

use std::time::Duration;

use crate::apply::{ApplyOutcome, ApplyResult};
use crate::error::MigrationError;
use crate::migration::PendingMigration;

/// Receives progress events from [`crate::Applier`]. Every method defaults to
/// doing nothing.
pub trait MigrationListener {
    /// A batch of `count` migrations is about to run.
    fn on_batch_start(&mut self, _count: usize) {}

    /// `migration` is about to be considered.
    fn on_migration_start(&mut self, _migration: &PendingMigration) {}

    /// `migration` finished with `outcome`.
    fn on_migration_outcome(
        &mut self,
        _migration: &PendingMigration,
        _outcome: &ApplyOutcome,
        _elapsed: Duration,
    ) {
    }

    /// The batch transaction committed.
    fn on_batch_committed(&mut self, _result: &ApplyResult) {}

    /// The batch transaction was rolled back because of `error`.
    fn on_batch_rolled_back(&mut self, _error: &MigrationError) {}
}

/// A listener that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl MigrationListener for NoopListener {}
