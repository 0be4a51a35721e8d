//! Version comparison.
//!
//! Versions are compared by stripping every non-digit character and reading
//! the remaining digits as one unbounded integer. `2.0` against `10.0` works;
//! versions with differently padded groups (`1.02` against `1.2`) do not
//! compare as their authors might expect.

use std::cmp::Ordering;

use crate::error::{MigrateResult, MigrationError};

/// Returns `true` iff `v1` is strictly greater than `v2`.
///
/// Fails if either version is absent.
pub fn compare(v1: Option<&str>, v2: Option<&str>) -> MigrateResult<bool> {
    let v1 = v1.ok_or(MigrationError::MissingVersion("first"))?;
    let v2 = v2.ok_or(MigrationError::MissingVersion("second"))?;
    Ok(numeric_cmp(v1, v2) == Ordering::Greater)
}

/// Total order over version strings used by [`compare`].
///
/// A version without any digits orders as zero.
pub fn numeric_cmp(a: &str, b: &str) -> Ordering {
    let a = digits(a);
    let b = digits(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(&b))
}

// Digits in order, leading zeros removed, so that length-then-lexical order is
// numeric order.
fn digits(version: &str) -> String {
    let all: String = version.chars().filter(char::is_ascii_digit).collect();
    all.trim_start_matches('0').to_string()
}
