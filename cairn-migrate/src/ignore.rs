//! Validation exemptions of the form `<type>:<state>`.
//!
//! ```text
//! versioned:pending    exempt versioned scripts not yet applied
//! repeatable:missing   exempt history rows of deleted repeatable scripts
//! *:missing            skip the missing-script check entirely
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::migration::{MigrationState, MigrationType};

/// Type axis of an ignore pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IgnoreType {
    /// Versioned migrations only.
    Versioned,
    /// Repeatable migrations only.
    Repeatable,
    /// `*`
    Any,
}

/// State axis of an ignore pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IgnoreState {
    /// Discovered but not applied.
    Pending,
    /// Applied but no longer discovered.
    Missing,
    /// `*`
    Any,
}

/// A single `(type, state)` exemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IgnorePattern {
    /// Which migration types are exempt.
    pub migration_type: IgnoreType,
    /// Which state is exempt.
    pub state: IgnoreState,
}

impl IgnorePattern {
    /// Create a pattern.
    pub const fn new(migration_type: IgnoreType, state: IgnoreState) -> Self {
        Self {
            migration_type,
            state,
        }
    }

    /// Whether this pattern exempts a migration of `migration_type` in `state`.
    pub fn covers(&self, migration_type: MigrationType, state: MigrationState) -> bool {
        let type_matches = match self.migration_type {
            IgnoreType::Any => true,
            IgnoreType::Versioned => migration_type == MigrationType::Versioned,
            IgnoreType::Repeatable => migration_type == MigrationType::Repeatable,
        };
        type_matches && self.covers_state(state)
    }

    /// Whether this pattern exempts every migration in `state`, whatever its type.
    pub fn covers_all(&self, state: MigrationState) -> bool {
        self.migration_type == IgnoreType::Any && self.covers_state(state)
    }

    fn covers_state(&self, state: MigrationState) -> bool {
        match self.state {
            IgnoreState::Any => true,
            IgnoreState::Pending => state == MigrationState::Pending,
            IgnoreState::Missing => state == MigrationState::Missing,
        }
    }
}

impl FromStr for IgnorePattern {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| ConfigurationError::MalformedIgnorePattern {
            pattern: s.to_string(),
            reason: reason.to_string(),
        };

        let (type_part, state_part) = s
            .split_once(':')
            .ok_or_else(|| malformed("expected <type>:<state>"))?;

        if state_part.contains(':') {
            return Err(malformed("expected exactly one ':'"));
        }

        let migration_type = match type_part.trim().to_ascii_lowercase().as_str() {
            "*" => IgnoreType::Any,
            "versioned" => IgnoreType::Versioned,
            "repeatable" => IgnoreType::Repeatable,
            _ => return Err(malformed("type must be one of versioned, repeatable, *")),
        };

        let state = match state_part.trim().to_ascii_lowercase().as_str() {
            "*" => IgnoreState::Any,
            "pending" => IgnoreState::Pending,
            "missing" => IgnoreState::Missing,
            _ => return Err(malformed("state must be one of pending, missing, *")),
        };

        Ok(Self::new(migration_type, state))
    }
}

impl fmt::Display for IgnorePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let migration_type = match self.migration_type {
            IgnoreType::Versioned => "versioned",
            IgnoreType::Repeatable => "repeatable",
            IgnoreType::Any => "*",
        };
        let state = match self.state {
            IgnoreState::Pending => "pending",
            IgnoreState::Missing => "missing",
            IgnoreState::Any => "*",
        };
        write!(f, "{}:{}", migration_type, state)
    }
}

/// The configured set of ignore patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnorePatterns(Vec<IgnorePattern>);

impl IgnorePatterns {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every raw pattern, failing on the first malformed one.
    pub fn parse<I, S>(raw: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter()
            .map(|p| p.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Whether any pattern exempts this migration.
    pub fn is_ignored(&self, migration_type: MigrationType, state: MigrationState) -> bool {
        self.0.iter().any(|p| p.covers(migration_type, state))
    }

    /// Whether a wildcard pattern exempts every migration in `state`.
    ///
    /// Only a `*` on the type axis does this. Listing `versioned` and
    /// `repeatable` separately exempts item by item but never the whole check.
    pub fn ignores_all(&self, state: MigrationState) -> bool {
        self.0.iter().any(|p| p.covers_all(state))
    }

    /// Whether no pattern is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern() {
        let pattern: IgnorePattern = "Versioned:PENDING".parse().unwrap();
        assert_eq!(
            pattern,
            IgnorePattern::new(IgnoreType::Versioned, IgnoreState::Pending)
        );

        let pattern: IgnorePattern = "*:missing".parse().unwrap();
        assert_eq!(pattern, IgnorePattern::new(IgnoreType::Any, IgnoreState::Missing));
        assert_eq!(pattern.to_string(), "*:missing");
    }

    #[test]
    fn test_parse_malformed() {
        for raw in [
            "versioned",
            "versioned:",
            "undo:pending",
            "a:b:c",
            ":missing",
            "versioned:applied",
        ] {
            let err = raw.parse::<IgnorePattern>().unwrap_err();
            assert!(
                matches!(err, ConfigurationError::MalformedIgnorePattern { ref pattern, .. } if pattern == raw),
                "{raw} should be malformed"
            );
        }
    }

    #[test]
    fn test_exact_pattern_covers_subset() {
        let pattern = IgnorePattern::new(IgnoreType::Versioned, IgnoreState::Pending);
        assert!(pattern.covers(MigrationType::Versioned, MigrationState::Pending));
        assert!(!pattern.covers(MigrationType::Repeatable, MigrationState::Pending));
        assert!(!pattern.covers(MigrationType::Versioned, MigrationState::Missing));
        assert!(!pattern.covers_all(MigrationState::Pending));
    }

    #[test]
    fn test_wildcards() {
        let any_type = IgnorePattern::new(IgnoreType::Any, IgnoreState::Missing);
        assert!(any_type.covers_all(MigrationState::Missing));
        assert!(!any_type.covers_all(MigrationState::Pending));

        let any_state = IgnorePattern::new(IgnoreType::Repeatable, IgnoreState::Any);
        assert!(any_state.covers(MigrationType::Repeatable, MigrationState::Pending));
        assert!(any_state.covers(MigrationType::Repeatable, MigrationState::Missing));
        assert!(!any_state.covers_all(MigrationState::Missing));
    }

    #[test]
    fn test_two_exact_patterns_are_not_a_wildcard() {
        let patterns = IgnorePatterns::parse(["versioned:missing", "repeatable:missing"]).unwrap();
        assert!(patterns.is_ignored(MigrationType::Versioned, MigrationState::Missing));
        assert!(patterns.is_ignored(MigrationType::Repeatable, MigrationState::Missing));
        assert!(!patterns.ignores_all(MigrationState::Missing));

        let wildcard = IgnorePatterns::parse(["*:missing"]).unwrap();
        assert!(wildcard.ignores_all(MigrationState::Missing));
    }
}
