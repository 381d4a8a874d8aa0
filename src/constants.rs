//! Centralized constants for the SQL guard.
//!
//! This module contains all default limits, keyword sets and pattern sources
//! used to build a [`GuardConfig`](crate::config::GuardConfig), making them easy
//! to find, understand, and override per deployment.

use std::time::Duration;

// =============================================================================
// Complexity Limits
// =============================================================================

/// Default maximum number of table references (`FROM` + `JOIN`).
pub const DEFAULT_MAX_TABLE_COUNT: usize = 10;

/// Default maximum number of joins.
pub const DEFAULT_MAX_JOIN_COUNT: usize = 8;

/// Default maximum number of subqueries.
pub const DEFAULT_MAX_SUBQUERY_COUNT: usize = 5;

/// Default maximum weighted complexity score.
pub const DEFAULT_MAX_COMPLEXITY_SCORE: f64 = 100.0;

// =============================================================================
// Complexity Weights
// =============================================================================

/// Score weight per table reference.
pub const TABLE_WEIGHT: f64 = 5.0;

/// Score weight per join.
pub const JOIN_WEIGHT: f64 = 10.0;

/// Score weight per subquery.
pub const SUBQUERY_WEIGHT: f64 = 15.0;

/// Score weight per aggregate function call.
pub const FUNCTION_WEIGHT: f64 = 3.0;

/// Score weight per condition keyword.
pub const CONDITION_WEIGHT: f64 = 2.0;

/// Upper bound (exclusive) of the LOW cost tier.
pub const LOW_COST_THRESHOLD: f64 = 20.0;

/// Upper bound (exclusive) of the MEDIUM cost tier.
pub const MEDIUM_COST_THRESHOLD: f64 = 50.0;

/// Upper bound (exclusive) of the HIGH cost tier.
pub const HIGH_COST_THRESHOLD: f64 = 100.0;

// =============================================================================
// Input Limits
// =============================================================================

/// Default maximum query length in bytes.
pub const DEFAULT_MAX_QUERY_LENGTH: usize = 1_000_000;

// =============================================================================
// Keyword Sets
// =============================================================================

/// Keywords flagged wherever they occur in a statement.
///
/// Entries ending in `_` are prefixes (`SP_`, `XP_`) and match any identifier
/// starting with them.
pub const DEFAULT_DANGEROUS_KEYWORDS: &[&str] = &[
    "DROP",
    "DELETE",
    "TRUNCATE",
    "ALTER",
    "CREATE",
    "INSERT",
    "UPDATE",
    "EXEC",
    "EXECUTE",
    "SP_",
    "XP_",
    "OPENROWSET",
    "OPENDATASOURCE",
    "BULK",
    "SHUTDOWN",
    "BACKUP",
    "RESTORE",
];

// =============================================================================
// Injection Patterns
// =============================================================================

/// Default injection pattern sources as `(category, regex)` pairs.
///
/// Patterns are compiled case-insensitively when the guard is built.
pub const DEFAULT_INJECTION_PATTERNS: &[(&str, &str)] = &[
    // Tautologies
    ("tautology", r"\b(?:OR|AND)\s+\d+\s*=\s*\d+"),
    ("tautology", r"\b(?:OR|AND)\s+'[^']*'\s*=\s*'[^']*'"),
    // Stacked statements
    (
        "statement chaining",
        r";\s*(?:DROP|DELETE|INSERT|UPDATE|CREATE|ALTER)\b",
    ),
    // Union-based exfiltration
    ("union select", r"\bUNION\s+(?:ALL\s+)?SELECT\b"),
    // Comment truncation
    ("comment truncation", r"--"),
    ("comment truncation", r"#"),
    ("comment truncation", r"(?s)/\*.*?\*/"),
    // String obfuscation
    ("string obfuscation", r"\b(?:CHAR|CONCAT|SUBSTRING)\s*\("),
];

// =============================================================================
// Cache Constants
// =============================================================================

/// Default cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default cache TTL as Duration.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(DEFAULT_CACHE_TTL_SECS);

/// Default maximum cache entries.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_thresholds_are_ordered() {
        assert!(LOW_COST_THRESHOLD < MEDIUM_COST_THRESHOLD);
        assert!(MEDIUM_COST_THRESHOLD < HIGH_COST_THRESHOLD);
    }

    #[test]
    fn test_default_keywords_are_uppercase() {
        for keyword in DEFAULT_DANGEROUS_KEYWORDS {
            assert_eq!(*keyword, keyword.to_uppercase());
        }
    }
}
