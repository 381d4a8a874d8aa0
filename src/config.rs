//! Configuration for the SQL guard.
//!
//! Every tunable is a value on [`GuardConfig`]; nothing is read from process
//! state at validation time. [`GuardConfig::from_env`] loads overrides from
//! environment variables following the 12-factor app pattern.

use crate::constants::{
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL_SECS, DEFAULT_DANGEROUS_KEYWORDS,
    DEFAULT_INJECTION_PATTERNS, DEFAULT_MAX_COMPLEXITY_SCORE, DEFAULT_MAX_JOIN_COUNT,
    DEFAULT_MAX_QUERY_LENGTH, DEFAULT_MAX_SUBQUERY_COUNT, DEFAULT_MAX_TABLE_COUNT,
};
use crate::error::GuardError;
use crate::security::SqlOperation;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Guard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Complexity limits applied when a call supplies none
    pub limits: ComplexityLimits,

    /// Keywords flagged anywhere in the text
    pub dangerous_keywords: Vec<String>,

    /// Operations rejected outright
    pub blocked_operations: Vec<SqlOperation>,

    /// Operations that require elevated permission
    pub elevated_operations: Vec<SqlOperation>,

    /// Injection heuristics, compiled when the guard is built
    pub injection_patterns: Vec<InjectionPattern>,

    /// Maximum query length (bytes)
    pub max_query_length: usize,

    /// Result cache configuration
    pub cache: CacheConfig,
}

/// Structural complexity limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityLimits {
    pub max_table_count: usize,
    pub max_join_count: usize,
    pub max_subquery_count: usize,
    pub max_complexity_score: f64,
}

/// A named injection heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionPattern {
    /// Category reported in violation messages
    pub category: String,

    /// Regex source, matched case-insensitively
    pub pattern: String,
}

impl InjectionPattern {
    pub fn new(category: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            pattern: pattern.into(),
        }
    }
}

/// Caller-side result cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable result caching
    pub enabled: bool,

    /// Time-to-live for cached results
    pub ttl: Duration,

    /// Maximum number of cached entries
    pub max_entries: usize,
}

impl GuardConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// All optional; unparsable values fall back to the defaults.
    /// - `SQLGUARD_MAX_TABLE_COUNT` (default: 10)
    /// - `SQLGUARD_MAX_JOIN_COUNT` (default: 8)
    /// - `SQLGUARD_MAX_SUBQUERY_COUNT` (default: 5)
    /// - `SQLGUARD_MAX_COMPLEXITY_SCORE` (default: 100.0)
    /// - `SQLGUARD_DANGEROUS_KEYWORDS`: comma-separated keyword list
    /// - `SQLGUARD_MAX_QUERY_LENGTH`: bytes (default: 1000000)
    /// - `SQLGUARD_ENABLE_CACHE`: enable result caching (default: false)
    /// - `SQLGUARD_CACHE_TTL`: seconds (default: 300)
    /// - `SQLGUARD_CACHE_MAX_ENTRIES` (default: 1000)
    ///
    /// The cache settings only take effect for callers that build a
    /// [`ValidationCache`](crate::cache::ValidationCache) from
    /// [`GuardConfig::cache`]; the `sql-guard` binary validates a single
    /// statement and never creates one.
    pub fn from_env() -> Result<Self, GuardError> {
        let defaults = Self::default();

        let limits = ComplexityLimits {
            max_table_count: env_parse("SQLGUARD_MAX_TABLE_COUNT")
                .unwrap_or(defaults.limits.max_table_count),
            max_join_count: env_parse("SQLGUARD_MAX_JOIN_COUNT")
                .unwrap_or(defaults.limits.max_join_count),
            max_subquery_count: env_parse("SQLGUARD_MAX_SUBQUERY_COUNT")
                .unwrap_or(defaults.limits.max_subquery_count),
            max_complexity_score: env_parse("SQLGUARD_MAX_COMPLEXITY_SCORE")
                .unwrap_or(defaults.limits.max_complexity_score),
        };

        let dangerous_keywords = match std::env::var("SQLGUARD_DANGEROUS_KEYWORDS") {
            Ok(list) => {
                let keywords: Vec<String> = list
                    .split(',')
                    .map(|k| k.trim().to_uppercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                if keywords.is_empty() {
                    return Err(GuardError::config(
                        "SQLGUARD_DANGEROUS_KEYWORDS is set but contains no keywords",
                    ));
                }
                keywords
            }
            Err(_) => defaults.dangerous_keywords,
        };

        let max_query_length =
            env_parse("SQLGUARD_MAX_QUERY_LENGTH").unwrap_or(defaults.max_query_length);

        let enabled = std::env::var("SQLGUARD_ENABLE_CACHE")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        let ttl_secs = env_parse("SQLGUARD_CACHE_TTL").unwrap_or(DEFAULT_CACHE_TTL_SECS);

        let max_entries =
            env_parse("SQLGUARD_CACHE_MAX_ENTRIES").unwrap_or(defaults.cache.max_entries);

        Ok(GuardConfig {
            limits,
            dangerous_keywords,
            max_query_length,
            cache: CacheConfig {
                enabled,
                ttl: Duration::from_secs(ttl_secs),
                max_entries,
            },
            ..defaults
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            limits: ComplexityLimits::default(),
            dangerous_keywords: DEFAULT_DANGEROUS_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            blocked_operations: vec![
                SqlOperation::Drop,
                SqlOperation::Delete,
                SqlOperation::Truncate,
            ],
            elevated_operations: vec![
                SqlOperation::Insert,
                SqlOperation::Update,
                SqlOperation::Alter,
                SqlOperation::Create,
            ],
            injection_patterns: DEFAULT_INJECTION_PATTERNS
                .iter()
                .map(|(category, pattern)| InjectionPattern::new(*category, *pattern))
                .collect(),
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
            cache: CacheConfig::default(),
        }
    }
}

impl Default for ComplexityLimits {
    fn default() -> Self {
        Self {
            max_table_count: DEFAULT_MAX_TABLE_COUNT,
            max_join_count: DEFAULT_MAX_JOIN_COUNT,
            max_subquery_count: DEFAULT_MAX_SUBQUERY_COUNT,
            max_complexity_score: DEFAULT_MAX_COMPLEXITY_SCORE,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}
