//! Structural complexity scoring.
//!
//! Counters are plain occurrence counts over the upper-cased text, not a
//! semantic parse. `FROM` and `JOIN` are counted as substrings, so an
//! identifier such as `from_date` inflates `table_count`.

use super::types::{CostTier, QueryComplexity, SecurityLevel, SecurityViolation, ViolationType};
use crate::config::ComplexityLimits;
use crate::constants::{
    CONDITION_WEIGHT, FUNCTION_WEIGHT, HIGH_COST_THRESHOLD, JOIN_WEIGHT, LOW_COST_THRESHOLD,
    MEDIUM_COST_THRESHOLD, SUBQUERY_WEIGHT, TABLE_WEIGHT,
};
use once_cell::sync::Lazy;
use regex::Regex;

static SUBQUERY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*SELECT\b")
        .unwrap_or_else(|e| panic!("Internal error: invalid subquery pattern: {}", e))
});

static FUNCTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:COUNT|SUM|AVG|MAX|MIN)\s*\(")
        .unwrap_or_else(|e| panic!("Internal error: invalid function pattern: {}", e))
});

static CONDITION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:WHERE|AND|OR)\b")
        .unwrap_or_else(|e| panic!("Internal error: invalid condition pattern: {}", e))
});

impl QueryComplexity {
    /// Derive score and cost tier from the five counters.
    pub fn from_counts(
        table_count: usize,
        join_count: usize,
        subquery_count: usize,
        function_count: usize,
        condition_count: usize,
    ) -> Self {
        let complexity_score = table_count as f64 * TABLE_WEIGHT
            + join_count as f64 * JOIN_WEIGHT
            + subquery_count as f64 * SUBQUERY_WEIGHT
            + function_count as f64 * FUNCTION_WEIGHT
            + condition_count as f64 * CONDITION_WEIGHT;

        Self {
            table_count,
            join_count,
            subquery_count,
            function_count,
            condition_count,
            complexity_score,
            estimated_cost: cost_tier(complexity_score),
        }
    }
}

/// Bucket a score into a cost tier.
pub fn cost_tier(score: f64) -> CostTier {
    if score < LOW_COST_THRESHOLD {
        CostTier::Low
    } else if score < MEDIUM_COST_THRESHOLD {
        CostTier::Medium
    } else if score < HIGH_COST_THRESHOLD {
        CostTier::High
    } else {
        CostTier::VeryHigh
    }
}

/// Count structural features of a statement.
pub fn analyze_complexity(sql: &str) -> QueryComplexity {
    let normalized = sql.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();

    let join_count = normalized.matches("JOIN").count();
    let table_count = normalized.matches("FROM").count() + join_count;

    QueryComplexity::from_counts(
        table_count,
        join_count,
        SUBQUERY_PATTERN.find_iter(&normalized).count(),
        FUNCTION_PATTERN.find_iter(&normalized).count(),
        CONDITION_PATTERN.find_iter(&normalized).count(),
    )
}

/// Compare counters against the configured limits.
pub fn check_limits(complexity: &QueryComplexity, limits: &ComplexityLimits) -> Vec<SecurityViolation> {
    let mut violations = Vec::new();

    if complexity.table_count > limits.max_table_count {
        violations.push(limit_violation(
            SecurityLevel::Blocked,
            format!(
                "Query references {} tables, exceeding the limit of {}",
                complexity.table_count, limits.max_table_count
            ),
        ));
    }

    if complexity.join_count > limits.max_join_count {
        violations.push(limit_violation(
            SecurityLevel::Warning,
            format!(
                "Query has {} joins, exceeding the recommended maximum of {}",
                complexity.join_count, limits.max_join_count
            ),
        ));
    }

    if complexity.subquery_count > limits.max_subquery_count {
        violations.push(limit_violation(
            SecurityLevel::Warning,
            format!(
                "Query has {} subqueries, exceeding the recommended maximum of {}",
                complexity.subquery_count, limits.max_subquery_count
            ),
        ));
    }

    if complexity.complexity_score > limits.max_complexity_score {
        violations.push(limit_violation(
            SecurityLevel::Blocked,
            format!(
                "Complexity score {:.1} exceeds the limit of {:.1}",
                complexity.complexity_score, limits.max_complexity_score
            ),
        ));
    }

    violations
}

fn limit_violation(level: SecurityLevel, message: String) -> SecurityViolation {
    SecurityViolation::new(level, ViolationType::ComplexityLimit, message)
        .with_suggestion("Split the query or reduce joins and subqueries")
}
