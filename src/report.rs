//! Report shapes derived from a [`ValidationResult`].
//!
//! Pure formatting; nothing here re-validates.

use crate::config::ComplexityLimits;
use crate::security::{
    FieldReference, QueryComplexity, SecurityLevel, SecurityViolation, SqlOperation,
    TableReference, ValidationResult, ViolationType,
};
use serde::Serialize;

/// Nested summary consumed by API callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityReport {
    pub summary: ReportSummary,
    pub violations: Vec<SecurityViolation>,
    pub references: ReportReferences,
    pub complexity: QueryComplexity,
    pub sanitized_sql: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub is_valid: bool,
    pub security_level: SecurityLevel,
    pub operation: SqlOperation,
    pub violation_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportReferences {
    pub tables: Vec<TableReference>,
    pub fields: Vec<FieldReference>,
}

/// Complexity subset of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityView {
    pub complexity: QueryComplexity,
    pub limit_violations: Vec<SecurityViolation>,
}

/// Injection and dangerous-operation findings of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InjectionView {
    pub is_safe: bool,
    pub security_level: SecurityLevel,
    pub violations: Vec<SecurityViolation>,
}

/// Read-only dump of the guard's tunables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityConfigView {
    pub limits: ComplexityLimits,
    pub dangerous_keywords: Vec<String>,
    pub blocked_operations: Vec<SqlOperation>,
    pub elevated_operations: Vec<SqlOperation>,
    pub injection_patterns: Vec<PatternView>,
    pub max_query_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternView {
    pub category: String,
    pub pattern: String,
}

/// Format a result into the nested report shape.
pub fn security_report(result: &ValidationResult) -> SecurityReport {
    SecurityReport {
        summary: ReportSummary {
            is_valid: result.is_valid,
            security_level: result.security_level,
            operation: result.operation,
            violation_count: result.violations.len(),
        },
        violations: result.violations.clone(),
        references: ReportReferences {
            tables: result.table_references.clone(),
            fields: result.field_references.clone(),
        },
        complexity: result.complexity.clone(),
        sanitized_sql: result.sanitized_sql.clone(),
    }
}

pub fn complexity_view(result: &ValidationResult) -> ComplexityView {
    ComplexityView {
        complexity: result.complexity.clone(),
        limit_violations: result
            .violations
            .iter()
            .filter(|v| v.violation_type == ViolationType::ComplexityLimit)
            .cloned()
            .collect(),
    }
}

pub fn injection_view(result: &ValidationResult) -> InjectionView {
    let violations: Vec<SecurityViolation> = result
        .violations
        .iter()
        .filter(|v| v.violation_type.is_security_finding())
        .cloned()
        .collect();
    let security_level = violations
        .iter()
        .map(|v| v.level)
        .max()
        .unwrap_or_default();

    InjectionView {
        is_safe: security_level == SecurityLevel::Safe,
        security_level,
        violations,
    }
}
