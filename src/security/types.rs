//! Value types produced by a validation call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level SQL operation of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SqlOperation {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    Truncate,
    Unknown,
}

impl SqlOperation {
    /// All recognized operations, in classification order.
    pub const KNOWN: [SqlOperation; 8] = [
        SqlOperation::Select,
        SqlOperation::Insert,
        SqlOperation::Update,
        SqlOperation::Delete,
        SqlOperation::Create,
        SqlOperation::Drop,
        SqlOperation::Alter,
        SqlOperation::Truncate,
    ];

    /// Upper-case SQL keyword for this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlOperation::Select => "SELECT",
            SqlOperation::Insert => "INSERT",
            SqlOperation::Update => "UPDATE",
            SqlOperation::Delete => "DELETE",
            SqlOperation::Create => "CREATE",
            SqlOperation::Drop => "DROP",
            SqlOperation::Alter => "ALTER",
            SqlOperation::Truncate => "TRUNCATE",
            SqlOperation::Unknown => "UNKNOWN",
        }
    }

    /// Map a leading keyword to an operation.
    pub fn from_keyword(keyword: &str) -> SqlOperation {
        Self::KNOWN
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(keyword))
            .unwrap_or(SqlOperation::Unknown)
    }

    /// Check if this is a read operation.
    pub fn is_read(&self) -> bool {
        matches!(self, SqlOperation::Select)
    }
}

impl fmt::Display for SqlOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a finding, ascending.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityLevel {
    #[default]
    Safe,
    Warning,
    Dangerous,
    Blocked,
}

impl SecurityLevel {
    /// Whether a statement at this level may still be executed.
    pub fn is_executable(&self) -> bool {
        *self != SecurityLevel::Blocked
    }

    /// Whether a sanitized statement is published at this level.
    pub fn allows_sanitized(&self) -> bool {
        matches!(self, SecurityLevel::Safe | SecurityLevel::Warning)
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SecurityLevel::Safe => "SAFE",
            SecurityLevel::Warning => "WARNING",
            SecurityLevel::Dangerous => "DANGEROUS",
            SecurityLevel::Blocked => "BLOCKED",
        };
        f.write_str(s)
    }
}

/// Taxonomy tag of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    DangerousOperation,
    WriteOperation,
    DangerousKeyword,
    SqlInjection,
    TableNotFound,
    FieldNotFound,
    ComplexityLimit,
    ParseError,
    ValidationError,
}

impl ViolationType {
    /// Types reported by the injection/dangerous-operation view.
    pub fn is_security_finding(&self) -> bool {
        matches!(
            self,
            ViolationType::SqlInjection
                | ViolationType::DangerousOperation
                | ViolationType::WriteOperation
                | ViolationType::DangerousKeyword
        )
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityViolation {
    pub level: SecurityLevel,
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl SecurityViolation {
    pub fn new(
        level: SecurityLevel,
        violation_type: ViolationType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            violation_type,
            message: message.into(),
            location: None,
            suggestion: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// A table named after `FROM` or a `JOIN`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReference {
    pub table_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// A column named in the select list.
///
/// `field_name == "*"` means all columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReference {
    pub field_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_alias: Option<String>,
}

impl FieldReference {
    pub fn is_wildcard(&self) -> bool {
        self.field_name == "*"
    }

    /// The qualifier as written, alias first.
    pub fn qualifier(&self) -> Option<&str> {
        self.table_alias.as_deref().or(self.table_name.as_deref())
    }
}

/// Estimated execution cost bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostTier {
    #[default]
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Structural counters and the score derived from them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryComplexity {
    pub table_count: usize,
    pub join_count: usize,
    pub subquery_count: usize,
    pub function_count: usize,
    pub condition_count: usize,
    pub complexity_score: f64,
    pub estimated_cost: CostTier,
}

/// Outcome of validating one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub security_level: SecurityLevel,
    pub operation: SqlOperation,
    pub violations: Vec<SecurityViolation>,
    pub table_references: Vec<TableReference>,
    pub field_references: Vec<FieldReference>,
    pub complexity: QueryComplexity,
    pub sanitized_sql: Option<String>,
}

impl ValidationResult {
    /// Fail-closed result for a statement that could not be analyzed.
    pub fn blocked(violation: SecurityViolation) -> Self {
        Self {
            is_valid: false,
            security_level: SecurityLevel::Blocked,
            operation: SqlOperation::Unknown,
            violations: vec![violation],
            table_references: Vec::new(),
            field_references: Vec::new(),
            complexity: QueryComplexity::default(),
            sanitized_sql: None,
        }
    }

    /// Count violations of the given type.
    pub fn count_of(&self, violation_type: ViolationType) -> usize {
        self.violations
            .iter()
            .filter(|v| v.violation_type == violation_type)
            .count()
    }

    pub fn has_violation(&self, violation_type: ViolationType) -> bool {
        self.count_of(violation_type) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_level_order() {
        assert!(SecurityLevel::Safe < SecurityLevel::Warning);
        assert!(SecurityLevel::Warning < SecurityLevel::Dangerous);
        assert!(SecurityLevel::Dangerous < SecurityLevel::Blocked);
    }

    #[test]
    fn test_operation_from_keyword() {
        assert_eq!(SqlOperation::from_keyword("select"), SqlOperation::Select);
        assert_eq!(SqlOperation::from_keyword("Truncate"), SqlOperation::Truncate);
        assert_eq!(SqlOperation::from_keyword("MERGE"), SqlOperation::Unknown);
    }

    #[test]
    fn test_serialized_tags() {
        let v = SecurityViolation::new(
            SecurityLevel::Blocked,
            ViolationType::SqlInjection,
            "tautology",
        );
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["level"], "BLOCKED");
        assert_eq!(json["type"], "SQL_INJECTION");
        assert!(json.get("location").is_none());

        let cost = serde_json::to_value(CostTier::VeryHigh).unwrap();
        assert_eq!(cost, "VERY_HIGH");
    }

    #[test]
    fn test_blocked_result_is_invalid() {
        let result = ValidationResult::blocked(SecurityViolation::new(
            SecurityLevel::Blocked,
            ViolationType::ParseError,
            "bad",
        ));
        assert!(!result.is_valid);
        assert!(result.sanitized_sql.is_none());
        assert_eq!(result.count_of(ViolationType::ParseError), 1);
    }
}
