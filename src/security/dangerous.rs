//! Dangerous operation and keyword detection.

use super::types::{SecurityLevel, SecurityViolation, SqlOperation, ViolationType};
use crate::error::GuardError;
use regex::Regex;

/// Applies the operation policy and scans for dangerous keywords.
#[derive(Debug, Clone)]
pub struct DangerousOperationDetector {
    blocked_operations: Vec<SqlOperation>,
    elevated_operations: Vec<SqlOperation>,
    keywords: Vec<(Regex, String)>,
}

impl DangerousOperationDetector {
    /// Build a detector from the configured policy.
    ///
    /// Keywords ending in `_` match as identifier prefixes; all others must
    /// stand alone as words.
    pub fn new(
        blocked_operations: &[SqlOperation],
        elevated_operations: &[SqlOperation],
        dangerous_keywords: &[String],
    ) -> Result<Self, GuardError> {
        let mut keywords = Vec::with_capacity(dangerous_keywords.len());
        for keyword in dangerous_keywords {
            let keyword = keyword.trim().to_uppercase();
            if keyword.is_empty() {
                return Err(GuardError::config("Dangerous keyword cannot be empty"));
            }
            keywords.push((keyword_pattern(&keyword)?, keyword));
        }

        Ok(Self {
            blocked_operations: blocked_operations.to_vec(),
            elevated_operations: elevated_operations.to_vec(),
            keywords,
        })
    }

    /// Verdict for the statement's top-level operation.
    pub fn check_operation(&self, operation: SqlOperation) -> Option<SecurityViolation> {
        if self.blocked_operations.contains(&operation) {
            return Some(
                SecurityViolation::new(
                    SecurityLevel::Blocked,
                    ViolationType::DangerousOperation,
                    format!(
                        "Dangerous operation {} is not allowed; only SELECT is unconditionally allowed",
                        operation
                    ),
                )
                .with_suggestion("Rewrite the request as a read-only SELECT query"),
            );
        }

        if self.elevated_operations.contains(&operation) {
            return Some(
                SecurityViolation::new(
                    SecurityLevel::Dangerous,
                    ViolationType::WriteOperation,
                    format!("Write operation {} requires elevated permission", operation),
                )
                .with_suggestion("Run write operations through an explicitly authorized path"),
            );
        }

        if operation == SqlOperation::Unknown {
            return Some(SecurityViolation::new(
                SecurityLevel::Warning,
                ViolationType::DangerousOperation,
                "Unrecognized statement type; only SELECT is unconditionally allowed",
            ));
        }

        None
    }

    /// One WARNING per dangerous keyword occurrence anywhere in the text.
    pub fn scan_keywords(&self, sql: &str) -> Vec<SecurityViolation> {
        let mut violations = Vec::new();
        for (pattern, keyword) in &self.keywords {
            for found in pattern.find_iter(sql) {
                violations.push(
                    SecurityViolation::new(
                        SecurityLevel::Warning,
                        ViolationType::DangerousKeyword,
                        format!("Potential dangerous keyword '{}'", keyword),
                    )
                    .with_location(found.as_str()),
                );
            }
        }
        violations
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|(_, k)| k.as_str())
    }

    pub fn blocked_operations(&self) -> &[SqlOperation] {
        &self.blocked_operations
    }

    pub fn elevated_operations(&self) -> &[SqlOperation] {
        &self.elevated_operations
    }
}

fn keyword_pattern(keyword: &str) -> Result<Regex, GuardError> {
    let escaped = regex::escape(keyword);
    let is_prefix = keyword.ends_with('_');
    let pattern = if is_prefix {
        format!(r"(?i)\b{}\w*", escaped)
    } else {
        format!(r"(?i)\b{}\b", escaped)
    };
    Regex::new(&pattern)
        .map_err(|e| GuardError::config(format!("Invalid keyword '{}': {}", keyword, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_DANGEROUS_KEYWORDS;

    fn detector() -> DangerousOperationDetector {
        let keywords: Vec<String> = DEFAULT_DANGEROUS_KEYWORDS
            .iter()
            .map(|k| k.to_string())
            .collect();
        DangerousOperationDetector::new(
            &[SqlOperation::Drop, SqlOperation::Delete, SqlOperation::Truncate],
            &[
                SqlOperation::Insert,
                SqlOperation::Update,
                SqlOperation::Alter,
                SqlOperation::Create,
            ],
            &keywords,
        )
        .unwrap()
    }

    #[test]
    fn test_operation_policy() {
        let d = detector();
        assert!(d.check_operation(SqlOperation::Select).is_none());

        let drop = d.check_operation(SqlOperation::Drop).unwrap();
        assert_eq!(drop.level, SecurityLevel::Blocked);
        assert_eq!(drop.violation_type, ViolationType::DangerousOperation);

        let insert = d.check_operation(SqlOperation::Insert).unwrap();
        assert_eq!(insert.level, SecurityLevel::Dangerous);
        assert_eq!(insert.violation_type, ViolationType::WriteOperation);

        let unknown = d.check_operation(SqlOperation::Unknown).unwrap();
        assert_eq!(unknown.level, SecurityLevel::Warning);
    }

    #[test]
    fn test_hidden_keywords_in_select() {
        let d = detector();
        let found = d.scan_keywords("SELECT * FROM t WHERE x = 'drop' OR exec_flag = 1");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].location.as_deref(), Some("drop"));
        assert_eq!(found[0].level, SecurityLevel::Warning);
    }

    #[test]
    fn test_one_violation_per_occurrence() {
        let d = detector();
        let found = d.scan_keywords("SELECT 1; DROP TABLE a; DROP TABLE b");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_prefix_keywords() {
        let d = detector();
        let found = d.scan_keywords("SELECT * FROM t; EXEC xp_cmdshell 'dir'");
        let locations: Vec<_> = found.iter().filter_map(|v| v.location.as_deref()).collect();
        assert!(locations.contains(&"xp_cmdshell"));
        assert!(locations.contains(&"EXEC"));
    }

    #[test]
    fn test_words_containing_keywords_are_ignored() {
        let d = detector();
        assert!(d.scan_keywords("SELECT created_at, updated_by FROM t").is_empty());
        assert!(d.scan_keywords("SELECT dropped_at FROM backups").is_empty());
    }

    #[test]
    fn test_whole_words_match_inside_literals_and_comments() {
        let d = detector();
        let hits = d.scan_keywords("SELECT 'drop' AS verb FROM t /* backup */");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].location.as_deref(), Some("drop"));
    }

    #[test]
    fn test_empty_keyword_rejected() {
        let result = DangerousOperationDetector::new(&[], &[], &["  ".to_string()]);
        assert!(matches!(result, Err(GuardError::Config(_))));
    }
}
