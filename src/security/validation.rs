//! Validation orchestrator.
//!
//! [`SqlGuard`] sequences tokenization, classification, detection, schema
//! checks and complexity scoring, then reduces the findings to one
//! [`SecurityLevel`]. It holds only immutable configuration, so a single guard
//! can be shared across threads and called concurrently.

use super::complexity::{analyze_complexity, check_limits};
use super::dangerous::DangerousOperationDetector;
use super::injection::InjectionDetector;
use super::operation::classify_operation;
use super::references::{extract_field_references, extract_table_references};
use super::sanitize::sanitize_sql;
use super::schema::{validate_schema, TableCatalog};
use super::tokenizer::{LexerTokenizer, StatementTokenizer};
use super::types::{SecurityLevel, SecurityViolation, ValidationResult};
use crate::cache::{CacheKey, ValidationCache};
use crate::config::{ComplexityLimits, GuardConfig};
use crate::error::GuardError;
use crate::report::{PatternView, SecurityConfigView};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Reduce violations to the most severe level, `Safe` when there are none.
pub fn aggregate_level(violations: &[SecurityViolation]) -> SecurityLevel {
    violations
        .iter()
        .map(|v| v.level)
        .max()
        .unwrap_or(SecurityLevel::Safe)
}

/// SQL security and complexity validator.
#[derive(Debug, Clone)]
pub struct SqlGuard<T = LexerTokenizer> {
    config: GuardConfig,
    tokenizer: T,
    dangerous: DangerousOperationDetector,
    injection: InjectionDetector,
}

impl SqlGuard<LexerTokenizer> {
    /// Build a guard using the `sqlparser` lexer.
    pub fn new(config: GuardConfig) -> Result<Self, GuardError> {
        Self::with_tokenizer(config, LexerTokenizer)
    }
}

impl<T: StatementTokenizer> SqlGuard<T> {
    /// Build a guard around a custom tokenizer.
    ///
    /// Fails if a configured pattern does not compile or a keyword is empty.
    pub fn with_tokenizer(config: GuardConfig, tokenizer: T) -> Result<Self, GuardError> {
        let dangerous = DangerousOperationDetector::new(
            &config.blocked_operations,
            &config.elevated_operations,
            &config.dangerous_keywords,
        )?;
        let injection = InjectionDetector::new(&config.injection_patterns)?;

        info!(
            max_table_count = config.limits.max_table_count,
            max_join_count = config.limits.max_join_count,
            max_subquery_count = config.limits.max_subquery_count,
            max_complexity_score = config.limits.max_complexity_score,
            keywords = config.dangerous_keywords.len(),
            injection_patterns = config.injection_patterns.len(),
            "SQL guard initialized"
        );

        Ok(Self {
            config,
            tokenizer,
            dangerous,
            injection,
        })
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Validate a statement.
    ///
    /// Never fails: any internal error, including a panic in a detector, is
    /// returned as a BLOCKED result. Schema checks run only when `schema` is
    /// given; `limits` overrides the configured complexity limits.
    pub fn validate(
        &self,
        sql: &str,
        schema: Option<&TableCatalog>,
        limits: Option<&ComplexityLimits>,
    ) -> ValidationResult {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.try_validate(sql, schema, limits)))
            .unwrap_or_else(|_| Err(GuardError::internal("validation panicked")));

        match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Validation failed closed");
                let mut violation = SecurityViolation::new(
                    SecurityLevel::Blocked,
                    e.violation_type(),
                    e.to_string(),
                );
                if let Some(suggestion) = e.suggestion() {
                    violation = violation.with_suggestion(suggestion);
                }
                ValidationResult::blocked(violation)
            }
        }
    }

    /// Validate through a caller-owned cache keyed by statement and schema version.
    ///
    /// Uses the configured limits. A disabled cache is bypassed.
    pub fn validate_cached(
        &self,
        cache: &ValidationCache,
        sql: &str,
        schema: Option<&TableCatalog>,
        schema_version: Option<&str>,
    ) -> ValidationResult {
        if !cache.is_enabled() {
            return self.validate(sql, schema, None);
        }

        let key = CacheKey::new(sql, schema_version);
        if let Some(result) = cache.get(&key) {
            debug!("Validation cache hit");
            return result;
        }

        let result = self.validate(sql, schema, None);
        cache.insert(key, result.clone());
        result
    }

    /// Strip comments and normalize whitespace.
    pub fn sanitize(&self, sql: &str) -> String {
        sanitize_sql(sql)
    }

    /// Read-only view of the active tunables and keyword sets.
    pub fn security_config(&self) -> SecurityConfigView {
        SecurityConfigView {
            limits: self.config.limits,
            dangerous_keywords: self.dangerous.keywords().map(str::to_string).collect(),
            blocked_operations: self.dangerous.blocked_operations().to_vec(),
            elevated_operations: self.dangerous.elevated_operations().to_vec(),
            injection_patterns: self
                .injection
                .patterns()
                .map(|(category, pattern)| PatternView {
                    category: category.to_string(),
                    pattern: pattern.to_string(),
                })
                .collect(),
            max_query_length: self.config.max_query_length,
        }
    }

    fn try_validate(
        &self,
        sql: &str,
        schema: Option<&TableCatalog>,
        limits: Option<&ComplexityLimits>,
    ) -> Result<ValidationResult, GuardError> {
        if sql.trim().is_empty() {
            return Err(GuardError::invalid_input("SQL statement cannot be empty"));
        }

        if sql.len() > self.config.max_query_length {
            return Err(GuardError::invalid_input(format!(
                "Query exceeds maximum length of {} bytes",
                self.config.max_query_length
            )));
        }

        let parsed = self.tokenizer.tokenize(sql)?;
        if parsed.is_blank() {
            return Err(GuardError::invalid_input(
                "SQL statement contains only comments",
            ));
        }

        let operation = classify_operation(&parsed, sql);
        debug!(
            %operation,
            statements = parsed.statement_count(),
            has_comments = parsed.has_comments(),
            "Statement classified"
        );

        let mut violations = Vec::new();
        violations.extend(self.dangerous.check_operation(operation));
        violations.extend(self.dangerous.scan_keywords(sql));
        violations.extend(self.injection.check(sql));

        let normalized = sanitize_sql(sql);
        let table_references = extract_table_references(&normalized)?;
        let field_references = extract_field_references(&normalized, &table_references);
        debug!(
            tables = table_references.len(),
            fields = field_references.len(),
            "References extracted"
        );

        if let Some(catalog) = schema {
            violations.extend(validate_schema(
                &table_references,
                &field_references,
                catalog,
            )?);
        }

        let complexity = analyze_complexity(&normalized);
        violations.extend(check_limits(
            &complexity,
            limits.unwrap_or(&self.config.limits),
        ));
        debug!(
            score = complexity.complexity_score,
            cost = ?complexity.estimated_cost,
            "Complexity analyzed"
        );

        let security_level = aggregate_level(&violations);
        if security_level == SecurityLevel::Blocked {
            warn!(
                %operation,
                violations = violations.len(),
                "Statement blocked"
            );
        }

        let sanitized_sql = security_level.allows_sanitized().then_some(normalized);

        Ok(ValidationResult {
            is_valid: security_level.is_executable(),
            security_level,
            operation,
            violations,
            table_references,
            field_references,
            complexity,
            sanitized_sql,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::tokenizer::ParsedStatement;
    use crate::security::{SqlOperation, ViolationType};

    fn guard() -> SqlGuard {
        SqlGuard::new(GuardConfig::default()).unwrap()
    }

    #[test]
    fn test_aggregate_level() {
        assert_eq!(aggregate_level(&[]), SecurityLevel::Safe);
        let violations = vec![
            SecurityViolation::new(SecurityLevel::Warning, ViolationType::DangerousKeyword, "a"),
            SecurityViolation::new(SecurityLevel::Dangerous, ViolationType::WriteOperation, "b"),
        ];
        assert_eq!(aggregate_level(&violations), SecurityLevel::Dangerous);
    }

    #[test]
    fn test_safe_select() {
        let result = guard().validate("SELECT id, name FROM users WHERE id = 5", None, None);
        assert!(result.is_valid);
        assert_eq!(result.security_level, SecurityLevel::Safe);
        assert_eq!(result.operation, SqlOperation::Select);
        assert!(result.violations.is_empty());
        assert_eq!(
            result.sanitized_sql.as_deref(),
            Some("SELECT id, name FROM users WHERE id = 5")
        );
    }

    #[test]
    fn test_write_is_dangerous_but_valid() {
        let result = guard().validate("INSERT INTO logs (msg) VALUES ('hi')", None, None);
        assert!(result.is_valid);
        assert_eq!(result.security_level, SecurityLevel::Dangerous);
        assert!(result.has_violation(ViolationType::WriteOperation));
        assert!(result.has_violation(ViolationType::DangerousKeyword));
        assert!(result.sanitized_sql.is_none());
    }

    #[test]
    fn test_hidden_keyword_is_warning() {
        let result = guard().validate("SELECT * FROM t WHERE action = 'restore'", None, None);
        assert!(result.is_valid);
        assert_eq!(result.security_level, SecurityLevel::Warning);
        assert!(result.sanitized_sql.is_some());
    }

    #[test]
    fn test_empty_input_fails_closed() {
        for sql in ["", "   ", "-- only a comment"] {
            let result = guard().validate(sql, None, None);
            assert!(!result.is_valid);
            assert_eq!(result.security_level, SecurityLevel::Blocked);
            assert!(result.has_violation(ViolationType::ParseError), "{:?}", sql);
        }
    }

    #[test]
    fn test_parse_error_fails_closed() {
        let result = guard().validate("SELECT 'unterminated FROM t", None, None);
        assert_eq!(result.security_level, SecurityLevel::Blocked);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].violation_type, ViolationType::ParseError);
        assert!(result.sanitized_sql.is_none());
    }

    #[test]
    fn test_query_length_limit() {
        let config = GuardConfig {
            max_query_length: 20,
            ..GuardConfig::default()
        };
        let guard = SqlGuard::new(config).unwrap();
        let result = guard.validate("SELECT a, b, c, d FROM some_table", None, None);
        assert!(result.has_violation(ViolationType::ParseError));
    }

    #[test]
    fn test_malformed_schema_fails_closed() {
        let mut schema = TableCatalog::new();
        schema.insert(String::new(), vec!["id".into()]);
        let result = guard().validate("SELECT id FROM users", Some(&schema), None);
        assert_eq!(result.security_level, SecurityLevel::Blocked);
        assert!(result.has_violation(ViolationType::ValidationError));
    }

    #[test]
    fn test_overlong_table_name_fails_closed() {
        let mut schema = TableCatalog::new();
        schema.insert("users".into(), vec!["id".into()]);
        let sql = format!("SELECT * FROM {}", "t".repeat(129));

        let result = guard().validate(&sql, Some(&schema), None);
        assert!(!result.is_valid);
        assert_eq!(result.security_level, SecurityLevel::Blocked);
        assert!(result.has_violation(ViolationType::ParseError));
    }

    #[test]
    fn test_disabled_cache_is_bypassed() {
        let cache = ValidationCache::new(std::time::Duration::from_secs(60), 8, false);
        let result = guard().validate_cached(&cache, "SELECT 1", None, None);
        assert!(result.is_valid);
        let stats = cache.stats();
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.entry_count, 0);
    }

    #[test]
    fn test_limit_override() {
        let limits = ComplexityLimits {
            max_table_count: 1,
            ..ComplexityLimits::default()
        };
        let sql = "SELECT * FROM a JOIN b ON a.id = b.id";
        assert!(guard().validate(sql, None, None).is_valid);

        let result = guard().validate(sql, None, Some(&limits));
        assert!(!result.is_valid);
        assert!(result.has_violation(ViolationType::ComplexityLimit));
    }

    #[test]
    fn test_invalid_pattern_rejected_at_construction() {
        let mut config = GuardConfig::default();
        config.injection_patterns.push(crate::config::InjectionPattern::new("bad", "("));
        assert!(matches!(SqlGuard::new(config), Err(GuardError::Config(_))));
    }

    struct PanickingTokenizer;

    impl StatementTokenizer for PanickingTokenizer {
        fn tokenize(&self, _sql: &str) -> Result<ParsedStatement, GuardError> {
            panic!("tokenizer bug")
        }
    }

    #[test]
    fn test_panic_fails_closed() {
        let guard = SqlGuard::with_tokenizer(GuardConfig::default(), PanickingTokenizer).unwrap();
        let result = guard.validate("SELECT 1", None, None);
        assert_eq!(result.security_level, SecurityLevel::Blocked);
        assert!(result.has_violation(ViolationType::ValidationError));
    }

    #[test]
    fn test_security_config_dump() {
        let view = guard().security_config();
        assert_eq!(view.limits, ComplexityLimits::default());
        assert!(view.dangerous_keywords.contains(&"OPENROWSET".to_string()));
        assert_eq!(view.blocked_operations.len(), 3);
        assert_eq!(view.injection_patterns.len(), 8);
    }
}
