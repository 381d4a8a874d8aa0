//! SQL injection detection.
//!
//! Scans raw statement text for heuristic injection patterns. Every match is
//! reported separately so callers can gauge severity by count.

use super::types::{SecurityLevel, SecurityViolation, ViolationType};
use crate::config::InjectionPattern;
use crate::error::GuardError;
use regex::Regex;

#[derive(Debug, Clone)]
struct CompiledPattern {
    category: String,
    source: String,
    regex: Regex,
}

/// SQL injection detector.
#[derive(Debug, Clone)]
pub struct InjectionDetector {
    patterns: Vec<CompiledPattern>,
}

impl InjectionDetector {
    /// Compile the configured patterns case-insensitively.
    pub fn new(patterns: &[InjectionPattern]) -> Result<Self, GuardError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let regex = Regex::new(&format!("(?i){}", p.pattern)).map_err(|e| {
                    GuardError::config(format!(
                        "Invalid injection pattern '{}' ({}): {}",
                        p.pattern, p.category, e
                    ))
                })?;
                Ok(CompiledPattern {
                    category: p.category.clone(),
                    source: p.pattern.clone(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>, GuardError>>()?;

        Ok(Self { patterns })
    }

    /// Check a query for SQL injection patterns.
    ///
    /// Returns one BLOCKED violation per match, located at the matched span.
    pub fn check(&self, query: &str) -> Vec<SecurityViolation> {
        let mut violations = Vec::new();
        for pattern in &self.patterns {
            for found in pattern.regex.find_iter(query) {
                violations.push(
                    SecurityViolation::new(
                        SecurityLevel::Blocked,
                        ViolationType::SqlInjection,
                        format!("Potential SQL injection detected: {}", pattern.category),
                    )
                    .with_location(found.as_str())
                    .with_suggestion("Use parameterized queries instead of string concatenation"),
                );
            }
        }
        violations
    }

    /// Configured patterns as `(category, source)` pairs.
    pub fn patterns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.patterns
            .iter()
            .map(|p| (p.category.as_str(), p.source.as_str()))
    }
}
