//! # SQL Guard
//!
//! Pre-execution security and complexity validation for SQL text.
//!
//! This crate provides:
//! - **Classification**: Leading-keyword operation detection
//! - **Detection**: Dangerous operations, dangerous keywords and injection heuristics
//! - **Schema checks**: Table and field references against a caller-supplied catalog
//! - **Complexity**: Weighted structural scoring with configurable limits
//! - **Sanitization**: Comment stripping and whitespace normalization
//!
//! Validation never fails: internal errors produce a BLOCKED result.
//!
//! ```no_run
//! use sql_guard::{GuardConfig, SqlGuard};
//!
//! let guard = SqlGuard::new(GuardConfig::default())?;
//! let result = guard.validate("SELECT name FROM users", None, None);
//! assert!(result.is_valid);
//! # Ok::<(), sql_guard::GuardError>(())
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod report;
pub mod security;

pub use cache::{CacheKey, ValidationCache};
pub use config::{ComplexityLimits, GuardConfig};
pub use error::GuardError;
pub use report::{complexity_view, injection_view, security_report};
pub use security::{SecurityLevel, SqlGuard, TableCatalog, ValidationResult};
