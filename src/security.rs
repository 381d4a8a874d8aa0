//! Security analysis of SQL statements.
//!
//! Each submodule is one stage of the pipeline driven by [`SqlGuard`]:
//! tokenization, operation classification, dangerous-operation and injection
//! detection, reference extraction, schema checks, complexity scoring and
//! sanitization.

mod complexity;
mod dangerous;
mod identifiers;
mod injection;
mod operation;
pub(crate) mod references;
mod sanitize;
mod schema;
pub(crate) mod tokenizer;
mod types;
mod validation;

pub use complexity::{analyze_complexity, check_limits, cost_tier};
pub use dangerous::DangerousOperationDetector;
pub use identifiers::{parse_qualified_name, unquote_identifier};
pub use injection::InjectionDetector;
pub use operation::classify_operation;
pub use references::{extract_field_references, extract_table_references};
pub use sanitize::sanitize_sql;
pub use schema::{validate_schema, CatalogIndex, TableCatalog};
pub use tokenizer::{LexerTokenizer, ParsedStatement, SqlToken, StatementTokenizer};
pub use types::{
    CostTier, FieldReference, QueryComplexity, SecurityLevel, SecurityViolation, SqlOperation,
    TableReference, ValidationResult, ViolationType,
};
pub use validation::{aggregate_level, SqlGuard};
