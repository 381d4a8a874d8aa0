//! Existence checks against a table catalog.
//!
//! The catalog is a snapshot supplied by the caller; names are compared
//! case-insensitively.

use super::types::{
    FieldReference, SecurityLevel, SecurityViolation, TableReference, ViolationType,
};
use crate::error::GuardError;
use std::collections::{HashMap, HashSet};

/// Table name to field names, as supplied by the catalog service.
pub type TableCatalog = HashMap<String, Vec<String>>;

/// Case-folded view of a [`TableCatalog`].
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    tables: HashMap<String, HashSet<String>>,
}

impl CatalogIndex {
    /// Index a catalog. Blank table names are rejected as malformed input.
    pub fn build(catalog: &TableCatalog) -> Result<Self, GuardError> {
        let mut tables = HashMap::with_capacity(catalog.len());
        for (table, fields) in catalog {
            let key = table.trim().to_lowercase();
            if key.is_empty() {
                return Err(GuardError::schema("Table name cannot be blank"));
            }
            let entry: &mut HashSet<String> = tables.entry(key).or_default();
            entry.extend(fields.iter().map(|f| f.trim().to_lowercase()));
        }
        Ok(Self { tables })
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(&table.to_lowercase())
    }

    /// `None` when the table itself is unknown.
    pub fn has_field(&self, table: &str, field: &str) -> Option<bool> {
        self.tables
            .get(&table.to_lowercase())
            .map(|fields| fields.contains(&field.to_lowercase()))
    }

    pub fn field_in_any_table(&self, field: &str) -> bool {
        let field = field.to_lowercase();
        self.tables.values().any(|fields| fields.contains(&field))
    }
}

/// Check extracted references against the catalog.
pub fn validate_schema(
    tables: &[TableReference],
    fields: &[FieldReference],
    catalog: &TableCatalog,
) -> Result<Vec<SecurityViolation>, GuardError> {
    let index = CatalogIndex::build(catalog)?;
    let mut violations = Vec::new();

    // alias and bare name both resolve to the canonical table
    let mut aliases: HashMap<String, &str> = HashMap::new();
    for table in tables {
        aliases.insert(table.table_name.to_lowercase(), &table.table_name);
        if let Some(alias) = &table.alias {
            aliases.insert(alias.to_lowercase(), &table.table_name);
        }
    }

    for table in tables {
        if !index.has_table(&table.table_name) {
            violations.push(
                SecurityViolation::new(
                    SecurityLevel::Blocked,
                    ViolationType::TableNotFound,
                    format!("Table '{}' does not exist", table.table_name),
                )
                .with_location(table.table_name.clone())
                .with_suggestion("Check the table name against the data source catalog"),
            );
        }
    }

    for field in fields.iter().filter(|f| !f.is_wildcard()) {
        let found = match field.qualifier() {
            Some(qualifier) => {
                let table = aliases
                    .get(&qualifier.to_lowercase())
                    .copied()
                    .unwrap_or(qualifier);
                index.has_field(table, &field.field_name).unwrap_or(false)
            }
            // ambiguity across tables is not reported
            None => index.field_in_any_table(&field.field_name),
        };

        if !found {
            let display = match field.qualifier() {
                Some(q) => format!("{}.{}", q, field.field_name),
                None => field.field_name.clone(),
            };
            violations.push(
                SecurityViolation::new(
                    SecurityLevel::Blocked,
                    ViolationType::FieldNotFound,
                    format!("Field '{}' does not exist", display),
                )
                .with_location(display)
                .with_suggestion("Check the column name against the table definition"),
            );
        }
    }

    Ok(violations)
}
