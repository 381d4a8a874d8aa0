//! Table and field reference extraction.
//!
//! Keyword-level, best effort: tables come from identifiers after `FROM`
//! (including comma-separated lists) and any `JOIN`, fields from the top-level
//! select list and the arguments of function calls in it. Other expressions in
//! the select list are skipped rather than guessed at.

use super::identifiers::{
    is_clause_keyword, parse_qualified_name, split_qualified_name, unquote_identifier,
};
use super::types::{FieldReference, TableReference};
use crate::error::GuardError;
use once_cell::sync::Lazy;
use regex::Regex;

const IDENT: &str = r#"(?:[A-Za-z_][\w$]*|"[^"]+"|\[[^\]]+\]|`[^`]+`)"#;

/// Nesting limit for function calls in the select list.
const MAX_CALL_DEPTH: usize = 16;

static TABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(FROM|JOIN)\s+({IDENT}(?:\.{IDENT})*)"))
        .unwrap_or_else(|e| panic!("Internal error: invalid table pattern: {}", e))
});

static LIST_ITEM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*,\s*({IDENT}(?:\.{IDENT})*)"))
        .unwrap_or_else(|e| panic!("Internal error: invalid list item pattern: {}", e))
});

static ALIAS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s+(?:AS\s+)?([A-Za-z_]\w*)")
        .unwrap_or_else(|e| panic!("Internal error: invalid alias pattern: {}", e))
});

static SELECT_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bSELECT\b")
        .unwrap_or_else(|e| panic!("Internal error: invalid select pattern: {}", e))
});

static FROM_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bFROM\b")
        .unwrap_or_else(|e| panic!("Internal error: invalid from pattern: {}", e))
});

static LIST_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:DISTINCT|ALL)\s+|^TOP\s+\d+\s+")
        .unwrap_or_else(|e| panic!("Internal error: invalid prefix pattern: {}", e))
});

static EXPLICIT_ALIAS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+AS\s+[^\s()]+$")
        .unwrap_or_else(|e| panic!("Internal error: invalid alias pattern: {}", e))
});

static COLUMN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^({IDENT}(?:\.{IDENT})*?)(?:\.(\*))?(?:\s+[A-Za-z_]\w*)?$"
    ))
    .unwrap_or_else(|e| panic!("Internal error: invalid column pattern: {}", e))
});

static FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?s)^{IDENT}(?:\.{IDENT})?\s*\((.*)\)(?:\s+[A-Za-z_]\w*)?$"
    ))
    .unwrap_or_else(|e| panic!("Internal error: invalid function pattern: {}", e))
});

/// Extract every table named after `FROM`, in a `FROM` list, or after a `JOIN`
/// variant.
///
/// Fails when a table name is malformed (an empty or over-long part) so the
/// statement is rejected instead of escaping the existence check.
pub fn extract_table_references(sql: &str) -> Result<Vec<TableReference>, GuardError> {
    let mut tables = Vec::new();

    for caps in TABLE_PATTERN.captures_iter(sql) {
        let (Some(keyword), Some(name)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let (table, mut offset) = table_item(sql, name.start(), name.end())?;
        tables.push(table);

        if !keyword.as_str().eq_ignore_ascii_case("FROM") {
            continue;
        }

        while let Some(item) = LIST_ITEM_PATTERN
            .captures(&sql[offset..])
            .and_then(|c| c.get(1))
        {
            let (table, next) = table_item(sql, offset + item.start(), offset + item.end())?;
            tables.push(table);
            offset = next;
        }
    }

    Ok(tables)
}

/// Parse the table name at `start..end` and its optional alias.
///
/// Returns the reference and the offset just past it.
fn table_item(sql: &str, start: usize, end: usize) -> Result<(TableReference, usize), GuardError> {
    let (schema, table_name) = parse_qualified_name(&sql[start..end])?;

    let (alias, consumed) = match ALIAS_PATTERN.captures(&sql[end..]).and_then(|c| c.get(1)) {
        Some(m) if !is_clause_keyword(m.as_str()) => (Some(m.as_str().to_string()), m.end()),
        _ => (None, 0),
    };

    Ok((
        TableReference {
            table_name,
            alias,
            schema,
        },
        end + consumed,
    ))
}

/// Extract plain column references from the first select list.
///
/// Qualifiers that match a table alias are recorded as `table_alias` with the
/// aliased table as `table_name`; any other qualifier is taken as a table name.
pub fn extract_field_references(sql: &str, tables: &[TableReference]) -> Vec<FieldReference> {
    let Some(select_list) = select_list(sql) else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    for item in split_top_level(select_list) {
        collect_select_item(item, tables, 0, &mut fields);
    }
    fields
}

/// Text between the first `SELECT` and its top-level `FROM`.
fn select_list(sql: &str) -> Option<&str> {
    let select = SELECT_KEYWORD.find(sql)?;
    let rest = &sql[select.end()..];

    FROM_KEYWORD
        .find_iter(rest)
        .find(|from| paren_depth(&rest[..from.start()]) == 0)
        .map(|from| rest[..from.start()].trim())
}

fn paren_depth(text: &str) -> i32 {
    text.chars().fold(0, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

/// Split on commas that are not nested in parentheses or quotes.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in list.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth -= 1,
            (None, ',') if depth == 0 => {
                items.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(list[start..].trim());

    items.into_iter().filter(|s| !s.is_empty()).collect()
}

/// Record the column references of one select item.
///
/// Plain column paths are taken as is; function calls contribute the columns
/// among their arguments. Anything else is skipped.
fn collect_select_item(
    item: &str,
    tables: &[TableReference],
    depth: usize,
    fields: &mut Vec<FieldReference>,
) {
    let item = LIST_PREFIX.replace(item, "");
    let item = EXPLICIT_ALIAS.replace(&item, "");
    let item = item.trim();

    if item == "*" {
        // COUNT(*) and friends name no column
        if depth == 0 {
            fields.push(FieldReference {
                field_name: "*".to_string(),
                table_name: None,
                table_alias: None,
            });
        }
        return;
    }

    if let Some(field) = column_reference(item, tables) {
        fields.push(field);
        return;
    }

    if depth >= MAX_CALL_DEPTH {
        return;
    }

    let Some(args) = FUNCTION_CALL.captures(item).and_then(|c| c.get(1)) else {
        return;
    };
    if !is_balanced(args.as_str()) {
        return;
    }
    for arg in split_top_level(args.as_str()) {
        collect_select_item(arg, tables, depth + 1, fields);
    }
}

/// True when parentheses pair up without closing early.
fn is_balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn column_reference(item: &str, tables: &[TableReference]) -> Option<FieldReference> {
    let caps = COLUMN_PATTERN.captures(item)?;
    let path = caps.get(1)?.as_str();
    let wildcard = caps.get(2).is_some();
    let parts = split_qualified_name(path);

    let (qualifier, field_name) = if wildcard {
        (parts.last().copied(), "*".to_string())
    } else {
        match parts.as_slice() {
            [.., qualifier, field] => (Some(*qualifier), unquote_identifier(field).to_string()),
            [field] => (None, unquote_identifier(field).to_string()),
            [] => return None,
        }
    };
    let qualifier = qualifier.map(|q| unquote_identifier(q).to_string());

    let (table_name, table_alias) = match qualifier {
        Some(q) => match tables
            .iter()
            .find(|t| t.alias.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(&q)))
        {
            Some(table) => (Some(table.table_name.clone()), Some(q)),
            None => (Some(q), None),
        },
        None => (None, None),
    };

    Some(FieldReference {
        field_name,
        table_name,
        table_alias,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_refs(sql: &str) -> Vec<TableReference> {
        extract_table_references(sql).unwrap()
    }

    fn fields(sql: &str) -> Vec<FieldReference> {
        extract_field_references(sql, &table_refs(sql))
    }

    #[test]
    fn test_simple_tables() {
        let tables = table_refs("SELECT * FROM users WHERE id = 1");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].table_name, "users");
        assert_eq!(tables[0].alias, None);
        assert_eq!(tables[0].schema, None);
    }

    #[test]
    fn test_join_variants_and_aliases() {
        let sql = "SELECT u.name FROM users u \
                   LEFT JOIN orders AS o ON o.user_id = u.id \
                   INNER JOIN dbo.items i ON i.order_id = o.id \
                   RIGHT OUTER JOIN [audit log] ON 1 = 1 \
                   JOIN tags";
        let tables = table_refs(sql);
        let names: Vec<_> = tables.iter().map(|t| t.table_name.as_str()).collect();
        assert_eq!(names, vec!["users", "orders", "items", "audit log", "tags"]);
        assert_eq!(tables[0].alias.as_deref(), Some("u"));
        assert_eq!(tables[1].alias.as_deref(), Some("o"));
        assert_eq!(tables[2].schema.as_deref(), Some("dbo"));
        assert_eq!(tables[3].alias, None);
        assert_eq!(tables[4].alias, None);
    }

    #[test]
    fn test_derived_table_is_skipped() {
        let tables = table_refs("SELECT * FROM (SELECT id FROM users) t");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].table_name, "users");
    }

    #[test]
    fn test_wildcard_field() {
        let f = fields("SELECT * FROM users");
        assert_eq!(f.len(), 1);
        assert!(f[0].is_wildcard());
    }

    #[test]
    fn test_qualified_and_aliased_fields() {
        let f = fields("SELECT u.name AS user_name, email, o.* FROM users u JOIN orders o ON 1 = 1");
        assert_eq!(f.len(), 3);

        assert_eq!(f[0].field_name, "name");
        assert_eq!(f[0].table_alias.as_deref(), Some("u"));
        assert_eq!(f[0].table_name.as_deref(), Some("users"));

        assert_eq!(f[1].field_name, "email");
        assert_eq!(f[1].qualifier(), None);

        assert!(f[2].is_wildcard());
        assert_eq!(f[2].table_name.as_deref(), Some("orders"));
    }

    #[test]
    fn test_qualifier_without_alias_is_table_name() {
        let f = fields("SELECT users.id FROM users");
        assert_eq!(f[0].field_name, "id");
        assert_eq!(f[0].table_name.as_deref(), Some("users"));
        assert_eq!(f[0].table_alias, None);
    }

    #[test]
    fn test_comma_separated_from_list() {
        let tables = table_refs("SELECT * FROM users u, dbo.orders AS o, secret_table WHERE u.id = o.user_id");
        let names: Vec<_> = tables.iter().map(|t| t.table_name.as_str()).collect();
        assert_eq!(names, vec!["users", "orders", "secret_table"]);
        assert_eq!(tables[0].alias.as_deref(), Some("u"));
        assert_eq!(tables[1].alias.as_deref(), Some("o"));
        assert_eq!(tables[1].schema.as_deref(), Some("dbo"));
        assert_eq!(tables[2].alias, None);
    }

    #[test]
    fn test_from_list_stops_at_clause() {
        let tables = table_refs("SELECT a, b FROM t ORDER BY a, b");
        assert_eq!(tables.len(), 1);

        let tables = table_refs("SELECT * FROM t, (SELECT 1) x");
        assert_eq!(tables.len(), 1);
    }

    #[test]
    fn test_dotted_quoted_table_name() {
        let tables = table_refs("SELECT * FROM [my.table]");
        assert_eq!(tables[0].table_name, "my.table");
        assert_eq!(tables[0].schema, None);
    }

    #[test]
    fn test_malformed_table_name_is_an_error() {
        let sql = format!("SELECT * FROM {}", "t".repeat(129));
        assert!(matches!(
            extract_table_references(&sql),
            Err(GuardError::InvalidInput(_))
        ));

        let sql = format!("SELECT * FROM users, {}", "x".repeat(129));
        assert!(extract_table_references(&sql).is_err());
    }

    #[test]
    fn test_function_arguments_are_extracted() {
        let f = fields("SELECT DISTINCT name, COUNT(*) AS n, COALESCE(a, b), 'x' FROM t GROUP BY name");
        let names: Vec<_> = f.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(names, vec!["name", "a", "b"]);
    }

    #[test]
    fn test_nested_function_arguments() {
        let f = fields("SELECT UPPER(TRIM(u.password_hash)) AS h, CAST(total AS INT) FROM users u");
        assert_eq!(f.len(), 2);
        assert_eq!(f[0].field_name, "password_hash");
        assert_eq!(f[0].table_alias.as_deref(), Some("u"));
        assert_eq!(f[0].table_name.as_deref(), Some("users"));
        assert_eq!(f[1].field_name, "total");
    }

    #[test]
    fn test_expressions_are_skipped() {
        let f = fields("SELECT a + b, CASE WHEN x THEN 1 END, 'x', 42, COUNT(*) FROM t");
        assert!(f.is_empty());
    }

    #[test]
    fn test_quoted_dotted_column() {
        let f = fields("SELECT t.\"a.b\" FROM t");
        assert_eq!(f[0].field_name, "a.b");
        assert_eq!(f[0].table_name.as_deref(), Some("t"));
    }

    #[test]
    fn test_subquery_in_select_list() {
        let f = fields("SELECT id, (SELECT MAX(x) FROM y) AS m FROM t");
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].field_name, "id");
    }

    #[test]
    fn test_implicit_alias() {
        let f = fields("SELECT name n FROM t");
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].field_name, "name");
    }

    #[test]
    fn test_no_from_clause() {
        assert!(fields("SELECT 1").is_empty());
    }
}
