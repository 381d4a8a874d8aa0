//! Identifier helpers used by reference extraction.

use crate::error::GuardError;

/// Maximum length for an identifier part.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Keywords that may directly follow a table name and are never aliases.
const CLAUSE_KEYWORDS: &[&str] = &[
    "AS", "CROSS", "EXCEPT", "FETCH", "FOR", "FULL", "GROUP", "HAVING", "INNER", "INTERSECT",
    "JOIN", "LEFT", "LIMIT", "NATURAL", "OFFSET", "ON", "ORDER", "OUTER", "RIGHT", "SET",
    "UNION", "USING", "VALUES", "WHERE", "WINDOW", "WITH",
];

/// Check whether a word is a clause keyword rather than an alias.
pub fn is_clause_keyword(word: &str) -> bool {
    CLAUSE_KEYWORDS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(word))
}

/// Strip one layer of `"..."`, `[...]` or `` `...` `` quoting.
pub fn unquote_identifier(identifier: &str) -> &str {
    let trimmed = identifier.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if matches!((first, last), (b'"', b'"') | (b'[', b']') | (b'`', b'`')) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

/// Split a dotted name on the dots outside `"..."`, `[...]` and `` `...` ``.
///
/// Parts keep their quoting.
pub fn split_qualified_name(identifier: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut closing: Option<char> = None;
    let mut start = 0;

    for (i, c) in identifier.char_indices() {
        match (closing, c) {
            (Some(end), _) if c == end => closing = None,
            (Some(_), _) => {}
            (None, '"') => closing = Some('"'),
            (None, '`') => closing = Some('`'),
            (None, '[') => closing = Some(']'),
            (None, '.') => {
                parts.push(&identifier[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&identifier[start..]);
    parts
}

/// Parse a potentially schema-qualified identifier.
///
/// Returns `(schema, name)`. The last part is the name and the part before it
/// the schema, so `db.dbo.Users` yields `(Some("dbo"), "Users")`.
pub fn parse_qualified_name(identifier: &str) -> Result<(Option<String>, String), GuardError> {
    let parts: Vec<&str> = split_qualified_name(identifier)
        .into_iter()
        .map(unquote_identifier)
        .collect();

    if parts.iter().any(|p| p.is_empty()) {
        return Err(GuardError::invalid_input(format!(
            "Identifier has an empty part: '{}'",
            identifier
        )));
    }

    if let Some(part) = parts.iter().find(|p| p.len() > MAX_IDENTIFIER_LENGTH) {
        return Err(GuardError::invalid_input(format!(
            "Identifier '{}' exceeds maximum length of {} characters",
            part, MAX_IDENTIFIER_LENGTH
        )));
    }

    match parts.as_slice() {
        [name] => Ok((None, name.to_string())),
        [.., schema, name] => Ok((Some(schema.to_string()), name.to_string())),
        [] => Err(GuardError::invalid_input("Identifier cannot be empty")),
    }
}
