//! Comment stripping and whitespace normalization.

use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)--[^\n]*|/\*.*?\*/")
        .unwrap_or_else(|e| panic!("Internal error: invalid comment pattern: {}", e))
});

/// Remove `--` and `/* */` comments, collapse whitespace and trim.
///
/// Each comment is replaced by a space so removal never joins neighbouring
/// tokens. Stripping repeats until nothing changes, which keeps the function
/// idempotent.
pub fn sanitize_sql(sql: &str) -> String {
    let mut current = sql.to_string();
    loop {
        let stripped = COMMENT_PATTERN.replace_all(&current, " ").into_owned();
        if stripped == current {
            break;
        }
        current = stripped;
    }

    current.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments() {
        assert_eq!(
            sanitize_sql("SELECT *  -- all columns\nFROM users /* main */ WHERE id = 1"),
            "SELECT * FROM users WHERE id = 1"
        );
        assert_eq!(sanitize_sql("/* a\nmulti-line\ncomment */SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_whitespace_normalization() {
        assert_eq!(
            sanitize_sql("  SELECT\tname\n\nFROM   users;  "),
            "SELECT name FROM users;"
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "SELECT 1",
            "-/**/- hidden\nSELECT 2",
            "/* unterminated SELECT 3",
            "SELECT a -- x\n, b /* y */ FROM t",
            "",
            "   ",
        ];
        for input in inputs {
            let once = sanitize_sql(input);
            assert_eq!(sanitize_sql(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_comment_replaced_by_space() {
        assert_eq!(sanitize_sql("-/**/- hidden\nSELECT 2"), "- - hidden SELECT 2");
    }
}
