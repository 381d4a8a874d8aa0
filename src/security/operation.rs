//! Statement operation classification.

use super::tokenizer::ParsedStatement;
use super::types::SqlOperation;

/// Classify the top-level operation of a statement.
///
/// The first keyword token wins. When the token stream yields no leading word
/// the trimmed, upper-cased text is matched by prefix instead.
pub fn classify_operation(parsed: &ParsedStatement, sql: &str) -> SqlOperation {
    if let Some(keyword) = parsed.first_keyword() {
        return SqlOperation::from_keyword(keyword);
    }

    let upper = sql.trim().to_uppercase();
    SqlOperation::KNOWN
        .into_iter()
        .find(|op| upper.starts_with(op.as_str()))
        .unwrap_or(SqlOperation::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::tokenizer::{LexerTokenizer, StatementTokenizer};

    fn classify(sql: &str) -> SqlOperation {
        let parsed = LexerTokenizer.tokenize(sql).unwrap();
        classify_operation(&parsed, sql)
    }

    #[test]
    fn test_detect_query_type() {
        assert_eq!(classify("SELECT * FROM Users"), SqlOperation::Select);
        assert_eq!(classify("  select * FROM Users"), SqlOperation::Select);
        assert_eq!(classify("INSERT INTO Users VALUES (1)"), SqlOperation::Insert);
        assert_eq!(classify("UPDATE Users SET name = 'foo'"), SqlOperation::Update);
        assert_eq!(classify("DELETE FROM Users WHERE id = 1"), SqlOperation::Delete);
        assert_eq!(classify("DROP TABLE Users"), SqlOperation::Drop);
        assert_eq!(classify("CREATE TABLE Users (id INT)"), SqlOperation::Create);
        assert_eq!(classify("ALTER TABLE Users ADD c INT"), SqlOperation::Alter);
        assert_eq!(classify("truncate table Users"), SqlOperation::Truncate);
    }

    #[test]
    fn test_detect_with_comments() {
        assert_eq!(classify("-- comment\nSELECT * FROM Users"), SqlOperation::Select);
        assert_eq!(classify("/* comment */ DROP TABLE Users"), SqlOperation::Drop);
    }

    #[test]
    fn test_unrecognized_leading_token() {
        assert_eq!(classify("MERGE INTO t USING s ON 1 = 1"), SqlOperation::Unknown);
        assert_eq!(
            classify("WITH cte AS (SELECT 1) SELECT * FROM cte"),
            SqlOperation::Unknown
        );
    }

    #[test]
    fn test_prefix_fallback() {
        // Quoted leading word is not a keyword token.
        let sql = "\"SELECT\"";
        let parsed = LexerTokenizer.tokenize(sql).unwrap();
        assert_eq!(parsed.first_keyword(), None);
        assert_eq!(classify_operation(&parsed, sql), SqlOperation::Unknown);

        let empty = ParsedStatement::default();
        assert_eq!(classify_operation(&empty, "delete from t"), SqlOperation::Delete);
    }
}
