//! Tokenizer adapter.
//!
//! Wraps the `sqlparser` lexer behind [`StatementTokenizer`] so the detectors
//! only ever see [`ParsedStatement`]. A grammar-aware implementation can be
//! dropped in later without touching classification or scoring.

use crate::error::GuardError;
use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};

/// A lexical token, independent of the lexer that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlToken {
    /// Keyword or identifier. `quoted` is set for `"x"`, `[x]` and `` `x` ``.
    Word { value: String, quoted: bool },
    Number(String),
    StringLiteral(String),
    Comment(String),
    Semicolon,
    Whitespace,
    Symbol(String),
}

/// Token stream for one input blob.
///
/// Multiple `;`-separated statements stay in one blob.
#[derive(Debug, Clone, Default)]
pub struct ParsedStatement {
    tokens: Vec<SqlToken>,
}

impl ParsedStatement {
    pub fn new(tokens: Vec<SqlToken>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[SqlToken] {
        &self.tokens
    }

    /// First unquoted word, skipping whitespace, comments and opening parens.
    pub fn first_keyword(&self) -> Option<&str> {
        for token in &self.tokens {
            match token {
                SqlToken::Whitespace | SqlToken::Comment(_) => continue,
                SqlToken::Symbol(s) if s == "(" => continue,
                SqlToken::Word {
                    value,
                    quoted: false,
                } => return Some(value.as_str()),
                _ => return None,
            }
        }
        None
    }

    /// Number of non-empty `;`-separated segments.
    pub fn statement_count(&self) -> usize {
        let mut count = 0;
        let mut has_content = false;
        for token in &self.tokens {
            match token {
                SqlToken::Semicolon => {
                    if has_content {
                        count += 1;
                    }
                    has_content = false;
                }
                SqlToken::Whitespace | SqlToken::Comment(_) => {}
                _ => has_content = true,
            }
        }
        if has_content {
            count += 1;
        }
        count
    }

    pub fn has_comments(&self) -> bool {
        self.tokens
            .iter()
            .any(|t| matches!(t, SqlToken::Comment(_)))
    }

    /// True when only whitespace and comments were found.
    pub fn is_blank(&self) -> bool {
        self.tokens
            .iter()
            .all(|t| matches!(t, SqlToken::Whitespace | SqlToken::Comment(_)))
    }
}

/// Produces a [`ParsedStatement`] from raw SQL.
pub trait StatementTokenizer: Send + Sync {
    fn tokenize(&self, sql: &str) -> Result<ParsedStatement, GuardError>;
}

/// [`StatementTokenizer`] backed by the `sqlparser` generic dialect lexer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexerTokenizer;

impl StatementTokenizer for LexerTokenizer {
    fn tokenize(&self, sql: &str) -> Result<ParsedStatement, GuardError> {
        let dialect = GenericDialect {};
        let tokens = Tokenizer::new(&dialect, sql)
            .tokenize()
            .map_err(|e| GuardError::parse(e.to_string()))?;

        Ok(ParsedStatement::new(
            tokens.into_iter().filter_map(convert_token).collect(),
        ))
    }
}

fn convert_token(token: Token) -> Option<SqlToken> {
    let converted = match token {
        Token::EOF => return None,
        Token::Word(word) => SqlToken::Word {
            value: word.value,
            quoted: word.quote_style.is_some(),
        },
        Token::Number(n, _) => SqlToken::Number(n),
        Token::SingleQuotedString(s)
        | Token::DoubleQuotedString(s)
        | Token::NationalStringLiteral(s)
        | Token::EscapedStringLiteral(s) => SqlToken::StringLiteral(s),
        Token::SemiColon => SqlToken::Semicolon,
        Token::Whitespace(Whitespace::SingleLineComment { comment, .. }) => {
            SqlToken::Comment(comment)
        }
        Token::Whitespace(Whitespace::MultiLineComment(comment)) => SqlToken::Comment(comment),
        Token::Whitespace(_) => SqlToken::Whitespace,
        other => SqlToken::Symbol(other.to_string()),
    };
    Some(converted)
}
