/// Lexical token of the SQL subset read by [`crate::parser::Parser`].
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Numeric literal, kept as written
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 50.2
    /// 1e3
    /// ```
    Number(String),

    /// String literal enclosed in single or double quotes
    ///
    /// `value` holds the unescaped content, `quote` the delimiter used.
    ///
    /// # Examples
    /// ```text
    /// 'nddcoder'
    /// "2020-12-12"
    /// ```
    String { value: String, quote: char },

    // Identifiers and keywords
    /// Bare word: a field name, function name or keyword
    ///
    /// Keywords are not separate tokens; they are matched case-insensitively
    /// with [`Token::is_keyword`].
    ///
    /// # Examples
    /// ```text
    /// created_at
    /// SELECT
    /// ObjectId
    /// ```
    Word(String),

    /// Identifier enclosed in back-quotes
    ///
    /// # Example
    /// ```text
    /// `user name`
    /// ```
    QuotedIdentifier(String),

    // Comparison operators
    /// `=`
    Eq,
    /// `<>` or `!=` (the spelling is kept)
    NotEq(String),
    /// `<=>`
    NullSafeEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,

    // Arithmetic operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*` (also the select-all marker)
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,

    // Logical operators
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,

    // Punctuation
    LParen,
    RParen,
    Comma,
    Dot,
    Semicolon,

    /// End of input
    Eof,
}

/// Words that never count as identifiers inside a condition.
pub const RESERVED_KEYWORDS: &[&str] = &[
    "ALL", "AND", "AS", "ASC", "BETWEEN", "BY", "DESC", "DISTINCT", "EXISTS", "FALSE", "FOR",
    "FORCE", "FROM", "GROUP", "HAVING", "IGNORE", "IN", "INDEX", "IS", "KEY", "LIKE", "LIMIT",
    "NOT", "NULL", "OFFSET", "OR", "ORDER", "REGEXP", "SELECT", "TRUE", "USE", "WHERE", "XOR",
];

/// Keywords that start a clause of a SELECT statement.
pub const CLAUSE_KEYWORDS: &[&str] = &[
    "FROM", "WHERE", "GROUP", "HAVING", "ORDER", "LIMIT", "USE", "FORCE", "IGNORE",
];

impl Token {
    /// Returns true if this token is the given keyword (case-insensitive).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(word) if word.eq_ignore_ascii_case(keyword))
    }

    /// Returns true if this token is any of the given keywords.
    pub fn is_any_keyword(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|keyword| self.is_keyword(keyword))
    }

    /// Returns true for a word that is not a reserved keyword.
    pub fn is_identifier(&self) -> bool {
        match self {
            Token::Word(_) => !self.is_any_keyword(RESERVED_KEYWORDS),
            Token::QuotedIdentifier(_) => true,
            _ => false,
        }
    }

    /// `AND`, `OR`, `&&` or `||`, normalized to `AND` / `OR`.
    pub fn connective(&self) -> Option<&'static str> {
        match self {
            Token::AndAnd => Some("AND"),
            Token::OrOr => Some("OR"),
            t if t.is_keyword("and") => Some("AND"),
            t if t.is_keyword("or") => Some("OR"),
            _ => None,
        }
    }
}

/// Half-open range of char indices a token covers in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A token together with the source range it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}
