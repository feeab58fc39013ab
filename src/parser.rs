use std::fmt;

use crate::{
    ast::{
        Condition, GroupItem, IndexHint, IndexHintKind, Limit, OrderItem, SelectExpression,
        SelectStatement, SortDirection, Span, Spanned, Statement, TableReference, Token,
        tokens::CLAUSE_KEYWORDS,
    },
    lexer::{LexError, Lexer},
};

/// Statement kinds that are recognized but not translated.
const OTHER_STATEMENTS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "REPLACE", "CREATE", "DROP", "ALTER", "TRUNCATE", "SHOW",
    "SET", "EXPLAIN", "DESCRIBE", "CALL", "WITH",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    Lex(LexError),
    UnexpectedToken {
        expected: String,
        found: Token,
        offset: usize,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex(e) => write!(f, "{}", e),
            ParseError::UnexpectedToken {
                expected,
                found,
                offset,
            } => write!(f, "Expected {}, got {:?} at offset {}", expected, found, offset),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Lex(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError::Lex(e)
    }
}

/// Reads the SQL subset understood by the translator into a [`Statement`].
///
/// Clauses after `FROM` may come in any order, the way MySQL-style parsers
/// accept them. WHERE and HAVING are kept as flat condition lists.
pub struct Parser {
    lexer: Lexer,
    tokens: Vec<Spanned>,
    position: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let tokens = lexer.tokenize()?;
        Ok(Parser {
            lexer,
            tokens,
            position: 0,
        })
    }

    fn current(&self) -> &Token {
        self.token_at(self.position)
    }

    fn token_at(&self, index: usize) -> &Token {
        self.tokens
            .get(index)
            .map(|spanned| &spanned.token)
            .unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        self.current().is_keyword(keyword)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current().clone(),
            offset: self
                .tokens
                .get(self.position)
                .map(|spanned| spanned.span.start)
                .unwrap_or_default(),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if !self.check_keyword(keyword) {
            return Err(self.unexpected(keyword));
        }
        self.advance();
        Ok(())
    }

    /// Source text of the tokens in `start..end`, as written.
    fn text(&self, start: usize, end: usize) -> String {
        if start >= end {
            return String::new();
        }
        self.lexer.slice(Span {
            start: self.tokens[start].span.start,
            end: self.tokens[end - 1].span.end,
        })
    }

    fn at_item_end(&self, depth: i32) -> bool {
        match self.current() {
            Token::Eof | Token::Semicolon => true,
            Token::Comma | Token::RParen => depth == 0,
            token => depth == 0 && token.is_any_keyword(CLAUSE_KEYWORDS),
        }
    }

    /// Reads the first statement of the input.
    ///
    /// Returns `Ok(None)` when the input does not start with a statement.
    pub fn parse_statement(&mut self) -> Result<Option<Statement>, ParseError> {
        while self.current() == &Token::Semicolon {
            self.advance();
        }

        let Token::Word(word) = self.current() else {
            return Ok(None);
        };

        let kind = word.to_ascii_uppercase();
        if kind == "SELECT" {
            return self.parse_select().map(|select| Some(Statement::Select(select)));
        }
        if OTHER_STATEMENTS.contains(&kind.as_str()) {
            return Ok(Some(Statement::Other { kind }));
        }
        Ok(None)
    }

    fn parse_select(&mut self) -> Result<SelectStatement, ParseError> {
        self.expect_keyword("select")?;

        while self.current().is_any_keyword(&["DISTINCT", "ALL"]) {
            self.advance();
        }

        let mut statement = SelectStatement {
            expr: self.parse_select_list(),
            ..SelectStatement::default()
        };

        if self.check_keyword("from") {
            self.advance();
            statement.from = self.parse_from();
        }

        loop {
            match self.current() {
                Token::Eof | Token::Semicolon => break,
                // Stray closing brackets between clauses are ignored
                Token::RParen => self.advance(),
                t if t.is_keyword("where") => {
                    self.advance();
                    statement.where_conditions = self.parse_conditions();
                }
                t if t.is_keyword("group") => {
                    self.advance();
                    self.expect_keyword("by")?;
                    statement.group = self
                        .parse_items()
                        .into_iter()
                        .map(|(expr, _)| GroupItem { expr })
                        .collect();
                }
                t if t.is_keyword("having") => {
                    self.advance();
                    statement.having = self.parse_conditions();
                }
                t if t.is_keyword("order") => {
                    self.advance();
                    self.expect_keyword("by")?;
                    statement.order = self
                        .parse_items()
                        .into_iter()
                        .map(|(expr, direction)| OrderItem { expr, direction })
                        .collect();
                }
                t if t.is_keyword("limit") => {
                    self.advance();
                    statement.limit = Some(self.parse_limit()?);
                }
                t if t.is_any_keyword(&["USE", "FORCE", "IGNORE"]) => {
                    let hint = self.parse_index_hint()?;
                    statement.index_hints.push(hint);
                }
                t if t.is_keyword("from") && statement.from.is_empty() => {
                    self.advance();
                    statement.from = self.parse_from();
                }
                _ => return Err(self.unexpected("a SELECT clause")),
            }
        }

        Ok(statement)
    }

    fn parse_select_list(&mut self) -> Vec<SelectExpression> {
        let mut items = vec![];

        loop {
            let start = self.position;
            let mut depth = 0;

            while !self.at_item_end(depth) {
                match self.current() {
                    Token::LParen => depth += 1,
                    Token::RParen => depth -= 1,
                    _ => {}
                }
                self.advance();
            }

            if self.position > start {
                items.push(self.select_item(start, self.position));
            }

            if self.current() == &Token::Comma {
                self.advance();
            } else {
                break;
            }
        }

        items
    }

    fn select_item(&self, start: usize, end: usize) -> SelectExpression {
        let mut expr_end = end;
        let mut alias = None;

        if end - start >= 3 && self.token_at(end - 2).is_keyword("as") {
            alias = name_of(self.token_at(end - 1));
            expr_end = end - 2;
        } else if end - start >= 2
            && self.token_at(end - 1).is_identifier()
            && ends_operand(self.token_at(end - 2))
        {
            alias = name_of(self.token_at(end - 1));
            expr_end = end - 1;
        }

        let function = (start..expr_end.saturating_sub(1)).find_map(|i| {
            match (self.token_at(i), self.token_at(i + 1)) {
                (Token::Word(name), Token::LParen) => Some(name.clone()),
                _ => None,
            }
        });

        SelectExpression {
            expr: self.text(start, expr_end),
            function,
            alias,
        }
    }

    fn parse_from(&mut self) -> Vec<TableReference> {
        let mut tables = vec![];

        loop {
            let Some(first) = self.table_name() else {
                break;
            };
            self.advance();

            let mut table = TableReference {
                table: first,
                database: None,
                alias: None,
            };

            if self.current() == &Token::Dot {
                let qualified = self.token_at(self.position + 1);
                if let Some(name) = name_of(qualified).filter(|_| qualified.is_identifier()) {
                    table.database = Some(std::mem::replace(&mut table.table, name));
                    self.advance();
                    self.advance();
                }
            }

            if self.check_keyword("as") {
                self.advance();
                table.alias = name_of(self.current());
                self.advance();
            } else if self.current().is_identifier() {
                table.alias = name_of(self.current());
                self.advance();
            }

            tables.push(table);

            if self.current() == &Token::Comma {
                self.advance();
            } else {
                break;
            }
        }

        tables
    }

    fn table_name(&self) -> Option<String> {
        let token = self.current();
        if token.is_identifier() {
            name_of(token)
        } else {
            None
        }
    }

    /// Reads a WHERE/HAVING body into a flat condition list.
    fn parse_conditions(&mut self) -> Vec<Condition> {
        let mut conditions = vec![];
        let mut depth = 0;
        let mut start = self.position;
        let mut between = false;

        loop {
            let token = self.current();
            match token {
                Token::Eof | Token::Semicolon => break,
                Token::RParen if depth == 0 => break,
                t if depth == 0 && t.is_any_keyword(CLAUSE_KEYWORDS) => break,
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                t if t.is_keyword("between") => between = true,
                t => {
                    if let Some(connective) = t.connective() {
                        // The AND of `BETWEEN a AND b` does not split conditions
                        if connective == "AND" && between {
                            between = false;
                        } else {
                            if self.position > start {
                                conditions.push(self.condition_leaf(start, self.position));
                            }
                            conditions.push(Condition::connective(connective));
                            self.advance();
                            start = self.position;
                            continue;
                        }
                    }
                }
            }
            self.advance();
        }

        if self.position > start {
            conditions.push(self.condition_leaf(start, self.position));
        }

        conditions
    }

    fn condition_leaf(&self, start: usize, end: usize) -> Condition {
        let mut identifiers: Vec<String> = vec![];

        for index in start..end {
            let token = self.token_at(index);
            let literal = match token {
                Token::String { value, .. } => Some(value.clone()),
                Token::QuotedIdentifier(name) => Some(name.clone()),
                Token::Word(word) if token.is_identifier() => Some(word.clone()),
                _ => None,
            };

            if let Some(literal) = literal
                && !identifiers.contains(&literal)
            {
                identifiers.push(literal);
            }
        }

        Condition::leaf(self.text(start, end), identifiers)
    }

    /// Reads comma separated GROUP BY / ORDER BY items with their direction.
    fn parse_items(&mut self) -> Vec<(String, SortDirection)> {
        let mut items = vec![];

        loop {
            let start = self.position;
            let mut depth = 0;

            while !self.at_item_end(depth) {
                match self.current() {
                    Token::LParen => depth += 1,
                    Token::RParen => depth -= 1,
                    _ => {}
                }
                self.advance();
            }

            let mut end = self.position;
            let mut direction = SortDirection::Asc;
            if end > start {
                let last = self.token_at(end - 1);
                if last.is_keyword("desc") {
                    direction = SortDirection::Desc;
                    end -= 1;
                } else if last.is_keyword("asc") {
                    end -= 1;
                }
            }

            if end > start {
                items.push((self.text(start, end), direction));
            }

            if self.current() == &Token::Comma {
                self.advance();
            } else {
                break;
            }
        }

        items
    }

    fn parse_number(&mut self) -> Result<u64, ParseError> {
        let value = match self.current() {
            Token::Number(n) => n.parse::<u64>().ok(),
            _ => None,
        };

        match value {
            Some(value) => {
                self.advance();
                Ok(value)
            }
            None => Err(self.unexpected("a non-negative integer")),
        }
    }

    fn parse_limit(&mut self) -> Result<Limit, ParseError> {
        let first = self.parse_number()?;

        if self.current() == &Token::Comma {
            self.advance();
            let row_count = self.parse_number()?;
            return Ok(Limit {
                offset: first,
                row_count,
            });
        }

        if self.check_keyword("offset") {
            self.advance();
            let offset = self.parse_number()?;
            return Ok(Limit {
                offset,
                row_count: first,
            });
        }

        Ok(Limit {
            offset: 0,
            row_count: first,
        })
    }

    fn parse_index_hint(&mut self) -> Result<IndexHint, ParseError> {
        let kind = match self.current() {
            t if t.is_keyword("use") => IndexHintKind::Use,
            t if t.is_keyword("force") => IndexHintKind::Force,
            _ => IndexHintKind::Ignore,
        };
        self.advance();

        if !self.current().is_any_keyword(&["INDEX", "KEY"]) {
            return Err(self.unexpected("INDEX or KEY"));
        }
        self.advance();

        if self.check_keyword("for") {
            self.advance();
            if self.current().is_any_keyword(&["ORDER", "GROUP"]) {
                self.advance();
                self.expect_keyword("by")?;
            } else {
                self.expect_keyword("join")?;
            }
        }

        let mut indexes = vec![];

        if self.current() == &Token::LParen {
            self.advance();
            while self.current() != &Token::RParen {
                match name_of(self.current()) {
                    Some(name) => indexes.push(name),
                    None => return Err(self.unexpected("an index name")),
                }
                self.advance();
                if self.current() == &Token::Comma {
                    self.advance();
                }
            }
            self.advance();
        } else if let Some(name) = name_of(self.current()).filter(|_| self.current().is_identifier()) {
            indexes.push(name);
            self.advance();
        } else {
            return Err(self.unexpected("an index name"));
        }

        Ok(IndexHint { kind, indexes })
    }
}

fn name_of(token: &Token) -> Option<String> {
    match token {
        Token::Word(name) | Token::QuotedIdentifier(name) => Some(name.clone()),
        Token::String { value, .. } => Some(value.clone()),
        _ => None,
    }
}

/// Tokens after which a bare identifier can only be an alias.
fn ends_operand(token: &Token) -> bool {
    match token {
        Token::RParen | Token::Number(_) | Token::String { .. } | Token::QuotedIdentifier(_) => {
            true
        }
        Token::Word(_) => token.is_identifier(),
        _ => false,
    }
}

/// Reads the first statement of `sql`.
///
/// # Examples
///
/// ```
/// use sql_to_mongodb_query::parser::parse_statement;
/// use sql_to_mongodb_query::ast::Statement;
///
/// let statement = parse_statement("SELECT id FROM users WHERE age > 12").unwrap();
/// assert!(matches!(statement, Some(Statement::Select(_))));
///
/// assert_eq!(parse_statement("random sql query").unwrap(), None);
/// ```
pub fn parse_statement(sql: &str) -> Result<Option<Statement>, ParseError> {
    Parser::new(Lexer::new(sql))?.parse_statement()
}
