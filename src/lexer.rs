use std::fmt;

use crate::ast::{Span, Spanned, Token};

/// Location of a character in the source text (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub position: Position,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.position)
    }
}

impl std::error::Error for LexError {}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
        }
    }

    /// Source text covered by `span`.
    pub fn slice(&self, span: Span) -> String {
        self.input[span.start..span.end.min(self.input.len())]
            .iter()
            .collect()
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn error(&self, message: impl Into<String>, offset: usize) -> LexError {
        let before = &self.input[..offset.min(self.input.len())];
        let line = before.iter().filter(|&&c| c == '\n').count() + 1;
        let column = before.iter().rev().take_while(|&&c| c != '\n').count() + 1;
        LexError {
            message: message.into(),
            position: Position {
                offset,
                line,
                column,
            },
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.current_char() {
                Some(ch) if ch.is_whitespace() => self.advance(),
                Some('-') if self.peek_char(1) == Some('-') => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_char(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    while let Some(ch) = self.current_char() {
                        if ch == '*' && self.peek_char(1) == Some('/') {
                            self.advance();
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    // A doubled quote stands for the quote itself
                    if self.peek_char(1) == Some(quote) {
                        result.push(quote);
                        self.advance();
                        self.advance();
                        continue;
                    }
                    self.advance();
                    return Ok(result);
                }
                '\\' if quote != '`' => {
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('0') => result.push('\0'),
                        Some(ch) => result.push(ch),
                        None => {
                            return Err(self.error(
                                "Unterminated string: unexpected end of input after backslash",
                                start,
                            ));
                        }
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error("Unterminated string: missing closing quote", start))
    }

    fn read_number(&mut self) -> String {
        let mut number = String::new();
        let mut seen_dot = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !seen_dot && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                seen_dot = true;
                number.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E') && self.exponent_follows() {
                number.push(ch);
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.current_char() {
                    number.push(sign);
                    self.advance();
                }
                while let Some(digit) = self.current_char().filter(char::is_ascii_digit) {
                    number.push(digit);
                    self.advance();
                }
                break;
            } else {
                break;
            }
        }

        number
    }

    fn exponent_follows(&self) -> bool {
        match self.peek_char(1) {
            Some(c) if c.is_ascii_digit() => true,
            Some('+' | '-') => self.peek_char(2).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    fn double(&mut self, token: Token) -> Token {
        self.advance();
        self.advance();
        token
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments();
        self.token_start = self.position;

        let token = match self.current_char() {
            None => Token::Eof,
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some(',') => self.single(Token::Comma),
            Some(';') => self.single(Token::Semicolon),
            Some('.') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                let digits = {
                    self.advance();
                    self.read_number()
                };
                Token::Number(format!("0.{}", digits))
            }
            Some('.') => self.single(Token::Dot),
            Some('+') => self.single(Token::Plus),
            Some('-') => self.single(Token::Minus),
            Some('*') => self.single(Token::Star),
            Some('/') => self.single(Token::Slash),
            Some('%') => self.single(Token::Percent),
            Some('=') => self.single(Token::Eq),
            Some('<') => match (self.peek_char(1), self.peek_char(2)) {
                (Some('='), Some('>')) => {
                    self.advance();
                    self.double(Token::NullSafeEq)
                }
                (Some('='), _) => self.double(Token::LtEq),
                (Some('>'), _) => self.double(Token::NotEq("<>".to_string())),
                _ => self.single(Token::Lt),
            },
            Some('>') => {
                if self.peek_char(1) == Some('=') {
                    self.double(Token::GtEq)
                } else {
                    self.single(Token::Gt)
                }
            }
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.double(Token::NotEq("!=".to_string()))
                } else {
                    return Err(self.error(
                        "Unexpected '!' (did you mean '!=' or NOT?)",
                        self.position,
                    ));
                }
            }
            Some('&') if self.peek_char(1) == Some('&') => self.double(Token::AndAnd),
            Some('|') if self.peek_char(1) == Some('|') => self.double(Token::OrOr),
            Some(quote @ ('\'' | '"')) => {
                let value = self.read_string(quote)?;
                Token::String { value, quote }
            }
            Some('`') => Token::QuotedIdentifier(self.read_string('`')?),
            Some(ch) if ch.is_ascii_digit() => Token::Number(self.read_number()),
            Some(ch) if ch.is_alphabetic() || ch == '_' || ch == '@' => {
                if ch == '@' {
                    self.advance();
                    Token::Word(format!("@{}", self.read_identifier()))
                } else {
                    Token::Word(self.read_identifier())
                }
            }
            Some(ch) => {
                return Err(self.error(format!("Unexpected character '{}'", ch), self.position));
            }
        };

        Ok(token)
    }

    /// Reads the next token together with its source range.
    pub fn next_spanned(&mut self) -> Result<Spanned, LexError> {
        let token = self.next_token()?;
        Ok(Spanned {
            token,
            span: Span {
                start: self.token_start,
                end: self.position,
            },
        })
    }

    /// Reads every token up to and including [`Token::Eof`].
    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_spanned()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[test]
fn test_keywords_are_words() {
    let mut lexer = Lexer::new("SELECT from Where");
    assert!(lexer.next_token().unwrap().is_keyword("select"));
    assert!(lexer.next_token().unwrap().is_keyword("FROM"));
    assert!(lexer.next_token().unwrap().is_keyword("where"));
    assert_eq!(lexer.next_token().unwrap(), Token::Eof);
}

#[test]
fn test_comparison_spans() {
    let mut lexer = Lexer::new("age >= 12");
    let tokens = lexer.tokenize().unwrap();
    assert_eq!(tokens[1].token, Token::GtEq);
    assert_eq!(tokens[1].span, Span { start: 4, end: 6 });
    assert_eq!(lexer.slice(Span { start: 0, end: 9 }), "age >= 12");
}
