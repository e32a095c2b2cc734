use crate::error::{SourcePos, Span};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Semicolon,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,

    // One or two character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Literals
    Identifier,
    Number,
    String,

    // Keywords
    Let,
    Print,
    If,
    Else,
    While,
    Fun,
    Return,
    Import,
    True,
    False,
    Nil,
    And,
    Or,

    // Special
    Eof,
    /// Unscannable input. The lexeme carries the diagnostic message and the
    /// position points at the offending character (or the opening quote of an
    /// unterminated string). Callers must check for this before parsing.
    Invalid,
}

impl TokenKind {
    /// Name used in "expected X, got Y" parse errors.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::LeftParen => "LeftParen",
            TokenKind::RightParen => "RightParen",
            TokenKind::LeftBrace => "LeftBrace",
            TokenKind::RightBrace => "RightBrace",
            TokenKind::Semicolon => "Semicolon",
            TokenKind::Comma => "Comma",
            TokenKind::Plus => "Plus",
            TokenKind::Minus => "Minus",
            TokenKind::Star => "Star",
            TokenKind::Slash => "Slash",
            TokenKind::Bang => "Bang",
            TokenKind::BangEqual => "BangEqual",
            TokenKind::Equal => "Equal",
            TokenKind::EqualEqual => "EqualEqual",
            TokenKind::Less => "Less",
            TokenKind::LessEqual => "LessEqual",
            TokenKind::Greater => "Greater",
            TokenKind::GreaterEqual => "GreaterEqual",
            TokenKind::Identifier => "Identifier",
            TokenKind::Number => "Number",
            TokenKind::String => "String",
            TokenKind::Let => "Let",
            TokenKind::Print => "Print",
            TokenKind::If => "If",
            TokenKind::Else => "Else",
            TokenKind::While => "While",
            TokenKind::Fun => "Fun",
            TokenKind::Return => "Return",
            TokenKind::Import => "Import",
            TokenKind::True => "True",
            TokenKind::False => "False",
            TokenKind::Nil => "Nil",
            TokenKind::And => "And",
            TokenKind::Or => "Or",
            TokenKind::Eof => "Eof",
            TokenKind::Invalid => "Invalid",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
    pub pos: SourcePos,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: String, span: Span, pos: SourcePos) -> Self {
        Self {
            kind,
            lexeme,
            span,
            pos,
        }
    }
}

pub struct Lexer {
    source: String,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: u32,
    column: u32,
    start_pos: SourcePos,
    keywords: HashMap<&'static str, TokenKind>,
}

impl Lexer {
    pub fn new(source: String) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("let", TokenKind::Let);
        keywords.insert("print", TokenKind::Print);
        keywords.insert("if", TokenKind::If);
        keywords.insert("else", TokenKind::Else);
        keywords.insert("while", TokenKind::While);
        keywords.insert("fun", TokenKind::Fun);
        keywords.insert("return", TokenKind::Return);
        keywords.insert("import", TokenKind::Import);
        keywords.insert("true", TokenKind::True);
        keywords.insert("false", TokenKind::False);
        keywords.insert("nil", TokenKind::Nil);
        keywords.insert("and", TokenKind::And);
        keywords.insert("or", TokenKind::Or);

        Self {
            source,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_pos: SourcePos { line: 1, column: 1 },
            keywords,
        }
    }

    /// Scans the whole source. Never fails: malformed input is surfaced as
    /// `Invalid` tokens and scanning continues. The result always ends with
    /// an `Eof` token.
    pub fn scan(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_pos = SourcePos {
                line: self.line,
                column: self.column,
            };
            self.scan_token();
        }

        let pos = SourcePos {
            line: self.line,
            column: self.column,
        };
        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            Span::single(self.current),
            pos,
        ));
        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ';' => self.add_token(TokenKind::Semicolon),
            ',' => self.add_token(TokenKind::Comma),
            '+' => self.add_token(TokenKind::Plus),
            '-' => self.add_token(TokenKind::Minus),
            '*' => self.add_token(TokenKind::Star),
            '!' => {
                let kind = if self.match_char('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.match_char('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_char('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_char('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '/' => {
                if self.match_char('/') {
                    // Comment goes until end of line
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            ' ' | '\r' | '\t' | '\n' => {
                // Whitespace; advance() already tracked the position
            }
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            _ => {
                self.add_token_with_content(
                    TokenKind::Invalid,
                    format!("Unexpected character: '{}'", c),
                );
            }
        }
    }

    fn advance(&mut self) -> char {
        let c = self.source.as_bytes().get(self.current).copied().unwrap_or(0) as char;
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn peek(&self) -> char {
        self.source.as_bytes().get(self.current).copied().unwrap_or(0) as char
    }

    fn peek_next(&self) -> char {
        self.source
            .as_bytes()
            .get(self.current + 1)
            .copied()
            .unwrap_or(0) as char
    }

    fn string(&mut self) {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != '"' {
            let c = self.advance();
            if c == '\n' {
                // A raw newline inside a string; report at the opening quote
                self.add_token_with_content(
                    TokenKind::Invalid,
                    "Unterminated string".to_string(),
                );
                return;
            }
            if c == '\\' {
                if self.is_at_end() {
                    break;
                }
                let escaped = self.advance();
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    '"' => value.push('"'),
                    '\\' => value.push('\\'),
                    other => value.push(other),
                }
            } else {
                value.push(c);
            }
        }

        if self.is_at_end() {
            self.add_token_with_content(TokenKind::Invalid, "Unterminated string".to_string());
            return;
        }

        // Consume the closing "
        self.advance();
        self.add_token_with_content(TokenKind::String, value);
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // Fractional part only when a digit follows the dot
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        self.add_token(TokenKind::Number);
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        let kind = self
            .keywords
            .get(text)
            .copied()
            .unwrap_or(TokenKind::Identifier);

        self.add_token(kind);
    }

    fn add_token(&mut self, kind: TokenKind) {
        let text = self.source[self.start..self.current].to_string();
        self.add_token_with_content(kind, text);
    }

    fn add_token_with_content(&mut self, kind: TokenKind, lexeme: String) {
        self.tokens.push(Token::new(
            kind,
            lexeme,
            Span::new(self.start, self.current),
            self.start_pos,
        ));
    }
}
