//! Hand-written scanner for TQL source text. Tokens come out lazily, each
//! carrying its kind, the raw source text exactly as written, and the 1-based
//! line/column where it starts. Primitive tokens (nodes, predicates, bounds,
//! literals, times, blank nodes, bindings) keep their full raw text so the
//! semantic hooks can run the primitive parsers on it untouched.
//!
//! Keywords are case-insensitive; `GROUP BY` and `ORDER BY` fuse into single
//! tokens. Whitespace, `--` line comments and `/* */` block comments are
//! skipped. On an unrecognized rune sequence the scanner emits a single
//! `Error` token (message in the text field) and the stream ends.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Statement keywords.
    Select,
    From,
    Where,
    As,
    Id,
    Type,
    At,
    Before,
    After,
    Between,
    Insert,
    Delete,
    Data,
    Into,
    Create,
    Drop,
    Show,
    Graph,
    Graphs,
    Construct,
    Deconstruct,
    In,
    Optional,
    Filter,
    GroupBy,
    OrderBy,
    Having,
    Limit,
    Count,
    Sum,
    Distinct,
    Asc,
    Desc,
    And,
    Or,
    Not,
    /// A registered FILTER function name (`latest`).
    FilterFunction,
    // Punctuation and comparison operators.
    Comma,
    Dot,
    Semicolon,
    LBracket,
    RBracket,
    LPar,
    RPar,
    LSquare,
    RSquare,
    Eq,
    Lt,
    Gt,
    // Primitive tokens; text is the raw source form.
    Node,
    Predicate,
    PredicateBound,
    Literal,
    Time,
    BlankNode,
    Binding,
    // Control.
    Eof,
    Error,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    fn new(kind: TokenKind, text: String, line: usize, col: usize) -> Self {
        Token { kind, text, line, col }
    }
}

/// FILTER function names recognized by the lexer.
const FILTER_FUNCTIONS: &[&str] = &["latest"];

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    done: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer { chars: input.chars().collect(), pos: 0, line: 1, col: 1, done: false }
    }

    /// Drain the whole source into a token vector, ending with `Eof` (or a
    /// single trailing `Error`).
    pub fn lex_all(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token();
            let stop = matches!(token.kind, TokenKind::Eof | TokenKind::Error);
            out.push(token);
            if stop {
                return out;
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn text_from(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), Token> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('-') if self.peek_at(1) == Some('-') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let (line, col) = (self.line, self.col);
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while let Some(c) = self.advance() {
                        if c == '*' && self.peek() == Some('/') {
                            self.advance();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(self.error_at("unterminated block comment", line, col));
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn error_at(&mut self, msg: &str, line: usize, col: usize) -> Token {
        self.done = true;
        Token::new(TokenKind::Error, msg.to_string(), line, col)
    }

    /// Produce the next token. After `Eof` or `Error` the stream stays pinned
    /// on `Eof`.
    pub fn next_token(&mut self) -> Token {
        if self.done {
            return Token::new(TokenKind::Eof, String::new(), self.line, self.col);
        }
        if let Err(e) = self.skip_whitespace_and_comments() {
            return e;
        }
        let (line, col) = (self.line, self.col);
        let start = self.pos;
        let ch = match self.peek() {
            None => {
                self.done = true;
                return Token::new(TokenKind::Eof, String::new(), line, col);
            }
            Some(c) => c,
        };

        let single = |kind: TokenKind| Some(kind);
        let punct = match ch {
            ',' => single(TokenKind::Comma),
            '.' => single(TokenKind::Dot),
            ';' => single(TokenKind::Semicolon),
            '{' => single(TokenKind::LBracket),
            '}' => single(TokenKind::RBracket),
            '(' => single(TokenKind::LPar),
            ')' => single(TokenKind::RPar),
            '[' => single(TokenKind::LSquare),
            ']' => single(TokenKind::RSquare),
            '=' => single(TokenKind::Eq),
            '<' => single(TokenKind::Lt),
            '>' => single(TokenKind::Gt),
            _ => None,
        };
        if let Some(kind) = punct {
            self.advance();
            return Token::new(kind, self.text_from(start), line, col);
        }

        match ch {
            '?' => self.lex_binding(start, line, col),
            '/' => self.lex_node(start, line, col),
            '"' => self.lex_quoted(start, line, col),
            '_' => self.lex_blank_node(start, line, col),
            c if c.is_ascii_digit() => self.lex_time(start, line, col),
            c if c.is_alphabetic() => self.lex_word(start, line, col),
            c => self.error_at(&format!("unrecognized character '{}'", c), line, col),
        }
    }

    fn lex_binding(&mut self, start: usize, line: usize, col: usize) -> Token {
        self.advance(); // '?'
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let text = self.text_from(start);
        if text.len() == 1 {
            return self.error_at("binding name missing after '?'", line, col);
        }
        Token::new(TokenKind::Binding, text, line, col)
    }

    fn lex_node(&mut self, start: usize, line: usize, col: usize) -> Token {
        // Type path.
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '/') {
            self.advance();
        }
        if self.peek() != Some('<') {
            return self.error_at("expected '<id>' after node type path", line, col);
        }
        self.advance();
        loop {
            match self.advance() {
                None => return self.error_at("unterminated node id", line, col),
                Some('\n') => return self.error_at("unterminated node id", line, col),
                Some('>') => break,
                Some(_) => {}
            }
        }
        Token::new(TokenKind::Node, self.text_from(start), line, col)
    }

    fn lex_quoted(&mut self, start: usize, line: usize, col: usize) -> Token {
        self.advance(); // opening quote
        loop {
            match self.advance() {
                None | Some('\n') => return self.error_at("unterminated string", line, col),
                Some('"') => break,
                Some(_) => {}
            }
        }
        // Dispatch on the tail: a literal type marker or a predicate anchor.
        if self.peek() == Some('^') && self.peek_at(1) == Some('^') {
            self.advance();
            self.advance();
            for expected in "type:".chars() {
                if self.peek() != Some(expected) {
                    return self.error_at("expected 'type:' after '^^'", line, col);
                }
                self.advance();
            }
            while matches!(self.peek(), Some(c) if c.is_alphanumeric()) {
                self.advance();
            }
            return Token::new(TokenKind::Literal, self.text_from(start), line, col);
        }
        if self.peek() == Some('@') && self.peek_at(1) == Some('[') {
            self.advance();
            self.advance();
            let mut has_comma = false;
            loop {
                match self.advance() {
                    None | Some('\n') => return self.error_at("unterminated predicate anchor", line, col),
                    Some(']') => break,
                    Some(',') => has_comma = true,
                    Some(_) => {}
                }
            }
            let kind = if has_comma { TokenKind::PredicateBound } else { TokenKind::Predicate };
            return Token::new(kind, self.text_from(start), line, col);
        }
        self.error_at("bare string: expected '^^type:' or '@[' after closing quote", line, col)
    }

    fn lex_blank_node(&mut self, start: usize, line: usize, col: usize) -> Token {
        self.advance(); // '_'
        if self.peek() != Some(':') {
            return self.error_at("expected ':' after '_' in blank node", line, col);
        }
        self.advance();
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let text = self.text_from(start);
        if text.len() == 2 {
            return self.error_at("blank node label missing after '_:'", line, col);
        }
        Token::new(TokenKind::BlankNode, text, line, col)
    }

    fn lex_time(&mut self, start: usize, line: usize, col: usize) -> Token {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()
            || matches!(c, '-' | ':' | '+' | '.' | 'T' | 'Z' | 't' | 'z'))
        {
            self.advance();
        }
        let text = self.text_from(start);
        if chrono::DateTime::parse_from_rfc3339(&text).is_err() {
            return self.error_at(&format!("cannot lex '{}' as an RFC 3339 time", text), line, col);
        }
        Token::new(TokenKind::Time, text, line, col)
    }

    fn lex_word(&mut self, start: usize, line: usize, col: usize) -> Token {
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let word = self.text_from(start);
        let upper = word.to_ascii_uppercase();
        if upper == "GROUP" || upper == "ORDER" {
            return self.lex_fused_by(start, &upper, line, col);
        }
        let kind = match upper.as_str() {
            "SELECT" => TokenKind::Select,
            "FROM" => TokenKind::From,
            "WHERE" => TokenKind::Where,
            "AS" => TokenKind::As,
            "ID" => TokenKind::Id,
            "TYPE" => TokenKind::Type,
            "AT" => TokenKind::At,
            "BEFORE" => TokenKind::Before,
            "AFTER" => TokenKind::After,
            "BETWEEN" => TokenKind::Between,
            "INSERT" => TokenKind::Insert,
            "DELETE" => TokenKind::Delete,
            "DATA" => TokenKind::Data,
            "INTO" => TokenKind::Into,
            "CREATE" => TokenKind::Create,
            "DROP" => TokenKind::Drop,
            "SHOW" => TokenKind::Show,
            "GRAPH" => TokenKind::Graph,
            "GRAPHS" => TokenKind::Graphs,
            "CONSTRUCT" => TokenKind::Construct,
            "DECONSTRUCT" => TokenKind::Deconstruct,
            "IN" => TokenKind::In,
            "OPTIONAL" => TokenKind::Optional,
            "FILTER" => TokenKind::Filter,
            "HAVING" => TokenKind::Having,
            "LIMIT" => TokenKind::Limit,
            "COUNT" => TokenKind::Count,
            "SUM" => TokenKind::Sum,
            "DISTINCT" => TokenKind::Distinct,
            "ASC" => TokenKind::Asc,
            "DESC" => TokenKind::Desc,
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "NOT" => TokenKind::Not,
            _ => {
                if FILTER_FUNCTIONS.contains(&word.to_ascii_lowercase().as_str()) {
                    TokenKind::FilterFunction
                } else {
                    return self.error_at(&format!("unrecognized keyword '{}'", word), line, col);
                }
            }
        };
        Token::new(kind, word, line, col)
    }

    fn lex_fused_by(&mut self, start: usize, first: &str, line: usize, col: usize) -> Token {
        // Consume the whitespace run and the BY word so the token text stays a
        // verbatim source slice.
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
        let by_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let by: String = self.chars[by_start..self.pos].iter().collect();
        if !by.eq_ignore_ascii_case("BY") {
            return self.error_at(&format!("expected BY after {}", first), line, col);
        }
        let kind = if first == "GROUP" { TokenKind::GroupBy } else { TokenKind::OrderBy };
        Token::new(kind, self.text_from(start), line, col)
    }
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod lexer_tests;
