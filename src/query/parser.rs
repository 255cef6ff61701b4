//! Generic LL(k) driver over a grammar encoded as data. A grammar maps each
//! non-terminal symbol to an ordered list of clauses; a clause is an ordered
//! list of elements (token kinds or symbols) plus up to three hooks:
//! clause-start, per-element, and clause-end. Hooks mutate the statement under
//! construction; their cross-invocation state lives on the per-parse
//! [`HookState`].
//!
//! The grammar must be left-factored: per non-terminal at most one clause is
//! empty and every other clause starts with a token element. That shape is
//! validated once at construction, so runtime clause selection is a single
//! lookahead-token match with an ε fallback.

use std::collections::{HashMap, VecDeque};

use crate::error::{Error, Result};
use crate::query::hooks::HookState;
use crate::query::lexer::{Lexer, Token, TokenKind};
use crate::query::semantic::Statement;

pub type Symbol = &'static str;

/// Number of lookahead tokens kept beyond the current one.
pub const LOOKAHEAD: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarElement {
    Symbol(Symbol),
    Token(TokenKind),
}

/// What a per-element hook just saw: a consumed token or a completed
/// non-terminal.
#[derive(Debug, Clone)]
pub enum ConsumedElement {
    Token(Token),
    Symbol(Symbol),
}

impl ConsumedElement {
    pub fn token(&self) -> Option<&Token> {
        match self {
            ConsumedElement::Token(t) => Some(t),
            ConsumedElement::Symbol(_) => None,
        }
    }
}

pub type ClauseHook = fn(&mut Statement, &mut HookState, Symbol) -> Result<()>;
pub type ElementHook = fn(&mut Statement, &mut HookState, &ConsumedElement) -> Result<()>;

#[derive(Debug, Default)]
pub struct Clause {
    pub elements: Vec<GrammarElement>,
    pub start_hook: Option<ClauseHook>,
    pub element_hook: Option<ElementHook>,
    pub end_hook: Option<ClauseHook>,
}

impl Clause {
    pub fn with_start(mut self, hook: ClauseHook) -> Self {
        self.start_hook = Some(hook);
        self
    }

    pub fn with_element(mut self, hook: ElementHook) -> Self {
        self.element_hook = Some(hook);
        self
    }

    pub fn with_end(mut self, hook: ClauseHook) -> Self {
        self.end_hook = Some(hook);
        self
    }

    fn first_token(&self) -> Option<TokenKind> {
        match self.elements.first() {
            Some(GrammarElement::Token(k)) => Some(*k),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Grammar {
    symbols: HashMap<Symbol, Vec<Clause>>,
}

impl Grammar {
    /// Build a grammar, validating the left-factored contract.
    pub fn new(symbols: HashMap<Symbol, Vec<Clause>>) -> Result<Self> {
        for (symbol, clauses) in &symbols {
            let mut empties = 0usize;
            for clause in clauses {
                if clause.elements.is_empty() {
                    empties += 1;
                } else if clause.first_token().is_none() {
                    return Err(Error::Parse {
                        line: 0,
                        col: 0,
                        token: String::new(),
                        message: format!(
                            "grammar is not left-factored: a non-empty clause of '{}' does not start with a token",
                            symbol
                        ),
                    });
                }
            }
            if empties > 1 {
                return Err(Error::Parse {
                    line: 0,
                    col: 0,
                    token: String::new(),
                    message: format!("grammar is not left-factored: '{}' has {} empty clauses", symbol, empties),
                });
            }
        }
        Ok(Grammar { symbols })
    }

    fn clauses(&self, symbol: Symbol) -> Result<&[Clause]> {
        self.symbols.get(symbol).map(Vec::as_slice).ok_or_else(|| Error::Parse {
            line: 0,
            col: 0,
            token: String::new(),
            message: format!("unknown grammar symbol '{}'", symbol),
        })
    }
}

pub struct Parser<'g> {
    grammar: &'g Grammar,
    lexer: Lexer,
    buffer: VecDeque<Token>,
}

impl<'g> Parser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Parser { grammar, lexer: Lexer::new(""), buffer: VecDeque::new() }
    }

    /// Parse one statement from `input`, starting at `start` and firing hooks
    /// into `st`/`hooks`. Trailing input after the statement is an error.
    pub fn parse(
        &mut self,
        input: &str,
        start: Symbol,
        st: &mut Statement,
        hooks: &mut HookState,
    ) -> Result<()> {
        self.lexer = Lexer::new(input);
        self.buffer.clear();
        self.fill();
        self.consume_symbol(start, st, hooks)?;
        let current = self.peek(0);
        if current.kind != TokenKind::Eof {
            return Err(unexpected(&current, "trailing input after statement"));
        }
        Ok(())
    }

    /// i-th lookahead token; the stream pins to `Eof` past its end.
    pub fn peek(&self, i: usize) -> Token {
        self.buffer
            .get(i)
            .cloned()
            .unwrap_or_else(|| Token { kind: TokenKind::Eof, text: String::new(), line: 0, col: 0 })
    }

    /// Does the current token match `kind`?
    pub fn can_accept(&self, kind: TokenKind) -> bool {
        self.peek(0).kind == kind
    }

    fn fill(&mut self) {
        while self.buffer.len() < LOOKAHEAD + 1 {
            let token = self.lexer.next_token();
            let last = matches!(token.kind, TokenKind::Eof);
            self.buffer.push_back(token);
            if last {
                break;
            }
        }
    }

    fn consume_token(&mut self, kind: TokenKind, symbol: Symbol) -> Result<Token> {
        let current = self.peek(0);
        if current.kind == TokenKind::Error {
            return Err(Error::Lex { line: current.line, col: current.col, message: current.text });
        }
        if current.kind != kind {
            return Err(unexpected(
                &current,
                &format!("expected {} while parsing '{}'", kind, symbol),
            ));
        }
        let token = self.buffer.pop_front().unwrap_or(current);
        self.fill();
        Ok(token)
    }

    fn consume_symbol(
        &mut self,
        symbol: Symbol,
        st: &mut Statement,
        hooks: &mut HookState,
    ) -> Result<()> {
        let current = self.peek(0);
        if current.kind == TokenKind::Error {
            return Err(Error::Lex { line: current.line, col: current.col, message: current.text });
        }
        let clauses = self.grammar.clauses(symbol)?;
        let selected = clauses
            .iter()
            .find(|c| c.first_token() == Some(current.kind))
            .or_else(|| clauses.iter().find(|c| c.elements.is_empty()));
        let clause = match selected {
            Some(c) => c,
            None => {
                return Err(unexpected(
                    &current,
                    &format!("no clause of '{}' accepts this token", symbol),
                ))
            }
        };
        self.expect(symbol, clause, st, hooks)
    }

    fn expect(
        &mut self,
        symbol: Symbol,
        clause: &Clause,
        st: &mut Statement,
        hooks: &mut HookState,
    ) -> Result<()> {
        if let Some(hook) = clause.start_hook {
            hook(st, hooks, symbol)?;
        }
        for element in &clause.elements {
            let consumed = match *element {
                GrammarElement::Token(kind) => {
                    ConsumedElement::Token(self.consume_token(kind, symbol)?)
                }
                GrammarElement::Symbol(inner) => {
                    self.consume_symbol(inner, st, hooks)?;
                    ConsumedElement::Symbol(inner)
                }
            };
            if let Some(hook) = clause.element_hook {
                hook(st, hooks, &consumed)?;
            }
        }
        if let Some(hook) = clause.end_hook {
            hook(st, hooks, symbol)?;
        }
        Ok(())
    }
}

fn unexpected(token: &Token, message: &str) -> Error {
    Error::Parse {
        line: token.line,
        col: token.col,
        token: if token.kind == TokenKind::Eof { "<eof>".to_string() } else { token.text.clone() },
        message: message.to_string(),
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod parser_tests;
