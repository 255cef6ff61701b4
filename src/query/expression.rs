//! Boolean expression evaluation over result rows, used by HAVING. The
//! builder turns the captured token stream into a small evaluator tree by
//! recursive descent: one operand per recursion (`NOT x`, `?b op operand`, or
//! a parenthesized expression), with `AND`/`OR` combining the remainder.
//! Comparisons are typed: literals against literals (kinds must match unless
//! both are numeric), nodes/predicates support equality only, times compare
//! chronologically, and everything else goes through the canonical comparable
//! string of the cell.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::graph::predicate::parse_time;
use crate::graph::{default_literal_builder, Literal, Node, Predicate};
use crate::query::lexer::{Token, TokenKind};
use crate::table::{Cell, Row};

pub trait Evaluator: Send + Sync + std::fmt::Debug {
    fn evaluate(&self, row: &Row) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Lt,
    Gt,
}

impl CompOp {
    fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Eq => Some(CompOp::Eq),
            TokenKind::Lt => Some(CompOp::Lt),
            TokenKind::Gt => Some(CompOp::Gt),
            _ => None,
        }
    }

    fn matches(&self, ord: Ordering) -> bool {
        match self {
            CompOp::Eq => ord == Ordering::Equal,
            CompOp::Lt => ord == Ordering::Less,
            CompOp::Gt => ord == Ordering::Greater,
        }
    }
}

/// Compiled form of an absent HAVING clause.
#[derive(Debug)]
pub struct AlwaysTrue;

impl Evaluator for AlwaysTrue {
    fn evaluate(&self, _row: &Row) -> Result<bool> {
        Ok(true)
    }
}

/// `?l op ?r` — both cells must be bound; compares comparable strings.
#[derive(Debug)]
struct BindingComparison {
    op: CompOp,
    left: String,
    right: String,
}

impl Evaluator for BindingComparison {
    fn evaluate(&self, row: &Row) -> Result<bool> {
        let l = lookup(row, &self.left)?;
        let r = lookup(row, &self.right)?;
        Ok(self.op.matches(l.comparable_string().cmp(&r.comparable_string())))
    }
}

/// `?l op literal` — the left cell must be a literal or a plain string.
#[derive(Debug)]
struct LiteralComparison {
    op: CompOp,
    binding: String,
    literal: Literal,
}

impl Evaluator for LiteralComparison {
    fn evaluate(&self, row: &Row) -> Result<bool> {
        let cell = lookup(row, &self.binding)?;
        let left = match cell {
            Cell::Literal(l) => l.clone(),
            Cell::String(s) => {
                if !matches!(self.literal, Literal::Text(_)) {
                    return Err(Error::expr_eval(format!(
                        "string binding '{}' only compares against text literals, got {}",
                        self.binding, self.literal
                    )));
                }
                Literal::Text(s.clone())
            }
            other => {
                return Err(Error::expr_eval(format!(
                    "binding '{}' holds {} where a literal was expected",
                    self.binding, other
                )))
            }
        };
        if left.type_name() != self.literal.type_name()
            && !(left.is_numeric() && self.literal.is_numeric())
        {
            return Err(Error::expr_eval(format!(
                "cannot compare {} against {}",
                left.type_name(),
                self.literal.type_name()
            )));
        }
        // Mixed numeric kinds compare numerically; everything else compares by
        // the canonical comparable string.
        let ord = if left.is_numeric() && left.type_name() != self.literal.type_name() {
            let (l, r) = (left.as_f64().unwrap_or_default(), self.literal.as_f64().unwrap_or_default());
            l.partial_cmp(&r)
                .ok_or_else(|| Error::expr_eval("numeric comparison is undefined on NaN".to_string()))?
        } else {
            left.comparable_string().cmp(&self.literal.comparable_string())
        };
        Ok(self.op.matches(ord))
    }
}

/// `?l = node` — ordering across nodes is undefined, so `<`/`>` fail.
#[derive(Debug)]
struct NodeComparison {
    op: CompOp,
    binding: String,
    node: Node,
}

impl Evaluator for NodeComparison {
    fn evaluate(&self, row: &Row) -> Result<bool> {
        if self.op != CompOp::Eq {
            return Err(Error::expr_eval("nodes only support equality comparison".to_string()));
        }
        match row.get(&self.binding) {
            None => Ok(false),
            Some(Cell::Node(n)) => Ok(*n == self.node),
            Some(other) => Err(Error::expr_eval(format!(
                "binding '{}' holds {} where a node was expected",
                self.binding, other
            ))),
        }
    }
}

/// `?l op time` — chronological ordering.
#[derive(Debug)]
struct TimeComparison {
    op: CompOp,
    binding: String,
    time: DateTime<Utc>,
}

impl Evaluator for TimeComparison {
    fn evaluate(&self, row: &Row) -> Result<bool> {
        match row.get(&self.binding) {
            None => Ok(false),
            Some(Cell::Time(t)) => Ok(self.op.matches(t.cmp(&self.time))),
            Some(other) => Err(Error::expr_eval(format!(
                "binding '{}' holds {} where a time was expected",
                self.binding, other
            ))),
        }
    }
}

/// `?l = predicate` — non-equality operations fail.
#[derive(Debug)]
struct PredicateComparison {
    op: CompOp,
    binding: String,
    predicate: Predicate,
}

impl Evaluator for PredicateComparison {
    fn evaluate(&self, row: &Row) -> Result<bool> {
        if self.op != CompOp::Eq {
            return Err(Error::expr_eval("predicates only support equality comparison".to_string()));
        }
        match row.get(&self.binding) {
            None => Ok(false),
            Some(Cell::Predicate(p)) => Ok(*p == self.predicate),
            Some(other) => Err(Error::expr_eval(format!(
                "binding '{}' holds {} where a predicate was expected",
                self.binding, other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoolOp {
    And,
    Or,
    Not,
}

/// Short-circuiting boolean combinator; `NOT` carries no right operand.
#[derive(Debug)]
struct BooleanNode {
    op: BoolOp,
    left: Box<dyn Evaluator>,
    right: Option<Box<dyn Evaluator>>,
}

impl Evaluator for BooleanNode {
    fn evaluate(&self, row: &Row) -> Result<bool> {
        let left = self.left.evaluate(row)?;
        match self.op {
            BoolOp::Not => {
                if self.right.is_some() {
                    return Err(Error::expr_eval("NOT takes a single operand".to_string()));
                }
                Ok(!left)
            }
            BoolOp::And => {
                if !left {
                    return Ok(false);
                }
                self.right_operand()?.evaluate(row)
            }
            BoolOp::Or => {
                if left {
                    return Ok(true);
                }
                self.right_operand()?.evaluate(row)
            }
        }
    }
}

impl BooleanNode {
    fn right_operand(&self) -> Result<&dyn Evaluator> {
        self.right
            .as_deref()
            .ok_or_else(|| Error::expr_eval("binary boolean operator is missing its right operand".to_string()))
    }
}

fn lookup<'r>(row: &'r Row, binding: &str) -> Result<&'r Cell> {
    row.get(binding)
        .ok_or_else(|| Error::expr_eval(format!("binding '{}' is not bound in the row", binding)))
}

/// Build an evaluator from a captured token stream (the HAVING tokens, with
/// the keyword itself excluded).
pub fn new_evaluator(tokens: &[Token]) -> Result<Box<dyn Evaluator>> {
    if tokens.is_empty() {
        return Err(Error::expr_build("empty expression".to_string()));
    }
    let (eval, rest) = parse_expression(tokens)?;
    if !rest.is_empty() {
        return Err(Error::expr_build(format!(
            "trailing tokens after expression, starting at '{}'",
            rest[0].text
        )));
    }
    Ok(eval)
}

fn parse_expression(tokens: &[Token]) -> Result<(Box<dyn Evaluator>, &[Token])> {
    let (left, rest) = parse_operand(tokens)?;
    match rest.first().map(|t| t.kind) {
        Some(TokenKind::And) => {
            let (right, rest) = parse_expression(&rest[1..])?;
            Ok((Box::new(BooleanNode { op: BoolOp::And, left, right: Some(right) }), rest))
        }
        Some(TokenKind::Or) => {
            let (right, rest) = parse_expression(&rest[1..])?;
            Ok((Box::new(BooleanNode { op: BoolOp::Or, left, right: Some(right) }), rest))
        }
        _ => Ok((left, rest)),
    }
}

fn parse_operand(tokens: &[Token]) -> Result<(Box<dyn Evaluator>, &[Token])> {
    let first = tokens
        .first()
        .ok_or_else(|| Error::expr_build("expression ended where an operand was expected".to_string()))?;
    match first.kind {
        TokenKind::Not => {
            let (inner, rest) = parse_operand(&tokens[1..])?;
            Ok((Box::new(BooleanNode { op: BoolOp::Not, left: inner, right: None }), rest))
        }
        TokenKind::LPar => {
            let (inner, rest) = parse_expression(&tokens[1..])?;
            match rest.first().map(|t| t.kind) {
                Some(TokenKind::RPar) => Ok((inner, &rest[1..])),
                _ => Err(Error::expr_build("unbalanced '(' in expression".to_string())),
            }
        }
        TokenKind::Binding => parse_comparison(tokens),
        _ => Err(Error::expr_build(format!("unexpected token '{}' in expression", first.text))),
    }
}

fn parse_comparison(tokens: &[Token]) -> Result<(Box<dyn Evaluator>, &[Token])> {
    let binding = tokens[0].text.clone();
    let op_token = tokens
        .get(1)
        .ok_or_else(|| Error::expr_build(format!("'{}' is missing a comparison operator", binding)))?;
    let op = CompOp::from_token(op_token.kind).ok_or_else(|| {
        Error::expr_build(format!("unknown comparison operator '{}'", op_token.text))
    })?;
    let operand = tokens
        .get(2)
        .ok_or_else(|| Error::expr_build(format!("comparison on '{}' is missing its operand", binding)))?;
    let eval: Box<dyn Evaluator> = match operand.kind {
        TokenKind::Binding => {
            Box::new(BindingComparison { op, left: binding, right: operand.text.clone() })
        }
        TokenKind::Literal => {
            let literal = default_literal_builder()
                .parse(&operand.text)
                .map_err(|e| Error::expr_build(e.to_string()))?;
            Box::new(LiteralComparison { op, binding, literal })
        }
        TokenKind::Node => {
            let node = Node::parse(&operand.text).map_err(|e| Error::expr_build(e.to_string()))?;
            Box::new(NodeComparison { op, binding, node })
        }
        TokenKind::Time => {
            let time = parse_time(&operand.text).map_err(|e| Error::expr_build(e.to_string()))?;
            Box::new(TimeComparison { op, binding, time })
        }
        TokenKind::Predicate => {
            let predicate =
                Predicate::parse(&operand.text).map_err(|e| Error::expr_build(e.to_string()))?;
            Box::new(PredicateComparison { op, binding, predicate })
        }
        _ => {
            return Err(Error::expr_build(format!(
                "'{}' is not a valid comparison operand",
                operand.text
            )))
        }
    };
    Ok((eval, &tokens[3..]))
}

#[cfg(test)]
#[path = "expression_tests.rs"]
mod expression_tests;
