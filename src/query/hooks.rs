//! Semantic hooks shared by every statement form: statement-kind binding,
//! graph-name accumulation, and the INSERT/DELETE data accumulator. The
//! where-clause, projection/modifier, and CONSTRUCT hooks live in their own
//! modules alongside this one.
//!
//! Hooks are plain functions wired into grammar clauses; whatever state they
//! need across invocations lives on the per-parse [`HookState`], so nothing
//! leaks between statements.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::graph::{default_literal_builder, Literal, Node, Object, Predicate, Triple};
use crate::query::lexer::TokenKind;
use crate::query::parser::{ConsumedElement, Symbol};
use crate::query::semantic::{FilterOperation, Statement, StatementKind};

/// Which global-bounds keyword is currently collecting times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundsMode {
    Before,
    After,
    Between,
}

/// Mutable cross-invocation hook state, owned by one parse run.
#[derive(Default)]
pub struct HookState {
    // Last alias modifier keyword seen per working-clause position.
    pub(crate) subject_last_nop: Option<TokenKind>,
    pub(crate) predicate_last_nop: Option<TokenKind>,
    pub(crate) object_last_nop: Option<TokenKind>,
    // Projection accumulation.
    pub(crate) vars_last_nop: Option<TokenKind>,
    // FILTER clause under construction.
    pub(crate) filter_operation: Option<FilterOperation>,
    pub(crate) filter_binding: Option<String>,
    pub(crate) filter_value: Option<Literal>,
    // Global temporal bounds state machine.
    pub(crate) bounds_mode: Option<BoundsMode>,
    pub(crate) between_lower: Option<DateTime<Utc>>,
    // Partial triple while accumulating INSERT/DELETE data.
    pub(crate) data_subject: Option<Node>,
    pub(crate) data_predicate: Option<Predicate>,
}

impl HookState {
    pub fn new() -> Self {
        HookState::default()
    }

    pub(crate) fn reset_working_clause_state(&mut self) {
        self.subject_last_nop = None;
        self.predicate_last_nop = None;
        self.object_last_nop = None;
    }
}

fn bind_kind(st: &mut Statement, kind: StatementKind) -> Result<()> {
    if let Some(existing) = st.kind {
        return Err(Error::semantic(format!(
            "statement kind already bound to {:?} while binding {:?}",
            existing, kind
        )));
    }
    st.kind = Some(kind);
    Ok(())
}

pub fn bind_query(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> Result<()> {
    bind_kind(st, StatementKind::Query)
}

pub fn bind_insert(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> Result<()> {
    bind_kind(st, StatementKind::Insert)
}

pub fn bind_delete(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> Result<()> {
    bind_kind(st, StatementKind::Delete)
}

pub fn bind_create(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> Result<()> {
    bind_kind(st, StatementKind::Create)
}

pub fn bind_drop(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> Result<()> {
    bind_kind(st, StatementKind::Drop)
}

pub fn bind_show(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> Result<()> {
    bind_kind(st, StatementKind::Show)
}

pub fn bind_construct(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> Result<()> {
    bind_kind(st, StatementKind::Construct)
}

pub fn bind_deconstruct(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> Result<()> {
    bind_kind(st, StatementKind::Deconstruct)
}

fn accumulate_graph(list: &mut Vec<String>, element: &ConsumedElement) {
    // Commas and nested symbols are ignored; binding tokens carry the names.
    if let Some(token) = element.token() {
        if token.kind == TokenKind::Binding {
            list.push(token.text.clone());
        }
    }
}

/// Collects `FROM`/`INTO` graph names of queries, mutations, and
/// CREATE/DROP statements.
pub fn graph_accumulator(st: &mut Statement, _h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    accumulate_graph(&mut st.graph_names, e);
    Ok(())
}

/// Collects the graphs a CONSTRUCT/DECONSTRUCT reads from.
pub fn input_graph_accumulator(
    st: &mut Statement,
    _h: &mut HookState,
    e: &ConsumedElement,
) -> Result<()> {
    accumulate_graph(&mut st.input_graph_names, e);
    Ok(())
}

/// Collects the graphs a CONSTRUCT/DECONSTRUCT writes to.
pub fn output_graph_accumulator(
    st: &mut Statement,
    _h: &mut HookState,
    e: &ConsumedElement,
) -> Result<()> {
    accumulate_graph(&mut st.output_graph_names, e);
    Ok(())
}

/// Accumulates `(node, predicate, object)` triples of INSERT/DELETE DATA
/// blocks. Position falls out of arrival order: first node is the subject,
/// the first predicate the predicate, and the next primitive completes the
/// triple.
pub fn data_accumulator(st: &mut Statement, h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    let token = match e.token() {
        Some(t) => t,
        None => return Ok(()),
    };
    match token.kind {
        TokenKind::Node => {
            let node = Node::parse(&token.text)?;
            if h.data_subject.is_none() {
                h.data_subject = Some(node);
            } else {
                finish_data_triple(st, h, Object::Node(node))?;
            }
        }
        TokenKind::Predicate => {
            let predicate = Predicate::parse(&token.text)?;
            if h.data_predicate.is_none() {
                h.data_predicate = Some(predicate);
            } else {
                finish_data_triple(st, h, Object::Predicate(predicate))?;
            }
        }
        TokenKind::Literal => {
            let literal = default_literal_builder().parse(&token.text)?;
            finish_data_triple(st, h, Object::Literal(literal))?;
        }
        _ => {}
    }
    Ok(())
}

fn finish_data_triple(st: &mut Statement, h: &mut HookState, object: Object) -> Result<()> {
    let subject = h
        .data_subject
        .take()
        .ok_or_else(|| Error::semantic("data triple is missing its subject node".to_string()))?;
    let predicate = h
        .data_predicate
        .take()
        .ok_or_else(|| Error::semantic("data triple is missing its predicate".to_string()))?;
    st.data.push(Triple::new(subject, predicate, object));
    Ok(())
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod hooks_tests;
