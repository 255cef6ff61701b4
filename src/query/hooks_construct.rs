//! CONSTRUCT/DECONSTRUCT template hooks: working-clause and working-pair
//! lifecycle plus the position hooks assigning subjects, predicates, and
//! objects with the same validation the WHERE hooks apply. Templates only
//! accept concrete primitives, bindings, and blank-node labels; partial
//! predicates and bounds have no meaning here.

use crate::error::{Error, Result};
use crate::graph::{default_literal_builder, Node, Object, Predicate};
use crate::query::hooks::HookState;
use crate::query::lexer::TokenKind;
use crate::query::parser::{ConsumedElement, Symbol};
use crate::query::semantic::{ConstructClause, ConstructPair, Statement, StatementKind};

/// Start a fresh working template clause.
pub fn construct_init(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> Result<()> {
    st.working_construct = ConstructClause::default();
    Ok(())
}

/// Append the working template clause once its region ends.
pub fn construct_next(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> Result<()> {
    flush_pair(st)?;
    if !st.working_construct.is_empty() {
        let clause = std::mem::take(&mut st.working_construct);
        st.construct_clauses.push(clause);
    }
    Ok(())
}

/// Append the working predicate-object pair (main pair first, then the
/// reification pairs introduced with `;`).
pub fn construct_pair_next(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> Result<()> {
    flush_pair(st)
}

fn flush_pair(st: &mut Statement) -> Result<()> {
    let clause = &mut st.working_construct;
    if clause.working_pair.is_empty() {
        return Ok(());
    }
    let pair = std::mem::take(&mut clause.working_pair);
    if pair.p.is_none() && pair.p_binding.is_none() {
        return Err(Error::semantic("template pair is missing its predicate".to_string()));
    }
    if pair.o.is_none() && pair.o_binding.is_none() && pair.o_blank.is_none() {
        return Err(Error::semantic("template pair is missing its object".to_string()));
    }
    clause.pairs.push(pair);
    Ok(())
}

/// Template subject position.
pub fn construct_subject(st: &mut Statement, _h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    let token = match e.token() {
        Some(t) => t,
        None => return Ok(()),
    };
    let clause = &mut st.working_construct;
    let already = clause.s.is_some() || clause.s_binding.is_some() || clause.s_blank.is_some();
    match token.kind {
        TokenKind::Node => {
            if already {
                return Err(Error::semantic(format!(
                    "template subject already set at '{}'",
                    token.text
                )));
            }
            clause.s = Some(Node::parse(&token.text)?);
        }
        TokenKind::Binding => {
            if already {
                return Err(Error::semantic(format!(
                    "template subject already set at '{}'",
                    token.text
                )));
            }
            clause.s_binding = Some(token.text.clone());
        }
        TokenKind::BlankNode => {
            if already {
                return Err(Error::semantic(format!(
                    "template subject already set at '{}'",
                    token.text
                )));
            }
            clause.s_blank = Some(token.text.trim_start_matches("_:").to_string());
        }
        _ => {}
    }
    Ok(())
}

/// Template predicate position; only full predicates or bindings are legal.
pub fn construct_predicate(
    st: &mut Statement,
    _h: &mut HookState,
    e: &ConsumedElement,
) -> Result<()> {
    let token = match e.token() {
        Some(t) => t,
        None => return Ok(()),
    };
    let pair = &mut st.working_construct.working_pair;
    match token.kind {
        TokenKind::Predicate => {
            if pair.p.is_some() || pair.p_binding.is_some() {
                return Err(Error::semantic(format!(
                    "template predicate already set at '{}'",
                    token.text
                )));
            }
            pair.p = Some(Predicate::parse(&token.text)?);
        }
        TokenKind::Binding => {
            if pair.p.is_some() || pair.p_binding.is_some() {
                return Err(Error::semantic(format!(
                    "template predicate already set at '{}'",
                    token.text
                )));
            }
            pair.p_binding = Some(token.text.clone());
        }
        _ => {}
    }
    Ok(())
}

/// Template object position.
pub fn construct_object(st: &mut Statement, _h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    let token = match e.token() {
        Some(t) => t,
        None => return Ok(()),
    };
    let pair = &mut st.working_construct.working_pair;
    let already = pair.o.is_some() || pair.o_binding.is_some() || pair.o_blank.is_some();
    if already && matches!(token.kind, TokenKind::Node | TokenKind::Literal | TokenKind::Predicate | TokenKind::BlankNode | TokenKind::Binding) {
        return Err(Error::semantic(format!("template object already set at '{}'", token.text)));
    }
    match token.kind {
        TokenKind::Node => pair.o = Some(Object::Node(Node::parse(&token.text)?)),
        TokenKind::Literal => {
            pair.o = Some(Object::Literal(default_literal_builder().parse(&token.text)?))
        }
        TokenKind::Predicate => pair.o = Some(Object::Predicate(Predicate::parse(&token.text)?)),
        TokenKind::BlankNode => {
            pair.o_blank = Some(token.text.trim_start_matches("_:").to_string())
        }
        TokenKind::Binding => pair.o_binding = Some(token.text.clone()),
        _ => {}
    }
    Ok(())
}

/// Clause-end check of CONSTRUCT/DECONSTRUCT statements: the template exists,
/// its bindings resolve against the WHERE pattern, and DECONSTRUCT templates
/// carry no blank nodes (removing freshly minted nodes can never match).
pub fn construct_finalize(st: &mut Statement, h: &mut HookState, s: Symbol) -> Result<()> {
    construct_next(st, h, s)?;
    if !st.working_clause.is_empty() {
        let clause = std::mem::take(&mut st.working_clause);
        st.pattern.push(clause);
    }
    if st.construct_clauses.is_empty() {
        return Err(Error::semantic("statement has an empty template".to_string()));
    }
    let available = st.pattern_bindings();
    let mut check_binding = |binding: &Option<String>| -> Result<()> {
        if let Some(name) = binding {
            if !available.contains(name) {
                return Err(Error::semantic(format!(
                    "template binding '{}' does not appear in the pattern",
                    name
                )));
            }
        }
        Ok(())
    };
    for clause in &st.construct_clauses {
        check_binding(&clause.s_binding)?;
        for pair in &clause.pairs {
            check_binding(&pair.p_binding)?;
            check_binding(&pair.o_binding)?;
        }
    }
    if st.kind == Some(StatementKind::Deconstruct) {
        for clause in &st.construct_clauses {
            let has_blank =
                clause.s_blank.is_some() || clause.pairs.iter().any(|p| p.o_blank.is_some());
            if has_blank {
                return Err(Error::semantic(
                    "DECONSTRUCT templates cannot contain blank nodes".to_string(),
                ));
            }
        }
    }
    Ok(())
}
