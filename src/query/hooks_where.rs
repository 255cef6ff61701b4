//! WHERE-pattern hooks: working-clause lifecycle plus the stateful
//! subject/predicate/object hooks driven by the last modifier keyword seen
//! (`AS`/`TYPE`/`ID`/`AT`), and the FILTER clause hook.
//!
//! Predicate tokens that fail the full parse are matched against the partial
//! forms: `"id"@[?anchor]` extracts the id and an anchor binding, and the
//! two-anchor bound form extracts a time or binding per side. Ids with an
//! embedded comma cannot be told apart from the bound separator, so they are
//! rejected outright.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::graph::node::BLANK_NODE_TYPE;
use crate::graph::predicate::parse_time;
use crate::graph::{default_literal_builder, Node, Object, Predicate, PredicateKind};
use crate::query::hooks::HookState;
use crate::query::lexer::{Token, TokenKind};
use crate::query::parser::{ConsumedElement, Symbol};
use crate::query::semantic::{FilterClause, FilterOperation, GraphClause, Statement};

static PARTIAL_PREDICATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^"(.+)"@\["?([^\]"]*)"?\]$"#).unwrap());

static PREDICATE_BOUND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^"(.+)"@\["?([^\]",]*)"?,"?([^\]",]*)"?\]$"#).unwrap());

/// Start a fresh working clause.
pub fn where_init_working_clause(st: &mut Statement, h: &mut HookState, _s: Symbol) -> Result<()> {
    st.working_clause = GraphClause::default();
    h.reset_working_clause_state();
    Ok(())
}

/// Append the working clause to the pattern if it captured anything, then
/// reset for the next one.
pub fn where_next_working_clause(st: &mut Statement, h: &mut HookState, _s: Symbol) -> Result<()> {
    if !st.working_clause.is_empty() {
        let clause = std::mem::take(&mut st.working_clause);
        st.pattern.push(clause);
    }
    h.reset_working_clause_state();
    Ok(())
}

fn set_once(slot: &mut Option<String>, token: &Token, what: &str) -> Result<()> {
    if slot.is_some() {
        return Err(Error::semantic(format!("{} assigned twice at '{}'", what, token.text)));
    }
    *slot = Some(token.text.clone());
    Ok(())
}

/// Subject-position hook.
pub fn where_subject(st: &mut Statement, h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    let token = match e.token() {
        Some(t) => t,
        None => return Ok(()),
    };
    let wc = &mut st.working_clause;
    match token.kind {
        TokenKind::LBracket | TokenKind::RBracket => h.subject_last_nop = None,
        TokenKind::Optional => wc.optional = true,
        TokenKind::Node => {
            if wc.s.is_some() {
                return Err(Error::semantic(format!("subject already set at '{}'", token.text)));
            }
            if wc.s_binding.is_some() {
                return Err(Error::semantic(
                    "subject cannot carry both a node and a binding".to_string(),
                ));
            }
            wc.s = Some(Node::parse(&token.text)?);
        }
        TokenKind::Binding => {
            match h.subject_last_nop {
                None => {
                    if wc.s.is_some() {
                        return Err(Error::semantic(
                            "subject cannot carry both a node and a binding".to_string(),
                        ));
                    }
                    set_once(&mut wc.s_binding, token, "subject binding")?;
                }
                Some(TokenKind::As) => set_once(&mut wc.s_alias, token, "subject alias")?,
                Some(TokenKind::Type) => {
                    set_once(&mut wc.s_type_alias, token, "subject type alias")?
                }
                Some(TokenKind::Id) => set_once(&mut wc.s_id_alias, token, "subject id alias")?,
                Some(other) => {
                    return Err(Error::semantic(format!(
                        "unexpected modifier {} before subject binding '{}'",
                        other, token.text
                    )))
                }
            }
            h.subject_last_nop = None;
        }
        other => h.subject_last_nop = Some(other),
    }
    Ok(())
}

/// Predicate-position hook.
pub fn where_predicate(st: &mut Statement, h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    let token = match e.token() {
        Some(t) => t,
        None => return Ok(()),
    };
    let wc = &mut st.working_clause;
    match token.kind {
        TokenKind::Predicate => {
            if wc.p.is_some() || wc.p_id.is_some() {
                return Err(Error::semantic(format!("predicate already set at '{}'", token.text)));
            }
            match Predicate::parse(&token.text) {
                Ok(p) => {
                    wc.p_temporal = p.kind() == PredicateKind::Temporal;
                    wc.p = Some(p);
                }
                Err(_) => {
                    let (id, anchor_binding) = parse_partial_predicate(&token.text)?;
                    wc.p_id = Some(id);
                    if let Some(binding) = anchor_binding {
                        wc.p_anchor_binding = Some(binding);
                        wc.p_temporal = true;
                    }
                }
            }
        }
        TokenKind::PredicateBound => {
            if wc.p.is_some() || wc.p_id.is_some() {
                return Err(Error::semantic(format!("predicate already set at '{}'", token.text)));
            }
            let bound = parse_predicate_bound(&token.text)?;
            wc.p_id = Some(bound.id);
            wc.p_lower_bound = bound.lower;
            wc.p_upper_bound = bound.upper;
            wc.p_lower_bound_alias = bound.lower_binding;
            wc.p_upper_bound_alias = bound.upper_binding;
            wc.p_temporal = true;
        }
        TokenKind::Binding => {
            match h.predicate_last_nop {
                None => {
                    if wc.p.is_some() {
                        return Err(Error::semantic(
                            "predicate cannot carry both a value and a binding".to_string(),
                        ));
                    }
                    set_once(&mut wc.p_binding, token, "predicate binding")?;
                }
                Some(TokenKind::As) => set_once(&mut wc.p_alias, token, "predicate alias")?,
                Some(TokenKind::Id) => set_once(&mut wc.p_id_alias, token, "predicate id alias")?,
                Some(TokenKind::At) => {
                    set_once(&mut wc.p_anchor_alias, token, "predicate anchor alias")?
                }
                Some(other) => {
                    return Err(Error::semantic(format!(
                        "unexpected modifier {} before predicate binding '{}'",
                        other, token.text
                    )))
                }
            }
            h.predicate_last_nop = None;
        }
        other => h.predicate_last_nop = Some(other),
    }
    Ok(())
}

/// Object-position hook; the predicate arms apply here too, with the object
/// field set.
pub fn where_object(st: &mut Statement, h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    let token = match e.token() {
        Some(t) => t,
        None => return Ok(()),
    };
    let wc = &mut st.working_clause;
    match token.kind {
        TokenKind::Node => {
            check_object_unset(wc, token)?;
            wc.o = Some(Object::Node(Node::parse(&token.text)?));
        }
        TokenKind::BlankNode => {
            check_object_unset(wc, token)?;
            let label = token.text.trim_start_matches("_:");
            wc.o = Some(Object::Node(Node::new(BLANK_NODE_TYPE, label)?));
        }
        TokenKind::Literal => {
            check_object_unset(wc, token)?;
            wc.o = Some(Object::Literal(default_literal_builder().parse(&token.text)?));
        }
        TokenKind::Predicate => {
            check_object_unset(wc, token)?;
            match Predicate::parse(&token.text) {
                Ok(p) => {
                    wc.o_temporal = p.kind() == PredicateKind::Temporal;
                    wc.o = Some(Object::Predicate(p));
                }
                Err(_) => {
                    let (id, anchor_binding) = parse_partial_predicate(&token.text)?;
                    wc.o_id = Some(id);
                    if let Some(binding) = anchor_binding {
                        wc.o_anchor_binding = Some(binding);
                        wc.o_temporal = true;
                    }
                }
            }
        }
        TokenKind::PredicateBound => {
            check_object_unset(wc, token)?;
            let bound = parse_predicate_bound(&token.text)?;
            wc.o_id = Some(bound.id);
            wc.o_lower_bound = bound.lower;
            wc.o_upper_bound = bound.upper;
            wc.o_lower_bound_alias = bound.lower_binding;
            wc.o_upper_bound_alias = bound.upper_binding;
            wc.o_temporal = true;
        }
        TokenKind::Binding => {
            match h.object_last_nop {
                None => {
                    if wc.o.is_some() || wc.o_id.is_some() {
                        return Err(Error::semantic(
                            "object cannot carry both a value and a binding".to_string(),
                        ));
                    }
                    set_once(&mut wc.o_binding, token, "object binding")?;
                }
                Some(TokenKind::As) => set_once(&mut wc.o_alias, token, "object alias")?,
                Some(TokenKind::Type) => set_once(&mut wc.o_type_alias, token, "object type alias")?,
                Some(TokenKind::Id) => set_once(&mut wc.o_id_alias, token, "object id alias")?,
                Some(TokenKind::At) => {
                    set_once(&mut wc.o_anchor_alias, token, "object anchor alias")?
                }
                Some(other) => {
                    return Err(Error::semantic(format!(
                        "unexpected modifier {} before object binding '{}'",
                        other, token.text
                    )))
                }
            }
            h.object_last_nop = None;
        }
        other => h.object_last_nop = Some(other),
    }
    Ok(())
}

fn check_object_unset(wc: &GraphClause, token: &Token) -> Result<()> {
    if wc.o.is_some() || wc.o_id.is_some() {
        return Err(Error::semantic(format!("object already set at '{}'", token.text)));
    }
    if wc.o_binding.is_some() {
        return Err(Error::semantic("object cannot carry both a value and a binding".to_string()));
    }
    Ok(())
}

/// FILTER clause hook; validates and appends the clause on the closing paren.
pub fn where_filter(st: &mut Statement, h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    let token = match e.token() {
        Some(t) => t,
        None => return Ok(()),
    };
    match token.kind {
        TokenKind::FilterFunction => {
            if h.filter_operation.is_some() {
                return Err(Error::semantic(format!(
                    "filter operation assigned twice at '{}'",
                    token.text
                )));
            }
            h.filter_operation = Some(FilterOperation::parse(&token.text)?);
        }
        TokenKind::Binding => {
            if h.filter_binding.is_some() {
                return Err(Error::semantic(format!(
                    "filter binding assigned twice at '{}'",
                    token.text
                )));
            }
            h.filter_binding = Some(token.text.clone());
        }
        TokenKind::Literal => {
            h.filter_value = Some(default_literal_builder().parse(&token.text)?);
        }
        TokenKind::RPar => {
            if let Some(operation) = h.filter_operation.take() {
                let binding = h.filter_binding.take().ok_or_else(|| {
                    Error::semantic("filter clause is missing its binding".to_string())
                })?;
                let value = h.filter_value.take();
                if operation.requires_value() && value.is_none() {
                    return Err(Error::semantic(format!(
                        "filter function on '{}' requires a value argument",
                        binding
                    )));
                }
                if !operation.requires_value() && value.is_some() {
                    return Err(Error::semantic(format!(
                        "filter function on '{}' does not take a value argument",
                        binding
                    )));
                }
                st.filters.push(FilterClause { operation, binding, value });
            }
        }
        _ => {}
    }
    Ok(())
}

fn parse_partial_predicate(text: &str) -> Result<(String, Option<String>)> {
    let caps = PARTIAL_PREDICATE_RE
        .captures(text)
        .ok_or_else(|| Error::primitive(format!("cannot parse predicate '{}'", text)))?;
    let id = caps[1].to_string();
    if id.contains(',') {
        return Err(Error::primitive(format!("predicate id with embedded ',' in '{}'", text)));
    }
    let anchor = caps[2].trim();
    if anchor.is_empty() {
        return Ok((id, None));
    }
    if let Some(binding) = anchor.strip_prefix('?') {
        if binding.is_empty() {
            return Err(Error::primitive(format!("empty anchor binding in '{}'", text)));
        }
        return Ok((id, Some(anchor.to_string())));
    }
    Err(Error::primitive(format!("cannot parse predicate anchor in '{}'", text)))
}

struct PredicateBound {
    id: String,
    lower: Option<DateTime<Utc>>,
    upper: Option<DateTime<Utc>>,
    lower_binding: Option<String>,
    upper_binding: Option<String>,
}

fn parse_predicate_bound(text: &str) -> Result<PredicateBound> {
    let caps = PREDICATE_BOUND_RE
        .captures(text)
        .ok_or_else(|| Error::primitive(format!("cannot parse predicate bound '{}'", text)))?;
    let id = caps[1].to_string();
    if id.contains(',') {
        return Err(Error::primitive(format!("predicate id with embedded ',' in '{}'", text)));
    }
    let mut bound = PredicateBound {
        id,
        lower: None,
        upper: None,
        lower_binding: None,
        upper_binding: None,
    };
    match parse_bound_side(&caps[2], text)? {
        BoundSide::Binding(b) => bound.lower_binding = Some(b),
        BoundSide::Time(t) => bound.lower = Some(t),
    }
    match parse_bound_side(&caps[3], text)? {
        BoundSide::Binding(b) => bound.upper_binding = Some(b),
        BoundSide::Time(t) => bound.upper = Some(t),
    }
    if let (Some(lower), Some(upper)) = (bound.lower, bound.upper) {
        if lower > upper {
            return Err(Error::semantic(format!(
                "predicate bound lower anchor is after the upper anchor in '{}'",
                text
            )));
        }
    }
    Ok(bound)
}

enum BoundSide {
    Binding(String),
    Time(DateTime<Utc>),
}

fn parse_bound_side(side: &str, whole: &str) -> Result<BoundSide> {
    let side = side.trim();
    if side.is_empty() {
        return Err(Error::primitive(format!("empty bound side in '{}'", whole)));
    }
    if let Some(name) = side.strip_prefix('?') {
        if name.is_empty() {
            return Err(Error::primitive(format!("empty bound binding in '{}'", whole)));
        }
        return Ok(BoundSide::Binding(side.to_string()));
    }
    Ok(BoundSide::Time(parse_time(side)?))
}
