//! Projection and statement-modifier hooks: the var accumulator and its
//! pattern-binding checker, GROUP BY / ORDER BY collectors and consistency
//! checkers, HAVING token capture and evaluator construction, LIMIT, and the
//! global temporal bounds collector.

use crate::error::{Error, Result};
use crate::graph::{default_literal_builder, Literal};
use crate::graph::predicate::parse_time;
use crate::query::expression::{new_evaluator, AlwaysTrue};
use crate::query::hooks::{BoundsMode, HookState};
use crate::query::lexer::TokenKind;
use crate::query::parser::{ConsumedElement, Symbol};
use crate::query::semantic::Statement;
use crate::table::{AggregationOp, SortKey};

/// Marks `SELECT DISTINCT` on the statement.
pub fn global_distinct(st: &mut Statement, _h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    if let Some(token) = e.token() {
        if token.kind == TokenKind::Distinct {
            st.global_distinct = true;
        }
    }
    Ok(())
}

/// Builds the projection list. A bare binding starts a projection, `COUNT`/
/// `SUM` set the aggregation, `DISTINCT` the modifier, a binding after `AS`
/// sets the alias and flushes, and a comma flushes.
pub fn var_accumulator(st: &mut Statement, h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    let token = match e.token() {
        Some(t) => t,
        None => return Ok(()),
    };
    match token.kind {
        TokenKind::Count => st.working_projection.op = Some(AggregationOp::Count),
        TokenKind::Sum => st.working_projection.op = Some(AggregationOp::Sum),
        TokenKind::Distinct => st.working_projection.distinct = true,
        TokenKind::As => h.vars_last_nop = Some(TokenKind::As),
        TokenKind::Binding => {
            if h.vars_last_nop == Some(TokenKind::As) {
                h.vars_last_nop = None;
                if st.working_projection.alias.is_some() {
                    return Err(Error::semantic(format!(
                        "projection alias assigned twice at '{}'",
                        token.text
                    )));
                }
                st.working_projection.alias = Some(token.text.clone());
                flush_projection(st)?;
            } else if st.working_projection.binding.is_empty() {
                st.working_projection.binding = token.text.clone();
            } else {
                return Err(Error::semantic(format!(
                    "projection binding assigned twice at '{}'",
                    token.text
                )));
            }
        }
        TokenKind::Comma => flush_projection(st)?,
        _ => {}
    }
    Ok(())
}

pub(crate) fn flush_projection(st: &mut Statement) -> Result<()> {
    if st.working_projection.is_empty() {
        return Ok(());
    }
    let projection = std::mem::take(&mut st.working_projection);
    if projection.binding.is_empty() {
        return Err(Error::semantic("projection is missing its binding".to_string()));
    }
    st.projections.push(projection);
    Ok(())
}

/// Flushes the trailing projection once the var list ends.
pub fn var_list_done(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> Result<()> {
    flush_projection(st)
}

/// Collects GROUP BY bindings.
pub fn group_by_bindings(st: &mut Statement, _h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    if let Some(token) = e.token() {
        if token.kind == TokenKind::Binding && !st.group_by.contains(&token.text) {
            st.group_by.push(token.text.clone());
        }
    }
    Ok(())
}

/// GROUP BY consistency: every grouped binding matches a projection, grouped
/// projections stay bare, and ungrouped projections aggregate.
pub fn group_by_bindings_checker(
    st: &mut Statement,
    _h: &mut HookState,
    e: &ConsumedElement,
) -> Result<()> {
    if !matches!(e, ConsumedElement::Symbol(s) if *s == "GROUP_LIST") {
        return Ok(());
    }
    for group in &st.group_by {
        let known = st
            .projections
            .iter()
            .any(|p| p.output_name() == group || &p.binding == group);
        if !known {
            return Err(Error::semantic(format!(
                "GROUP BY binding '{}' does not match any projection",
                group
            )));
        }
    }
    for projection in &st.projections {
        let grouped = st
            .group_by
            .iter()
            .any(|g| g == projection.output_name() || g == &projection.binding);
        if grouped && projection.op.is_some() {
            return Err(Error::semantic(format!(
                "projection '{}' is grouped and cannot be aggregated",
                projection.binding
            )));
        }
        if !grouped && projection.op.is_none() {
            return Err(Error::semantic(format!(
                "projection '{}' must be aggregated or listed in GROUP BY",
                projection.binding
            )));
        }
    }
    Ok(())
}

/// Collects ORDER BY keys; `ASC`/`DESC` adjust the key just collected.
pub fn order_by_bindings(st: &mut Statement, _h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    let token = match e.token() {
        Some(t) => t,
        None => return Ok(()),
    };
    match token.kind {
        TokenKind::Binding => {
            st.order_by.push(SortKey { binding: token.text.clone(), descending: false })
        }
        TokenKind::Asc | TokenKind::Desc => {
            let key = st.order_by.last_mut().ok_or_else(|| {
                Error::semantic(format!("direction '{}' without an ORDER BY binding", token.text))
            })?;
            key.descending = token.kind == TokenKind::Desc;
        }
        _ => {}
    }
    Ok(())
}

/// ORDER BY consistency: keys name output bindings, contradictory directions
/// for one binding are rejected, and exact duplicates collapse.
pub fn order_by_bindings_checker(
    st: &mut Statement,
    _h: &mut HookState,
    e: &ConsumedElement,
) -> Result<()> {
    if !matches!(e, ConsumedElement::Symbol(s) if *s == "ORDER_LIST") {
        return Ok(());
    }
    let outputs = st.output_bindings();
    let mut kept: Vec<SortKey> = Vec::new();
    for key in &st.order_by {
        if !outputs.iter().any(|o| o == &key.binding) {
            return Err(Error::semantic(format!(
                "ORDER BY binding '{}' is not an output binding (available: {})",
                key.binding,
                outputs.join(", ")
            )));
        }
        match kept.iter().find(|k| k.binding == key.binding) {
            Some(existing) if existing.descending != key.descending => {
                return Err(Error::semantic(format!(
                    "ORDER BY lists '{}' with contradictory directions",
                    key.binding
                )))
            }
            Some(_) => {}
            None => kept.push(key.clone()),
        }
    }
    st.order_by = kept;
    Ok(())
}

/// Captures the raw HAVING token stream (the keyword itself excluded).
pub fn having_expression(st: &mut Statement, _h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    if let Some(token) = e.token() {
        st.having_tokens.push(token.clone());
    }
    Ok(())
}

/// Compiles the captured HAVING tokens once the expression region ends.
pub fn having_expression_builder(
    st: &mut Statement,
    _h: &mut HookState,
    e: &ConsumedElement,
) -> Result<()> {
    if matches!(e, ConsumedElement::Symbol(s) if *s == "HAVING_EXPR") {
        st.having = Some(new_evaluator(&st.having_tokens)?);
    }
    Ok(())
}

/// LIMIT takes a non-negative int64 literal.
pub fn limit_collection(st: &mut Statement, _h: &mut HookState, e: &ConsumedElement) -> Result<()> {
    let token = match e.token() {
        Some(t) => t,
        None => return Ok(()),
    };
    if token.kind != TokenKind::Literal {
        return Ok(());
    }
    match default_literal_builder().parse(&token.text)? {
        Literal::Int64(v) if v >= 0 => {
            st.limit = Some(v);
            Ok(())
        }
        other => Err(Error::semantic(format!(
            "invalid LIMIT literal '{}': expected a non-negative int64, got {}",
            token.text,
            other.type_name()
        ))),
    }
}

/// Collects the global temporal bounds: `BEFORE t` caps the upper anchor,
/// `AFTER t` the lower, and `BETWEEN t1, t2` sets both with `t1 <= t2`.
pub fn collect_global_bounds(
    st: &mut Statement,
    h: &mut HookState,
    e: &ConsumedElement,
) -> Result<()> {
    let token = match e.token() {
        Some(t) => t,
        None => return Ok(()),
    };
    match token.kind {
        TokenKind::Before => h.bounds_mode = Some(BoundsMode::Before),
        TokenKind::After => h.bounds_mode = Some(BoundsMode::After),
        TokenKind::Between => {
            h.bounds_mode = Some(BoundsMode::Between);
            h.between_lower = None;
        }
        TokenKind::Comma => {
            if h.bounds_mode != Some(BoundsMode::Between) {
                return Err(Error::semantic(
                    "',' in global bounds without a preceding BETWEEN".to_string(),
                ));
            }
        }
        TokenKind::Time => {
            let time = parse_time(&token.text)?;
            match h.bounds_mode {
                Some(BoundsMode::Before) => st.lookup_bounds.upper_anchor = Some(time),
                Some(BoundsMode::After) => st.lookup_bounds.lower_anchor = Some(time),
                Some(BoundsMode::Between) => match h.between_lower {
                    None => {
                        h.between_lower = Some(time);
                        st.lookup_bounds.lower_anchor = Some(time);
                    }
                    Some(lower) => {
                        if time < lower {
                            return Err(Error::semantic(format!(
                                "BETWEEN bounds out of order: '{}' precedes the lower anchor",
                                token.text
                            )));
                        }
                        st.lookup_bounds.upper_anchor = Some(time);
                    }
                },
                None => {
                    return Err(Error::semantic(format!(
                        "time '{}' without a preceding BEFORE/AFTER/BETWEEN",
                        token.text
                    )))
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Clause-end check of a query: projections resolve against the pattern's
/// bindings, aggregation requires GROUP BY, and absent HAVING compiles to an
/// always-true evaluator.
pub fn query_finalize(st: &mut Statement, h: &mut HookState, _s: Symbol) -> Result<()> {
    flush_projection(st)?;
    if !st.working_clause.is_empty() {
        let clause = std::mem::take(&mut st.working_clause);
        st.pattern.push(clause);
    }
    h.reset_working_clause_state();

    let available = st.pattern_bindings();
    for projection in &st.projections {
        if !available.contains(&projection.binding) {
            let mut names: Vec<&String> = available.iter().collect();
            names.sort();
            return Err(Error::semantic(format!(
                "projection binding '{}' does not appear in the pattern (available: {})",
                projection.binding,
                names.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
            )));
        }
    }
    for filter in &st.filters {
        if !available.contains(&filter.binding) {
            return Err(Error::semantic(format!(
                "FILTER binding '{}' does not appear in the pattern",
                filter.binding
            )));
        }
    }
    if st.group_by.is_empty() && st.projections.iter().any(|p| p.op.is_some()) {
        return Err(Error::semantic(
            "aggregated projections require a non-empty GROUP BY".to_string(),
        ));
    }
    if st.having.is_none() {
        st.having = Some(Box::new(AlwaysTrue));
    }
    Ok(())
}
