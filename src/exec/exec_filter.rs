//! FILTER application over the solver's joined binding table. Joins run
//! first; each filter then prunes the joined rows. The only registered
//! function is `latest`: rows survive when their anchor is the most recent
//! within their version group. The group is derived from the clause that
//! binds the filtered binding: subject plus predicate id when the binding
//! sits in the predicate position, or subject, predicate, and object
//! predicate id when it sits in the object position. Concrete clause
//! positions contribute constants; bound positions are read off the row's
//! cells. Ties keep every row; rows that cannot produce a version key (no
//! anchor, or cells left unbound by an OPTIONAL clause) never survive a
//! latest filter.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::Object;
use crate::query::semantic::{FilterClause, FilterOperation, GraphClause};
use crate::table::{Cell, Row, Table};

/// Where a filtered binding sits within a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTarget {
    Predicate,
    Object,
}

/// Resolve the position of `binding` within `clause`, if it binds there.
pub fn filter_target(clause: &GraphClause, binding: &str) -> Option<FilterTarget> {
    let hit = |slot: &Option<String>| slot.as_deref() == Some(binding);
    if hit(&clause.p_binding)
        || hit(&clause.p_alias)
        || hit(&clause.p_anchor_binding)
        || hit(&clause.p_anchor_alias)
    {
        return Some(FilterTarget::Predicate);
    }
    if hit(&clause.o_binding)
        || hit(&clause.o_alias)
        || hit(&clause.o_anchor_binding)
        || hit(&clause.o_anchor_alias)
    {
        return Some(FilterTarget::Object);
    }
    None
}

/// A filter binding must sit in a temporal position of some clause; subjects
/// have no anchor to version on.
pub fn check_filter_positions(pattern: &[GraphClause], filters: &[FilterClause]) -> Result<()> {
    for filter in filters {
        if !pattern.iter().any(|c| filter_target(c, &filter.binding).is_some()) {
            return Err(Error::semantic(format!(
                "FILTER binding '{}' does not name a predicate or object position",
                filter.binding
            )));
        }
    }
    Ok(())
}

/// Apply every filter clause to the joined binding table.
pub fn apply_filters(
    pattern: &[GraphClause],
    filters: &[FilterClause],
    table: &mut Table,
) -> Result<()> {
    for filter in filters {
        let (clause, target) = pattern
            .iter()
            .find_map(|c| filter_target(c, &filter.binding).map(|t| (c, t)))
            .ok_or_else(|| {
                Error::semantic(format!(
                    "FILTER binding '{}' does not name a predicate or object position",
                    filter.binding
                ))
            })?;
        match filter.operation {
            FilterOperation::Latest => {
                debug!("[FILTER] latest({}) over {} joined rows", filter.binding, table.num_rows());
                apply_latest(clause, target, table);
            }
        }
    }
    Ok(())
}

fn apply_latest(clause: &GraphClause, target: FilterTarget, table: &mut Table) {
    let mut newest: HashMap<String, DateTime<Utc>> = HashMap::new();
    for row in table.rows() {
        if let Some((key, anchor)) = version_key(clause, target, row) {
            newest
                .entry(key)
                .and_modify(|current| {
                    if anchor > *current {
                        *current = anchor;
                    }
                })
                .or_insert(anchor);
        }
    }
    table.retain(|row| match version_key(clause, target, row) {
        Some((key, anchor)) => newest.get(&key) == Some(&anchor),
        None => false,
    });
}

fn version_key(clause: &GraphClause, target: FilterTarget, row: &Row) -> Option<(String, DateTime<Utc>)> {
    let subject = subject_key(clause, row)?;
    match target {
        FilterTarget::Predicate => {
            let (id, predicate_anchor) = predicate_parts(clause, row);
            let id = id?;
            let anchor = anchor_from(row, &clause.p_anchor_binding)
                .or_else(|| anchor_from(row, &clause.p_anchor_alias))
                .or(predicate_anchor)?;
            Some((format!("{}\u{1f}{}", subject, id), anchor))
        }
        FilterTarget::Object => {
            let predicate = predicate_identity(clause, row)?;
            let (object_id, object_anchor) = object_parts(clause, row);
            let object_id = object_id?;
            let anchor = anchor_from(row, &clause.o_anchor_binding)
                .or_else(|| anchor_from(row, &clause.o_anchor_alias))
                .or(object_anchor)?;
            Some((format!("{}\u{1f}{}\u{1f}{}", subject, predicate, object_id), anchor))
        }
    }
}

fn subject_key(clause: &GraphClause, row: &Row) -> Option<String> {
    if let Some(node) = &clause.s {
        return Some(node.to_string());
    }
    let binding = clause.s_binding.as_ref().or(clause.s_alias.as_ref())?;
    row.get(binding).map(Cell::comparable_string)
}

fn predicate_cell<'r>(clause: &GraphClause, row: &'r Row) -> Option<&'r Cell> {
    let binding = clause.p_binding.as_ref().or(clause.p_alias.as_ref())?;
    row.get(binding)
}

fn predicate_parts(clause: &GraphClause, row: &Row) -> (Option<String>, Option<DateTime<Utc>>) {
    if let Some(p) = &clause.p {
        return (Some(p.id().to_string()), p.anchor());
    }
    if let Some(Cell::Predicate(p)) = predicate_cell(clause, row) {
        return (Some(p.id().to_string()), p.anchor());
    }
    (clause.p_id.clone(), None)
}

fn predicate_identity(clause: &GraphClause, row: &Row) -> Option<String> {
    if let Some(p) = &clause.p {
        return Some(p.to_string());
    }
    if let Some(cell) = predicate_cell(clause, row) {
        return Some(cell.comparable_string());
    }
    clause.p_id.clone()
}

fn object_parts(clause: &GraphClause, row: &Row) -> (Option<String>, Option<DateTime<Utc>>) {
    if let Some(Object::Predicate(p)) = &clause.o {
        return (Some(p.id().to_string()), p.anchor());
    }
    if let Some(binding) = clause.o_binding.as_ref().or(clause.o_alias.as_ref()) {
        if let Some(Cell::Predicate(p)) = row.get(binding) {
            return (Some(p.id().to_string()), p.anchor());
        }
        // Bound to a non-predicate cell: no version to compare.
        return (None, None);
    }
    (clause.o_id.clone(), None)
}

fn anchor_from(row: &Row, binding: &Option<String>) -> Option<DateTime<Utc>> {
    row.get(binding.as_ref()?).and_then(Cell::as_time)
}

#[cfg(test)]
#[path = "exec_filter_tests.rs"]
mod exec_filter_tests;
