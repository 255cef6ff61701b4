//! Graph-pattern solver. Clauses resolve most-specific-first (optional
//! clauses after every required one), each over its own bounded triple
//! stream; matched triples turn into binding rows and consecutive clause
//! tables join on their shared bindings, left-outer for OPTIONAL clauses.
//! FILTER clauses run after every join, over the joined binding table.

use std::cmp::Reverse;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::exec::context::{Context, ExecConfig};
use crate::exec::exec_filter::{apply_filters, check_filter_positions};
use crate::graph::{Object, Triple};
use crate::query::semantic::{GraphClause, LookupBounds, Statement};
use crate::storage::{Graph, Lookup, SharedStore, Store};
use crate::table::{Cell, Row, Table};

/// Resolve the WHERE pattern of `stmt` against its input graphs and return
/// the joined binding table.
pub async fn solve_pattern(
    ctx: &Context,
    store: &SharedStore,
    stmt: &Statement,
    config: &ExecConfig,
) -> Result<Table> {
    check_filter_positions(&stmt.pattern, &stmt.filters)?;

    let graph_names = stmt.read_graph_names();
    let mut graphs: Vec<Arc<dyn Graph>> = Vec::with_capacity(graph_names.len());
    for name in &graph_names {
        ctx.check()?;
        let graph = store
            .graph(name)
            .await
            .map_err(|e| Error::store(format!("graph('{}')", name), e))?;
        graphs.push(graph);
    }

    // Specificity ordering, ties by original order; OPTIONAL clauses join
    // against the accumulated left side, so they go last.
    let mut order: Vec<&GraphClause> = stmt.pattern.iter().filter(|c| !c.is_empty()).collect();
    order.sort_by_key(|c| (c.optional, Reverse(c.specificity())));
    debug!("[PLANNER] solving {} clauses over {} graphs", order.len(), graphs.len());

    let mut acc: Option<Table> = None;
    for clause in order {
        ctx.check()?;
        let table = resolve_clause(ctx, &graphs, clause, stmt, config).await?;
        debug!("[PLANNER] clause resolved to {} rows", table.num_rows());
        acc = Some(match acc {
            None => table,
            Some(left) if clause.optional => left.left_outer_join(&table),
            Some(left) => left.inner_join(&table),
        });
    }
    let mut joined = acc
        .ok_or_else(|| Error::semantic("the statement has an empty graph pattern".to_string()))?;
    ctx.check()?;
    apply_filters(&stmt.pattern, &stmt.filters, &mut joined)?;
    Ok(joined)
}

async fn resolve_clause(
    ctx: &Context,
    graphs: &[Arc<dyn Graph>],
    clause: &GraphClause,
    stmt: &Statement,
    config: &ExecConfig,
) -> Result<Table> {
    let lookup = clause_lookup(clause, &stmt.lookup_bounds);
    let mut table = Table::new(clause.bindings().into_iter().cloned().collect());
    for graph in graphs {
        let (tx, mut rx) = mpsc::channel(config.chan_size);
        let producer_graph = graph.clone();
        let producer_lookup = lookup.clone();
        let producer =
            tokio::spawn(async move { producer_graph.triples(producer_lookup, tx).await });
        while let Some(triple) = rx.recv().await {
            // Dropping the receiver on error stops the producer at its next
            // send, which drains and closes the in-flight channel.
            ctx.check()?;
            if let Some(row) = clause_row(clause, &triple) {
                table.add_row(row);
            }
        }
        producer
            .await
            .map_err(|e| Error::store("triples", anyhow::anyhow!(e)))?
            .map_err(|e| Error::store("triples", e))?;
    }
    Ok(table)
}

/// The most specific lookup a clause admits, with clause-level temporal
/// bounds overriding the statement's global bounds.
fn clause_lookup(clause: &GraphClause, bounds: &LookupBounds) -> Lookup {
    Lookup {
        subject: clause.s.clone(),
        predicate: clause.p.clone(),
        predicate_id: clause.p_id.clone(),
        object: clause.o.clone(),
        lower_anchor: clause.p_lower_bound.or(bounds.lower_anchor),
        upper_anchor: clause.p_upper_bound.or(bounds.upper_anchor),
        max_elements: None,
    }
}

/// Turn a matching triple into a binding row, or reject it when the clause
/// demands attributes the triple cannot provide (a temporal anchor, an object
/// predicate id, agreement on a repeated binding).
fn clause_row(clause: &GraphClause, triple: &Triple) -> Option<Row> {
    let subject = triple.subject();
    let predicate = triple.predicate();
    let anchor = predicate.anchor();

    let wants_anchor = clause.p_anchor_binding.is_some()
        || clause.p_anchor_alias.is_some()
        || clause.p_lower_bound_alias.is_some()
        || clause.p_upper_bound_alias.is_some();
    if (clause.p_temporal || wants_anchor) && anchor.is_none() {
        return None;
    }

    // Partial object predicates constrain the object side the same way.
    let object_predicate = triple.object().as_predicate();
    let object_anchor = object_predicate.and_then(|p| p.anchor());
    let wants_object_anchor = clause.o_anchor_binding.is_some()
        || clause.o_anchor_alias.is_some()
        || clause.o_lower_bound_alias.is_some()
        || clause.o_upper_bound_alias.is_some();
    if clause.o_id.is_some() || clause.o_temporal || wants_object_anchor {
        let op = object_predicate?;
        if let Some(id) = &clause.o_id {
            if op.id() != id {
                return None;
            }
        }
        if (clause.o_temporal || wants_object_anchor) && object_anchor.is_none() {
            return None;
        }
        if let (Some(lower), Some(at)) = (clause.o_lower_bound, object_anchor) {
            if at < lower {
                return None;
            }
        }
        if let (Some(upper), Some(at)) = (clause.o_upper_bound, object_anchor) {
            if at > upper {
                return None;
            }
        }
    }

    let mut row = Row::new();
    let mut ok = true;
    {
        let mut bind = |name: &Option<String>, cell: Option<Cell>| {
            if !ok {
                return;
            }
            if let (Some(name), Some(cell)) = (name.as_ref(), cell) {
                match row.get(name) {
                    // A binding repeated within one clause must agree on all
                    // its positions.
                    Some(existing) => {
                        if existing.comparable_string() != cell.comparable_string() {
                            ok = false;
                        }
                    }
                    None => {
                        row.insert(name.clone(), cell);
                    }
                }
            }
        };

        bind(&clause.s_binding, Some(Cell::Node(subject.clone())));
        bind(&clause.s_alias, Some(Cell::Node(subject.clone())));
        bind(&clause.s_type_alias, Some(Cell::String(subject.node_type().to_string())));
        bind(&clause.s_id_alias, Some(Cell::String(subject.id().to_string())));

        bind(&clause.p_binding, Some(Cell::Predicate(predicate.clone())));
        bind(&clause.p_alias, Some(Cell::Predicate(predicate.clone())));
        bind(&clause.p_id_alias, Some(Cell::String(predicate.id().to_string())));
        bind(&clause.p_anchor_binding, anchor.map(Cell::Time));
        bind(&clause.p_anchor_alias, anchor.map(Cell::Time));
        bind(&clause.p_lower_bound_alias, anchor.map(Cell::Time));
        bind(&clause.p_upper_bound_alias, anchor.map(Cell::Time));

        let object_cell = match triple.object() {
            Object::Node(n) => Cell::Node(n.clone()),
            Object::Predicate(p) => Cell::Predicate(p.clone()),
            Object::Literal(l) => Cell::Literal(l.clone()),
        };
        bind(&clause.o_binding, Some(object_cell.clone()));
        bind(&clause.o_alias, Some(object_cell));
        if clause.o_type_alias.is_some() {
            match triple.object().as_node() {
                Some(n) => bind(&clause.o_type_alias, Some(Cell::String(n.node_type().to_string()))),
                None => return None,
            }
        }
        if clause.o_id_alias.is_some() {
            let id = match triple.object() {
                Object::Node(n) => n.id().to_string(),
                Object::Predicate(p) => p.id().to_string(),
                Object::Literal(_) => return None,
            };
            bind(&clause.o_id_alias, Some(Cell::String(id)));
        }
        bind(&clause.o_anchor_binding, object_anchor.map(Cell::Time));
        bind(&clause.o_anchor_alias, object_anchor.map(Cell::Time));
        bind(&clause.o_lower_bound_alias, object_anchor.map(Cell::Time));
        bind(&clause.o_upper_bound_alias, object_anchor.map(Cell::Time));
    }
    if !ok {
        return None;
    }
    Some(row)
}

#[cfg(test)]
#[path = "exec_pattern_tests.rs"]
mod exec_pattern_tests;
