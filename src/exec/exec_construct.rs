//! CONSTRUCT/DECONSTRUCT execution: solve the WHERE pattern over the input
//! graphs, instantiate the template clauses per result row, and add (or
//! remove) the produced triples on every output graph.
//!
//! Blank-node labels are scoped per result row: every `_:label` in the
//! template names the same freshly minted node within one row and a new one
//! in the next. A template clause with reification pairs (`;`) emits its main
//! triple plus a blank reification node carrying `_subject`/`_predicate`/
//! `_object` links and one triple per extra pair. Rows that leave a template
//! binding unbound (OPTIONAL patterns) skip that clause.

use std::collections::HashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::exec::context::{Context, ExecConfig};
use crate::exec::exec_pattern::solve_pattern;
use crate::graph::{Node, Object, Predicate, Triple};
use crate::query::semantic::{ConstructClause, ConstructPair, Statement};
use crate::storage::{Graph, SharedStore, Store};
use crate::table::{Cell, Row, Table};

pub async fn run_construct(
    ctx: &Context,
    store: &SharedStore,
    stmt: &Statement,
    config: &ExecConfig,
    remove: bool,
) -> Result<Table> {
    let bindings = solve_pattern(ctx, store, stmt, config).await?;
    ctx.check()?;

    let mut triples: Vec<Triple> = Vec::new();
    for row in bindings.rows() {
        let mut blanks: HashMap<String, Node> = HashMap::new();
        for clause in &stmt.construct_clauses {
            instantiate_clause(clause, row, &mut blanks, &mut triples)?;
        }
    }
    debug!(
        "[CONSTRUCT] instantiated {} triples from {} rows (remove={})",
        triples.len(),
        bindings.num_rows(),
        remove
    );

    for name in &stmt.output_graph_names {
        let graph = store
            .graph(name)
            .await
            .map_err(|e| Error::store(format!("graph('{}')", name), e))?;
        for bulk in triples.chunks(config.bulk_size.max(1)) {
            ctx.check()?;
            if remove {
                graph
                    .remove_triples(bulk)
                    .await
                    .map_err(|e| Error::store(format!("remove_triples('{}')", name), e))?;
            } else {
                graph
                    .add_triples(bulk)
                    .await
                    .map_err(|e| Error::store(format!("add_triples('{}')", name), e))?;
            }
        }
    }
    Ok(Table::default())
}

fn instantiate_clause(
    clause: &ConstructClause,
    row: &Row,
    blanks: &mut HashMap<String, Node>,
    out: &mut Vec<Triple>,
) -> Result<()> {
    let subject = if let Some(node) = &clause.s {
        node.clone()
    } else if let Some(binding) = &clause.s_binding {
        match row.get(binding) {
            Some(Cell::Node(n)) => n.clone(),
            Some(other) => {
                return Err(Error::expr_eval(format!(
                    "template subject '{}' holds {} where a node was expected",
                    binding, other
                )))
            }
            None => return Ok(()),
        }
    } else if let Some(label) = &clause.s_blank {
        blanks.entry(label.clone()).or_insert_with(Node::new_blank_node).clone()
    } else {
        return Err(Error::semantic("template clause is missing its subject".to_string()));
    };

    let mut resolved: Vec<(Predicate, Object)> = Vec::with_capacity(clause.pairs.len());
    for pair in &clause.pairs {
        let predicate = match pair_predicate(pair, row)? {
            Some(p) => p,
            None => return Ok(()),
        };
        let object = match pair_object(pair, row, blanks)? {
            Some(o) => o,
            None => return Ok(()),
        };
        resolved.push((predicate, object));
    }
    let mut pairs = resolved.into_iter();
    let (main_p, main_o) = pairs
        .next()
        .ok_or_else(|| Error::semantic("template clause has no predicate-object pair".to_string()))?;
    out.push(Triple::new(subject.clone(), main_p.clone(), main_o.clone()));

    let extras: Vec<(Predicate, Object)> = pairs.collect();
    if !extras.is_empty() {
        // Reify the main triple on a fresh blank node and hang the extra
        // pairs off it.
        let reifier = Node::new_blank_node();
        out.push(Triple::new(
            reifier.clone(),
            Predicate::new_immutable("_subject")?,
            Object::Node(subject),
        ));
        out.push(Triple::new(
            reifier.clone(),
            Predicate::new_immutable("_predicate")?,
            Object::Predicate(main_p),
        ));
        out.push(Triple::new(reifier.clone(), Predicate::new_immutable("_object")?, main_o));
        for (p, o) in extras {
            out.push(Triple::new(reifier.clone(), p, o));
        }
    }
    Ok(())
}

fn pair_predicate(pair: &ConstructPair, row: &Row) -> Result<Option<Predicate>> {
    if let Some(p) = &pair.p {
        return Ok(Some(p.clone()));
    }
    let binding = pair
        .p_binding
        .as_ref()
        .ok_or_else(|| Error::semantic("template pair is missing its predicate".to_string()))?;
    match row.get(binding) {
        Some(Cell::Predicate(p)) => Ok(Some(p.clone())),
        Some(other) => Err(Error::expr_eval(format!(
            "template predicate '{}' holds {} where a predicate was expected",
            binding, other
        ))),
        None => Ok(None),
    }
}

fn pair_object(
    pair: &ConstructPair,
    row: &Row,
    blanks: &mut HashMap<String, Node>,
) -> Result<Option<Object>> {
    if let Some(o) = &pair.o {
        return Ok(Some(o.clone()));
    }
    if let Some(label) = &pair.o_blank {
        let node = blanks.entry(label.clone()).or_insert_with(Node::new_blank_node).clone();
        return Ok(Some(Object::Node(node)));
    }
    let binding = pair
        .o_binding
        .as_ref()
        .ok_or_else(|| Error::semantic("template pair is missing its object".to_string()))?;
    match row.get(binding) {
        Some(Cell::Node(n)) => Ok(Some(Object::Node(n.clone()))),
        Some(Cell::Predicate(p)) => Ok(Some(Object::Predicate(p.clone()))),
        Some(Cell::Literal(l)) => Ok(Some(Object::Literal(l.clone()))),
        Some(other) => Err(Error::expr_eval(format!(
            "template object '{}' holds {} and cannot be placed in a triple",
            binding, other
        ))),
        None => Ok(None),
    }
}
