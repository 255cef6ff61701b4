//! SELECT result stages, applied to the solver's binding table in order:
//! projection with grouping and aggregation, DISTINCT, HAVING, ORDER BY, and
//! LIMIT.

use tracing::debug;

use crate::error::Result;
use crate::query::expression::Evaluator;
use crate::query::semantic::Statement;
use crate::table::{ProjectionSpec, Table};

/// Collapse the binding table to the projection list, applying GROUP BY
/// aggregation and the statement-wide DISTINCT.
pub fn project(stmt: &Statement, table: &Table) -> Result<Table> {
    let specs: Vec<ProjectionSpec> = stmt
        .projections
        .iter()
        .map(|p| ProjectionSpec {
            source: p.binding.clone(),
            output: p.output_name().to_string(),
            op: p.op,
            distinct: p.distinct,
        })
        .collect();
    // GROUP BY names match projections by alias or source binding; grouping
    // itself runs over the output columns.
    let group_keys: Vec<String> = stmt
        .group_by
        .iter()
        .filter_map(|g| {
            stmt.projections
                .iter()
                .find(|p| p.output_name() == g || &p.binding == g)
                .map(|p| p.output_name().to_string())
        })
        .collect();
    debug!("[SELECT] projecting {} columns, {} group keys", specs.len(), group_keys.len());
    let mut out = table.project_and_group(&specs, &group_keys)?;
    if stmt.global_distinct {
        out.dedup();
    }
    Ok(out)
}

/// Drop rows the compiled HAVING evaluator rejects; evaluation errors
/// propagate.
pub fn apply_having(stmt: &Statement, table: Table) -> Result<Table> {
    let evaluator = match &stmt.having {
        Some(e) => e,
        None => return Ok(table),
    };
    let mut out = Table::new(table.bindings().to_vec());
    for row in table.rows() {
        if evaluator.evaluate(row)? {
            out.add_row(row.clone());
        }
    }
    Ok(out)
}

/// Stable ORDER BY sort, then LIMIT truncation.
pub fn order_and_limit(stmt: &Statement, table: &mut Table) {
    table.sort(&stmt.order_by);
    if let Some(limit) = stmt.limit {
        table.limit(limit);
    }
}

#[cfg(test)]
#[path = "select_stages_tests.rs"]
mod select_stages_tests;
