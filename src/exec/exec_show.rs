//! SHOW GRAPHS execution: a single-column table of graph names.

use crate::error::{Error, Result};
use crate::exec::context::Context;
use crate::storage::{SharedStore, Store};
use crate::table::{Cell, Row, Table};

/// The binding name of the SHOW GRAPHS result column.
pub const GRAPH_COLUMN: &str = "?graph";

pub async fn run_show(ctx: &Context, store: &SharedStore) -> Result<Table> {
    ctx.check()?;
    let names =
        store.graph_names().await.map_err(|e| Error::store("graph_names", e))?;
    let mut table = Table::new(vec![GRAPH_COLUMN.to_string()]);
    for name in names {
        let mut row = Row::new();
        row.insert(GRAPH_COLUMN.to_string(), Cell::String(name));
        table.add_row(row);
    }
    Ok(table)
}
