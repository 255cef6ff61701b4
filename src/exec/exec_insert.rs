//! INSERT DATA execution: add the statement's triples to every target graph
//! in bulks. A failing bulk aborts the statement; earlier bulks stay in
//! place, per the store contract.

use tracing::debug;

use crate::error::{Error, Result};
use crate::exec::context::{Context, ExecConfig};
use crate::graph::Triple;
use crate::storage::{Graph, SharedStore, Store};
use crate::table::Table;

pub async fn run_insert(
    ctx: &Context,
    store: &SharedStore,
    names: &[String],
    data: &[Triple],
    config: &ExecConfig,
) -> Result<Table> {
    for name in names {
        let graph = store
            .graph(name)
            .await
            .map_err(|e| Error::store(format!("graph('{}')", name), e))?;
        for bulk in data.chunks(config.bulk_size.max(1)) {
            ctx.check()?;
            graph
                .add_triples(bulk)
                .await
                .map_err(|e| Error::store(format!("add_triples('{}')", name), e))?;
            debug!("[EXEC] inserted bulk of {} triples into {}", bulk.len(), name);
        }
    }
    Ok(Table::default())
}
