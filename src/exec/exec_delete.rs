//! DELETE DATA execution, symmetric to INSERT: remove the statement's
//! triples from every target graph in bulks.

use tracing::debug;

use crate::error::{Error, Result};
use crate::exec::context::{Context, ExecConfig};
use crate::graph::Triple;
use crate::storage::{Graph, SharedStore, Store};
use crate::table::Table;

pub async fn run_delete(
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
                .remove_triples(bulk)
                .await
                .map_err(|e| Error::store(format!("remove_triples('{}')", name), e))?;
            debug!("[EXEC] removed bulk of {} triples from {}", bulk.len(), name);
        }
    }
    Ok(Table::default())
}
