//! CREATE/DROP GRAPH execution. Store failures (duplicate creation, missing
//! graph) surface as-is, annotated with the operation.

use tracing::info;

use crate::error::{Error, Result};
use crate::exec::context::Context;
use crate::storage::{SharedStore, Store};
use crate::table::Table;

pub async fn run_create(ctx: &Context, store: &SharedStore, names: &[String]) -> Result<Table> {
    for name in names {
        ctx.check()?;
        store
            .new_graph(name)
            .await
            .map_err(|e| Error::store(format!("new_graph('{}')", name), e))?;
        info!("[EXEC] created graph {}", name);
    }
    Ok(Table::default())
}

pub async fn run_drop(ctx: &Context, store: &SharedStore, names: &[String]) -> Result<Table> {
    for name in names {
        ctx.check()?;
        store
            .delete_graph(name)
            .await
            .map_err(|e| Error::store(format!("delete_graph('{}')", name), e))?;
        info!("[EXEC] dropped graph {}", name);
    }
    Ok(Table::default())
}
