//! SELECT execution: solve the graph pattern, then run the result stages.

use crate::error::Result;
use crate::exec::context::{Context, ExecConfig};
use crate::exec::exec_pattern::solve_pattern;
use crate::exec::select_stages;
use crate::query::semantic::Statement;
use crate::storage::SharedStore;
use crate::table::Table;

pub async fn run_select(
    ctx: &Context,
    store: &SharedStore,
    stmt: &Statement,
    config: &ExecConfig,
) -> Result<Table> {
    let bindings = solve_pattern(ctx, store, stmt, config).await?;
    ctx.check()?;
    let projected = select_stages::project(stmt, &bindings)?;
    let mut out = select_stages::apply_having(stmt, projected)?;
    ctx.check()?;
    select_stages::order_and_limit(stmt, &mut out);
    Ok(out)
}
