//! Statement planning and execution. `plan` validates a parsed statement
//! against its kind and produces a `Plan`; `Plan::execute` dispatches to the
//! per-kind executors and returns the result table. Planner decisions are
//! traced via `tracing` events.
// NOTE: This module is intentionally kept thin. Add new logic in exec_*.rs files.

pub mod context;
pub mod exec_construct;
pub mod exec_create;
pub mod exec_delete;
pub mod exec_filter;
pub mod exec_insert;
pub mod exec_pattern;
pub mod exec_select;
pub mod exec_show;
pub mod select_stages;

use tracing::debug;

pub use context::{Context, ExecConfig};

use crate::error::{Error, Result};
use crate::query::semantic::{Statement, StatementKind};
use crate::storage::SharedStore;
use crate::table::Table;

pub struct Plan {
    stmt: Statement,
    store: SharedStore,
    config: ExecConfig,
}

impl std::fmt::Debug for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plan")
            .field("stmt", &self.stmt)
            .field("config", &self.config)
            .finish()
    }
}

/// Validate `stmt` and build its execution plan. The statement is owned by
/// the plan from here on and treated as read-only.
pub fn plan(stmt: Statement, store: SharedStore, config: ExecConfig) -> Result<Plan> {
    let kind = stmt
        .kind
        .ok_or_else(|| Error::semantic("statement has no kind bound".to_string()))?;
    match kind {
        StatementKind::Query => {
            if stmt.pattern.iter().all(|c| c.is_empty()) {
                return Err(Error::semantic("query has an empty graph pattern".to_string()));
            }
            if stmt.read_graph_names().is_empty() {
                return Err(Error::semantic("query names no input graphs".to_string()));
            }
        }
        StatementKind::Insert | StatementKind::Delete | StatementKind::Create
        | StatementKind::Drop => {
            if stmt.graph_names.is_empty() {
                return Err(Error::semantic("statement names no target graphs".to_string()));
            }
        }
        StatementKind::Construct | StatementKind::Deconstruct => {
            if stmt.output_graph_names.is_empty() {
                return Err(Error::semantic("statement names no output graphs".to_string()));
            }
            if stmt.read_graph_names().is_empty() {
                return Err(Error::semantic("statement names no input graphs".to_string()));
            }
        }
        StatementKind::Show => {}
    }
    debug!("[PLANNER] planned {:?} statement", kind);
    Ok(Plan { stmt, store, config })
}

impl Plan {
    pub fn statement(&self) -> &Statement {
        &self.stmt
    }

    /// Run the plan to completion and return the result table. Cancellation
    /// and deadline checks fire between phases; a failing phase discards any
    /// partially built table.
    pub async fn execute(&self, ctx: &Context) -> Result<Table> {
        ctx.check()?;
        let stmt = &self.stmt;
        match stmt.kind {
            Some(StatementKind::Query) => {
                exec_select::run_select(ctx, &self.store, stmt, &self.config).await
            }
            Some(StatementKind::Insert) => {
                exec_insert::run_insert(ctx, &self.store, &stmt.graph_names, &stmt.data, &self.config)
                    .await
            }
            Some(StatementKind::Delete) => {
                exec_delete::run_delete(ctx, &self.store, &stmt.graph_names, &stmt.data, &self.config)
                    .await
            }
            Some(StatementKind::Create) => {
                exec_create::run_create(ctx, &self.store, &stmt.graph_names).await
            }
            Some(StatementKind::Drop) => {
                exec_create::run_drop(ctx, &self.store, &stmt.graph_names).await
            }
            Some(StatementKind::Show) => exec_show::run_show(ctx, &self.store).await,
            Some(StatementKind::Construct) => {
                exec_construct::run_construct(ctx, &self.store, stmt, &self.config, false).await
            }
            Some(StatementKind::Deconstruct) => {
                exec_construct::run_construct(ctx, &self.store, stmt, &self.config, true).await
            }
            None => Err(Error::semantic("statement has no kind bound".to_string())),
        }
    }
}

/// Parse, plan, and execute one TQL statement.
pub async fn execute_query(
    ctx: &Context,
    store: &SharedStore,
    text: &str,
    config: &ExecConfig,
) -> Result<Table> {
    let stmt = crate::query::parse(text)?;
    let plan = plan(stmt, store.clone(), config.clone())?;
    plan.execute(ctx).await
}
