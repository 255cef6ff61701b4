//! Typed statement model built by the semantic hooks during the parse. The
//! statement owns the WHERE pattern (graph clauses plus one working clause
//! under construction), the filter and projection lists, grouping/ordering/
//! having/limit modifiers, global temporal lookup bounds, and the CONSTRUCT
//! template clauses. After the parse the planner treats it as read-only.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};
use crate::graph::{Literal, Node, Object, Predicate};
use crate::query::expression::Evaluator;
use crate::query::lexer::Token;
use crate::table::{AggregationOp, SortKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Query,
    Insert,
    Delete,
    Create,
    Drop,
    Construct,
    Deconstruct,
    Show,
}

/// One triple template of the WHERE pattern. Each position stores mutually
/// exclusive alternatives (a concrete primitive or a binding) plus the alias
/// bindings introduced with `AS`/`TYPE`/`ID`/`AT`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphClause {
    pub optional: bool,

    pub s: Option<Node>,
    pub s_binding: Option<String>,
    pub s_alias: Option<String>,
    pub s_type_alias: Option<String>,
    pub s_id_alias: Option<String>,

    pub p: Option<Predicate>,
    pub p_binding: Option<String>,
    pub p_id: Option<String>,
    pub p_alias: Option<String>,
    pub p_id_alias: Option<String>,
    pub p_anchor_binding: Option<String>,
    pub p_anchor_alias: Option<String>,
    pub p_lower_bound: Option<DateTime<Utc>>,
    pub p_upper_bound: Option<DateTime<Utc>>,
    pub p_lower_bound_alias: Option<String>,
    pub p_upper_bound_alias: Option<String>,
    pub p_temporal: bool,

    pub o: Option<Object>,
    pub o_binding: Option<String>,
    pub o_alias: Option<String>,
    pub o_type_alias: Option<String>,
    pub o_id_alias: Option<String>,
    pub o_id: Option<String>,
    pub o_anchor_binding: Option<String>,
    pub o_anchor_alias: Option<String>,
    pub o_lower_bound: Option<DateTime<Utc>>,
    pub o_upper_bound: Option<DateTime<Utc>>,
    pub o_lower_bound_alias: Option<String>,
    pub o_upper_bound_alias: Option<String>,
    pub o_temporal: bool,
}

impl GraphClause {
    pub fn is_empty(&self) -> bool {
        *self == GraphClause::default()
    }

    /// Number of concrete positions; drives clause resolution order.
    pub fn specificity(&self) -> usize {
        [self.s.is_some(), self.p.is_some(), self.o.is_some()].iter().filter(|b| **b).count()
    }

    /// Every binding name this clause can fill in a result row.
    pub fn bindings(&self) -> Vec<&String> {
        [
            &self.s_binding,
            &self.s_alias,
            &self.s_type_alias,
            &self.s_id_alias,
            &self.p_binding,
            &self.p_alias,
            &self.p_id_alias,
            &self.p_anchor_binding,
            &self.p_anchor_alias,
            &self.p_lower_bound_alias,
            &self.p_upper_bound_alias,
            &self.o_binding,
            &self.o_alias,
            &self.o_type_alias,
            &self.o_id_alias,
            &self.o_anchor_binding,
            &self.o_anchor_alias,
            &self.o_lower_bound_alias,
            &self.o_upper_bound_alias,
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperation {
    Latest,
}

impl FilterOperation {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "latest" => Ok(FilterOperation::Latest),
            _ => Err(Error::semantic(format!("unknown filter function '{}'", name))),
        }
    }

    /// Does the operation take a second value argument?
    pub fn requires_value(&self) -> bool {
        match self {
            FilterOperation::Latest => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub operation: FilterOperation,
    pub binding: String,
    pub value: Option<Literal>,
}

/// One projected output column, optionally aggregated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub binding: String,
    pub alias: Option<String>,
    pub op: Option<AggregationOp>,
    pub distinct: bool,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        *self == Projection::default()
    }

    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.binding)
    }
}

/// One predicate-object pair of a CONSTRUCT template clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstructPair {
    pub p: Option<Predicate>,
    pub p_binding: Option<String>,
    pub o: Option<Object>,
    pub o_binding: Option<String>,
    pub o_blank: Option<String>,
}

impl ConstructPair {
    pub fn is_empty(&self) -> bool {
        *self == ConstructPair::default()
    }
}

/// One CONSTRUCT template clause: a subject plus one main predicate-object
/// pair and any number of reification pairs introduced with `;`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstructClause {
    pub s: Option<Node>,
    pub s_binding: Option<String>,
    pub s_blank: Option<String>,
    pub pairs: Vec<ConstructPair>,
    pub working_pair: ConstructPair,
}

impl ConstructClause {
    pub fn is_empty(&self) -> bool {
        *self == ConstructClause::default()
    }
}

/// Global temporal bounds applied to every lookup of the statement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LookupBounds {
    pub lower_anchor: Option<DateTime<Utc>>,
    pub upper_anchor: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct Statement {
    pub kind: Option<StatementKind>,
    pub graph_names: Vec<String>,
    pub input_graph_names: Vec<String>,
    pub output_graph_names: Vec<String>,
    pub data: Vec<crate::graph::Triple>,
    pub pattern: Vec<GraphClause>,
    pub working_clause: GraphClause,
    pub filters: Vec<FilterClause>,
    pub projections: Vec<Projection>,
    pub working_projection: Projection,
    pub global_distinct: bool,
    pub group_by: Vec<String>,
    pub order_by: Vec<SortKey>,
    pub having_tokens: Vec<Token>,
    pub having: Option<Box<dyn Evaluator>>,
    pub limit: Option<i64>,
    pub lookup_bounds: LookupBounds,
    pub construct_clauses: Vec<ConstructClause>,
    pub working_construct: ConstructClause,
}

impl Statement {
    pub fn new() -> Self {
        Statement::default()
    }

    pub fn kind(&self) -> Option<StatementKind> {
        self.kind
    }

    /// All binding names the WHERE pattern can produce.
    pub fn pattern_bindings(&self) -> HashSet<String> {
        let mut out = HashSet::new();
        for clause in &self.pattern {
            for binding in clause.bindings() {
                out.insert(binding.clone());
            }
        }
        out
    }

    /// Names of the output columns after projection (aliases win).
    pub fn output_bindings(&self) -> Vec<String> {
        self.projections.iter().map(|p| p.output_name().to_string()).collect()
    }

    /// Graphs a query reads from: `FROM` names plus input-only names.
    pub fn read_graph_names(&self) -> Vec<String> {
        let mut out = self.graph_names.clone();
        for name in &self.input_graph_names {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        out
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("kind", &self.kind)
            .field("graph_names", &self.graph_names)
            .field("input_graph_names", &self.input_graph_names)
            .field("output_graph_names", &self.output_graph_names)
            .field("data", &self.data)
            .field("pattern", &self.pattern)
            .field("filters", &self.filters)
            .field("projections", &self.projections)
            .field("global_distinct", &self.global_distinct)
            .field("group_by", &self.group_by)
            .field("order_by", &self.order_by)
            .field("having", &self.having.as_ref().map(|_| "<evaluator>"))
            .field("limit", &self.limit)
            .field("lookup_bounds", &self.lookup_bounds)
            .field("construct_clauses", &self.construct_clauses)
            .finish()
    }
}

#[cfg(test)]
#[path = "semantic_tests.rs"]
mod semantic_tests;
