//!
//! chronotope result tables
//! ------------------------
//! Row/column representation of query results. A cell is a tagged union over
//! the primitive kinds plus times and plain strings; a row maps binding names
//! to cells (absent key = unbound); a table is an ordered binding list plus an
//! ordered row list. The planner drives everything through the primitives
//! here: stable multi-key sort, dedup, group-by aggregation, projection with
//! aliasing, truncation, and inner/left-outer joins on shared bindings.
//!
//! Ordering across heterogeneous cells is defined by each cell's comparable
//! string: literals use their canonical comparable form, plain strings compare
//! as text literals, times as fixed-width RFC 3339 nanos, and nodes and
//! predicates as their text form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};

use crate::error::{Error, Result};
use crate::graph::predicate::format_time;
use crate::graph::{Literal, Node, Predicate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Node(Node),
    Predicate(Predicate),
    Literal(Literal),
    Time(DateTime<Utc>),
    String(String),
}

impl Cell {
    /// Canonical comparable form; lexicographic order matches the natural
    /// order within one cell kind.
    pub fn comparable_string(&self) -> String {
        match self {
            Cell::Node(n) => n.to_string(),
            Cell::Predicate(p) => p.to_string(),
            Cell::Literal(l) => l.comparable_string(),
            Cell::Time(t) => format_time(t),
            Cell::String(s) => format!("\"{}\"^^type:text", s),
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Cell::Literal(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Cell::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Node(n) => n.fmt(f),
            Cell::Predicate(p) => p.fmt(f),
            Cell::Literal(l) => l.fmt(f),
            Cell::Time(t) => write!(f, "{}", format_time(t)),
            Cell::String(s) => write!(f, "{}", s),
        }
    }
}

/// A result row. Binding names are unique per row; an absent key is an
/// unbound cell (left-outer joins produce those).
pub type Row = HashMap<String, Cell>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationOp {
    Sum,
    Count,
}

/// One output column of a projection pass: `source` is read from the input
/// rows, `output` names the column in the result, and an optional aggregator
/// collapses grouped rows.
#[derive(Debug, Clone)]
pub struct ProjectionSpec {
    pub source: String,
    pub output: String,
    pub op: Option<AggregationOp>,
    pub distinct: bool,
}

/// One ORDER BY key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub binding: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    bindings: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(bindings: Vec<String>) -> Self {
        let mut t = Table::default();
        t.add_bindings(&bindings);
        t
    }

    pub fn bindings(&self) -> &[String] {
        &self.bindings
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.iter().any(|b| b == name)
    }

    /// Append binding columns, keeping first-seen order and ignoring repeats.
    pub fn add_bindings(&mut self, names: &[String]) {
        for name in names {
            if !self.has_binding(name) {
                self.bindings.push(name.clone());
            }
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Stable multi-key sort. Unbound cells sort before bound ones; each key
    /// may flip to descending independently.
    pub fn sort(&mut self, keys: &[SortKey]) {
        if keys.is_empty() {
            return;
        }
        self.rows.sort_by(|a, b| {
            for key in keys {
                let ka = a.get(&key.binding).map(Cell::comparable_string);
                let kb = b.get(&key.binding).map(Cell::comparable_string);
                let ord = ka.cmp(&kb);
                if ord != Ordering::Equal {
                    return if key.descending { ord.reverse() } else { ord };
                }
            }
            Ordering::Equal
        });
    }

    /// Drop duplicate rows across all bindings, keeping first occurrences.
    pub fn dedup(&mut self) {
        let bindings = self.bindings.clone();
        self.dedup_on(&bindings);
    }

    /// Drop rows that agree on every binding in `subset`, keeping first
    /// occurrences.
    pub fn dedup_on(&mut self, subset: &[String]) {
        let mut seen: HashSet<String> = HashSet::new();
        self.rows.retain(|row| seen.insert(row_key(row, subset)));
    }

    /// Keep only the rows `keep` accepts, preserving order.
    pub fn retain<F: FnMut(&Row) -> bool>(&mut self, keep: F) {
        self.rows.retain(keep);
    }

    /// Truncate to the first `n` rows.
    pub fn limit(&mut self, n: i64) {
        let n = if n < 0 { 0 } else { n as usize };
        self.rows.truncate(n);
    }

    /// Project to a new column list, optionally collapsing groups. Group keys
    /// name output columns; every non-key projection must carry an aggregator
    /// when `group_keys` is non-empty (the statement checkers guarantee that).
    pub fn project_and_group(
        &self,
        specs: &[ProjectionSpec],
        group_keys: &[String],
    ) -> Result<Table> {
        let mut out = Table::new(specs.iter().map(|s| s.output.clone()).collect());
        if group_keys.is_empty() {
            for row in &self.rows {
                let mut projected = Row::new();
                for spec in specs {
                    if let Some(cell) = row.get(&spec.source) {
                        projected.insert(spec.output.clone(), cell.clone());
                    }
                }
                out.add_row(projected);
            }
            return Ok(out);
        }

        // Bucket rows by the group key, keeping first-seen group order.
        let key_sources: Vec<&ProjectionSpec> = specs
            .iter()
            .filter(|s| group_keys.iter().any(|k| k == &s.output))
            .collect();
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&Row>> = HashMap::new();
        for row in &self.rows {
            let key = key_sources
                .iter()
                .map(|s| row.get(&s.source).map(Cell::comparable_string).unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\u{1f}");
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_default().push(row);
        }

        for key in order {
            let members = &groups[&key];
            let mut projected = Row::new();
            for spec in specs {
                match spec.op {
                    None => {
                        if let Some(cell) = members[0].get(&spec.source) {
                            projected.insert(spec.output.clone(), cell.clone());
                        }
                    }
                    Some(op) => {
                        let cell = aggregate(members, &spec.source, op, spec.distinct)?;
                        projected.insert(spec.output.clone(), cell);
                    }
                }
            }
            out.add_row(projected);
        }
        Ok(out)
    }

    /// Inner join on the shared bindings; a cartesian product when none are
    /// shared. Rows whose shared bindings disagree (including bound against
    /// unbound) are rejected.
    pub fn inner_join(&self, right: &Table) -> Table {
        self.join(right, false)
    }

    /// Left-outer join: unmatched left rows survive with the right-side
    /// bindings left unbound.
    pub fn left_outer_join(&self, right: &Table) -> Table {
        self.join(right, true)
    }

    fn join(&self, right: &Table, keep_unmatched_left: bool) -> Table {
        let shared: Vec<String> = self
            .bindings
            .iter()
            .filter(|b| right.has_binding(b))
            .cloned()
            .collect();

        let mut out = Table::new(self.bindings.clone());
        out.add_bindings(&right.bindings);

        let mut index: HashMap<String, Vec<&Row>> = HashMap::new();
        for row in &right.rows {
            index.entry(row_key(row, &shared)).or_default().push(row);
        }

        for left_row in &self.rows {
            let key = row_key(left_row, &shared);
            match index.get(&key) {
                Some(matches) => {
                    for right_row in matches {
                        let mut merged = left_row.clone();
                        for (name, cell) in right_row.iter() {
                            merged.entry(name.clone()).or_insert_with(|| cell.clone());
                        }
                        out.add_row(merged);
                    }
                }
                None => {
                    if keep_unmatched_left {
                        out.add_row(left_row.clone());
                    }
                }
            }
        }
        out
    }

    /// Human-readable TAB-separated rendering: header row of binding names,
    /// then one line per row with unbound cells left empty.
    pub fn to_text(&self) -> String {
        let mut out = self.bindings.join("\t");
        out.push('\n');
        for row in &self.rows {
            let line = self
                .bindings
                .iter()
                .map(|b| row.get(b).map(|c| c.to_string()).unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\t");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

fn row_key(row: &Row, bindings: &[String]) -> String {
    bindings
        .iter()
        .map(|b| row.get(b).map(Cell::comparable_string).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

fn aggregate(rows: &[&Row], source: &str, op: AggregationOp, distinct: bool) -> Result<Cell> {
    let mut cells: Vec<&Cell> = rows.iter().filter_map(|r| r.get(source)).collect();
    if distinct {
        let mut seen: HashSet<String> = HashSet::new();
        cells.retain(|c| seen.insert(c.comparable_string()));
    }
    match op {
        AggregationOp::Count => Ok(Cell::Literal(Literal::Int64(cells.len() as i64))),
        AggregationOp::Sum => {
            let mut int_sum: i64 = 0;
            let mut float_sum: f64 = 0.0;
            let mut saw_float = false;
            for cell in &cells {
                match cell.as_literal() {
                    Some(Literal::Int64(v)) => {
                        int_sum = int_sum.checked_add(*v).ok_or_else(|| {
                            Error::expr_eval(format!("int64 overflow summing '{}'", source))
                        })?;
                        float_sum += *v as f64;
                    }
                    Some(Literal::Float64(v)) => {
                        saw_float = true;
                        float_sum += *v;
                    }
                    _ => {
                        return Err(Error::expr_eval(format!(
                            "cannot sum non-numeric cell '{}' bound to '{}'",
                            cell, source
                        )))
                    }
                }
            }
            if saw_float {
                Ok(Cell::Literal(Literal::Float64(float_sum)))
            } else {
                Ok(Cell::Literal(Literal::Int64(int_sum)))
            }
        }
    }
}

#[cfg(test)]
mod table_tests;
