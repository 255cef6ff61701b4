use super::*;
use crate::graph::default_literal_builder;

fn node(text: &str) -> Cell {
    Cell::Node(Node::parse(text).expect(text))
}

fn int(v: i64) -> Cell {
    Cell::Literal(Literal::Int64(v))
}

fn text(v: &str) -> Cell {
    Cell::Literal(default_literal_builder().build_text(v).expect(v))
}

fn row(pairs: &[(&str, Cell)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn bindings_dedupe_and_keep_order() {
    let mut t = Table::new(names(&["?a", "?b"]));
    t.add_bindings(&names(&["?b", "?c", "?a"]));
    assert_eq!(t.bindings(), &["?a", "?b", "?c"]);
}

#[test]
fn string_cells_compare_as_text_literals() {
    assert_eq!(Cell::String("abc".into()).comparable_string(), text("abc").comparable_string());
}

#[test]
fn sort_is_stable_and_idempotent() {
    let mut t = Table::new(names(&["?n", "?tag"]));
    t.add_row(row(&[("?n", int(2)), ("?tag", text("first"))]));
    t.add_row(row(&[("?n", int(1)), ("?tag", text("a"))]));
    t.add_row(row(&[("?n", int(2)), ("?tag", text("second"))]));
    let keys = [SortKey { binding: "?n".into(), descending: false }];
    t.sort(&keys);
    let tags: Vec<String> = t.rows().iter().map(|r| r["?tag"].to_string()).collect();
    // Equal keys keep their original relative order.
    assert_eq!(tags, vec!["\"a\"^^type:text", "\"first\"^^type:text", "\"second\"^^type:text"]);

    let snapshot = t.clone();
    t.sort(&keys);
    assert_eq!(t, snapshot, "sorting by the same key must be a no-op");
}

#[test]
fn sort_descending_and_unbound_first() {
    let mut t = Table::new(names(&["?n"]));
    t.add_row(row(&[("?n", int(1))]));
    t.add_row(row(&[]));
    t.add_row(row(&[("?n", int(3))]));
    t.sort(&[SortKey { binding: "?n".into(), descending: false }]);
    assert!(t.rows()[0].get("?n").is_none(), "unbound sorts first ascending");
    t.sort(&[SortKey { binding: "?n".into(), descending: true }]);
    assert_eq!(t.rows()[0].get("?n"), Some(&int(3)));
    assert!(t.rows()[2].get("?n").is_none());
}

#[test]
fn dedup_on_column_subset() {
    let mut t = Table::new(names(&["?s", "?o"]));
    t.add_row(row(&[("?s", node("/u<a>")), ("?o", int(1))]));
    t.add_row(row(&[("?s", node("/u<a>")), ("?o", int(2))]));
    t.add_row(row(&[("?s", node("/u<b>")), ("?o", int(3))]));
    let mut whole = t.clone();
    whole.dedup();
    assert_eq!(whole.num_rows(), 3, "no whole-row duplicates to drop");
    t.dedup_on(&names(&["?s"]));
    assert_eq!(t.num_rows(), 2);
    assert_eq!(t.rows()[0]["?o"], int(1), "first occurrence wins");
}

#[test]
fn retain_keeps_matching_rows_in_order() {
    let mut t = Table::new(names(&["?n"]));
    for i in 0..6 {
        t.add_row(row(&[("?n", int(i))]));
    }
    t.retain(|r| matches!(r.get("?n"), Some(Cell::Literal(Literal::Int64(v))) if v % 2 == 0));
    assert_eq!(t.num_rows(), 3);
    let kept: Vec<Cell> = t.rows().iter().map(|r| r["?n"].clone()).collect();
    assert_eq!(kept, vec![int(0), int(2), int(4)]);
}

#[test]
fn limit_truncates_and_larger_is_noop() {
    let mut t = Table::new(names(&["?n"]));
    for i in 0..5 {
        t.add_row(row(&[("?n", int(i))]));
    }
    t.limit(3);
    assert_eq!(t.num_rows(), 3);
    let snapshot = t.clone();
    t.limit(3);
    assert_eq!(t, snapshot);
    t.limit(10);
    assert_eq!(t, snapshot, "limit with larger N is a no-op");
    t.limit(-1);
    assert_eq!(t.num_rows(), 0);
}

#[test]
fn projection_renames_columns() {
    let mut t = Table::new(names(&["?s", "?o"]));
    t.add_row(row(&[("?s", node("/u<a>")), ("?o", int(1))]));
    let specs = [ProjectionSpec {
        source: "?s".into(),
        output: "?who".into(),
        op: None,
        distinct: false,
    }];
    let out = t.project_and_group(&specs, &[]).expect("project");
    assert_eq!(out.bindings(), &["?who"]);
    assert_eq!(out.rows()[0]["?who"], node("/u<a>"));
}

#[test]
fn group_by_count_and_sum() {
    let mut t = Table::new(names(&["?s", "?n"]));
    t.add_row(row(&[("?s", node("/u<a>")), ("?n", int(1))]));
    t.add_row(row(&[("?s", node("/u<a>")), ("?n", int(2))]));
    t.add_row(row(&[("?s", node("/u<b>")), ("?n", int(5))]));
    let specs = [
        ProjectionSpec { source: "?s".into(), output: "?s".into(), op: None, distinct: false },
        ProjectionSpec {
            source: "?n".into(),
            output: "?count".into(),
            op: Some(AggregationOp::Count),
            distinct: false,
        },
        ProjectionSpec {
            source: "?n".into(),
            output: "?sum".into(),
            op: Some(AggregationOp::Sum),
            distinct: false,
        },
    ];
    let out = t.project_and_group(&specs, &names(&["?s"])).expect("group");
    assert_eq!(out.num_rows(), 2);
    assert_eq!(out.rows()[0]["?count"], int(2));
    assert_eq!(out.rows()[0]["?sum"], int(3));
    assert_eq!(out.rows()[1]["?count"], int(1));
    assert_eq!(out.rows()[1]["?sum"], int(5));
}

#[test]
fn count_distinct_uses_comparable_identity() {
    let mut t = Table::new(names(&["?s", "?o"]));
    t.add_row(row(&[("?s", node("/u<a>")), ("?o", text("x"))]));
    t.add_row(row(&[("?s", node("/u<a>")), ("?o", text("x"))]));
    t.add_row(row(&[("?s", node("/u<a>")), ("?o", text("y"))]));
    let specs = [
        ProjectionSpec { source: "?s".into(), output: "?s".into(), op: None, distinct: false },
        ProjectionSpec {
            source: "?o".into(),
            output: "?n".into(),
            op: Some(AggregationOp::Count),
            distinct: true,
        },
    ];
    let out = t.project_and_group(&specs, &names(&["?s"])).expect("group");
    assert_eq!(out.rows()[0]["?n"], int(2));
}

#[test]
fn sum_mixed_numerics_widen_and_non_numeric_fails() {
    let mut t = Table::new(names(&["?s", "?v"]));
    t.add_row(row(&[("?s", node("/u<a>")), ("?v", int(1))]));
    t.add_row(row(&[("?s", node("/u<a>")), ("?v", Cell::Literal(Literal::Float64(0.5)))]));
    let specs = [
        ProjectionSpec { source: "?s".into(), output: "?s".into(), op: None, distinct: false },
        ProjectionSpec {
            source: "?v".into(),
            output: "?sum".into(),
            op: Some(AggregationOp::Sum),
            distinct: false,
        },
    ];
    let out = t.project_and_group(&specs, &names(&["?s"])).expect("group");
    assert_eq!(out.rows()[0]["?sum"], Cell::Literal(Literal::Float64(1.5)));

    let mut bad = Table::new(names(&["?s", "?v"]));
    bad.add_row(row(&[("?s", node("/u<a>")), ("?v", text("oops"))]));
    assert!(bad.project_and_group(&specs, &names(&["?s"])).is_err());
}

#[test]
fn inner_join_matches_shared_bindings() {
    let mut left = Table::new(names(&["?s", "?p"]));
    left.add_row(row(&[("?s", node("/u<a>")), ("?p", text("x"))]));
    left.add_row(row(&[("?s", node("/u<b>")), ("?p", text("y"))]));
    let mut right = Table::new(names(&["?s", "?o"]));
    right.add_row(row(&[("?s", node("/u<a>")), ("?o", int(1))]));

    let joined = left.inner_join(&right);
    assert_eq!(joined.bindings(), &["?s", "?p", "?o"]);
    assert_eq!(joined.num_rows(), 1);
    assert_eq!(joined.rows()[0]["?o"], int(1));
    assert_eq!(joined.rows()[0]["?p"], text("x"));
}

#[test]
fn join_without_shared_bindings_is_cartesian() {
    let mut left = Table::new(names(&["?a"]));
    left.add_row(row(&[("?a", int(1))]));
    left.add_row(row(&[("?a", int(2))]));
    let mut right = Table::new(names(&["?b"]));
    right.add_row(row(&[("?b", int(10))]));
    right.add_row(row(&[("?b", int(20))]));
    assert_eq!(left.inner_join(&right).num_rows(), 4);
}

#[test]
fn left_outer_join_keeps_unmatched_left_rows() {
    let mut left = Table::new(names(&["?s"]));
    left.add_row(row(&[("?s", node("/u<a>"))]));
    left.add_row(row(&[("?s", node("/u<b>"))]));
    let mut right = Table::new(names(&["?s", "?e"]));
    right.add_row(row(&[("?s", node("/u<a>")), ("?e", text("x@y"))]));

    let joined = left.left_outer_join(&right);
    assert_eq!(joined.num_rows(), 2);
    let bound: Vec<bool> = joined.rows().iter().map(|r| r.contains_key("?e")).collect();
    assert_eq!(bound, vec![true, false]);
}

#[test]
fn to_text_renders_header_and_unbound_cells() {
    let mut t = Table::new(names(&["?s", "?e"]));
    t.add_row(row(&[("?s", node("/u<a>")), ("?e", text("x"))]));
    t.add_row(row(&[("?s", node("/u<b>"))]));
    let text = t.to_text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "?s\t?e");
    assert_eq!(lines[1], "/u<a>\t\"x\"^^type:text");
    assert_eq!(lines[2], "/u<b>\t");
}
