//! The concrete TQL grammar, encoded as static clause tables over the LL(1)
//! driver. Each non-terminal lists its clauses token-first (left-factored,
//! validated once at startup) and wires the semantic hooks that build the
//! statement: kind binding on clause start, accumulation hooks per element,
//! and the finalize checks on clause end.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::Result;
use crate::query::hooks::{
    bind_construct, bind_create, bind_deconstruct, bind_delete, bind_drop, bind_insert,
    bind_query, bind_show, data_accumulator, graph_accumulator, input_graph_accumulator,
    output_graph_accumulator, HookState,
};
use crate::query::hooks_construct::{
    construct_finalize, construct_init, construct_next, construct_object, construct_pair_next,
    construct_predicate, construct_subject,
};
use crate::query::hooks_vars::{
    collect_global_bounds, global_distinct, group_by_bindings, group_by_bindings_checker,
    having_expression, having_expression_builder, limit_collection, order_by_bindings,
    order_by_bindings_checker, query_finalize, var_accumulator, var_list_done,
};
use crate::query::hooks_where::{
    where_filter, where_init_working_clause, where_next_working_clause, where_object,
    where_predicate, where_subject,
};
use crate::query::lexer::TokenKind::*;
use crate::query::parser::GrammarElement::{Symbol as Sym, Token as Tok};
use crate::query::parser::{Clause, Grammar, Parser, Symbol};
use crate::query::semantic::Statement;

pub const START_SYMBOL: Symbol = "START";

static GRAMMAR: Lazy<Grammar> =
    Lazy::new(|| build_grammar().expect("the TQL grammar is left-factored"));

/// The process-wide grammar instance.
pub fn global_grammar() -> &'static Grammar {
    &GRAMMAR
}

/// Parse one TQL statement into its semantic form.
pub fn parse(input: &str) -> Result<Statement> {
    let mut st = Statement::new();
    let mut hooks = HookState::new();
    Parser::new(global_grammar()).parse(input, START_SYMBOL, &mut st, &mut hooks)?;
    Ok(st)
}

fn clause(elements: Vec<crate::query::parser::GrammarElement>) -> Clause {
    Clause { elements, ..Default::default() }
}

fn empty() -> Clause {
    Clause::default()
}

/// The `BEFORE t | AFTER t | BETWEEN t1, t2` clauses, shared by every
/// modifier tail.
fn bounds_clauses() -> Vec<Clause> {
    vec![
        clause(vec![Tok(Before), Tok(Time)]).with_element(collect_global_bounds),
        clause(vec![Tok(After), Tok(Time)]).with_element(collect_global_bounds),
        clause(vec![Tok(Between), Tok(Time), Tok(Comma), Tok(Time)])
            .with_element(collect_global_bounds),
    ]
}

/// Clauses of one projection item (`?b [AS ?b]` or `COUNT/SUM(...)`).
fn var_clauses() -> Vec<Clause> {
    vec![
        clause(vec![Tok(Binding), Sym("VAR_AS"), Sym("VARS_REST")]).with_element(var_accumulator),
        clause(vec![Tok(Count), Tok(LPar), Sym("VAR_INNER"), Tok(RPar), Sym("VAR_AS"), Sym("VARS_REST")])
            .with_element(var_accumulator),
        clause(vec![Tok(Sum), Tok(LPar), Sym("VAR_INNER"), Tok(RPar), Sym("VAR_AS"), Sym("VARS_REST")])
            .with_element(var_accumulator),
    ]
}

fn build_grammar() -> Result<Grammar> {
    let mut g: HashMap<Symbol, Vec<Clause>> = HashMap::new();

    g.insert(
        START_SYMBOL,
        vec![
            clause(vec![
                Tok(Select),
                Sym("SELECT_VARS"),
                Tok(From),
                Sym("GRAPHS"),
                Tok(Where),
                Tok(LBracket),
                Sym("WHERE_PATTERN"),
                Tok(RBracket),
                Sym("MODIFIERS"),
                Tok(Semicolon),
            ])
            .with_start(bind_query)
            .with_end(query_finalize),
            clause(vec![
                Tok(Insert),
                Tok(Data),
                Tok(Into),
                Sym("GRAPHS"),
                Tok(LBracket),
                Sym("DATA_TRIPLES"),
                Tok(RBracket),
                Tok(Semicolon),
            ])
            .with_start(bind_insert),
            clause(vec![
                Tok(Delete),
                Tok(Data),
                Tok(From),
                Sym("GRAPHS"),
                Tok(LBracket),
                Sym("DATA_TRIPLES"),
                Tok(RBracket),
                Tok(Semicolon),
            ])
            .with_start(bind_delete),
            clause(vec![Tok(Create), Tok(Graph), Sym("GRAPHS"), Tok(Semicolon)])
                .with_start(bind_create),
            clause(vec![Tok(Drop), Tok(Graph), Sym("GRAPHS"), Tok(Semicolon)]).with_start(bind_drop),
            clause(vec![Tok(Show), Tok(Graphs), Tok(Semicolon)]).with_start(bind_show),
            clause(vec![
                Tok(Construct),
                Tok(LBracket),
                Sym("CONSTRUCT_TRIPLES"),
                Tok(RBracket),
                Tok(Into),
                Sym("OUTPUT_GRAPHS"),
                Tok(From),
                Sym("INPUT_GRAPHS"),
                Tok(Where),
                Tok(LBracket),
                Sym("WHERE_PATTERN"),
                Tok(RBracket),
                Tok(Semicolon),
            ])
            .with_start(bind_construct)
            .with_end(construct_finalize),
            clause(vec![
                Tok(Deconstruct),
                Tok(LBracket),
                Sym("CONSTRUCT_TRIPLES"),
                Tok(RBracket),
                Tok(In),
                Sym("OUTPUT_GRAPHS"),
                Tok(From),
                Sym("INPUT_GRAPHS"),
                Tok(Where),
                Tok(LBracket),
                Sym("WHERE_PATTERN"),
                Tok(RBracket),
                Tok(Semicolon),
            ])
            .with_start(bind_deconstruct)
            .with_end(construct_finalize),
        ],
    );

    // Projections. SELECT_VARS admits a leading DISTINCT over the whole list.
    let mut select_vars = vec![clause(vec![Tok(Distinct), Sym("VARS")]).with_element(global_distinct)];
    select_vars.extend(var_clauses());
    g.insert("SELECT_VARS", select_vars);
    g.insert("VARS", var_clauses());
    g.insert(
        "VAR_INNER",
        vec![
            clause(vec![Tok(Distinct), Tok(Binding)]).with_element(var_accumulator),
            clause(vec![Tok(Binding)]).with_element(var_accumulator),
        ],
    );
    g.insert(
        "VAR_AS",
        vec![clause(vec![Tok(As), Tok(Binding)]).with_element(var_accumulator), empty()],
    );
    g.insert(
        "VARS_REST",
        vec![
            clause(vec![Tok(Comma), Sym("VARS")]).with_element(var_accumulator),
            empty().with_end(var_list_done),
        ],
    );

    // Graph-name lists.
    g.insert(
        "GRAPHS",
        vec![clause(vec![Tok(Binding), Sym("GRAPHS_REST")]).with_element(graph_accumulator)],
    );
    g.insert("GRAPHS_REST", vec![clause(vec![Tok(Comma), Sym("GRAPHS")]), empty()]);
    g.insert(
        "INPUT_GRAPHS",
        vec![clause(vec![Tok(Binding), Sym("INPUT_GRAPHS_REST")])
            .with_element(input_graph_accumulator)],
    );
    g.insert("INPUT_GRAPHS_REST", vec![clause(vec![Tok(Comma), Sym("INPUT_GRAPHS")]), empty()]);
    g.insert(
        "OUTPUT_GRAPHS",
        vec![clause(vec![Tok(Binding), Sym("OUTPUT_GRAPHS_REST")])
            .with_element(output_graph_accumulator)],
    );
    g.insert("OUTPUT_GRAPHS_REST", vec![clause(vec![Tok(Comma), Sym("OUTPUT_GRAPHS")]), empty()]);

    // INSERT/DELETE data blocks.
    g.insert(
        "DATA_TRIPLES",
        vec![clause(vec![Tok(Node), Sym("DATA_PO"), Sym("DATA_TRIPLES_REST")])
            .with_element(data_accumulator)],
    );
    g.insert(
        "DATA_PO",
        vec![clause(vec![Tok(Predicate), Sym("DATA_OBJECT")]).with_element(data_accumulator)],
    );
    g.insert(
        "DATA_OBJECT",
        vec![
            clause(vec![Tok(Node)]).with_element(data_accumulator),
            clause(vec![Tok(Predicate)]).with_element(data_accumulator),
            clause(vec![Tok(Literal)]).with_element(data_accumulator),
        ],
    );
    g.insert("DATA_TRIPLES_REST", vec![clause(vec![Tok(Dot), Sym("DATA_TRIPLES")]), empty()]);

    // WHERE pattern: triple templates, OPTIONAL blocks, FILTER clauses.
    g.insert(
        "WHERE_PATTERN",
        vec![
            clause(vec![Tok(Optional), Tok(LBracket), Sym("TPL"), Tok(RBracket), Sym("WHERE_REST")])
                .with_start(where_init_working_clause)
                .with_element(where_subject),
            clause(vec![Tok(Node), Sym("TPL_PRED"), Sym("WHERE_REST")])
                .with_start(where_init_working_clause)
                .with_element(where_subject),
            clause(vec![Tok(Binding), Sym("SUBJECT_MODS"), Sym("TPL_PRED"), Sym("WHERE_REST")])
                .with_start(where_init_working_clause)
                .with_element(where_subject),
            clause(vec![
                Tok(Filter),
                Tok(LPar),
                Tok(FilterFunction),
                Tok(LPar),
                Tok(Binding),
                Sym("FILTER_VALUE"),
                Tok(RPar),
                Tok(RPar),
                Sym("WHERE_REST"),
            ])
            .with_start(where_init_working_clause)
            .with_element(where_filter),
        ],
    );
    g.insert(
        "FILTER_VALUE",
        vec![clause(vec![Tok(Comma), Tok(Literal)]).with_element(where_filter), empty()],
    );
    g.insert(
        "WHERE_REST",
        vec![
            clause(vec![Tok(Dot), Sym("WHERE_PATTERN")]).with_start(where_next_working_clause),
            empty().with_start(where_next_working_clause),
        ],
    );
    g.insert(
        "TPL",
        vec![
            clause(vec![Tok(Node), Sym("TPL_PRED")]).with_element(where_subject),
            clause(vec![Tok(Binding), Sym("SUBJECT_MODS"), Sym("TPL_PRED")])
                .with_element(where_subject),
        ],
    );
    g.insert(
        "SUBJECT_MODS",
        vec![
            clause(vec![Tok(As), Tok(Binding), Sym("SUBJECT_MODS")]).with_element(where_subject),
            clause(vec![Tok(Type), Tok(Binding), Sym("SUBJECT_MODS")]).with_element(where_subject),
            clause(vec![Tok(Id), Tok(Binding), Sym("SUBJECT_MODS")]).with_element(where_subject),
            empty(),
        ],
    );
    g.insert(
        "TPL_PRED",
        vec![
            clause(vec![Tok(Predicate), Sym("TPL_OBJ")]).with_element(where_predicate),
            clause(vec![Tok(PredicateBound), Sym("TPL_OBJ")]).with_element(where_predicate),
            clause(vec![Tok(Binding), Sym("PRED_MODS"), Sym("TPL_OBJ")])
                .with_element(where_predicate),
        ],
    );
    g.insert(
        "PRED_MODS",
        vec![
            clause(vec![Tok(As), Tok(Binding), Sym("PRED_MODS")]).with_element(where_predicate),
            clause(vec![Tok(Id), Tok(Binding), Sym("PRED_MODS")]).with_element(where_predicate),
            clause(vec![Tok(At), Tok(Binding), Sym("PRED_MODS")]).with_element(where_predicate),
            empty(),
        ],
    );
    g.insert(
        "TPL_OBJ",
        vec![
            clause(vec![Tok(Node)]).with_element(where_object),
            clause(vec![Tok(BlankNode)]).with_element(where_object),
            clause(vec![Tok(Literal)]).with_element(where_object),
            clause(vec![Tok(Predicate)]).with_element(where_object),
            clause(vec![Tok(PredicateBound)]).with_element(where_object),
            clause(vec![Tok(Binding), Sym("OBJ_MODS")]).with_element(where_object),
        ],
    );
    g.insert(
        "OBJ_MODS",
        vec![
            clause(vec![Tok(As), Tok(Binding), Sym("OBJ_MODS")]).with_element(where_object),
            clause(vec![Tok(Type), Tok(Binding), Sym("OBJ_MODS")]).with_element(where_object),
            clause(vec![Tok(Id), Tok(Binding), Sym("OBJ_MODS")]).with_element(where_object),
            clause(vec![Tok(At), Tok(Binding), Sym("OBJ_MODS")]).with_element(where_object),
            empty(),
        ],
    );

    // Statement modifiers, in their fixed order with every tail optional.
    let mut modifiers = vec![
        clause(vec![Tok(GroupBy), Sym("GROUP_LIST"), Sym("AFTER_GROUP")])
            .with_element(group_by_bindings_checker),
    ];
    let mut after_group = Vec::new();
    for target in [&mut modifiers, &mut after_group] {
        target.push(
            clause(vec![Tok(OrderBy), Sym("ORDER_LIST"), Sym("AFTER_ORDER")])
                .with_element(order_by_bindings_checker),
        );
    }
    let mut after_order = Vec::new();
    for target in [&mut modifiers, &mut after_group, &mut after_order] {
        target.push(
            clause(vec![Tok(Having), Sym("HAVING_EXPR"), Sym("AFTER_HAVING")])
                .with_element(having_expression_builder),
        );
    }
    let mut after_having = Vec::new();
    for target in [&mut modifiers, &mut after_group, &mut after_order, &mut after_having] {
        target.push(
            clause(vec![Tok(Limit), Tok(Literal), Sym("AFTER_LIMIT")])
                .with_element(limit_collection),
        );
    }
    let mut after_limit = Vec::new();
    for target in
        [&mut modifiers, &mut after_group, &mut after_order, &mut after_having, &mut after_limit]
    {
        target.extend(bounds_clauses());
        target.push(empty());
    }
    g.insert("MODIFIERS", modifiers);
    g.insert("AFTER_GROUP", after_group);
    g.insert("AFTER_ORDER", after_order);
    g.insert("AFTER_HAVING", after_having);
    g.insert("AFTER_LIMIT", after_limit);

    g.insert(
        "GROUP_LIST",
        vec![clause(vec![Tok(Binding), Sym("GROUP_REST")]).with_element(group_by_bindings)],
    );
    g.insert("GROUP_REST", vec![clause(vec![Tok(Comma), Sym("GROUP_LIST")]), empty()]);
    g.insert(
        "ORDER_LIST",
        vec![clause(vec![Tok(Binding), Sym("ORDER_DIR"), Sym("ORDER_REST")])
            .with_element(order_by_bindings)],
    );
    g.insert(
        "ORDER_DIR",
        vec![
            clause(vec![Tok(Asc)]).with_element(order_by_bindings),
            clause(vec![Tok(Desc)]).with_element(order_by_bindings),
            empty(),
        ],
    );
    g.insert("ORDER_REST", vec![clause(vec![Tok(Comma), Sym("ORDER_LIST")]), empty()]);

    // HAVING captures its raw token stream; the evaluator builder compiles it
    // once the region ends.
    let having_tokens =
        [Binding, Not, LPar, RPar, Eq, Lt, Gt, And, Or, Literal, Node, Time, Predicate];
    let mut having_expr: Vec<Clause> = having_tokens
        .iter()
        .map(|k| clause(vec![Tok(*k), Sym("HAVING_EXPR")]).with_element(having_expression))
        .collect();
    having_expr.push(empty());
    g.insert("HAVING_EXPR", having_expr);

    // CONSTRUCT/DECONSTRUCT templates.
    g.insert(
        "CONSTRUCT_TRIPLES",
        vec![
            clause(vec![Tok(Node), Sym("CONSTRUCT_PO"), Sym("CONSTRUCT_REST")])
                .with_start(construct_init)
                .with_element(construct_subject),
            clause(vec![Tok(Binding), Sym("CONSTRUCT_PO"), Sym("CONSTRUCT_REST")])
                .with_start(construct_init)
                .with_element(construct_subject),
            clause(vec![Tok(BlankNode), Sym("CONSTRUCT_PO"), Sym("CONSTRUCT_REST")])
                .with_start(construct_init)
                .with_element(construct_subject),
        ],
    );
    g.insert(
        "CONSTRUCT_PO",
        vec![
            clause(vec![Tok(Predicate), Sym("CONSTRUCT_OBJ"), Sym("CONSTRUCT_PO_REST")])
                .with_element(construct_predicate),
            clause(vec![Tok(Binding), Sym("CONSTRUCT_OBJ"), Sym("CONSTRUCT_PO_REST")])
                .with_element(construct_predicate),
        ],
    );
    g.insert(
        "CONSTRUCT_OBJ",
        vec![
            clause(vec![Tok(Node)]).with_element(construct_object),
            clause(vec![Tok(Literal)]).with_element(construct_object),
            clause(vec![Tok(Predicate)]).with_element(construct_object),
            clause(vec![Tok(BlankNode)]).with_element(construct_object),
            clause(vec![Tok(Binding)]).with_element(construct_object),
        ],
    );
    g.insert(
        "CONSTRUCT_PO_REST",
        vec![
            clause(vec![Tok(Semicolon), Sym("CONSTRUCT_PO")]).with_start(construct_pair_next),
            empty().with_start(construct_pair_next),
        ],
    );
    g.insert(
        "CONSTRUCT_REST",
        vec![
            clause(vec![Tok(Dot), Sym("CONSTRUCT_TRIPLES")]).with_start(construct_next),
            empty().with_start(construct_next),
        ],
    );

    Grammar::new(g)
}

#[cfg(test)]
#[path = "grammar_tests.rs"]
mod grammar_tests;
