use super::*;
use std::collections::HashMap;

// Tiny grammar used to exercise the driver in isolation. Hooks record their
// firing order through the statement's graph-name list.
fn mark(st: &mut Statement, label: &str) {
    st.graph_names.push(label.to_string());
}

fn start_hook(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> crate::error::Result<()> {
    mark(st, "start");
    Ok(())
}

fn end_hook(st: &mut Statement, _h: &mut HookState, _s: Symbol) -> crate::error::Result<()> {
    mark(st, "end");
    Ok(())
}

fn element_hook(
    st: &mut Statement,
    _h: &mut HookState,
    e: &ConsumedElement,
) -> crate::error::Result<()> {
    match e {
        ConsumedElement::Token(t) => mark(st, &format!("tok:{}", t.text)),
        ConsumedElement::Symbol(s) => mark(st, &format!("sym:{}", s)),
    }
    Ok(())
}

fn failing_hook(
    _st: &mut Statement,
    _h: &mut HookState,
    _e: &ConsumedElement,
) -> crate::error::Result<()> {
    Err(crate::error::Error::semantic("hook rejected the element"))
}

fn mini_grammar() -> Grammar {
    let mut g: HashMap<Symbol, Vec<Clause>> = HashMap::new();
    g.insert(
        "S",
        vec![Clause {
            elements: vec![GrammarElement::Token(TokenKind::Select), GrammarElement::Symbol("LIST")],
            start_hook: Some(start_hook),
            element_hook: Some(element_hook),
            end_hook: Some(end_hook),
        }],
    );
    g.insert(
        "LIST",
        vec![
            Clause {
                elements: vec![GrammarElement::Token(TokenKind::Binding), GrammarElement::Symbol("LIST")],
                element_hook: Some(element_hook),
                ..Default::default()
            },
            Clause::default(),
        ],
    );
    Grammar::new(g).expect("mini grammar")
}

fn run(input: &str) -> crate::error::Result<Statement> {
    let grammar = mini_grammar();
    let mut st = Statement::new();
    let mut hooks = HookState::new();
    Parser::new(&grammar).parse(input, "S", &mut st, &mut hooks)?;
    Ok(st)
}

#[test]
fn hooks_fire_in_clause_order() {
    let st = run("SELECT ?a ?b").expect("parse");
    assert_eq!(
        st.graph_names,
        vec!["start", "tok:SELECT", "tok:?a", "tok:?b", "sym:LIST", "end"]
    );
}

#[test]
fn epsilon_clause_is_the_fallback() {
    let st = run("SELECT").expect("parse");
    assert_eq!(st.graph_names, vec!["start", "tok:SELECT", "sym:LIST", "end"]);
}

#[test]
fn unexpected_token_names_token_and_symbol() {
    let err = run("FROM").expect_err("reject");
    assert_eq!(err.kind(), "parse");
    let text = err.to_string();
    assert!(text.contains("FROM"), "missing token in {}", text);
    assert!(text.contains("'S'"), "missing symbol in {}", text);
    assert!(text.contains("1:1"), "missing position in {}", text);
}

#[test]
fn trailing_input_is_rejected() {
    let err = run("SELECT ?a FROM").expect_err("trailing");
    assert_eq!(err.kind(), "parse");
    assert!(err.to_string().contains("trailing input"), "{}", err);
}

#[test]
fn lex_errors_surface_as_lex_kind() {
    let err = run("SELECT #").expect_err("lex");
    assert_eq!(err.kind(), "lex");
}

#[test]
fn hook_errors_abort_the_parse() {
    let mut g: HashMap<Symbol, Vec<Clause>> = HashMap::new();
    g.insert(
        "S",
        vec![Clause {
            elements: vec![GrammarElement::Token(TokenKind::Select)],
            element_hook: Some(failing_hook),
            ..Default::default()
        }],
    );
    let grammar = Grammar::new(g).expect("grammar");
    let mut st = Statement::new();
    let mut hooks = HookState::new();
    let err = Parser::new(&grammar).parse("SELECT", "S", &mut st, &mut hooks).expect_err("hook");
    assert_eq!(err.kind(), "semantic_hook");
}

#[test]
fn grammar_rejects_clause_not_starting_with_token() {
    let mut g: HashMap<Symbol, Vec<Clause>> = HashMap::new();
    g.insert(
        "S",
        vec![Clause { elements: vec![GrammarElement::Symbol("X")], ..Default::default() }],
    );
    g.insert("X", vec![Clause::default()]);
    let err = Grammar::new(g).expect_err("not left-factored");
    assert!(err.to_string().contains("left-factored"), "{}", err);
}

#[test]
fn grammar_rejects_multiple_empty_clauses() {
    let mut g: HashMap<Symbol, Vec<Clause>> = HashMap::new();
    g.insert("S", vec![Clause::default(), Clause::default()]);
    let err = Grammar::new(g).expect_err("double epsilon");
    assert!(err.to_string().contains("empty clauses"), "{}", err);
}

#[test]
fn unknown_symbol_is_a_parse_error() {
    let grammar = mini_grammar();
    let mut st = Statement::new();
    let mut hooks = HookState::new();
    let err =
        Parser::new(&grammar).parse("SELECT", "MISSING", &mut st, &mut hooks).expect_err("unknown");
    assert!(err.to_string().contains("unknown grammar symbol"), "{}", err);
}

#[test]
fn lookahead_peek_and_accept() {
    let grammar = mini_grammar();
    let mut parser = Parser::new(&grammar);
    let mut st = Statement::new();
    let mut hooks = HookState::new();
    parser.parse("SELECT", "S", &mut st, &mut hooks).expect("parse");
    // After a full parse the stream rests on EOF.
    assert!(parser.can_accept(TokenKind::Eof));
    assert_eq!(parser.peek(3).kind, TokenKind::Eof);
}
