use super::*;

fn kinds(input: &str) -> Vec<TokenKind> {
    Lexer::lex_all(input).into_iter().map(|t| t.kind).collect()
}

fn texts(input: &str) -> Vec<String> {
    Lexer::lex_all(input)
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.text)
        .collect()
}

#[test]
fn keywords_are_case_insensitive() {
    assert_eq!(
        kinds("SELECT select SeLeCt"),
        vec![TokenKind::Select, TokenKind::Select, TokenKind::Select, TokenKind::Eof]
    );
}

#[test]
fn full_query_token_stream() {
    let input = "SELECT ?s FROM ?g WHERE { ?s \"knows\"@[] /u<mary> };";
    assert_eq!(
        kinds(input),
        vec![
            TokenKind::Select,
            TokenKind::Binding,
            TokenKind::From,
            TokenKind::Binding,
            TokenKind::Where,
            TokenKind::LBracket,
            TokenKind::Binding,
            TokenKind::Predicate,
            TokenKind::Node,
            TokenKind::RBracket,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn primitive_tokens_keep_raw_source_text() {
    let input = "/u<john doe> \"knows\"@[] \"saw\"@[2020-01-01T00:00:00Z] \
                 \"a\"@[2020-01-01T00:00:00Z,2021-01-01T00:00:00Z] \
                 \"21.5\"^^type:float64 2022-03-04T05:06:07.000000008Z _:v1 ?who";
    let lexed = Lexer::lex_all(input);
    let expected = [
        (TokenKind::Node, "/u<john doe>"),
        (TokenKind::Predicate, "\"knows\"@[]"),
        (TokenKind::Predicate, "\"saw\"@[2020-01-01T00:00:00Z]"),
        (TokenKind::PredicateBound, "\"a\"@[2020-01-01T00:00:00Z,2021-01-01T00:00:00Z]"),
        (TokenKind::Literal, "\"21.5\"^^type:float64"),
        (TokenKind::Time, "2022-03-04T05:06:07.000000008Z"),
        (TokenKind::BlankNode, "_:v1"),
        (TokenKind::Binding, "?who"),
    ];
    for (i, (kind, text)) in expected.iter().enumerate() {
        assert_eq!(lexed[i].kind, *kind, "kind at {}", i);
        assert_eq!(lexed[i].text, *text, "raw text at {}", i);
        // Raw-text law: the token text is a verbatim source substring.
        assert!(input.contains(*text), "token text '{}' not a source substring", text);
    }
}

#[test]
fn group_by_and_order_by_fuse() {
    let tokens = Lexer::lex_all("GROUP BY ?s ORDER   BY ?n group by ?x");
    assert_eq!(tokens[0].kind, TokenKind::GroupBy);
    assert_eq!(tokens[0].text, "GROUP BY");
    assert_eq!(tokens[2].kind, TokenKind::OrderBy);
    assert_eq!(tokens[2].text, "ORDER   BY");
    assert_eq!(tokens[4].kind, TokenKind::GroupBy);
    assert_eq!(tokens[4].text, "group by");
    assert_eq!(kinds("GROUP ?s")[0], TokenKind::Error);
}

#[test]
fn punctuation_and_operators() {
    assert_eq!(
        kinds(", . ; { } ( ) [ ] = < >"),
        vec![
            TokenKind::Comma,
            TokenKind::Dot,
            TokenKind::Semicolon,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::LPar,
            TokenKind::RPar,
            TokenKind::LSquare,
            TokenKind::RSquare,
            TokenKind::Eq,
            TokenKind::Lt,
            TokenKind::Gt,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn filter_function_names_lex_specially() {
    assert_eq!(kinds("FILTER(latest(?p))")[0..6].to_vec(), vec![
        TokenKind::Filter,
        TokenKind::LPar,
        TokenKind::FilterFunction,
        TokenKind::LPar,
        TokenKind::Binding,
        TokenKind::RPar,
    ]);
}

#[test]
fn comments_and_whitespace_are_skipped() {
    let input = "SELECT -- trailing comment\n?s /* block\ncomment */ FROM";
    assert_eq!(kinds(input), vec![
        TokenKind::Select,
        TokenKind::Binding,
        TokenKind::From,
        TokenKind::Eof,
    ]);
    assert_eq!(texts("?a--x\n?b"), vec!["?a", "?b"]);
}

#[test]
fn positions_are_one_based_lines_and_columns() {
    let tokens = Lexer::lex_all("SELECT ?s\n  FROM ?g");
    assert_eq!((tokens[0].line, tokens[0].col), (1, 1));
    assert_eq!((tokens[1].line, tokens[1].col), (1, 8));
    assert_eq!((tokens[2].line, tokens[2].col), (2, 3));
    assert_eq!((tokens[3].line, tokens[3].col), (2, 8));
}

#[test]
fn lex_errors_stop_the_stream() {
    let tokens = Lexer::lex_all("SELECT ?s # nope");
    let err = tokens.last().expect("token");
    assert_eq!(err.kind, TokenKind::Error);
    assert_eq!((err.line, err.col), (1, 11));
    assert!(err.text.contains("unrecognized character"), "message: {}", err.text);
}

#[test]
fn unterminated_strings_and_anchors_error() {
    for input in ["\"abc", "\"abc\"@[2020", "\"abc\"^^typo:text", "\"abc\" ?x", "/u<paul", "?"] {
        let tokens = Lexer::lex_all(input);
        assert_eq!(tokens.last().expect("token").kind, TokenKind::Error, "input '{}'", input);
    }
}

#[test]
fn invalid_time_is_an_error() {
    let tokens = Lexer::lex_all("BEFORE 2020-13-99T00:00:00Z");
    assert_eq!(tokens[1].kind, TokenKind::Error);
    assert!(tokens[1].text.contains("RFC 3339"), "message: {}", tokens[1].text);
}

#[test]
fn stream_pins_to_eof_after_end() {
    let mut lexer = Lexer::new(";");
    assert_eq!(lexer.next_token().kind, TokenKind::Semicolon);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}
