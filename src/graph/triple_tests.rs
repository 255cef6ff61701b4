use super::*;
use crate::graph::literal::default_literal_builder;

fn builder() -> &'static Builder {
    default_literal_builder()
}

#[test]
fn object_parse_dispatches_on_shape() {
    let n = Object::parse("/u<paul>", builder()).expect("node");
    assert!(n.as_node().is_some());

    let p = Object::parse("\"knows\"@[]", builder()).expect("predicate");
    assert!(p.as_predicate().is_some());

    let l = Object::parse("\"x@y\"^^type:text", builder()).expect("literal");
    assert!(l.as_literal().is_some());

    assert!(Object::parse("?binding", builder()).is_err());
    assert!(Object::parse("", builder()).is_err());
}

#[test]
fn triple_text_round_trip() {
    let texts = [
        "/u<paul>\t\"knows\"@[]\t/u<peter>",
        "/u<a>\t\"saw\"@[2020-01-01T00:00:00.000000000Z]\t/u<b>",
        "/u<a>\t\"email\"@[]\t\"x@y\"^^type:text",
        "/room<k1>\t\"temp\"@[]\t\"21.5\"^^type:float64",
    ];
    for text in texts {
        let t = Triple::parse(text, builder()).expect(text);
        assert_eq!(t.to_string(), text, "display drifted for {}", text);
        let again = Triple::parse(&t.to_string(), builder()).expect("reparse");
        assert_eq!(again, t);
    }
}

#[test]
fn triple_accessors() {
    let t = Triple::parse("/u<paul>\t\"knows\"@[]\t/u<peter>", builder()).expect("parse");
    assert_eq!(t.subject().id(), "paul");
    assert_eq!(t.predicate().id(), "knows");
    assert_eq!(t.object().as_node().expect("node").id(), "peter");
}

#[test]
fn triple_rejects_wrong_shapes() {
    for text in [
        "",
        "/u<paul>",
        "/u<paul>\t\"knows\"@[]",
        "/u<paul>\t\"knows\"@[]\t/u<peter>\textra",
        "/u<paul> \"knows\"@[] /u<peter>",
        "/u<paul>\tknows\t/u<peter>",
    ] {
        assert!(Triple::parse(text, builder()).is_err(), "accepted '{}'", text);
    }
}
