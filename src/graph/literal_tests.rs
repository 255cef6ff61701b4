use super::*;

fn b() -> Builder {
    Builder::bounded(64)
}

#[test]
fn parse_all_kinds_round_trip() {
    let cases = [
        "\"true\"^^type:bool",
        "\"false\"^^type:bool",
        "\"42\"^^type:int64",
        "\"-7\"^^type:int64",
        "\"3.25\"^^type:float64",
        "\"hello world\"^^type:text",
        "\"aGVsbG8=\"^^type:blob",
    ];
    for text in cases {
        let lit = b().parse(text).expect(text);
        assert_eq!(lit.to_string(), text, "display drifted for {}", text);
    }
}

#[test]
fn blob_decodes_base64() {
    let lit = b().parse("\"aGVsbG8=\"^^type:blob").expect("parse");
    assert_eq!(lit, Literal::Blob(b"hello".to_vec()));
}

#[test]
fn rejects_malformed_literals() {
    for text in [
        "\"1\"^^type:int32",
        "\"yes\"^^type:bool",
        "\"abc\"^^type:int64",
        "\"1.x\"^^type:float64",
        "\"!!!\"^^type:blob",
        "\"plain\"",
        "42",
    ] {
        assert!(b().parse(text).is_err(), "accepted '{}'", text);
    }
}

#[test]
fn builder_bounds_value_text() {
    let tight = Builder::bounded(4);
    assert!(tight.build_text("abcd").is_ok());
    assert!(tight.build_text("abcde").is_err());
    // The blob bound applies to the encoded form.
    assert!(tight.build_blob(b"abc").is_ok());
    assert!(tight.build_blob(b"abcd").is_err());
    // Parsing honors the same bound.
    assert!(tight.parse("\"abcde\"^^type:text").is_err());
}

#[test]
fn default_builder_is_shared_and_bounded() {
    let builder = default_literal_builder();
    assert_eq!(builder.max_text_len(), DEFAULT_MAX_TEXT_LENGTH);
    let long = "x".repeat(DEFAULT_MAX_TEXT_LENGTH + 1);
    assert!(builder.build_text(&long).is_err());
}

#[test]
fn comparable_strings_order_int64() {
    let values = [-5i64, -1, 0, 1, 10, 2, i64::MIN, i64::MAX];
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mut by_key = values.to_vec();
    by_key.sort_by_key(|v| Literal::Int64(*v).comparable_string());
    assert_eq!(by_key, sorted);
}

#[test]
fn comparable_strings_order_float64() {
    let values = [-2.5f64, -0.1, 0.0, 0.1, 1.5, 100.0, -1000.0];
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("ordered"));
    let mut by_key = values.to_vec();
    by_key.sort_by_key(|v| Literal::Float64(*v).comparable_string());
    assert_eq!(by_key, sorted);
}

#[test]
fn comparable_strings_keep_text_type_suffix() {
    let lit = b().build_text("abc").expect("build");
    assert_eq!(lit.comparable_string(), "\"abc\"^^type:text");
}

#[test]
fn numeric_widening() {
    assert_eq!(Literal::Int64(2).as_f64(), Some(2.0));
    assert_eq!(Literal::Float64(2.5).as_f64(), Some(2.5));
    assert_eq!(b().build_text("x").expect("build").as_f64(), None);
}
