use super::*;

/// Collect (kind, text) pairs from an input.
fn scan(input: &str) -> Vec<(TokenKind, String)> {
    tokenize(input, "<test>")
        .expect("tokenize")
        .into_iter()
        .map(|t| (t.kind, t.text))
        .collect()
}

fn texts(input: &str) -> Vec<String> {
    scan(input).into_iter().map(|(_, t)| t).collect()
}

#[test]
fn numbers_with_separators_and_radix_prefixes() {
    assert_eq!(
        scan("1_000 0xFF 0b1010 3.14"),
        vec![
            (TokenKind::Int, "1000".to_string()),
            (TokenKind::Int, "0xFF".to_string()),
            (TokenKind::Int, "0b1010".to_string()),
            (TokenKind::Decimal, "3.14".to_string()),
        ]
    );
}

#[test]
fn dot_digit_switches_to_decimal_but_spread_does_not() {
    assert_eq!(
        scan("12.5"),
        vec![(TokenKind::Decimal, "12.5".to_string())]
    );
    assert_eq!(
        scan("...xs"),
        vec![
            (TokenKind::Operator, "...".to_string()),
            (TokenKind::Identifier, "xs".to_string()),
        ]
    );
}

#[test]
fn malformed_number_is_a_lexical_error() {
    assert!(tokenize("12abc", "<test>").is_err());
    assert!(tokenize("0x", "<test>").is_err());
    assert!(tokenize("0b2", "<test>").is_err());
}

#[test]
fn string_escapes_are_decoded() {
    assert_eq!(
        scan(r#"'a\nb' "x\x41y" '\q'"#),
        vec![
            (TokenKind::Str, "a\nb".to_string()),
            (TokenKind::Str, "xAy".to_string()),
            (TokenKind::Str, "q".to_string()),
        ]
    );
}

#[test]
fn unterminated_string_and_pattern_fail() {
    assert!(tokenize("'abc", "<test>").is_err());
    assert!(tokenize("//ab", "<test>").is_err());
}

#[test]
fn pattern_body_is_verbatim() {
    assert_eq!(
        scan(r"//\d+//"),
        vec![(TokenKind::Pattern, r"\d+".to_string())]
    );
}

#[test]
fn longest_match_punctuation() {
    assert_eq!(
        texts("<<< << <* <= < >>> >> >= > == => = != !> ! -> -= - *> *= * += /= %="),
        vec![
            "<<<", "<<", "<*", "<=", "<", ">>>", ">>", ">=", ">", "==", "=>", "=", "!=", "!>",
            "!", "->", "-=", "-", "*>", "*=", "*", "+=", "/=", "%=",
        ]
    );
}

#[test]
fn keywords_and_booleans_are_retagged() {
    assert_eq!(
        scan("if TRUE then x"),
        vec![
            (TokenKind::Keyword, "if".to_string()),
            (TokenKind::Boolean, "TRUE".to_string()),
            (TokenKind::Keyword, "then".to_string()),
            (TokenKind::Identifier, "x".to_string()),
        ]
    );
}

#[test]
fn comments_never_reach_the_stream() {
    assert_eq!(
        scan("1 # comment with 'tokens' == junk\n2"),
        vec![
            (TokenKind::Int, "1".to_string()),
            (TokenKind::Int, "2".to_string()),
        ]
    );
}

#[test]
fn crlf_and_lf_produce_identical_streams_and_positions() {
    let lf = tokenize("def a = 1\ndef b = 2\n", "<test>").expect("lf");
    let crlf = tokenize("def a = 1\r\ndef b = 2\r\n", "<test>").expect("crlf");
    assert_eq!(lf.len(), crlf.len());
    for (a, b) in lf.iter().zip(crlf.iter()) {
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.text, b.text);
        assert_eq!(a.pos.line, b.pos.line);
        assert_eq!(a.pos.column, b.pos.column);
    }
}

#[test]
fn positions_are_one_based() {
    let toks = tokenize("a\n  bb", "<test>").expect("tokenize");
    assert_eq!((toks[0].pos.line, toks[0].pos.column), (1, 1));
    assert_eq!((toks[1].pos.line, toks[1].pos.column), (2, 3));
}
