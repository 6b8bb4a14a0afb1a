use super::*;

fn kinds(src: &str) -> Vec<TokenKind> {
    lex(src).unwrap().into_iter().map(|t| t.kind).collect()
}

#[test]
fn lexes_numbers_in_all_forms() {
    assert_eq!(
        kinds("42 1.5 .5 2. 1e3 2.5E-1"),
        vec![
            TokenKind::Number(42.0),
            TokenKind::Number(1.5),
            TokenKind::Number(0.5),
            TokenKind::Number(2.0),
            TokenKind::Number(1000.0),
            TokenKind::Number(0.25),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn two_char_operators_win_over_single() {
    assert_eq!(
        kinds("x&^y<<2>>1&3"),
        vec![
            TokenKind::Ident("x".to_owned()),
            TokenKind::AmpCaret,
            TokenKind::Ident("y".to_owned()),
            TokenKind::Shl,
            TokenKind::Number(2.0),
            TokenKind::Shr,
            TokenKind::Number(1.0),
            TokenKind::Amp,
            TokenKind::Number(3.0),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn spans_cover_source_bytes() {
    let toks = lex("  frame % 7").unwrap();
    assert_eq!(toks[0].span, Span { start: 2, end: 7 });
    assert_eq!(toks[1].span, Span { start: 8, end: 9 });
    assert_eq!(toks[3].span, Span { start: 11, end: 11 });
}

#[test]
fn rejects_unknown_characters_with_offset() {
    let err = lex("x + y == 3").unwrap_err();
    assert_eq!(err.offset, 6);
    assert!(err.message.contains("'='"), "{}", err.message);

    let err = lex("x ≥ y").unwrap_err();
    assert_eq!(err.offset, 2);
    assert!(err.message.contains('≥'), "{}", err.message);
}

#[test]
fn rejects_malformed_literals() {
    let err = lex("1e+").unwrap_err();
    assert_eq!(err.offset, 1);

    let err = lex("3 * 12abc").unwrap_err();
    assert_eq!(err.offset, 4);
    assert!(err.message.contains("12abc"), "{}", err.message);

    let err = lex("1 + 1e400").unwrap_err();
    assert_eq!(err.offset, 4);
    assert!(err.message.contains("out of range"), "{}", err.message);
}

#[test]
fn token_display_names_the_text() {
    assert_eq!(TokenKind::AmpCaret.to_string(), "'&^'");
    assert_eq!(TokenKind::Ident("foo".to_owned()).to_string(), "identifier 'foo'");
    assert_eq!(TokenKind::Eof.to_string(), "end of input");
}
