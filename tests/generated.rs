// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.
//
// Lexer built from generated static tables (see `tests/out`, kept in sync with the generator by
// `lexergen_generated_source` in the library tests).

#![cfg(test)]

mod out;

use std::io::Cursor;
use nfalex_core::char_reader::CharReader;
use nfalex_core::lexer::{Lexer, LexerError};
use out::build_lexer;

#[test]
fn generated_lexer_tokens() {
    let mut lexer: Lexer<CharReader<Cursor<&str>>> = build_lexer();
    let tests: Vec<(&str, Vec<(u16, &str)>)> = vec![
        ("abc", vec![(10, "abc")]),
        ("ab\tĀǿz  x", vec![(10, "ab"), (10, "Āǿz"), (10, "x")]),
        ("", vec![]),
    ];
    for (idx, (input, expected)) in tests.into_iter().enumerate() {
        lexer.attach_stream(CharReader::new(Cursor::new(input)));
        let tokens = lexer.tokens().map(|(kind, ch, text, _)| (kind, ch, text)).collect::<Vec<_>>();
        let expected = expected.into_iter().map(|(kind, text)| (kind, 0, text.to_string())).collect::<Vec<_>>();
        assert_eq!(tokens, expected, "test {idx} failed");
    }
}

#[test]
fn generated_lexer_errors() {
    let mut lexer: Lexer<CharReader<Cursor<&str>>> = build_lexer();
    lexer.attach_stream(CharReader::new(Cursor::new("ab ȀZ")));
    assert!(matches!(lexer.get_token(), Ok(Some((10, 0, text, _))) if text == "ab"));
    match lexer.get_token() {
        Err(LexerError::UnrecognizedChar { info }) => {
            assert_eq!(info.curr_char, Some('Ȁ'));
            assert_eq!((info.line, info.col), (1, 4));
        }
        other => panic!("unexpected result {other:?}"),
    }
}
