use loomc_util::Handler;

use crate::{Lexer, Tag, Token};

fn scan_all(source: &str) -> Vec<Tag> {
    let handler = Handler::new();
    let mut lexer = Lexer::new(source, &handler);
    let mut tags = Vec::new();
    loop {
        let token = Lexer::scan(&mut lexer);
        let tag = token.tag();
        if tag == Tag::Eof {
            break;
        }
        tags.push(tag);
    }
    tags
}

#[test]
fn simple_operators_and_numbers() {
    let tags = scan_all("1 + 2");
    assert_eq!(tags, vec![Tag::Num, Tag::Char('+'), Tag::Num]);
}

#[test]
fn two_char_operators_resolve_over_single_char() {
    let tags = scan_all("a <= b && c");
    assert_eq!(tags, vec![Tag::Id, Tag::Le, Tag::Id, Tag::And, Tag::Id]);
}

#[test]
fn lone_ampersand_is_not_an_operator_error() {
    let handler = Handler::new();
    let mut lexer = Lexer::new("a & b", &handler);
    let tags: Vec<_> = std::iter::from_fn(|| {
        let t = Lexer::scan(&mut lexer);
        (!t.is(Tag::Eof)).then_some(t.tag())
    })
    .collect();
    assert_eq!(tags, vec![Tag::Id, Tag::Char('&'), Tag::Id]);
    assert!(!handler.has_errors());
}

#[test]
fn keywords_are_recognized() {
    let tags = scan_all("if while fun let");
    assert_eq!(tags, vec![Tag::If, Tag::While, Tag::Fun, Tag::Let]);
}

#[test]
fn indent_and_dedent_bracket_a_block() {
    let source = "fun f()\n\tlet x = 1\nfun g()\n\tlet y = 2";
    let tags = scan_all(source);
    let indents = tags.iter().filter(|t| **t == Tag::Indent).count();
    let dedents = tags.iter().filter(|t| **t == Tag::Dedent).count();
    assert_eq!(indents, dedents);
    assert_eq!(indents, 2);
}

#[test]
fn nested_dedent_unwinds_multiple_levels() {
    let source = "fun f()\n\tif true\n\t\tlet x = 1\nlet y = 2";
    let tags = scan_all(source);
    let dedent_positions: Vec<usize> =
        tags.iter().enumerate().filter(|(_, t)| **t == Tag::Dedent).map(|(i, _)| i).collect();
    assert_eq!(dedent_positions.len(), 2);
}

#[test]
fn repeated_identifier_interns_to_equal_symbol() {
    let handler = Handler::new();
    let mut lexer = Lexer::new("count count", &handler);
    let first = Lexer::scan(&mut lexer);
    let second = Lexer::scan(&mut lexer);
    match (first, second) {
        (Token::Word(_, a), Token::Word(_, b)) => assert_eq!(a, b),
        other => panic!("expected two Word tokens, got {other:?}"),
    }
}

#[test]
fn fractional_number_literal() {
    let handler = Handler::new();
    let mut lexer = Lexer::new("3.14", &handler);
    match Lexer::scan(&mut lexer) {
        Token::Number(n) => assert!((n - 3.14).abs() < 1e-9),
        other => panic!("expected Number, got {other:?}"),
    }
}

#[test]
fn blank_line_at_a_lower_indent_still_dedents() {
    // The blank line between the two statements has zero leading tabs,
    // which is less than the block's indent level of one - it must still
    // trigger the unconditional "less" branch, not be swallowed as if it
    // matched the current level.
    let source = "fun f()\n\tlet x = 1\n\nlet y = 2";
    let tags = scan_all(source);
    let indents = tags.iter().filter(|t| **t == Tag::Indent).count();
    let dedents = tags.iter().filter(|t| **t == Tag::Dedent).count();
    assert_eq!(indents, 1);
    assert_eq!(dedents, 1);
}

#[test]
fn indentation_jump_of_more_than_one_level_is_reported() {
    let handler = Handler::new();
    let source = "fun f()\n\t\tlet x = 1";
    let mut lexer = Lexer::new(source, &handler);
    while !Lexer::scan(&mut lexer).is(Tag::Eof) {}
    assert!(handler.has_errors());
}
