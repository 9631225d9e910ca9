//! Numeric literal scanning.

use crate::token::Token;

use super::Lexer;

impl<'a> Lexer<'a> {
    /// `digit+ ('.' digit+)?`. Always produces a `Number`, even on a
    /// malformed fraction (`parse` failing would be a scanner bug, not a
    /// user error, since every character consumed here is an ASCII digit
    /// or a single `.`).
    pub(super) fn scan_number(&mut self) -> Token {
        let start = self.cursor.position();
        while self.cursor.current().is_ascii_digit() {
            self.cursor.advance();
        }

        if self.cursor.current() == '.' && self.cursor.peek(1).is_ascii_digit() {
            self.cursor.advance();
            while self.cursor.current().is_ascii_digit() {
                self.cursor.advance();
            }
        }

        let end = self.cursor.position();
        let text = self.cursor.slice(start, end);
        let value: f64 = text.parse().expect("scanner only consumed digits and '.'");
        Token::Number(value)
    }
}
