//! Identifier and keyword scanning.

use loomc_util::Symbol;

use crate::token::{reserved_word, Tag, Token};

use super::Lexer;

impl<'a> Lexer<'a> {
    /// `letter (letter | digit | '_')*`. Looks the lexeme up in the
    /// reserved-word table; a hit returns the keyword's tag, a miss
    /// interns the text as a fresh identifier. Interning is what gives
    /// repeated occurrences of the same name identical `Symbol`s.
    pub(super) fn scan_identifier(&mut self) -> Token {
        let start = self.cursor.position();
        while matches!(self.cursor.current(), c if c.is_ascii_alphanumeric() || c == '_') {
            self.cursor.advance();
        }
        let text = self.cursor.slice(start, self.cursor.position());

        let tag = reserved_word(text).unwrap_or(Tag::Id);
        Token::Word(tag, Symbol::intern(text))
    }
}
