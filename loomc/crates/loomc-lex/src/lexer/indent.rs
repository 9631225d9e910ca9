//! Newline handling: counts leading tabs and synthesizes `Indent`/`Dedent`.

use crate::token::{Tag, Token};

use super::Lexer;

impl<'a> Lexer<'a> {
    /// If a previous line dropped more than one indent level, this drains
    /// the remaining `Dedent`s one per call before any more source is
    /// scanned.
    pub(super) fn next_pending_dedent(&mut self) -> Option<Token> {
        let target = self.pending_dedent_target?;
        if self.indent_level > target {
            self.indent_level -= 1;
            Some(Token::Simple(Tag::Dedent))
        } else {
            self.pending_dedent_target = None;
            None
        }
    }

    /// Consumes the `\n` at the cursor and however many leading tabs
    /// follow it. Returns `Some(token)` when a structural token should be
    /// yielded, or `None` to keep scanning (a blank line, or a line whose
    /// indent matches the current level).
    pub(super) fn consume_newline(&mut self) -> Option<Token> {
        self.cursor.advance();
        let tabs = self.count_leading_tabs();

        if tabs == self.indent_level {
            if self.rest_of_line_is_blank() && self.indent_level > 0 {
                self.indent_level -= 1;
                return Some(Token::Simple(Tag::Dedent));
            }
            return None;
        }

        if tabs > self.indent_level {
            if tabs > self.indent_level + 1 {
                self.report_error("indentation jumps by more than one level");
            }
            self.indent_level = tabs;
            return Some(Token::Simple(Tag::Indent));
        }

        if tabs < self.indent_level {
            self.indent_level -= 1;
            if tabs < self.indent_level {
                self.pending_dedent_target = Some(tabs);
            }
            return Some(Token::Simple(Tag::Dedent));
        }

        None
    }

    fn count_leading_tabs(&mut self) -> u32 {
        let mut tabs = 0;
        while self.cursor.current() == '\t' {
            self.cursor.advance();
            tabs += 1;
        }
        tabs
    }

    fn rest_of_line_is_blank(&self) -> bool {
        let mut offset = 0;
        loop {
            match self.cursor.peek(offset) {
                ' ' | '\r' => offset += 1,
                '\n' | '\0' => return true,
                _ => return false,
            }
        }
    }
}
