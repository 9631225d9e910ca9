//! Scanner implementation, split by concern:
//! - `indent` - newline handling and `Indent`/`Dedent` synthesis
//! - `number` - numeric literals
//! - `identifier` - identifiers and reserved-word lookup

mod identifier;
mod indent;
mod number;

use loomc_util::{DiagnosticBuilder, Handler, Span};

use crate::cursor::Cursor;
use crate::token::{Tag, Token};

/// Scans source text into [`Token`]s on demand. Stateful: it remembers
/// the current indent level and, while unwinding several nested blocks
/// at once, how many more `Dedent`s still owe before it may resume
/// scanning ordinary content.
pub struct Lexer<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) handler: &'a Handler,
    pub(crate) indent_level: u32,
    pub(crate) pending_dedent_target: Option<u32>,
    token_start: usize,
    token_start_line: u32,
    token_start_column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            indent_level: 0,
            pending_dedent_target: None,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    /// Returns the next token, or `Token::Simple(Tag::Eof)` at end of
    /// input. Synthesized `Indent`/`Dedent` tokens are returned without
    /// consuming any further characters than the newline that produced
    /// them.
    pub fn scan(&mut self) -> Token {
        if let Some(dedent) = self.next_pending_dedent() {
            return dedent;
        }

        loop {
            self.skip_intra_line_whitespace();

            if self.cursor.is_at_end() {
                return Token::Simple(Tag::Eof);
            }

            if self.cursor.current() == '\n' {
                if let Some(token) = self.consume_newline() {
                    return token;
                }
                continue;
            }

            break;
        }

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        self.scan_content_token()
    }

    fn scan_content_token(&mut self) -> Token {
        let c = self.cursor.current();
        match c {
            '(' | ')' | '+' | '-' | '*' | '/' | ',' | ';' | '[' | ']' => {
                self.cursor.advance();
                Token::Simple(Tag::Char(c))
            }
            '&' => self.two_char('&', Tag::And, Tag::Char('&')),
            '|' => self.two_char('|', Tag::Or, Tag::Char('|')),
            '=' => self.two_char('=', Tag::Eq, Tag::Char('=')),
            '!' => self.two_char('=', Tag::Ne, Tag::Char('!')),
            '<' => self.two_char('=', Tag::Le, Tag::Char('<')),
            '>' => self.two_char('=', Tag::Ge, Tag::Char('>')),
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),
            c => {
                self.report_error(format!("unexpected character '{}'", c));
                self.cursor.advance();
                Token::Simple(Tag::Char(c))
            }
        }
    }

    /// Resolves a two-character operator via one character of lookahead:
    /// if `second` follows the current char, consume both and return
    /// `wide`; otherwise consume just the current char and return
    /// `narrow`.
    fn two_char(&mut self, second: char, wide: Tag, narrow: Tag) -> Token {
        self.cursor.advance();
        if self.cursor.current() == second {
            self.cursor.advance();
            Token::Simple(wide)
        } else {
            Token::Simple(narrow)
        }
    }

    fn skip_intra_line_whitespace(&mut self) {
        while matches!(self.cursor.current(), ' ' | '\t' | '\r') {
            self.cursor.advance();
        }
    }

    pub(crate) fn report_error(&mut self, message: impl Into<String>) {
        let span = Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_start_line,
            self.token_start_column,
        );
        DiagnosticBuilder::error(message).span(span).emit(self.handler);
    }

    pub fn line(&self) -> u32 {
        self.cursor.line()
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        match self.scan() {
            Token::Simple(Tag::Eof) => None,
            token => Some(token),
        }
    }
}
