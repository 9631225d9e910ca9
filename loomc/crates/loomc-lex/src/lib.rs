//! loomc-lex - the indentation-sensitive scanner.
//!
//! Converts source text into a lazy stream of [`Token`]s, synthesizing
//! `Indent`/`Dedent` tokens from leading tabs the way Python's tokenizer
//! does. The scanner never looks more than one character ahead; two-char
//! operators are resolved with a single `peek`.

mod cursor;
mod lexer;
mod token;

#[cfg(test)]
mod tests;

pub use lexer::Lexer;
pub use token::{reserved_word, Tag, Token};
