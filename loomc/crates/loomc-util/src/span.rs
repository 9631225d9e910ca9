//! Source locations.
//!
//! The language is single-file, so a [`Span`] only needs to carry a byte
//! range and a 1-based line/column pair - there is no `FileId` to thread
//! through, unlike a multi-module front end.

/// A range of source text, used for error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self { start, end, line, column }
    }

    /// A placeholder span for nodes synthesized by the compiler itself
    /// rather than parsed from source (e.g. the implicit `ret i32 0`).
    pub const DUMMY: Span = Span { start: 0, end: 0, line: 0, column: 0 };
}
