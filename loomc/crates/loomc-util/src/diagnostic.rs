//! Diagnostic collection and reporting.
//!
//! Every error the front end can raise - lexical, syntactic, declaration,
//! reference, or type - funnels through a single [`Handler`]. Nodes never
//! print directly; they build a [`Diagnostic`] and hand it to the handler,
//! which both prints it to standard error and bumps the aggregate count
//! the driver checks before writing output.

use crate::Span;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity. The front end never emits anything above `Error`
/// today, but `Level` stays a proper enum rather than a bool so a future
/// warning pass has somewhere to plug in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
        }
    }
}

/// A single diagnostic message tied to a source location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Span,
}

/// Fluent constructor for a [`Diagnostic`]. The indirection exists so
/// call sites read as `DiagnosticBuilder::error("...").span(s).emit(h)`
/// instead of constructing the struct by hand at every error site.
pub struct DiagnosticBuilder {
    level: Level,
    message: String,
    span: Span,
}

impl DiagnosticBuilder {
    pub fn error(message: impl Into<String>) -> Self {
        Self { level: Level::Error, message: message.into(), span: Span::DUMMY }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: Level::Warning, message: message.into(), span: Span::DUMMY }
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn build(self) -> Diagnostic {
        Diagnostic { level: self.level, message: self.message, span: self.span }
    }

    /// Builds the diagnostic and hands it straight to `handler`.
    pub fn emit(self, handler: &Handler) {
        handler.report(self.build());
    }
}

/// Collects diagnostics for one compilation and prints them as they
/// arrive. `error_count` is what the driver checks to decide whether to
/// write the `.ll` file at all.
pub struct Handler {
    error_count: RefCell<usize>,
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler {
    pub fn new() -> Self {
        Self { error_count: RefCell::new(0) }
    }

    /// Records and prints `diagnostic`. Errors are written in the
    /// `error:<line>: <message>` shape the driver's callers expect.
    pub fn report(&self, diagnostic: Diagnostic) {
        if diagnostic.level == Level::Error {
            *self.error_count.borrow_mut() += 1;
        }
        eprintln!("{}:{}: {}", diagnostic.level, diagnostic.span.line, diagnostic.message);
    }

    /// Convenience for call sites that don't need the builder's span/code
    /// chaining - most of the emitter's error paths are one-liners.
    pub fn error(&self, message: impl Into<String>, span: Span) {
        self.report(Diagnostic { level: Level::Error, message: message.into(), span });
    }

    pub fn has_errors(&self) -> bool {
        *self.error_count.borrow() > 0
    }

    pub fn error_count(&self) -> usize {
        *self.error_count.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporting_an_error_increments_the_count() {
        let handler = Handler::new();
        handler.error("bad thing", Span::new(0, 1, 3, 1));
        assert_eq!(handler.error_count(), 1);
        assert!(handler.has_errors());
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let handler = Handler::new();
        DiagnosticBuilder::warning("unused").span(Span::DUMMY).emit(&handler);
        assert_eq!(handler.error_count(), 0);
        assert!(!handler.has_errors());
    }
}
