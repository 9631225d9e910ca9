//! loomc-util - shared foundation types for the loom compiler.
//!
//! Every other crate in the workspace depends on this one for the three
//! things a single-pass front end needs everywhere: interned identifiers
//! ([`Symbol`]), source locations ([`Span`]), and diagnostic reporting
//! ([`Handler`], [`DiagnosticBuilder`]).

mod diagnostic;
mod span;
mod symbol;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, Handler, Level};
pub use span::Span;
pub use symbol::Symbol;
