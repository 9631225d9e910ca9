//! Interned identifiers.
//!
//! The scanner produces a fresh `Word` token for every identifier it reads,
//! but repeated occurrences of the same lexeme (a variable referenced ten
//! times, say) must compare and hash in O(1) and should not duplicate the
//! backing string. [`Symbol`] is a 4-byte handle into a process-wide,
//! thread-safe string table; interning the same text twice always returns
//! the same handle.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

/// A handle to an interned string. Cheap to copy, compare, and hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

struct Interner {
    strings: DashMap<&'static str, u32, ahash::RandomState>,
    by_index: DashMap<u32, &'static str, ahash::RandomState>,
    next: AtomicU32,
}

fn interner() -> &'static Interner {
    static TABLE: OnceLock<Interner> = OnceLock::new();
    TABLE.get_or_init(|| Interner {
        strings: DashMap::with_hasher(ahash::RandomState::new()),
        by_index: DashMap::with_hasher(ahash::RandomState::new()),
        next: AtomicU32::new(0),
    })
}

impl Symbol {
    /// Interns `text`, returning the symbol for it. Calling this twice with
    /// the same string is guaranteed to return equal symbols.
    pub fn intern(text: &str) -> Symbol {
        let table = interner();
        if let Some(existing) = table.strings.get(text) {
            return Symbol(*existing);
        }

        let leaked: &'static str = Box::leak(text.to_owned().into_boxed_str());
        let index = table.next.fetch_add(1, Ordering::Relaxed);
        table.strings.insert(leaked, index);
        table.by_index.insert(index, leaked);
        Symbol(index)
    }

    /// The original text this symbol was interned from.
    pub fn as_str(&self) -> &'static str {
        *interner()
            .by_index
            .get(&self.0)
            .expect("symbol not present in interner")
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_interning_returns_identical_symbol() {
        let a = Symbol::intern("count");
        let b = Symbol::intern("count");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_text_interns_distinct_symbols() {
        let a = Symbol::intern("a");
        let b = Symbol::intern("b");
        assert_ne!(a, b);
    }

    #[test]
    fn as_str_round_trips() {
        let sym = Symbol::intern("total");
        assert_eq!(sym.as_str(), "total");
    }
}
