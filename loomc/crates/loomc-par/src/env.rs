//! Lexically-scoped name resolution.
//!
//! A scope maps a [`Symbol`] to the [`DeclId`] of the slot it names. Scopes
//! nest: a new one is pushed on entry to a function body, an `if`/`else`
//! branch, a loop body, or a `for`-init region, and popped on exit. Lookup
//! walks outward from the current scope to the root.

use rustc_hash::FxHashMap;

use loomc_util::Symbol;

use crate::ast::DeclId;

#[derive(Default)]
struct Scope {
    bindings: FxHashMap<Symbol, DeclId>,
}

/// The scope stack. The innermost (current) scope is the last element.
pub struct Env {
    scopes: Vec<Scope>,
}

impl Env {
    pub fn new() -> Self {
        Self { scopes: vec![Scope::default()] }
    }

    /// Pushes a fresh child scope. Pair with [`Env::pop`] on every exit
    /// path - callers use a scope guard (see `crate::parser`) rather than
    /// calling this directly.
    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
        debug_assert!(!self.scopes.is_empty(), "popped the root scope");
    }

    /// Adds `name` to the current scope. Callers that disallow shadowing
    /// within one scope must check [`Env::get_current`] first.
    pub fn insert(&mut self, name: Symbol, decl: DeclId) {
        self.scopes.last_mut().expect("root scope always present").bindings.insert(name, decl);
    }

    /// Lookup restricted to the current (innermost) scope - used by
    /// declarations to detect redefinition.
    pub fn get_current(&self, name: Symbol) -> Option<DeclId> {
        self.scopes.last().and_then(|scope| scope.bindings.get(&name).copied())
    }

    /// Lookup in the current scope, walking parents until found or the
    /// root is exhausted.
    pub fn get(&self, name: Symbol) -> Option<DeclId> {
        self.scopes.iter().rev().find_map(|scope| scope.bindings.get(&name).copied())
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_up_to_parent_scope() {
        let mut env = Env::new();
        env.insert(Symbol::intern("x"), DeclId(0));
        env.push();
        assert_eq!(env.get(Symbol::intern("x")), Some(DeclId(0)));
        assert_eq!(env.get_current(Symbol::intern("x")), None);
    }

    #[test]
    fn shadowing_in_a_child_scope_does_not_affect_parent() {
        let mut env = Env::new();
        env.insert(Symbol::intern("shadowed"), DeclId(0));
        env.push();
        env.insert(Symbol::intern("shadowed"), DeclId(1));
        assert_eq!(env.get(Symbol::intern("shadowed")), Some(DeclId(1)));
        env.pop();
        assert_eq!(env.get(Symbol::intern("shadowed")), Some(DeclId(0)));
    }

    #[test]
    fn get_current_does_not_see_sibling_scopes() {
        let mut env = Env::new();
        env.push();
        env.insert(Symbol::intern("a"), DeclId(0));
        env.pop();
        env.push();
        assert_eq!(env.get_current(Symbol::intern("a")), None);
    }
}
