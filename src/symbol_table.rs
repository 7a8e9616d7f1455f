//! Compile-time scope tracking: identifier -> declared [`Type`].

use std::collections::HashMap;

use crate::types::Type;

struct Scope {
    bindings: HashMap<String, Type>,
}

/// A stack of scopes, entered/exited on block boundaries by the parser.
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope {
                bindings: HashMap::new(),
            }],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope {
            bindings: HashMap::new(),
        });
    }

    pub fn exit_scope(&mut self) {
        self.scopes.pop();
        debug_assert!(!self.scopes.is_empty(), "popped the root scope");
    }

    /// Declares `name` in the innermost scope. Returns `false` if `name` is
    /// already declared in that same scope (redeclaration).
    pub fn declare(&mut self, name: &str, ty: Type) -> bool {
        let scope = self.scopes.last_mut().expect("at least one scope");
        if scope.bindings.contains_key(name) {
            return false;
        }
        scope.bindings.insert(name.to_string(), ty);
        true
    }

    /// Walks outward from the innermost scope looking for `name`.
    pub fn lookup(&self, name: &str) -> Option<&Type> {
        for scope in self.scopes.iter().rev() {
            if let Some(ty) = scope.bindings.get(name) {
                return Some(ty);
            }
        }
        None
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_and_lookup() {
        let mut st = SymbolTable::new();
        assert!(st.declare("x", Type::Number));
        assert_eq!(st.lookup("x"), Some(&Type::Number));
    }

    #[test]
    fn redeclaration_in_same_scope_rejected() {
        let mut st = SymbolTable::new();
        assert!(st.declare("x", Type::Number));
        assert!(!st.declare("x", Type::String));
    }

    #[test]
    fn shadowing_in_nested_scope_allowed() {
        let mut st = SymbolTable::new();
        st.declare("x", Type::Number);
        st.enter_scope();
        assert!(st.declare("x", Type::String));
        assert_eq!(st.lookup("x"), Some(&Type::String));
        st.exit_scope();
        assert_eq!(st.lookup("x"), Some(&Type::Number));
    }

    #[test]
    fn unknown_identifier_not_found() {
        let st = SymbolTable::new();
        assert_eq!(st.lookup("missing"), None);
    }

    #[test]
    fn outer_scope_visible_from_inner() {
        let mut st = SymbolTable::new();
        st.declare("outer", Type::Bool);
        st.enter_scope();
        assert_eq!(st.lookup("outer"), Some(&Type::Bool));
    }
}
