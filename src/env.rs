//! Runtime environment: a parent-linked tree of frames.
//!
//! Frames are `Arc`-shared rather than `Rc`-shared (the teacher's model for
//! a single-threaded interpreter) because closures captured inside a `par`
//! block must be safely readable and writable from more than one OS thread
//! at once (spec §4.4, §5). Each frame's bindings live behind a
//! `parking_lot::Mutex`, giving the "single writer or a lock" guarantee
//! spec §9 calls for while keeping individual reads/writes to a single
//! `HashMap` operation (no torn reads of a `NUMBER`/`BOOL` value).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::RuntimeError;
use crate::value::Value;

pub struct Environment {
    bindings: Mutex<HashMap<String, Value>>,
    parent: Option<Arc<Environment>>,
}

impl Environment {
    pub fn root() -> Arc<Environment> {
        Arc::new(Environment {
            bindings: Mutex::new(HashMap::new()),
            parent: None,
        })
    }

    pub fn child(parent: &Arc<Environment>) -> Arc<Environment> {
        Arc::new(Environment {
            bindings: Mutex::new(HashMap::new()),
            parent: Some(Arc::clone(parent)),
        })
    }

    /// Binds `name` in this frame, overwriting any existing binding in the
    /// same frame (used for declarations, which the parser already checked
    /// for redeclaration, and for closure parameter binding).
    pub fn define(&self, name: &str, value: Value) {
        self.bindings.lock().insert(name.to_string(), value);
    }

    /// Walks outward looking for `name` and returns a clone of its value.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.bindings.lock().get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Mutates the innermost frame that already contains `name`. Returns a
    /// `RuntimeError::UndeclaredIdentifier` if no frame in the chain has it
    /// (should be unreachable after the parser's scope checking).
    pub fn set(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        {
            let mut bindings = self.bindings.lock();
            if bindings.contains_key(name) {
                bindings.insert(name.to_string(), value);
                return Ok(());
            }
        }
        match &self.parent {
            Some(p) => p.set(name, value),
            None => Err(RuntimeError::UndeclaredIdentifier(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let env = Environment::root();
        env.define("x", Value::Number(1.0));
        assert!(matches!(env.get("x"), Some(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn undefined_identifier_is_none() {
        let env = Environment::root();
        assert!(env.get("missing").is_none());
    }

    #[test]
    fn parent_lookup() {
        let parent = Environment::root();
        parent.define("x", Value::Number(1.0));
        let child = Environment::child(&parent);
        assert!(matches!(child.get("x"), Some(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn set_mutates_innermost_owning_frame() {
        let parent = Environment::root();
        parent.define("x", Value::Number(1.0));
        let child = Environment::child(&parent);
        child.set("x", Value::Number(2.0)).unwrap();
        assert!(matches!(parent.get("x"), Some(Value::Number(n)) if n == 2.0));
    }

    #[test]
    fn set_on_undeclared_name_errors() {
        let env = Environment::root();
        assert!(env.set("missing", Value::Number(1.0)).is_err());
    }

    #[test]
    fn shadowing_in_child_frame_does_not_affect_parent() {
        let parent = Environment::root();
        parent.define("x", Value::Number(1.0));
        let child = Environment::child(&parent);
        child.define("x", Value::Number(99.0));
        assert!(matches!(child.get("x"), Some(Value::Number(n)) if n == 99.0));
        assert!(matches!(parent.get("x"), Some(Value::Number(n)) if n == 1.0));
    }
}
