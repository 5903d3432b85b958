//! Lexical environments.
//!
//! Reference-counted records forming a singly-linked parent chain. A
//! frame only ever mutates the head it owns (creating child environments
//! or writing bindings resolved through the chain), never the structure
//! of ancestor environments.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

use crate::object::{ObjectHandle, PropertyKey};
use crate::value::Value;

/// One binding in a declarative record.
#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

enum EnvRecord {
    Declarative(IndexMap<Rc<str>, Binding>),
    ObjectBound(ObjectHandle),
}

struct EnvData {
    record: RefCell<EnvRecord>,
    parent: Option<Environment>,
}

/// Outcome of a bound assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// The binding was updated.
    Done,
    /// No binding with that name exists anywhere in the chain.
    NotFound,
    /// The nearest binding is immutable (`const`).
    Immutable,
}

/// A lexical environment handle (shared, ref-counted).
#[derive(Clone)]
pub struct Environment(Rc<EnvData>);

impl Environment {
    /// Create a declarative record (function scope, block scope, catch
    /// scope).
    pub fn declarative(parent: Option<Environment>) -> Environment {
        Environment(Rc::new(EnvData {
            record: RefCell::new(EnvRecord::Declarative(IndexMap::new())),
            parent,
        }))
    }

    /// Create an object-bound record (`with`, the global environment).
    pub fn object_bound(parent: Option<Environment>, object: ObjectHandle) -> Environment {
        Environment(Rc::new(EnvData {
            record: RefCell::new(EnvRecord::ObjectBound(object)),
            parent,
        }))
    }

    /// The parent environment, if any.
    pub fn parent(&self) -> Option<Environment> {
        self.0.parent.clone()
    }

    /// Handle identity.
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The bound object of an object-bound record.
    pub fn binding_object(&self) -> Option<ObjectHandle> {
        match &*self.0.record.borrow() {
            EnvRecord::ObjectBound(object) => Some(object.clone()),
            EnvRecord::Declarative(_) => None,
        }
    }

    /// Create (or overwrite) a binding in this record.
    pub fn create_binding(&self, name: &str, value: Value, mutable: bool) {
        match &mut *self.0.record.borrow_mut() {
            EnvRecord::Declarative(bindings) => {
                bindings.insert(name.into(), Binding { value, mutable });
            }
            EnvRecord::ObjectBound(object) => {
                object.set(&PropertyKey::from_str(name), value);
            }
        }
    }

    /// Whether this single record binds `name`.
    pub fn has_binding(&self, name: &str) -> bool {
        match &*self.0.record.borrow() {
            EnvRecord::Declarative(bindings) => bindings.contains_key(name),
            EnvRecord::ObjectBound(object) => object.has(&PropertyKey::from_str(name)),
        }
    }

    /// Resolve an identifier through the chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut cursor = Some(self.clone());
        while let Some(env) = cursor {
            match &*env.0.record.borrow() {
                EnvRecord::Declarative(bindings) => {
                    if let Some(binding) = bindings.get(name) {
                        return Some(binding.value.clone());
                    }
                }
                EnvRecord::ObjectBound(object) => {
                    if let Some(value) = object.get(&PropertyKey::from_str(name)) {
                        return Some(value);
                    }
                }
            }
            cursor = env.parent();
        }
        None
    }

    /// Resolve the environment holding `name`, if any.
    pub fn resolve(&self, name: &str) -> Option<Environment> {
        let mut cursor = Some(self.clone());
        while let Some(env) = cursor {
            if env.has_binding(name) {
                return Some(env);
            }
            cursor = env.parent();
        }
        None
    }

    /// Bound assignment through the chain.
    pub fn set(&self, name: &str, value: Value) -> SetOutcome {
        let mut cursor = Some(self.clone());
        while let Some(env) = cursor {
            match &mut *env.0.record.borrow_mut() {
                EnvRecord::Declarative(bindings) => {
                    if let Some(binding) = bindings.get_mut(name) {
                        if !binding.mutable {
                            return SetOutcome::Immutable;
                        }
                        binding.value = value;
                        return SetOutcome::Done;
                    }
                }
                EnvRecord::ObjectBound(object) => {
                    if object.has(&PropertyKey::from_str(name)) {
                        object.set(&PropertyKey::from_str(name), value);
                        return SetOutcome::Done;
                    }
                }
            }
            cursor = env.parent();
        }
        SetOutcome::NotFound
    }

    /// Delete a binding (non-strict `delete identifier`). Only
    /// object-bound records honour deletion.
    pub fn delete_binding(&self, name: &str) -> bool {
        let mut cursor = Some(self.clone());
        while let Some(env) = cursor {
            match &mut *env.0.record.borrow_mut() {
                EnvRecord::Declarative(bindings) => {
                    if bindings.contains_key(name) {
                        return false;
                    }
                }
                EnvRecord::ObjectBound(object) => {
                    let key = PropertyKey::from_str(name);
                    if object.has_own(&key) {
                        return object.delete(&key);
                    }
                }
            }
            cursor = env.parent();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_chain() {
        let outer = Environment::declarative(None);
        outer.create_binding("x", Value::Integer(1), true);
        let inner = Environment::declarative(Some(outer));
        assert_eq!(inner.lookup("x"), Some(Value::Integer(1)));
        assert_eq!(inner.lookup("y"), None);
    }

    #[test]
    fn test_shadowing() {
        let outer = Environment::declarative(None);
        outer.create_binding("x", Value::Integer(1), true);
        let inner = Environment::declarative(Some(outer.clone()));
        inner.create_binding("x", Value::Integer(2), true);
        assert_eq!(inner.lookup("x"), Some(Value::Integer(2)));
        assert_eq!(outer.lookup("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn test_set_immutable() {
        let env = Environment::declarative(None);
        env.create_binding("c", Value::Integer(1), false);
        assert_eq!(env.set("c", Value::Integer(2)), SetOutcome::Immutable);
        assert_eq!(env.lookup("c"), Some(Value::Integer(1)));
    }

    #[test]
    fn test_object_bound_record() {
        let obj = ObjectHandle::ordinary(None);
        obj.set(&PropertyKey::from_str("prop"), Value::Integer(9));
        let env = Environment::object_bound(None, obj.clone());
        assert_eq!(env.lookup("prop"), Some(Value::Integer(9)));
        assert_eq!(env.set("prop", Value::Integer(10)), SetOutcome::Done);
        assert_eq!(
            obj.get(&PropertyKey::from_str("prop")),
            Some(Value::Integer(10))
        );
    }

    #[test]
    fn test_set_not_found() {
        let env = Environment::declarative(None);
        assert_eq!(env.set("missing", Value::Null), SetOutcome::NotFound);
    }
}
