use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::object::Object;

/// A lexical scope: a name→value map with an optional link to an outer
/// scope. Environments are always held behind `Rc<RefCell<_>>` so that
/// function values can share ownership of the environment they close over.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Object>,
    outer: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: None,
        }))
    }

    pub fn enclosed(outer: Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: Some(outer),
        }))
    }

    /// Walks inner to outer looking for `name`.
    pub fn get(env: &Rc<RefCell<Environment>>, name: &str) -> Option<Object> {
        let this = env.borrow();
        match this.store.get(name) {
            Some(value) => Some(value.clone()),
            None => match &this.outer {
                Some(outer) => Environment::get(outer, name),
                None => None,
            },
        }
    }

    /// Introduces or overwrites a binding in the innermost environment.
    pub fn set(env: &Rc<RefCell<Environment>>, name: impl Into<String>, value: Object) {
        env.borrow_mut().store.insert(name.into(), value);
    }

    /// Mutates the nearest existing binding for `name`. Returns `false` if no
    /// enclosing scope defines `name`.
    pub fn assign(env: &Rc<RefCell<Environment>>, name: &str, value: Object) -> bool {
        if env.borrow().store.contains_key(name) {
            env.borrow_mut().store.insert(name.to_string(), value);
            return true;
        }
        let outer = env.borrow().outer.clone();
        match outer {
            Some(outer) => Environment::assign(&outer, name, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_falls_through_to_outer() {
        let outer = Environment::new();
        Environment::set(&outer, "x", Object::Integer(1));
        let inner = Environment::enclosed(outer);

        assert!(matches!(
            Environment::get(&inner, "x"),
            Some(Object::Integer(1))
        ));
    }

    #[test]
    fn test_set_only_touches_innermost_scope() {
        let outer = Environment::new();
        Environment::set(&outer, "x", Object::Integer(1));
        let inner = Environment::enclosed(outer.clone());
        Environment::set(&inner, "x", Object::Integer(2));

        assert!(matches!(
            Environment::get(&outer, "x"),
            Some(Object::Integer(1))
        ));
        assert!(matches!(
            Environment::get(&inner, "x"),
            Some(Object::Integer(2))
        ));
    }

    #[test]
    fn test_assign_mutates_nearest_existing_binding() {
        let outer = Environment::new();
        Environment::set(&outer, "x", Object::Integer(1));
        let inner = Environment::enclosed(outer.clone());

        assert!(Environment::assign(&inner, "x", Object::Integer(99)));
        assert!(matches!(
            Environment::get(&outer, "x"),
            Some(Object::Integer(99))
        ));
    }

    #[test]
    fn test_assign_fails_when_undefined() {
        let env = Environment::new();
        assert!(!Environment::assign(&env, "missing", Object::Integer(1)));
    }
}
