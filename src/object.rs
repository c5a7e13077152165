use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use once_cell::sync::Lazy;

use crate::ast::Statement;
use crate::environment::Environment;

pub static NULL: Lazy<Object> = Lazy::new(|| Object::Null);
pub static TRUE: Lazy<Object> = Lazy::new(|| Object::Boolean(true));
pub static FALSE: Lazy<Object> = Lazy::new(|| Object::Boolean(false));

pub type BuiltinFn = fn(&[Object]) -> Object;

#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    Str(Rc<String>),
    Null,
    Array(Rc<RefCell<Vec<Object>>>),
    Hash(Rc<RefCell<HashMap<HashKey, (Object, Object)>>>),
    Function(Rc<FunctionObj>),
    Builtin(&'static str, BuiltinFn),
    ReturnValue(Box<Object>),
    Break,
    Continue,
    Error(String),
}

#[derive(Debug)]
pub struct FunctionObj {
    pub parameters: Vec<String>,
    pub body: Vec<Statement>,
    pub env: Rc<RefCell<Environment>>,
}

/// A key derived from a [`Hashable`] object. Two equal-valued hashable
/// objects of the same kind always collapse to the same `HashKey`, even if
/// they are distinct allocations (e.g. two separately constructed strings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    tag: &'static str,
    hash: u64,
}

pub trait Hashable {
    fn hash_key(&self) -> Option<HashKey>;
}

impl Hashable for Object {
    fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(i) => Some(HashKey {
                tag: "INTEGER",
                hash: *i as u64,
            }),
            Object::Boolean(b) => Some(HashKey {
                tag: "BOOLEAN",
                hash: if *b { 1 } else { 0 },
            }),
            Object::Str(s) => Some(HashKey {
                tag: "STRING",
                hash: fnv1a(s.as_bytes()),
            }),
            _ => None,
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

impl Object {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::Str(_) => "STRING",
            Object::Null => "NULL",
            Object::Array(_) => "ARRAY",
            Object::Hash(_) => "HASH",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(..) => "BUILTIN",
            Object::ReturnValue(_) => "RETURN_VALUE",
            Object::Break => "BREAK",
            Object::Continue => "CONTINUE",
            Object::Error(_) => "ERROR",
        }
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Null | Object::Boolean(false))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    pub fn new_string(s: impl Into<String>) -> Object {
        Object::Str(Rc::new(s.into()))
    }

    pub fn new_array(elements: Vec<Object>) -> Object {
        Object::Array(Rc::new(RefCell::new(elements)))
    }

    /// Reference identity, used for the `==`/`!=` fallback comparison on
    /// heterogeneous operand pairs (see [`crate::evaluator`]).
    pub fn identity_eq(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::Null, Object::Null) => true,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Break, Object::Break) => true,
            (Object::Continue, Object::Continue) => true,
            (Object::Array(a), Object::Array(b)) => Rc::ptr_eq(a, b),
            (Object::Hash(a), Object::Hash(b)) => Rc::ptr_eq(a, b),
            (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(i) => write!(f, "{i}"),
            Object::Boolean(b) => write!(f, "{b}"),
            Object::Str(s) => write!(f, "{s}"),
            Object::Null => write!(f, "null"),
            Object::Array(elements) => {
                let items: Vec<String> =
                    elements.borrow().iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Object::Hash(pairs) => {
                let items: Vec<String> = pairs
                    .borrow()
                    .values()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Object::Function(func) => {
                write!(f, "fn({}) {{ ", func.parameters.join(", "))?;
                for stmt in &func.body {
                    write!(f, "{stmt} ")?;
                }
                write!(f, "}}")
            }
            Object::Builtin(name, _) => write!(f, "builtin function {name}"),
            Object::ReturnValue(value) => write!(f, "{value}"),
            Object::Break => write!(f, "break"),
            Object::Continue => write!(f, "continue"),
            Object::Error(msg) => write!(f, "ERROR: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_hash_key_equality_independent_of_allocation() {
        let a = Object::new_string("hello world");
        let b = Object::new_string("hello world");
        assert_eq!(a.hash_key(), b.hash_key());

        let c = Object::new_string("my name is johnny");
        assert_ne!(a.hash_key(), c.hash_key());
    }

    #[test]
    fn test_integer_and_boolean_hash_keys_distinguish_by_tag() {
        let zero = Object::Integer(0);
        let bool_false = Object::Boolean(false);
        assert_ne!(zero.hash_key(), bool_false.hash_key());
    }

    #[test]
    fn test_array_identity_is_by_reference() {
        let shared = Object::new_array(vec![Object::Integer(1)]);
        let clone_of_handle = shared.clone();
        let separate = Object::new_array(vec![Object::Integer(1)]);

        assert!(shared.identity_eq(&clone_of_handle));
        assert!(!shared.identity_eq(&separate));
    }
}
