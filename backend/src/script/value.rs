//! Dynamic values of the reference runtime

use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::bridge::value::DisplayList;

use super::error::ScriptError;
use super::interpreter::{Held, Interpreter};

/// A native type exposed to scripts
///
/// Implemented through [`native_class!`](crate::native_class). The
/// `Display` output is the object's `repr`.
pub trait NativeClass: fmt::Display + Send + Sync + 'static {
    /// Class name seen by scripts
    const CLASS_NAME: &'static str;
}

/// A scripting value
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Native(NativeObject),
    Function(Callable),
}

impl Value {
    /// Type name as reported in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Native(object) => object.class_name(),
            Value::Function(_) => "function",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Items of a list value
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The wrapped native object, or a `TypeError`
    pub fn native(&self) -> Result<&NativeObject, ScriptError> {
        match self {
            Value::Native(object) => Ok(object),
            other => Err(ScriptError::TypeError(format!(
                "expected a native object, found {}",
                other.type_name()
            ))),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "'{}'", s),
            Value::List(items) => write!(f, "{}", DisplayList(items)),
            Value::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::Native(object) => write!(f, "{}", object),
            Value::Function(callable) => write!(f, "<function {}>", callable.name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// ============================================================================
// Native objects
// ============================================================================

type AnyCell = dyn Any + Send + Sync;

/// A native value owned by the runtime
///
/// The value lives in an `Arc<RwLock<T>>`; clones of the object share it,
/// so methods taking `&mut T` are visible through every reference.
#[derive(Clone)]
pub struct NativeObject {
    class: &'static str,
    cell: Arc<AnyCell>,
    repr: fn(&AnyCell) -> String,
}

impl NativeObject {
    /// Wrap a native value
    pub fn new<T: NativeClass>(value: T) -> Self {
        NativeObject {
            class: T::CLASS_NAME,
            cell: Arc::new(RwLock::new(value)),
            repr: repr_of::<T>,
        }
    }

    /// Name of the object's class
    pub fn class_name(&self) -> &'static str {
        self.class
    }

    /// Shared cell holding the value, if it is a `T`
    pub fn cell<T: NativeClass>(&self) -> Result<Arc<RwLock<T>>, ScriptError> {
        Arc::clone(&self.cell)
            .downcast::<RwLock<T>>()
            .map_err(|_| {
                ScriptError::TypeError(format!(
                    "expected {}, found {}",
                    T::CLASS_NAME,
                    self.class
                ))
            })
    }

    /// Copy of the wrapped value
    pub fn get<T: NativeClass + Clone>(&self) -> Result<T, ScriptError> {
        let cell = self.cell::<T>()?;
        let value = cell.read().unwrap_or_else(PoisonError::into_inner).clone();
        Ok(value)
    }

    /// Whether both objects wrap the same native value
    pub fn ptr_eq(&self, other: &NativeObject) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

fn repr_of<T: NativeClass>(cell: &AnyCell) -> String {
    match cell.downcast_ref::<RwLock<T>>() {
        Some(lock) => lock.read().unwrap_or_else(PoisonError::into_inner).to_string(),
        None => format!("<{} object>", T::CLASS_NAME),
    }
}

impl fmt::Display for NativeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&(self.repr)(&*self.cell))
    }
}

// ============================================================================
// Callables
// ============================================================================

type CallableFn = dyn Fn(Held<'_>, Vec<Value>) -> Result<Value, ScriptError> + Send + Sync;

/// A function value
///
/// Functions created with [`Callable::new`] belong to an interpreter: the
/// last reference must be dropped while holding its token, otherwise the
/// interpreter records an ownership violation.
#[derive(Clone)]
pub struct Callable {
    inner: Arc<CallableInner>,
}

struct CallableInner {
    name: String,
    func: Box<CallableFn>,
    owner: Option<Weak<Interpreter>>,
}

impl Callable {
    /// Create a script function owned by the held interpreter
    pub fn new<F>(held: Held<'_>, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Held<'_>, Vec<Value>) -> Result<Value, ScriptError> + Send + Sync + 'static,
    {
        let owner = Arc::downgrade(&held.interpreter().handle());
        Callable {
            inner: Arc::new(CallableInner {
                name: name.into(),
                func: Box::new(func),
                owner: Some(owner),
            }),
        }
    }

    /// Create a builtin function, not tied to any interpreter
    pub fn builtin<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Held<'_>, Vec<Value>) -> Result<Value, ScriptError> + Send + Sync + 'static,
    {
        Callable {
            inner: Arc::new(CallableInner {
                name: name.into(),
                func: Box::new(func),
                owner: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Call the function
    pub fn call(&self, held: Held<'_>, args: Vec<Value>) -> Result<Value, ScriptError> {
        (self.inner.func)(held, args)
    }

    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Drop for CallableInner {
    fn drop(&mut self) {
        let Some(owner) = self.owner.as_ref().and_then(Weak::upgrade) else {
            return;
        };
        if !owner.token().is_held_by_current_thread() {
            owner.record_violation(&format!("function {}", self.name));
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Probe(i32);

    impl fmt::Display for Probe {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Probe({})", self.0)
        }
    }

    crate::native_class!(Probe, "Probe");

    #[test]
    fn test_repr_of_containers() {
        let value = Value::List(vec![
            Value::Int(1),
            Value::Str("a".to_string()),
            Value::Tuple(vec![Value::Bool(true)]),
            Value::None,
        ]);
        assert_eq!(value.to_string(), "[1, 'a', (True,), None]");
    }

    #[test]
    fn test_native_object_shares_cell() {
        let object = NativeObject::new(Probe(1));
        let alias = object.clone();
        object.cell::<Probe>().unwrap().write().unwrap().0 = 5;
        assert_eq!(alias.get::<Probe>().unwrap().0, 5);
        assert!(object.ptr_eq(&alias));
        assert_eq!(object.to_string(), "Probe(5)");
    }

    #[test]
    fn test_native_object_wrong_class() {
        let object = NativeObject::new(Probe(1));
        let err = object.cell::<crate::engine::Location>().unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_callable_dropped_without_token_is_recorded() {
        let interp = Interpreter::new();
        let callable = interp.with_ownership(|held| {
            Callable::new(held, "leak", |_, _| Ok(Value::None))
        });
        drop(callable);
        assert_eq!(interp.ownership_violations(), 1);
    }

    #[test]
    fn test_callable_dropped_with_token_is_clean() {
        let interp = Interpreter::new();
        interp.with_ownership(|held| {
            let callable = Callable::new(held, "ok", |_, args| Ok(Value::Int(args.len() as i64)));
            assert_eq!(callable.call(held, vec![Value::None]).unwrap(), Value::Int(1));
        });
        assert_eq!(interp.ownership_violations(), 0);
    }
}
