//! Namespaces and classes
//!
//! A [`Module`] is the namespace an extension publishes: attributes,
//! module-level functions and classes. Classes are built with
//! [`ClassBuilder`], whose `def` registers a method through a
//! [call adapter](crate::bridge::adapter).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::bridge::adapter::Adapter;

use super::convert::{FromArgs, IntoReturn, IntoValue};
use super::error::ScriptError;
use super::interpreter::Held;
use super::value::{Callable, NativeClass, Value};

/// A bound method: receives the receiver and the positional arguments
pub type MethodFn =
    dyn Fn(Held<'_>, &Value, Vec<Value>) -> Result<Value, ScriptError> + Send + Sync;

fn method_fn<F>(f: F) -> Arc<MethodFn>
where
    F: Fn(Held<'_>, &Value, Vec<Value>) -> Result<Value, ScriptError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A scripting class backed by a native type
pub struct Class {
    name: &'static str,
    constructor: Option<Callable>,
    methods: BTreeMap<String, Arc<MethodFn>>,
}

impl Class {
    /// Start building the class for native type `T`
    pub fn of<T: NativeClass>() -> ClassBuilder<T> {
        ClassBuilder {
            class: Class {
                name: T::CLASS_NAME,
                constructor: None,
                methods: BTreeMap::new(),
            },
            _native: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Method names in alphabetical order
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    /// Call the class to construct an instance
    pub fn instantiate(&self, held: Held<'_>, args: Vec<Value>) -> Result<Value, ScriptError> {
        match &self.constructor {
            Some(constructor) => constructor.call(held, args),
            None => Err(ScriptError::TypeError(format!(
                "cannot create '{}' instances",
                self.name
            ))),
        }
    }

    /// Call a method on `receiver`
    pub fn call_method(
        &self,
        held: Held<'_>,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, ScriptError> {
        let method = self.methods.get(name).ok_or_else(|| {
            ScriptError::AttributeError(format!(
                "'{}' object has no attribute '{}'",
                self.name, name
            ))
        })?;
        method(held, receiver, args)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("methods", &self.method_names())
            .finish()
    }
}

/// Builder registering constructor and methods of a native class
pub struct ClassBuilder<T> {
    class: Class,
    _native: PhantomData<fn() -> T>,
}

impl<T: NativeClass> ClassBuilder<T> {
    /// Register the constructor
    ///
    /// # Example
    /// ```ignore
    /// Class::of::<Location>().init(|(x, y, z): (f64, f64, f64)| Location::new(x, y, z))
    /// ```
    pub fn init<A, F, R>(mut self, constructor: F) -> Self
    where
        A: FromArgs,
        F: Fn(A) -> R + Send + Sync + 'static,
        R: IntoReturn,
    {
        let name = self.class.name;
        self.class.constructor = Some(Callable::builtin(name, move |_held, args| {
            constructor(A::from_args(&args)?).into_return()
        }));
        self
    }

    /// Register a constructor taking the raw argument list, for optional
    /// and keyword-like parameters
    pub fn init_raw<F>(mut self, constructor: F) -> Self
    where
        F: Fn(Held<'_>, Vec<Value>) -> Result<Value, ScriptError> + Send + Sync + 'static,
    {
        self.class.constructor = Some(Callable::builtin(self.class.name, constructor));
        self
    }

    /// Register a method through a call adapter
    ///
    /// Arguments are extracted as `A`; the adapter decides whether
    /// ownership is released for the duration of the native call.
    pub fn def<A, C>(mut self, name: &str, adapter: C) -> Self
    where
        A: FromArgs + 'static,
        C: Adapter<T, A> + Send + Sync + 'static,
        C::Output: IntoReturn,
    {
        let method = method_fn(move |held, receiver, args| {
            let cell = receiver.native()?.cell::<T>()?;
            let args = A::from_args(&args)?;
            adapter.call(&held, &cell, args).into_return()
        });
        self.class.methods.insert(name.to_string(), method);
        self
    }

    /// Register a method with full access to the receiver value and the
    /// interpreter, for methods that create scripting objects
    pub fn def_raw<F>(mut self, name: &str, method: F) -> Self
    where
        F: Fn(Held<'_>, &Value, Vec<Value>) -> Result<Value, ScriptError> + Send + Sync + 'static,
    {
        self.class.methods.insert(name.to_string(), method_fn(method));
        self
    }

    /// Register `__str__`/`__repr__` from the native `Display`
    pub fn def_repr(self) -> Self {
        self.def_raw("__repr__", |_held, receiver, _args| {
            Ok(Value::Str(receiver.native()?.to_string()))
        })
    }

    pub fn build(self) -> Class {
        self.class
    }
}

/// An extension namespace
pub struct Module {
    name: String,
    attrs: BTreeMap<String, Value>,
    classes: BTreeMap<&'static str, Class>,
    exceptions: BTreeSet<String>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            attrs: BTreeMap::new(),
            classes: BTreeMap::new(),
            exceptions: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a module attribute
    pub fn set_attr(&mut self, name: &str, value: impl IntoValue) {
        self.attrs.insert(name.to_string(), value.into_value());
    }

    /// Look up a module attribute or function
    pub fn getattr(&self, name: &str) -> Result<&Value, ScriptError> {
        self.attrs.get(name).ok_or_else(|| {
            ScriptError::AttributeError(format!(
                "module '{}' has no attribute '{}'",
                self.name, name
            ))
        })
    }

    /// Add a module-level function
    pub fn add_function(&mut self, function: Callable) -> Result<(), ScriptError> {
        let name = function.name().to_string();
        if self.attrs.contains_key(&name) {
            return Err(ScriptError::RuntimeError(format!(
                "'{}' is already registered in module '{}'",
                name, self.name
            )));
        }
        self.attrs.insert(name, Value::Function(function));
        Ok(())
    }

    /// Add a class; registering the same class twice is an error
    pub fn add_class(&mut self, class: Class) -> Result<(), ScriptError> {
        if self.classes.contains_key(class.name()) {
            return Err(ScriptError::RuntimeError(format!(
                "class '{}' is already registered in module '{}'",
                class.name(),
                self.name
            )));
        }
        log::debug!("registered class {}.{}", self.name, class.name());
        self.classes.insert(class.name(), class);
        Ok(())
    }

    /// Register an exception kind raised by this module's functions
    pub fn add_exception(&mut self, kind: &str) -> Result<(), ScriptError> {
        if !self.exceptions.insert(kind.to_string()) {
            return Err(ScriptError::RuntimeError(format!(
                "exception '{}' is already registered in module '{}'",
                kind, self.name
            )));
        }
        self.attrs.insert(kind.to_string(), Value::Str(format!("{}.{}", self.name, kind)));
        Ok(())
    }

    pub fn has_exception(&self, kind: &str) -> bool {
        self.exceptions.contains(kind)
    }

    pub fn class(&self, name: &str) -> Result<&Class, ScriptError> {
        self.classes.get(name).ok_or_else(|| {
            ScriptError::AttributeError(format!(
                "module '{}' has no class '{}'",
                self.name, name
            ))
        })
    }

    /// Class names in alphabetical order
    pub fn class_names(&self) -> Vec<&'static str> {
        self.classes.keys().copied().collect()
    }

    /// Call a module-level function or a class constructor
    pub fn call(&self, held: Held<'_>, name: &str, args: Vec<Value>) -> Result<Value, ScriptError> {
        if let Some(class) = self.classes.get(name) {
            return class.instantiate(held, args);
        }
        match self.getattr(name)? {
            Value::Function(function) => function.call(held, args),
            other => Err(ScriptError::TypeError(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    /// Call a method on a native object, dispatching on its class
    pub fn call_method(
        &self,
        held: Held<'_>,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, ScriptError> {
        let class_name = receiver.native()?.class_name();
        self.class(class_name)?.call_method(held, receiver, name, args)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<module '{}'>", self.name)
    }
}
