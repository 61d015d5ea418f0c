//! Reference embedding runtime
//!
//! A small dynamically-typed scripting runtime with the same ownership
//! contract as CPython: objects may only be created, called or destroyed by
//! the thread holding the interpreter's [`OwnershipToken`](crate::gil::OwnershipToken).
//! The bridges in [`crate::bridge`] target this runtime and, behind the
//! `pyo3` feature, CPython.
//!
//! # Architecture
//!
//! - **interpreter**: ownership token, `Held` proof, diagnostics channel
//! - **value**: dynamic values, native object wrappers, callables
//! - **convert**: `FromValue` / `IntoValue` conversions and argument tuples
//! - **module**: namespaces, classes and method dispatch

pub mod convert;
pub mod error;
pub mod interpreter;
pub mod module;
pub mod value;

pub use convert::{FromArgs, FromValue, IntoReturn, IntoValue};
pub use error::ScriptError;
pub use interpreter::{Held, Interpreter};
pub use module::{Class, ClassBuilder, Module};
pub use value::{Callable, NativeClass, NativeObject, Value};

/// Register a native type as a scripting class
///
/// Implements [`NativeClass`], [`IntoValue`] and [`FromValue`] for the type.
/// The type must be `Clone + Display + Send + Sync + 'static`.
///
/// # Example
/// ```
/// use std::fmt;
///
/// #[derive(Clone)]
/// struct Counter(u32);
///
/// impl fmt::Display for Counter {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "Counter({})", self.0)
///     }
/// }
///
/// libsim::native_class!(Counter, "Counter");
///
/// use libsim::script::{FromValue, IntoValue};
/// let value = Counter(3).into_value();
/// assert_eq!(value.to_string(), "Counter(3)");
/// assert_eq!(Counter::from_value(&value).unwrap().0, 3);
/// ```
#[macro_export]
macro_rules! native_class {
    ($ty:ty, $name:literal) => {
        impl $crate::script::NativeClass for $ty {
            const CLASS_NAME: &'static str = $name;
        }

        impl $crate::script::IntoValue for $ty {
            fn into_value(self) -> $crate::script::Value {
                $crate::script::Value::Native($crate::script::NativeObject::new(self))
            }
        }

        impl $crate::script::FromValue for $ty {
            fn from_value(
                value: &$crate::script::Value,
            ) -> ::std::result::Result<Self, $crate::script::ScriptError> {
                value.native()?.get::<$ty>()
            }
        }
    };
}
