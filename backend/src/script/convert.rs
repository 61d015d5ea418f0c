//! Conversions between native values and scripting values
//!
//! - [`IntoValue`]: native → script (always succeeds)
//! - [`FromValue`]: script → native (fails with `TypeError` on mismatch)
//! - [`FromArgs`]: argument vectors → argument tuples, arity 0 to 5
//! - [`IntoReturn`]: method results, including native `Result`s, → script

use crate::bridge::value::{list_to_vec, optional_to_value, sequence_to_list};

use super::error::ScriptError;
use super::value::{Callable, NativeObject, Value};

/// Convert a native value into a scripting value
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Extract a native value from a scripting value
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ScriptError>;
}

fn mismatch(expected: &str, found: &Value) -> ScriptError {
    ScriptError::TypeError(format!("expected {}, found {}", expected, found.type_name()))
}

// ========================================================================
// Identity and unit
// ========================================================================

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ScriptError> {
        Ok(value.clone())
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::None
    }
}

// ========================================================================
// Scalars
// ========================================================================

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ScriptError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }
}

macro_rules! impl_int {
    ($($ty:ty),*) => {$(
        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                match i64::try_from(self) {
                    Ok(i) => Value::Int(i),
                    Err(_) => Value::Float(self as f64),
                }
            }
        }

        impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self, ScriptError> {
                match value {
                    Value::Int(i) => <$ty>::try_from(*i).map_err(|_| {
                        ScriptError::ValueError(format!(
                            "integer {} out of range for {}",
                            i,
                            stringify!($ty)
                        ))
                    }),
                    other => Err(mismatch("int", other)),
                }
            }
        }
    )*};
}

impl_int!(i32, i64, u8, u16, u32, u64, usize);

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ScriptError> {
        match value {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            other => Err(mismatch("float", other)),
        }
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ScriptError> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ScriptError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            other => Err(mismatch("str", other)),
        }
    }
}

// ========================================================================
// Containers
// ========================================================================

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        sequence_to_list(self)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, ScriptError> {
        list_to_vec(value)
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        optional_to_value(self)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ScriptError> {
        match value {
            Value::None => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<A: IntoValue, B: IntoValue> IntoValue for (A, B) {
    fn into_value(self) -> Value {
        Value::Tuple(vec![self.0.into_value(), self.1.into_value()])
    }
}

impl<A: FromValue, B: FromValue> FromValue for (A, B) {
    fn from_value(value: &Value) -> Result<Self, ScriptError> {
        match value {
            Value::Tuple(items) | Value::List(items) if items.len() == 2 => {
                Ok((A::from_value(&items[0])?, B::from_value(&items[1])?))
            }
            other => Err(mismatch("pair", other)),
        }
    }
}

// ========================================================================
// Runtime objects
// ========================================================================

impl IntoValue for Callable {
    fn into_value(self) -> Value {
        Value::Function(self)
    }
}

impl FromValue for Callable {
    fn from_value(value: &Value) -> Result<Self, ScriptError> {
        match value {
            Value::Function(callable) => Ok(callable.clone()),
            other => Err(mismatch("function", other)),
        }
    }
}

impl IntoValue for NativeObject {
    fn into_value(self) -> Value {
        Value::Native(self)
    }
}

// ========================================================================
// Argument tuples
// ========================================================================

/// Unpack a call's positional arguments
///
/// Trailing arguments may be omitted when their type accepts `None`
/// (`Option<T>`), which is how optional parameters are declared.
pub trait FromArgs: Sized {
    fn from_args(args: &[Value]) -> Result<Self, ScriptError>;
}

fn arg<T: FromValue>(args: &[Value], index: usize) -> Result<T, ScriptError> {
    match args.get(index) {
        Some(value) => T::from_value(value),
        None => T::from_value(&Value::None).map_err(|_| {
            ScriptError::TypeError(format!("missing required argument {}", index + 1))
        }),
    }
}

macro_rules! impl_from_args {
    ($count:expr; $($ty:ident => $idx:tt),*) => {
        impl<$($ty: FromValue),*> FromArgs for ($($ty,)*) {
            #[allow(unused_variables)]
            fn from_args(args: &[Value]) -> Result<Self, ScriptError> {
                if args.len() > $count {
                    return Err(ScriptError::TypeError(format!(
                        "expected at most {} argument(s), got {}",
                        $count,
                        args.len()
                    )));
                }
                Ok(($(arg::<$ty>(args, $idx)?,)*))
            }
        }
    };
}

impl_from_args!(0;);
impl_from_args!(1; A1 => 0);
impl_from_args!(2; A1 => 0, A2 => 1);
impl_from_args!(3; A1 => 0, A2 => 1, A3 => 2);
impl_from_args!(4; A1 => 0, A2 => 1, A3 => 2, A4 => 3);
impl_from_args!(5; A1 => 0, A2 => 1, A3 => 2, A4 => 3, A5 => 4);

// ========================================================================
// Method results
// ========================================================================

/// Convert a native method's result into a call result
///
/// Plain values succeed; `Result`s propagate their error translated into a
/// scripting exception.
pub trait IntoReturn {
    fn into_return(self) -> Result<Value, ScriptError>;
}

impl<T: IntoValue> IntoReturn for T {
    fn into_return(self) -> Result<Value, ScriptError> {
        Ok(self.into_value())
    }
}

impl<T: IntoValue, E: Into<ScriptError>> IntoReturn for Result<T, E> {
    fn into_return(self) -> Result<Value, ScriptError> {
        self.map(IntoValue::into_value).map_err(Into::into)
    }
}
