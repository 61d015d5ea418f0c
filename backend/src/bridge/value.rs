//! Value Bridge
//!
//! Total, deterministic conversions between native containers and scripting
//! values:
//!
//! - optional → value: present wraps the value, absent is `None`
//! - sequence → list: native order, nothing skipped
//! - list → `Vec<T>`: index order, first unconvertible item is a `TypeError`
//!
//! plus the textual convention for native collections in debug output:
//! `[e0, e1, ...]`, `(first,second)` and `nullptr` for empty shared
//! references.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::script::{FromValue, IntoValue, ScriptError, Value};

/// Bridge an optional native value
///
/// # Example
/// ```
/// use libsim::bridge::optional_to_value;
/// use libsim::script::Value;
///
/// assert_eq!(optional_to_value(Some(3i64)), Value::Int(3));
/// assert_eq!(optional_to_value(None::<i64>), Value::None);
/// ```
pub fn optional_to_value<T: IntoValue>(optional: Option<T>) -> Value {
    match optional {
        Some(value) => value.into_value(),
        None => Value::None,
    }
}

/// Bridge a native sequence into a fresh list, preserving order
pub fn sequence_to_list<I>(items: I) -> Value
where
    I: IntoIterator,
    I::Item: IntoValue,
{
    let items = items.into_iter();
    let mut list = Vec::with_capacity(items.size_hint().0);
    for item in items {
        list.push(item.into_value());
    }
    Value::List(list)
}

/// Extract every item of a list as `T`, in index order
///
/// # Errors
///
/// `TypeError` if `input` is not a list or any item cannot be extracted as
/// `T`; the message names the first offending index. Nothing is skipped or
/// coerced.
///
/// # Example
/// ```
/// use libsim::bridge::list_to_vec;
/// use libsim::script::Value;
///
/// let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
/// assert_eq!(list_to_vec::<i64>(&list).unwrap(), vec![1, 2]);
///
/// let mixed = Value::List(vec![Value::Int(1), Value::Str("x".into())]);
/// assert!(list_to_vec::<i64>(&mixed).unwrap_err().is_invalid_argument());
/// ```
pub fn list_to_vec<T: FromValue>(input: &Value) -> Result<Vec<T>, ScriptError> {
    let items = match input {
        Value::List(items) => items,
        other => {
            return Err(ScriptError::TypeError(format!(
                "expected list, found {}",
                other.type_name()
            )))
        }
    };

    let mut result = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let value = T::from_value(item).map_err(|err| {
            ScriptError::TypeError(format!("list item {}: {}", index, err.message()))
        })?;
        result.push(value);
    }
    Ok(result)
}

/// Native timeouts are given in seconds and truncated to whole milliseconds.
/// Negative and NaN inputs become zero.
pub fn duration_from_seconds(seconds: f64) -> Duration {
    let millis = (1e3 * seconds) as u64;
    Duration::from_millis(millis)
}

// ============================================================================
// Debug rendering
// ============================================================================

/// Renders a sequence as `[e0, e1, ...]`
///
/// # Example
/// ```
/// use libsim::bridge::DisplayList;
///
/// assert_eq!(DisplayList(&vec![1, 2, 3]).to_string(), "[1, 2, 3]");
/// assert_eq!(DisplayList(&Vec::<i32>::new()).to_string(), "[]");
/// ```
#[derive(Clone, Copy)]
pub struct DisplayList<I>(pub I);

impl<I> fmt::Display for DisplayList<I>
where
    I: IntoIterator + Clone,
    I::Item: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        let mut items = self.0.clone().into_iter();
        if let Some(first) = items.next() {
            write!(f, "{}", first)?;
            for item in items {
                write!(f, ", {}", item)?;
            }
        }
        f.write_str("]")
    }
}

/// Renders a pair as `(first,second)`
#[derive(Clone, Copy)]
pub struct DisplayPair<'a, A, B>(pub &'a (A, B));

impl<A: fmt::Display, B: fmt::Display> fmt::Display for DisplayPair<'_, A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", (self.0).0, (self.0).1)
    }
}

/// Renders a shared reference, or `nullptr` when empty
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use libsim::bridge::{DisplayList, DisplayShared};
///
/// let items = vec![Some(Arc::new(1)), None];
/// let text = DisplayList(items.iter().map(DisplayShared)).to_string();
/// assert_eq!(text, "[1, nullptr]");
/// ```
#[derive(Clone, Copy)]
pub struct DisplayShared<'a, T>(pub &'a Option<Arc<T>>);

impl<T: fmt::Display> fmt::Display for DisplayShared<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(item) => write!(f, "{}", item),
            None => f.write_str("nullptr"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_rendering() {
        assert_eq!(DisplayPair(&(1, "a")).to_string(), "(1,a)");
    }

    #[test]
    fn test_non_list_is_type_error() {
        let err = list_to_vec::<i64>(&Value::Int(1)).unwrap_err();
        assert_eq!(err, ScriptError::TypeError("expected list, found int".to_string()));
    }

    #[test]
    fn test_mismatch_names_first_index() {
        let list = Value::List(vec![Value::Int(1), Value::None, Value::Str("x".to_string())]);
        let err = list_to_vec::<i64>(&list).unwrap_err();
        assert_eq!(err.message(), "list item 1: expected int, found NoneType");
    }

    #[test]
    fn test_duration_truncates_to_millis() {
        assert_eq!(duration_from_seconds(2.0), Duration::from_secs(2));
        assert_eq!(duration_from_seconds(0.0015), Duration::from_millis(1));
        assert_eq!(duration_from_seconds(-1.0), Duration::ZERO);
    }

    #[test]
    fn test_sequence_order_preserved() {
        let list = sequence_to_list(vec![3i64, 1, 2]);
        assert_eq!(list, Value::List(vec![Value::Int(3), Value::Int(1), Value::Int(2)]));
    }
}
