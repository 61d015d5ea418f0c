//! Scripting-side exceptions

use thiserror::Error;

/// An exception raised inside the scripting runtime
///
/// `TypeError` is the invalid-argument class: non-callable callbacks, list
/// items of the wrong type, wrong argument counts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("TypeError: {0}")]
    TypeError(String),

    #[error("ValueError: {0}")]
    ValueError(String),

    #[error("IndexError: {0}")]
    IndexError(String),

    #[error("AttributeError: {0}")]
    AttributeError(String),

    #[error("RuntimeError: {0}")]
    RuntimeError(String),

    /// Exception of a runtime- or module-defined kind (e.g. `TimeoutException`)
    #[error("{kind}: {message}")]
    Raised { kind: String, message: String },
}

impl ScriptError {
    /// Raise an exception of an arbitrary kind
    pub fn raised(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ScriptError::Raised {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Exception class name
    pub fn kind(&self) -> &str {
        match self {
            ScriptError::TypeError(_) => "TypeError",
            ScriptError::ValueError(_) => "ValueError",
            ScriptError::IndexError(_) => "IndexError",
            ScriptError::AttributeError(_) => "AttributeError",
            ScriptError::RuntimeError(_) => "RuntimeError",
            ScriptError::Raised { kind, .. } => kind,
        }
    }

    /// Exception message without the class name
    pub fn message(&self) -> &str {
        match self {
            ScriptError::TypeError(msg)
            | ScriptError::ValueError(msg)
            | ScriptError::IndexError(msg)
            | ScriptError::AttributeError(msg)
            | ScriptError::RuntimeError(msg) => msg,
            ScriptError::Raised { message, .. } => message,
        }
    }

    /// Whether this is an invalid-argument (type mismatch) error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ScriptError::TypeError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raised_kind_and_message() {
        let err = ScriptError::raised("TimeoutException", "time-out of 2s");
        assert_eq!(err.kind(), "TimeoutException");
        assert_eq!(err.message(), "time-out of 2s");
        assert_eq!(err.to_string(), "TimeoutException: time-out of 2s");
        assert!(!err.is_invalid_argument());
    }
}
