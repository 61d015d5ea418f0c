//! Interpreter state and the ownership proof
//!
//! An [`Interpreter`] owns one [`OwnershipToken`]. Code that touches
//! scripting objects receives a [`Held`] value, which can only be obtained
//! inside [`Interpreter::with_ownership`] and is `!Send`, so it cannot leave
//! the thread (or the scope) that owns the token.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use crate::gil::{LockGate, OwnershipToken};

use super::error::ScriptError;

static GLOBAL: OnceLock<Arc<Interpreter>> = OnceLock::new();

/// A scripting runtime instance
///
/// # Example
/// ```
/// use libsim::script::{Interpreter, IntoValue};
///
/// let interp = Interpreter::new();
/// let text = interp.with_ownership(|_held| 42i64.into_value().to_string());
/// assert_eq!(text, "42");
/// assert!(!interp.token().is_held());
/// ```
pub struct Interpreter {
    /// Handle to ourselves, so objects can keep the interpreter alive
    this: Weak<Interpreter>,
    token: OwnershipToken,
    /// Reported exceptions, the runtime's stderr
    diagnostics: Mutex<Vec<String>>,
    /// Scripting objects destroyed without holding the token
    violations: AtomicUsize,
}

impl Interpreter {
    /// Create an independent interpreter with its own token
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Interpreter {
            this: this.clone(),
            token: OwnershipToken::new(),
            diagnostics: Mutex::new(Vec::new()),
            violations: AtomicUsize::new(0),
        })
    }

    /// The process-wide interpreter
    pub fn global() -> &'static Arc<Interpreter> {
        GLOBAL.get_or_init(Interpreter::new)
    }

    /// Shared handle to this interpreter
    pub fn handle(&self) -> Arc<Interpreter> {
        match self.this.upgrade() {
            Some(interp) => interp,
            None => unreachable!("interpreter used while being dropped"),
        }
    }

    /// The ownership token guarding this interpreter's objects
    pub fn token(&self) -> &OwnershipToken {
        &self.token
    }

    /// Run `f` holding the ownership token
    ///
    /// Blocks until the token is available. Nested calls on a thread that
    /// already holds the token do not block.
    pub fn with_ownership<R>(&self, f: impl FnOnce(Held<'_>) -> R) -> R {
        let _guard = self.token.acquire();
        f(Held {
            interp: self,
            _not_send: PhantomData,
        })
    }

    /// Report an exception on the diagnostics channel
    ///
    /// Used where an exception must not propagate, e.g. a callback raising
    /// on a native dispatch thread.
    pub fn report(&self, error: &ScriptError) {
        log::error!("unhandled exception in callback: {}", error);
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.to_string());
    }

    /// All reported diagnostics, oldest first
    pub fn diagnostics(&self) -> Vec<String> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of scripting objects destroyed without the token
    pub fn ownership_violations(&self) -> usize {
        self.violations.load(Ordering::SeqCst)
    }

    pub(crate) fn record_violation(&self, object: &str) {
        log::error!("{} destroyed without holding the ownership token", object);
        self.violations.fetch_add(1, Ordering::SeqCst);
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("token", &self.token)
            .field("violations", &self.ownership_violations())
            .finish()
    }
}

impl LockGate for Interpreter {
    fn release_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.token.release_during(f)
    }

    fn acquire_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.token.acquire_during(f)
    }
}

/// Proof that the current thread owns an interpreter's token
#[derive(Clone, Copy)]
pub struct Held<'i> {
    interp: &'i Interpreter,
    _not_send: PhantomData<*const ()>,
}

impl<'i> Held<'i> {
    /// The interpreter whose token is held
    pub fn interpreter(self) -> &'i Interpreter {
        self.interp
    }

    /// Run a native closure with the token released
    ///
    /// The token is re-acquired before returning, also when `f` panics.
    pub fn allow_threads<F, R>(self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        let _released = self.interp.token.release();
        f()
    }
}

impl fmt::Debug for Held<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Held")
    }
}

impl LockGate for Held<'_> {
    fn release_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.allow_threads(f)
    }

    fn acquire_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_ownership_holds_token() {
        let interp = Interpreter::new();
        let held = interp.with_ownership(|held| held.interpreter().token().is_held_by_current_thread());
        assert!(held);
        assert!(!interp.token().is_held());
    }

    #[test]
    fn test_allow_threads_releases_token() {
        let interp = Interpreter::new();
        interp.with_ownership(|held| {
            let token = held.interpreter().token();
            assert!(!held.allow_threads(|| token.is_held()));
            assert!(token.is_held_by_current_thread());
        });
    }

    #[test]
    fn test_report_records_diagnostic() {
        let interp = Interpreter::new();
        interp.report(&ScriptError::ValueError("bad".to_string()));
        assert_eq!(interp.diagnostics(), vec!["ValueError: bad".to_string()]);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(Interpreter::global(), Interpreter::global()));
    }
}
