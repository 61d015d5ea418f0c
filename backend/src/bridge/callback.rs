//! Callback Bridge
//!
//! Turns a scripting callable into a native [`Invocable`] that any native
//! thread may call. Every invocation and the final release of the stored
//! callable happen while holding the owning runtime's token; exceptions the
//! callable raises are reported on the runtime's diagnostics channel and
//! never reach the invoking thread.
//!
//! # Critical Invariants
//!
//! 1. The scripting handle is only touched under ownership, including its
//!    destruction on whatever thread drops the last copy
//! 2. An invocation never propagates an error or a panic to its caller

use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::gil::LockGate;
use crate::script::{Callable, Held, Interpreter, IntoValue, ScriptError, Value};

/// A native callback taking events of type `E`
///
/// Plain closures qualify, so native code can subscribe with the same API
/// scripts use.
pub trait Invocable<E>: Send + Sync {
    fn invoke(&self, event: E);
}

impl<E, F> Invocable<E> for F
where
    F: Fn(E) + Send + Sync,
{
    fn invoke(&self, event: E) {
        self(event)
    }
}

/// A scripting handle destroyed under ownership
///
/// Holds the handle plus the gate of the runtime it belongs to. Dropping it
/// acquires the gate first, so the handle may go away on any thread.
pub struct StoredCallback<G: LockGate, H> {
    handle: Option<H>,
    gate: G,
}

impl<G: LockGate, H> StoredCallback<G, H> {
    pub fn new(gate: G, handle: H) -> Self {
        StoredCallback {
            handle: Some(handle),
            gate,
        }
    }

    /// The stored handle
    ///
    /// Only meaningful while holding ownership.
    pub fn get(&self) -> &H {
        match &self.handle {
            Some(handle) => handle,
            None => unreachable!("callback handle taken before drop"),
        }
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }
}

impl<G: LockGate, H> Drop for StoredCallback<G, H> {
    fn drop(&mut self) {
        let handle = self.handle.take();
        self.gate.acquire_during(move || drop(handle));
    }
}

impl<G: LockGate, H> fmt::Debug for StoredCallback<G, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCallback")
            .field("live", &self.handle.is_some())
            .finish()
    }
}

/// A scripting callable usable as a native `Invocable<E>`
///
/// Copies share the same callable; the last copy to go releases it under
/// the interpreter's token.
pub struct ScriptCallback<E> {
    callback: Arc<StoredCallback<Arc<Interpreter>, Callable>>,
    _event: PhantomData<fn(E)>,
}

impl<E> Clone for ScriptCallback<E> {
    fn clone(&self) -> Self {
        ScriptCallback {
            callback: Arc::clone(&self.callback),
            _event: PhantomData,
        }
    }
}

impl<E> fmt::Debug for ScriptCallback<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptCallback({})", self.callback.get().name())
    }
}

/// Wrap a scripting value as a native callback
///
/// # Errors
///
/// `TypeError` "callback argument must be callable!" when `callable` is not
/// a function; nothing is stored in that case.
///
/// # Example
/// ```
/// use libsim::bridge::{make_callback, Invocable};
/// use libsim::script::{Callable, Interpreter, Value};
///
/// let interp = Interpreter::new();
/// let callback = interp.with_ownership(|held| {
///     let f = Callable::new(held, "noop", |_, _| Ok(Value::None));
///     make_callback::<i64>(held, &Value::Function(f))
/// })
/// .unwrap();
///
/// callback.invoke(7);
/// assert!(interp.diagnostics().is_empty());
/// ```
pub fn make_callback<E>(held: Held<'_>, callable: &Value) -> Result<ScriptCallback<E>, ScriptError> {
    let callable = match callable {
        Value::Function(callable) => callable.clone(),
        _ => {
            return Err(ScriptError::TypeError(
                "callback argument must be callable!".to_string(),
            ))
        }
    };
    let interp = held.interpreter().handle();
    Ok(ScriptCallback {
        callback: Arc::new(StoredCallback::new(interp, callable)),
        _event: PhantomData,
    })
}

impl<E: IntoValue> Invocable<E> for ScriptCallback<E> {
    fn invoke(&self, event: E) {
        let interp = Arc::clone(self.callback.gate());
        interp.with_ownership(|held| {
            let callable = self.callback.get();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                callable.call(held, vec![event.into_value()])
            }));
            match outcome {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => held.interpreter().report(&err),
                Err(_) => held.interpreter().report(&ScriptError::RuntimeError(format!(
                    "callback {} panicked",
                    callable.name()
                ))),
            }
        });
    }
}
