//! The ownership token and its scoped guards

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Process-wide token, used by the global interpreter.
static GLOBAL: OwnershipToken = OwnershipToken::new();

/// Exclusive right to touch scripting objects
///
/// The token records which thread currently owns it. Ownership can only be
/// taken or given up through [`AcquireGuard`] and [`ReleaseGuard`], so every
/// change is undone when the enclosing scope ends.
///
/// # Example
/// ```
/// use libsim::gil::OwnershipToken;
///
/// let token = OwnershipToken::new();
/// let held = token.acquire();
/// assert!(token.is_held_by_current_thread());
///
/// {
///     let _released = token.release();
///     assert!(!token.is_held());
/// }
///
/// assert!(token.is_held_by_current_thread());
/// drop(held);
/// assert!(!token.is_held());
/// ```
pub struct OwnershipToken {
    /// Thread currently owning the token, if any
    holder: Mutex<Option<ThreadId>>,
    /// Signalled whenever the token becomes free
    released: Condvar,
}

impl OwnershipToken {
    /// Create a free token
    pub const fn new() -> Self {
        Self {
            holder: Mutex::new(None),
            released: Condvar::new(),
        }
    }

    /// The process-wide token
    pub fn global() -> &'static OwnershipToken {
        &GLOBAL
    }

    /// Block until the calling thread owns the token
    ///
    /// Re-entrant aware: if the calling thread already owns the token the
    /// returned guard is *nested* and neither acquires nor releases anything.
    ///
    /// Deadlock is possible if the token is held by a thread that is itself
    /// waiting on the caller; avoiding such cycles is the caller's job.
    pub fn acquire(&self) -> AcquireGuard<'_> {
        let nested = !self.take();
        AcquireGuard {
            token: self,
            nested,
            _not_send: PhantomData,
        }
    }

    /// Give the token up until the returned guard is dropped
    ///
    /// # Panics
    ///
    /// Panics if the calling thread does not own the token.
    pub fn release(&self) -> ReleaseGuard<'_> {
        self.give_back();
        ReleaseGuard {
            token: self,
            _not_send: PhantomData,
        }
    }

    /// Whether any thread owns the token
    pub fn is_held(&self) -> bool {
        self.state().is_some()
    }

    /// Whether the calling thread owns the token
    pub fn is_held_by_current_thread(&self) -> bool {
        *self.state() == Some(thread::current().id())
    }

    fn state(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.holder.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for the token and take it. Returns `false` when the calling
    /// thread already owned it.
    fn take(&self) -> bool {
        let me = thread::current().id();
        let mut holder = self.state();
        if *holder == Some(me) {
            return false;
        }
        while holder.is_some() {
            holder = self
                .released
                .wait(holder)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *holder = Some(me);
        true
    }

    fn give_back(&self) {
        let me = thread::current().id();
        let mut holder = self.state();
        if *holder != Some(me) {
            drop(holder);
            panic!("ownership token released by a thread that does not hold it");
        }
        *holder = None;
        drop(holder);
        self.released.notify_one();
    }
}

impl Default for OwnershipToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OwnershipToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnershipToken")
            .field("holder", &*self.state())
            .finish()
    }
}

/// Holds the token until dropped
///
/// Stack-scoped and bound to the thread that created it.
#[must_use = "ownership is given back as soon as the guard is dropped"]
pub struct AcquireGuard<'t> {
    token: &'t OwnershipToken,
    nested: bool,
    _not_send: PhantomData<*const ()>,
}

impl AcquireGuard<'_> {
    /// Whether this guard found the token already held by its thread
    pub fn is_nested(&self) -> bool {
        self.nested
    }
}

impl Drop for AcquireGuard<'_> {
    fn drop(&mut self) {
        if !self.nested {
            self.token.give_back();
        }
    }
}

impl fmt::Debug for AcquireGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcquireGuard")
            .field("nested", &self.nested)
            .finish()
    }
}

/// Keeps the token released until dropped, then waits to take it back
#[must_use = "ownership is taken back as soon as the guard is dropped"]
pub struct ReleaseGuard<'t> {
    token: &'t OwnershipToken,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        self.token.take();
    }
}

impl fmt::Debug for ReleaseGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReleaseGuard")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_acquire_and_release_restore_state() {
        let token = OwnershipToken::new();
        assert!(!token.is_held());

        let guard = token.acquire();
        assert!(!guard.is_nested());
        assert!(token.is_held_by_current_thread());

        {
            let _released = token.release();
            assert!(!token.is_held());
        }
        assert!(token.is_held_by_current_thread());

        drop(guard);
        assert!(!token.is_held());
    }

    #[test]
    fn test_nested_acquire_is_noop() {
        let token = OwnershipToken::new();
        let outer = token.acquire();
        {
            let inner = token.acquire();
            assert!(inner.is_nested());
        }
        // Dropping the nested guard must not give the token away
        assert!(token.is_held_by_current_thread());
        drop(outer);
        assert!(!token.is_held());
    }

    #[test]
    #[should_panic(expected = "does not hold it")]
    fn test_release_without_ownership_panics() {
        let token = OwnershipToken::new();
        let _released = token.release();
    }

    #[test]
    fn test_release_guard_restores_on_unwind() {
        let token = Arc::new(OwnershipToken::new());
        let worker = Arc::clone(&token);
        let result = thread::spawn(move || {
            let _held = worker.acquire();
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let _released = worker.release();
                panic!("native failure");
            }));
            assert!(outcome.is_err());
            worker.is_held_by_current_thread()
        })
        .join()
        .unwrap();

        assert!(result);
        assert!(!token.is_held());
    }

    #[test]
    fn test_other_thread_cannot_observe_ownership() {
        let token = Arc::new(OwnershipToken::new());
        let _held = token.acquire();
        let other = Arc::clone(&token);
        let seen = thread::spawn(move || (other.is_held(), other.is_held_by_current_thread()))
            .join()
            .unwrap();
        assert_eq!(seen, (true, false));
    }
}
