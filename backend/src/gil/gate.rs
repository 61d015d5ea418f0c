//! `LockGate` - the seam between native calls and ownership discipline
//!
//! Call adapters and callback bridges never touch a token directly; they ask
//! a gate to run a closure with ownership released or held. Each embedding
//! target provides its own gate (the reference interpreter, CPython through
//! PyO3), and [`Unlocked`] stands in where no ownership is involved.

use std::sync::Arc;

use super::token::OwnershipToken;

/// Runs closures with interpreter ownership released or held
pub trait LockGate {
    /// Run `f` with ownership released for its whole duration
    ///
    /// `f` must be `Send` so nothing that proves ownership can be smuggled
    /// into the released region.
    fn release_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send;

    /// Run `f` while holding ownership
    fn acquire_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R;
}

impl LockGate for OwnershipToken {
    fn release_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        let _released = self.release();
        f()
    }

    fn acquire_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _held = self.acquire();
        f()
    }
}

impl<G: LockGate> LockGate for Arc<G> {
    fn release_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        (**self).release_during(f)
    }

    fn acquire_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        (**self).acquire_during(f)
    }
}

impl<G: LockGate> LockGate for &G {
    fn release_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        (**self).release_during(f)
    }

    fn acquire_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        (**self).acquire_during(f)
    }
}

/// Gate for contexts with no interpreter involved: both operations just run
/// the closure.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlocked;

impl LockGate for Unlocked {
    fn release_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        f()
    }

    fn acquire_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        f()
    }
}
