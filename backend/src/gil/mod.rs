//! Lock Gate - interpreter ownership discipline
//!
//! The scripting runtimes this crate embeds are not thread-safe: only the
//! thread holding the interpreter's ownership token may construct, mutate or
//! destroy scripting objects. This module provides the token and the two
//! scoped guards that move it:
//!
//! - [`AcquireGuard`]: take ownership for a scope (native threads entering
//!   scripting territory, e.g. sensor dispatch invoking a stored callback)
//! - [`ReleaseGuard`]: give ownership up for a scope (long native calls such
//!   as simulation ticks, map loading or blocking waits)
//!
//! # Critical Invariants
//!
//! 1. **Mutual exclusion**: at most one thread holds the token at any time
//! 2. **Symmetry**: every guard restores the previous ownership state on every
//!    exit path, including early returns and unwinding
//! 3. **No raw API**: there is no public lock/unlock pair, only guards
//! 4. **No fairness**: waiters are woken in no particular order

mod gate;
mod token;

pub use gate::{LockGate, Unlocked};
pub use token::{AcquireGuard, OwnershipToken, ReleaseGuard};
