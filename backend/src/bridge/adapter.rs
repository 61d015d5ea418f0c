//! Call Adapter
//!
//! A native method is any `Fn(&T, A1, .., An) -> R` (or `&mut T`) with up to
//! five arguments. Adapters wrap one and call it on a receiver stored in a
//! `RwLock`, the way native objects are held by the runtime:
//!
//! - [`Call`]: immutable receiver, ownership kept (fast accessors)
//! - [`CallMut`]: mutable receiver, ownership kept
//! - [`WithoutLock`]: decorator releasing ownership for the whole call
//!   (anything that may block: ticks, map loads, server round trips)
//!
//! Results, including native errors, are returned untouched; translating
//! them is the caller's business.
//!
//! # Example
//! ```
//! use std::sync::RwLock;
//! use libsim::bridge::{call, AdapterExt, Adapter};
//! use libsim::gil::OwnershipToken;
//!
//! struct Counter(u64);
//!
//! impl Counter {
//!     fn add(&self, n: u64) -> u64 {
//!         self.0 + n
//!     }
//! }
//!
//! let token = OwnershipToken::new();
//! let _held = token.acquire();
//! let receiver = RwLock::new(Counter(1));
//!
//! let adapter = call(Counter::add).without_lock();
//! assert_eq!(adapter.call(&token, &receiver, (2,)), 3);
//! assert!(token.is_held_by_current_thread());
//! ```

use std::sync::{PoisonError, RwLock};

use crate::gil::{LockGate, Unlocked};

/// A native method taking `&T` and the argument tuple `A`
pub trait Method<T, A>: Send + Sync {
    type Output;

    fn invoke(&self, receiver: &T, args: A) -> Self::Output;
}

/// A native method taking `&mut T` and the argument tuple `A`
pub trait MethodMut<T, A>: Send + Sync {
    type Output;

    fn invoke(&self, receiver: &mut T, args: A) -> Self::Output;
}

macro_rules! impl_method {
    ($($arg:ident),*) => {
        impl<T, F, R, $($arg),*> Method<T, ($($arg,)*)> for F
        where
            F: Fn(&T $(, $arg)*) -> R + Send + Sync,
        {
            type Output = R;

            #[allow(non_snake_case)]
            fn invoke(&self, receiver: &T, ($($arg,)*): ($($arg,)*)) -> R {
                self(receiver $(, $arg)*)
            }
        }

        impl<T, F, R, $($arg),*> MethodMut<T, ($($arg,)*)> for F
        where
            F: Fn(&mut T $(, $arg)*) -> R + Send + Sync,
        {
            type Output = R;

            #[allow(non_snake_case)]
            fn invoke(&self, receiver: &mut T, ($($arg,)*): ($($arg,)*)) -> R {
                self(receiver $(, $arg)*)
            }
        }
    };
}

impl_method!();
impl_method!(A1);
impl_method!(A1, A2);
impl_method!(A1, A2, A3);
impl_method!(A1, A2, A3, A4);
impl_method!(A1, A2, A3, A4, A5);

/// Calls a method on a receiver guarded by a `RwLock`
pub trait Adapter<T, A> {
    type Output;

    /// Call the method; `gate` is the ownership gate of the calling thread
    fn call<G: LockGate>(&self, gate: &G, receiver: &RwLock<T>, args: A) -> Self::Output;
}

/// Immutable-receiver adapter
#[derive(Debug, Clone, Copy)]
pub struct Call<M>(M);

/// Mutable-receiver adapter
#[derive(Debug, Clone, Copy)]
pub struct CallMut<M>(M);

/// Releases ownership around the wrapped adapter
#[derive(Debug, Clone, Copy)]
pub struct WithoutLock<C>(C);

/// Adapt a `&T` method
pub fn call<M>(method: M) -> Call<M> {
    Call(method)
}

/// Adapt a `&mut T` method
pub fn call_mut<M>(method: M) -> CallMut<M> {
    CallMut(method)
}

impl<T, A, M: Method<T, A>> Adapter<T, A> for Call<M> {
    type Output = M::Output;

    fn call<G: LockGate>(&self, _gate: &G, receiver: &RwLock<T>, args: A) -> M::Output {
        let receiver = receiver.read().unwrap_or_else(PoisonError::into_inner);
        self.0.invoke(&receiver, args)
    }
}

impl<T, A, M: MethodMut<T, A>> Adapter<T, A> for CallMut<M> {
    type Output = M::Output;

    fn call<G: LockGate>(&self, _gate: &G, receiver: &RwLock<T>, args: A) -> M::Output {
        let mut receiver = receiver.write().unwrap_or_else(PoisonError::into_inner);
        self.0.invoke(&mut receiver, args)
    }
}

impl<T, A, C> Adapter<T, A> for WithoutLock<C>
where
    C: Adapter<T, A> + Sync,
    T: Send + Sync,
    A: Send,
    C::Output: Send,
{
    type Output = C::Output;

    fn call<G: LockGate>(&self, gate: &G, receiver: &RwLock<T>, args: A) -> C::Output {
        // The receiver lock is taken only once ownership is gone, so a
        // script thread waiting on the same receiver cannot deadlock us.
        gate.release_during(|| self.0.call(&Unlocked, receiver, args))
    }
}

/// Adds the [`WithoutLock`] decorator to base adapters
pub trait AdapterExt: Sized {
    fn without_lock(self) -> WithoutLock<Self> {
        WithoutLock(self)
    }
}

impl<M> AdapterExt for Call<M> {}
impl<M> AdapterExt for CallMut<M> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gil::OwnershipToken;

    struct Probe {
        hits: u32,
    }

    impl Probe {
        fn hits(&self) -> u32 {
            self.hits
        }

        fn hit(&mut self, n: u32) {
            self.hits += n;
        }

        fn sum5(&self, a: u32, b: u32, c: u32, d: u32, e: u32) -> u32 {
            self.hits + a + b + c + d + e
        }
    }

    #[test]
    fn test_const_and_mut_receivers() {
        let receiver = RwLock::new(Probe { hits: 0 });
        call_mut(Probe::hit).call(&Unlocked, &receiver, (3,));
        assert_eq!(call(Probe::hits).call(&Unlocked, &receiver, ()), 3);
    }

    #[test]
    fn test_five_arguments() {
        let receiver = RwLock::new(Probe { hits: 1 });
        let total = call(Probe::sum5).call(&Unlocked, &receiver, (1, 2, 3, 4, 5));
        assert_eq!(total, 16);
    }

    #[test]
    fn test_without_lock_releases_token_during_call() {
        let token = OwnershipToken::new();
        let _held = token.acquire();
        let receiver = RwLock::new(Probe { hits: 0 });

        let observed = call(|_: &Probe| token.is_held())
            .without_lock()
            .call(&token, &receiver, ());

        assert!(!observed);
        assert!(token.is_held_by_current_thread());
    }

    #[test]
    fn test_errors_pass_through_unchanged() {
        let receiver = RwLock::new(Probe { hits: 0 });
        let result: Result<u32, String> = call(|_: &Probe, msg: String| Err(msg))
            .without_lock()
            .call(&Unlocked, &receiver, ("boom".to_string(),));
        assert_eq!(result, Err("boom".to_string()));
    }
}
