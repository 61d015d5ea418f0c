//! Tests for the ownership token and its guards
//!
//! Ownership must be exclusive, guards must restore the previous state on
//! every exit path, and releasing must let other threads in.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use libsim::gil::{LockGate, OwnershipToken, Unlocked};

#[test]
fn test_token_starts_free() {
    let token = OwnershipToken::new();
    assert!(!token.is_held());
    assert!(!token.is_held_by_current_thread());
}

#[test]
fn test_acquire_guard_holds_until_dropped() {
    let token = OwnershipToken::new();
    {
        let guard = token.acquire();
        assert!(!guard.is_nested());
        assert!(token.is_held_by_current_thread());
    }
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
fn test_release_guard_lets_other_thread_acquire() {
    let token = Arc::new(OwnershipToken::new());
    let _held = token.acquire();

    let entered = Arc::new(AtomicBool::new(false));
    {
        let _released = token.release();
        let token = Arc::clone(&token);
        let entered = Arc::clone(&entered);
        thread::spawn(move || {
            let _guard = token.acquire();
            entered.store(true, Ordering::SeqCst);
        })
        .join()
        .unwrap();
    }

    assert!(entered.load(Ordering::SeqCst));
    assert!(token.is_held_by_current_thread());
}

#[test]
fn test_release_guard_restores_on_panic() {
    let token = OwnershipToken::new();
    let _held = token.acquire();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _released = token.release();
        panic!("native call failed");
    }));

    assert!(result.is_err());
    assert!(token.is_held_by_current_thread());
}

#[test]
#[should_panic(expected = "does not hold it")]
fn test_release_without_holding_panics() {
    let token = OwnershipToken::new();
    let _released = token.release();
}

#[test]
fn test_mutual_exclusion_under_contention() {
    let token = Arc::new(OwnershipToken::new());
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let token = Arc::clone(&token);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            thread::spawn(move || {
                for _ in 0..50 {
                    let _guard = token.acquire();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::yield_now();
                    inside.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    assert!(!token.is_held());
}

#[test]
fn test_waiter_blocks_until_release() {
    let token = Arc::new(OwnershipToken::new());
    let held = token.acquire();
    let (tx, rx) = mpsc::channel();

    let waiter = {
        let token = Arc::clone(&token);
        thread::spawn(move || {
            let _guard = token.acquire();
            tx.send(()).unwrap();
        })
    };

    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    drop(held);
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    waiter.join().unwrap();
}

#[test]
fn test_gate_release_during_reacquires() {
    let token = OwnershipToken::new();
    let _held = token.acquire();
    let was_held = token.release_during(|| token.is_held());
    assert!(!was_held);
    assert!(token.is_held_by_current_thread());
}

#[test]
fn test_gate_acquire_during_from_free_thread() {
    let token = Arc::new(OwnershipToken::new());
    let gate = Arc::clone(&token);
    let held_inside = thread::spawn(move || gate.acquire_during(|| gate.is_held_by_current_thread()))
        .join()
        .unwrap();
    assert!(held_inside);
    assert!(!token.is_held());
}

#[test]
fn test_unlocked_gate_runs_closures() {
    assert_eq!(Unlocked.release_during(|| 1), 1);
    assert_eq!(Unlocked.acquire_during(|| 2), 2);
}
