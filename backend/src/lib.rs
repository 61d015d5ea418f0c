//! Simulation Bridge Core - scripting bindings for a native simulator
//!
//! Exposes a native simulation client to scripting runtimes that are not
//! thread-safe, while the native core delivers data from its own threads.
//!
//! # Architecture
//!
//! - **gil**: Lock Gate, the interpreter ownership token and its guards
//! - **script**: Reference embedding runtime (values, classes, modules)
//! - **bridge**: Call Adapter, Value Bridge and Callback Bridge
//! - **engine**: The native simulation core the bindings adapt
//! - **bindings**: Module Aggregator, one export routine per subsystem
//!
//! # Critical Invariants
//!
//! 1. Scripting objects are only touched by the thread owning the interpreter
//! 2. Long native calls run with ownership released
//! 3. Errors raised inside callbacks never reach the native thread

// Module declarations
pub mod bindings;
pub mod bridge;
pub mod engine;
pub mod gil;
pub mod script;

// Re-exports for convenience
pub use bindings::load_module;
pub use bridge::{make_callback, Invocable, ScriptCallback};
pub use engine::{Client, EngineError, World};
pub use gil::{LockGate, OwnershipToken};
pub use script::{Interpreter, Module, ScriptError, Value};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn libsim(m: &Bound<'_, PyModule>) -> PyResult<()> {
    ffi::register_all(m)
}
