//! Bridges between native calls and an embedding runtime
//!
//! # Architecture
//!
//! - **adapter**: Call Adapter, turns native methods into callables with an
//!   optional ownership release around the call
//! - **value**: Value Bridge, optionals and sequences to and from scripting
//!   values, plus the debug rendering of native collections
//! - **callback**: Callback Bridge, scripting callables as native
//!   [`Invocable`]s safe to call from any thread
//!
//! # Error propagation
//!
//! Errors from script-initiated calls propagate unchanged to the caller.
//! Errors raised by a callback invoked from a native thread are reported and
//! contained at the Callback Bridge; the dispatching thread never sees them.

pub mod adapter;
pub mod callback;
pub mod value;

pub use adapter::{call, call_mut, Adapter, AdapterExt, Call, CallMut, Method, MethodMut, WithoutLock};
pub use callback::{make_callback, Invocable, ScriptCallback, StoredCallback};
pub use value::{
    duration_from_seconds, list_to_vec, optional_to_value, sequence_to_list, DisplayList,
    DisplayPair, DisplayShared,
};
