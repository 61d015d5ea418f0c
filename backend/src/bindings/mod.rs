//! Module Aggregator
//!
//! Builds the `libsim` scripting module by running every subsystem's export
//! routine against one namespace. Initialization is all-or-nothing: the
//! first failing export aborts the load and no partial module is returned.
//!
//! # Example
//! ```
//! use libsim::bindings::load_module;
//! use libsim::script::{Interpreter, Value};
//!
//! let interp = Interpreter::new();
//! interp.with_ownership(|held| {
//!     let module = load_module(held).unwrap();
//!     assert_eq!(module.getattr("__path__").unwrap(), &Value::Str("libsim".into()));
//!     assert!(module.class("Client").is_ok());
//! });
//! ```

/// Register a getter and a `set_` setter for each `Copy` field
macro_rules! fields {
    ($builder:expr, $ty:ty { $($field:ident: $fty:ty),* $(,)? }) => {
        $builder
            $(
                .def(
                    stringify!($field),
                    $crate::bridge::call(|this: &$ty| this.$field),
                )
                .def(
                    concat!("set_", stringify!($field)),
                    $crate::bridge::call_mut(|this: &mut $ty, value: $fty| this.$field = value),
                )
            )*
    };
}

/// Register a read-only getter for each `Copy` field
macro_rules! getters {
    ($builder:expr, $ty:ty { $($field:ident),* $(,)? }) => {
        $builder
            $(
                .def(
                    stringify!($field),
                    $crate::bridge::call(|this: &$ty| this.$field),
                )
            )*
    };
}

mod actor;
mod client;
mod convert;
#[cfg(any(feature = "rss", feature = "osm2odr"))]
mod extras;
mod geom;
mod world;

use std::sync::Arc;

use crate::engine::EngineError;
use crate::script::{Callable, FromArgs, Held, IntoReturn, Module, ScriptError};

pub use actor::{export_actor, export_blueprint, export_sensor, export_sensor_data};
pub use client::{
    export_client, export_commands, export_exception, export_lightmanager, export_trafficmanager,
};
pub use convert::ActorArg;
#[cfg(feature = "rss")]
pub use extras::export_ad_rss;
#[cfg(feature = "osm2odr")]
pub use extras::export_osm2odr;
pub use geom::{export_control, export_geom, export_weather};
pub use world::{export_map, export_snapshot, export_world};

/// Name of the module and its `__path__`
pub const MODULE_NAME: &str = "libsim";

/// Exception raised when a blocking call exceeds its timeout
pub const TIMEOUT_EXCEPTION: &str = "TimeoutException";

pub type Export = fn(&mut Module) -> Result<(), ScriptError>;

/// Every export routine, in registration order
fn exports() -> Vec<(&'static str, Export)> {
    let mut exports: Vec<(&'static str, Export)> = vec![
        ("geom", export_geom as Export),
        ("control", export_control as Export),
        ("blueprint", export_blueprint as Export),
        ("actor", export_actor as Export),
        ("sensor", export_sensor as Export),
        ("sensor_data", export_sensor_data as Export),
        ("snapshot", export_snapshot as Export),
        ("weather", export_weather as Export),
        ("world", export_world as Export),
        ("map", export_map as Export),
        ("client", export_client as Export),
        ("exception", export_exception as Export),
        ("commands", export_commands as Export),
        ("trafficmanager", export_trafficmanager as Export),
        ("lightmanager", export_lightmanager as Export),
    ];
    #[cfg(feature = "rss")]
    exports.push(("ad_rss", export_ad_rss as Export));
    #[cfg(feature = "osm2odr")]
    exports.push(("osm2odr", export_osm2odr as Export));
    exports
}

/// Initialize the `libsim` module
///
/// `_held` proves the caller owns the interpreter, as module initializers
/// must.
///
/// # Errors
///
/// The first error of any export routine; nothing is returned to the
/// caller in that case.
pub fn load_module(_held: Held<'_>) -> Result<Arc<Module>, ScriptError> {
    load_with(&exports())
}

/// Run `exports` against a fresh module
pub fn load_with(exports: &[(&str, Export)]) -> Result<Arc<Module>, ScriptError> {
    let mut module = Module::new(MODULE_NAME);
    module.set_attr("__path__", MODULE_NAME);
    for (name, export) in exports {
        export(&mut module).map_err(|err| {
            log::error!("{} initialization failed in export_{}: {}", MODULE_NAME, name, err);
            err
        })?;
        log::debug!("export_{} done", name);
    }
    Ok(Arc::new(module))
}

/// A module-level function taking positional arguments `A`
pub(crate) fn function<A, F, R>(name: &str, f: F) -> Callable
where
    A: FromArgs,
    F: Fn(A) -> R + Send + Sync + 'static,
    R: IntoReturn,
{
    Callable::builtin(name, move |_held, args| f(A::from_args(&args)?).into_return())
}

/// Standard translation of native failures into scripting exceptions
impl From<EngineError> for ScriptError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Timeout(_) => ScriptError::raised(TIMEOUT_EXCEPTION, err.to_string()),
            EngineError::InvalidArgument(_) | EngineError::Conversion(_) => {
                ScriptError::ValueError(err.to_string())
            }
            EngineError::ActorNotFound(_)
            | EngineError::SpawnFailed(_)
            | EngineError::BlueprintNotFound(_)
            | EngineError::NotASensor(_)
            | EngineError::AlreadyListening(_)
            | EngineError::MapNotFound(_) => ScriptError::RuntimeError(err.to_string()),
        }
    }
}
