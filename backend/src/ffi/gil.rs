//! Lock gates for the CPython interpreter lock

use pyo3::Python;

use crate::gil::LockGate;

/// Holding the GIL: releasing goes through `allow_threads`, acquiring is a
/// no-op
impl LockGate for Python<'_> {
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

/// Gate usable from threads that may or may not hold the GIL
///
/// Stored next to Python handles that outlive the call that created them,
/// such as callbacks kept by the dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonGil;

impl LockGate for PythonGil {
    fn release_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        Python::with_gil(|py| py.allow_threads(f))
    }

    fn acquire_during<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Python::with_gil(|_py| f())
    }
}
