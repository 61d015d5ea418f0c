//! Python callables as native [`Invocable`]s

use std::marker::PhantomData;
use std::sync::Arc;

use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;

use crate::bridge::{Invocable, StoredCallback};

use super::gil::PythonGil;

/// A Python callable any native thread may invoke
///
/// The GIL is taken for every call and for the final release of the
/// callable. Exceptions are printed to `sys.stderr` and go no further.
pub struct PyCallback<E> {
    inner: Arc<StoredCallback<PythonGil, Py<PyAny>>>,
    _event: PhantomData<fn(E)>,
}

impl<E> PyCallback<E> {
    /// # Errors
    ///
    /// `TypeError` when `callback` is not callable; nothing is stored.
    pub fn new(callback: &Bound<'_, PyAny>) -> PyResult<Self> {
        if !callback.is_callable() {
            return Err(PyTypeError::new_err("callback argument must be callable!"));
        }
        Ok(PyCallback {
            inner: Arc::new(StoredCallback::new(PythonGil, callback.clone().unbind())),
            _event: PhantomData,
        })
    }
}

impl<E> Clone for PyCallback<E> {
    fn clone(&self) -> Self {
        PyCallback {
            inner: Arc::clone(&self.inner),
            _event: PhantomData,
        }
    }
}

impl<E> Invocable<E> for PyCallback<E>
where
    E: IntoPy<PyObject>,
{
    fn invoke(&self, event: E) {
        Python::with_gil(|py| {
            let event = event.into_py(py);
            if let Err(err) = self.inner.get().call1(py, (event,)) {
                log::error!("python callback raised: {}", err);
                err.print(py);
            }
        })
    }
}
