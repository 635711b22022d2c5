use numpy::{PyReadonlyArray2, PyReadonlyArrayDyn, PyUntypedArrayMethods};
use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyModule;

use crate::error::LseError;
use crate::metrics;
use crate::simd;

const OPERATION_BUFFER: &str = "logsumexp";
const OPERATION_PAIR: &str = "logsumexp_pair";
const OPERATION_ROWS: &str = "logsumexp_rows";

impl From<LseError> for PyErr {
    fn from(err: LseError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[pyfunction]
#[pyo3(name = "logsumexp")]
fn logsumexp_py(array: &Bound<'_, PyAny>) -> PyResult<f32> {
    let array: PyReadonlyArrayDyn<'_, f32> = array
        .extract()
        .map_err(|_| PyTypeError::new_err("expected a NumPy array of dtype float32"))?;
    let data = array
        .as_slice()
        .map_err(|_| PyValueError::new_err("array must be C-contiguous"))?;
    let value = crate::try_logsumexp(data)?;
    metrics::record_backend(OPERATION_BUFFER, simd::level_for_len(data.len()).label());
    Ok(value)
}

#[pyfunction]
#[pyo3(name = "logsumexp_pair")]
fn logsumexp_pair_py(a: f32, b: f32) -> f32 {
    metrics::record_backend(OPERATION_PAIR, simd::SimdLevel::Scalar.label());
    crate::logsumexp_pair(a, b)
}

/// One result per row of a 2-D float32 array.
#[pyfunction]
#[pyo3(name = "logsumexp_rows")]
fn logsumexp_rows_py(array: &Bound<'_, PyAny>) -> PyResult<Vec<f32>> {
    let array: PyReadonlyArray2<'_, f32> = array
        .extract()
        .map_err(|_| PyTypeError::new_err("expected a 2-D NumPy array of dtype float32"))?;
    let cols = array.shape()[1];
    let data = array
        .as_slice()
        .map_err(|_| PyValueError::new_err("array must be C-contiguous"))?;
    if cols == 0 {
        return Err(LseError::EmptyInput { op: OPERATION_ROWS }.into());
    }
    let label = simd::level_for_len(cols).label();
    let out: Vec<f32> = data.chunks_exact(cols).map(crate::logsumexp).collect();
    metrics::record_backend(OPERATION_ROWS, label);
    Ok(out)
}

#[pyfunction]
fn simd_backend() -> &'static str {
    crate::simd_backend().label()
}

#[pyfunction]
fn backend_usage() -> Vec<(&'static str, &'static str, u64)> {
    metrics::snapshot()
        .into_iter()
        .map(|usage| (usage.operation, usage.backend, usage.count))
        .collect()
}

#[pymodule]
fn _stablelse(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_wrapped(pyo3::wrap_pyfunction!(logsumexp_py))?;
    m.add_wrapped(pyo3::wrap_pyfunction!(logsumexp_pair_py))?;
    m.add_wrapped(pyo3::wrap_pyfunction!(logsumexp_rows_py))?;
    m.add_wrapped(pyo3::wrap_pyfunction!(simd_backend))?;
    m.add_wrapped(pyo3::wrap_pyfunction!(backend_usage))?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("__doc__", "Numerically stable SIMD log-sum-exp for float32 arrays.")?;

    Ok(())
}

pub fn init_test_module(py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    _stablelse(py, module)
}
