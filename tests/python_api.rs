//! Integration exercises for the Python-facing API.
//!
//! These need a Python runtime with NumPy installed. Run them with
//! `cargo test --features python --tests`.

#![cfg(feature = "python")]

use libloading::Library;
use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyList, PyModule};
use stablelse::init_test_module;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Once;

static PY_RUNTIME: Once = Once::new();

fn default_python() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push(".venv");
    path.push("bin");
    path.push("python");
    path
}

fn resolve_python_executable() -> PathBuf {
    if let Ok(explicit) = std::env::var("STABLELSE_TEST_PYTHON") {
        let candidate = PathBuf::from(explicit);
        if candidate.is_file() {
            return candidate;
        }
    }
    let candidate = default_python();
    if candidate.is_file() {
        return candidate;
    }
    PathBuf::from("python3")
}

fn resolve_python_library(python: &Path) -> PathBuf {
    let script = r#"
import sysconfig, pathlib
libdir = sysconfig.get_config_var('LIBDIR')
name = sysconfig.get_config_var('INSTSONAME') or sysconfig.get_config_var('LDLIBRARY')
path = pathlib.Path(libdir) / name
print(path.resolve())
"#;
    let output = Command::new(python)
        .args(["-c", script])
        .output()
        .unwrap_or_else(|err| panic!("Failed to execute {}: {err}", python.display()));
    if !output.status.success() {
        panic!(
            "Python reported failure while locating libpython:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    let path = String::from_utf8(output.stdout)
        .expect("python output should be utf-8")
        .trim()
        .to_owned();
    let path = PathBuf::from(path);
    if !path.exists() {
        panic!("Resolved libpython path does not exist: {}", path.display());
    }
    path
}

fn ensure_python_initialized() {
    PY_RUNTIME.call_once(|| {
        let python = resolve_python_executable();
        let libpython = resolve_python_library(&python);
        unsafe {
            Library::new(&libpython).unwrap_or_else(|err| {
                panic!(
                    "Failed to load libpython from {}: {err}",
                    libpython.display()
                )
            });
        }
        pyo3::prepare_freethreaded_python();
    });
}

fn init(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let module = PyModule::new_bound(py, "_stablelse_test")?;
    init_test_module(py, &module)?;
    Ok(module)
}

fn float32_array<'py>(py: Python<'py>, values: &[f32]) -> PyResult<Bound<'py, PyAny>> {
    let numpy = py.import_bound("numpy")?;
    numpy.call_method1("array", (PyList::new_bound(py, values), "float32"))
}

#[test]
fn logsumexp_of_zeros_is_log_len() -> PyResult<()> {
    ensure_python_initialized();

    Python::with_gil(|py| -> PyResult<()> {
        let module = init(py)?;
        let array = float32_array(py, &[0.0; 8])?;
        let value: f32 = module.getattr("logsumexp")?.call1((array,))?.extract()?;
        assert!((value - 8.0f32.ln()).abs() < 1e-6);
        Ok(())
    })
}

#[test]
fn pair_matches_rust_entry_point() -> PyResult<()> {
    ensure_python_initialized();

    Python::with_gil(|py| -> PyResult<()> {
        let module = init(py)?;
        let value: f32 = module
            .getattr("logsumexp_pair")?
            .call1((1.5f32, -2.0f32))?
            .extract()?;
        assert_eq!(value, stablelse::logsumexp_pair(1.5, -2.0));
        Ok(())
    })
}

#[test]
fn rows_reduce_each_row_independently() -> PyResult<()> {
    ensure_python_initialized();

    Python::with_gil(|py| -> PyResult<()> {
        let module = init(py)?;
        let flat = float32_array(py, &[0.0, 0.0, 0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 5.0, 5.0])?;
        let matrix = flat.call_method1("reshape", ((2, 5),))?;
        let rows: Vec<f32> = module.getattr("logsumexp_rows")?.call1((matrix,))?.extract()?;
        assert_eq!(rows.len(), 2);
        assert!((rows[0] - 5.0f32.ln()).abs() < 1e-6);
        assert!((rows[1] - (5.0 + 5.0f32.ln())).abs() < 1e-5);
        Ok(())
    })
}

#[test]
fn wrong_dtype_raises_type_error() -> PyResult<()> {
    ensure_python_initialized();

    Python::with_gil(|py| -> PyResult<()> {
        let module = init(py)?;
        let numpy = py.import_bound("numpy")?;
        let doubles = numpy.call_method1("zeros", (4,))?;
        let err = module
            .getattr("logsumexp")?
            .call1((doubles,))
            .unwrap_err();
        assert!(err.is_instance_of::<PyTypeError>(py));
        Ok(())
    })
}

#[test]
fn empty_array_raises_value_error() -> PyResult<()> {
    ensure_python_initialized();

    Python::with_gil(|py| -> PyResult<()> {
        let module = init(py)?;
        let empty = float32_array(py, &[])?;
        let err = module.getattr("logsumexp")?.call1((empty,)).unwrap_err();
        assert!(err.is_instance_of::<PyValueError>(py));
        Ok(())
    })
}

#[test]
fn backend_usage_reports_recorded_calls() -> PyResult<()> {
    ensure_python_initialized();

    Python::with_gil(|py| -> PyResult<()> {
        let module = init(py)?;
        let backend: String = module.getattr("simd_backend")?.call0()?.extract()?;
        module
            .getattr("logsumexp")?
            .call1((float32_array(py, &[1.0; 16])?,))?;
        let usage: Vec<(String, String, u64)> =
            module.getattr("backend_usage")?.call0()?.extract()?;
        assert!(usage
            .iter()
            .any(|(op, label, count)| op == "logsumexp" && *label == backend && *count >= 1));
        Ok(())
    })
}
