//! Numerically stable log-sum-exp over `f32` data with 4-wide SIMD kernels.
//!
//! `log(Σ exp(xᵢ))` is evaluated as `m + log(Σ exp(xᵢ - m))` with
//! `m = max(xᵢ)`, so every exponential argument is `<= 0` and large inputs
//! neither overflow nor lose the small terms.
//!
//! | Function | Input |
//! |----------|-------|
//! | [`logsumexp_pair`] | two scalars |
//! | [`logsumexp`] / [`try_logsumexp`] | a contiguous buffer of any length |
//! | [`logsumexp_lanes`] / [`try_logsumexp_lanes`] | data already packed into [`Lane4`] registers |
//!
//! The buffer and lane reductions run on the best backend the CPU offers
//! (SSE2 on x86_64, NEON on aarch64, `wide::f32x4` elsewhere, plain scalar when
//! SIMD is disabled). Vector backends use a polynomial exponential with a
//! relative error around 1e-7; results therefore differ from a scalar
//! `f32::exp` evaluation in the last bits but stay well within 1e-5 relative.
//!
//! Backend selection can be steered with `STABLELSE_SIMD`
//! (`off` / `portable` / `auto`), `STABLELSE_SIMD_MAX` (`scalar`, `portable`,
//! `sse2`, `neon`) or a JSON file named by `STABLELSE_CONFIG`.
//!
//! ```
//! let values = [0.0f32; 8];
//! let lse = stablelse::logsumexp(&values);
//! assert!((lse - 8.0f32.ln()).abs() < 1e-6);
//! ```

mod config;
mod error;
#[cfg(any(test, feature = "python"))]
mod metrics;
#[cfg(feature = "python")]
mod python;
mod simd;
#[cfg(test)]
mod test_support;

pub use crate::config::LseConfig;
pub use crate::error::{LseError, Result};
pub use crate::simd::{capabilities, Lane4, SimdCapabilities, SimdLevel, SimdMode, LANES};

#[cfg(feature = "python")]
pub use crate::python::init_test_module;

/// Stable log-sum-exp of exactly two values.
#[inline]
pub fn logsumexp_pair(a: f32, b: f32) -> f32 {
    simd::logsumexp2(a, b)
}

/// Stable log-sum-exp of `input`.
///
/// A single element is returned unchanged and two elements give exactly
/// [`logsumexp_pair`].
///
/// # Panics
///
/// Panics if `input` is empty; use [`try_logsumexp`] to get an error instead.
pub fn logsumexp(input: &[f32]) -> f32 {
    assert!(!input.is_empty(), "logsumexp requires at least one element");
    simd::logsumexp_f32(input)
}

pub fn try_logsumexp(input: &[f32]) -> Result<f32> {
    if input.is_empty() {
        return Err(LseError::EmptyInput { op: "logsumexp" });
    }
    Ok(simd::logsumexp_f32(input))
}

/// Stable log-sum-exp over every lane of every vector in `input`.
///
/// # Panics
///
/// Panics if `input` is empty; use [`try_logsumexp_lanes`] to get an error
/// instead.
pub fn logsumexp_lanes(input: &[Lane4]) -> f32 {
    assert!(
        !input.is_empty(),
        "logsumexp_lanes requires at least one vector"
    );
    simd::logsumexp_lanes_f32(input)
}

pub fn try_logsumexp_lanes(input: &[Lane4]) -> Result<f32> {
    if input.is_empty() {
        return Err(LseError::EmptyInput {
            op: "logsumexp_lanes",
        });
    }
    Ok(simd::logsumexp_lanes_f32(input))
}

/// Runs [`logsumexp`] on a specific backend instead of the resolved one.
pub fn logsumexp_with(level: SimdLevel, input: &[f32]) -> Result<f32> {
    if input.is_empty() {
        return Err(LseError::EmptyInput { op: "logsumexp" });
    }
    simd::logsumexp_f32_on(level, input).ok_or(LseError::Unsupported { level })
}

/// Runs [`logsumexp_lanes`] on a specific backend instead of the resolved one.
pub fn logsumexp_lanes_with(level: SimdLevel, input: &[Lane4]) -> Result<f32> {
    if input.is_empty() {
        return Err(LseError::EmptyInput {
            op: "logsumexp_lanes",
        });
    }
    simd::logsumexp_lanes_f32_on(level, input).ok_or(LseError::Unsupported { level })
}

/// Copies a flat buffer into 4-wide lanes. The length must be a multiple of
/// [`LANES`].
pub fn pack_lanes(input: &[f32]) -> Result<Vec<Lane4>> {
    if input.len() % LANES != 0 {
        return Err(LseError::Misaligned {
            len: input.len(),
            lanes: LANES,
        });
    }
    Ok(input
        .chunks_exact(LANES)
        .map(|chunk| Lane4([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Settings the dispatcher was initialised with.
pub fn active_config() -> &'static LseConfig {
    config::config()
}

/// Backend that [`logsumexp`] uses for inputs of at least one lane.
pub fn simd_backend() -> SimdLevel {
    simd::level_for_len(LANES)
}

/// Backend that [`logsumexp_lanes`] uses.
pub fn simd_lanes_backend() -> SimdLevel {
    simd::lanes_level()
}
