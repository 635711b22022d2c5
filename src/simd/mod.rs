//! Kernel selection for the log-sum-exp reductions.
//!
//! Every operation has a scalar kernel plus a list of vector candidates. The
//! first candidate the CPU (and configuration) allows is resolved once per
//! process and cached; inputs shorter than one lane never reach a kernel.

use std::sync::OnceLock;

mod cpu;
pub mod dispatch;
mod math;
mod portable;
mod scalar;

#[cfg(target_arch = "aarch64")]
mod neon;
#[cfg(target_arch = "x86_64")]
mod x86;

use self::dispatch::{Candidate, DispatchResult, DispatchTable};

pub use self::cpu::capabilities;
pub use self::dispatch::{SimdLevel, SimdMode};
pub use self::math::LANES;
pub use self::scalar::{logsumexp2, logsumexp3};
pub type SimdCapabilities = cpu::SimdCapabilities;

/// Four `f32` values laid out as one 128-bit SIMD register.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Lane4(pub [f32; LANES]);

impl Lane4 {
    pub const fn splat(value: f32) -> Self {
        Lane4([value; LANES])
    }
}

impl From<[f32; LANES]> for Lane4 {
    fn from(values: [f32; LANES]) -> Self {
        Lane4(values)
    }
}

impl From<Lane4> for [f32; LANES] {
    fn from(lanes: Lane4) -> Self {
        lanes.0
    }
}

type BufferKernel = unsafe fn(&[f32]) -> f32;
type LanesKernel = unsafe fn(&[Lane4]) -> f32;

#[cfg(target_arch = "x86_64")]
const BUFFER_CANDIDATES: &[Candidate<BufferKernel>] = &[
    Candidate::new(SimdLevel::Sse2, x86::logsumexp),
    Candidate::new(SimdLevel::Portable, portable::logsumexp as BufferKernel),
];

#[cfg(target_arch = "aarch64")]
const BUFFER_CANDIDATES: &[Candidate<BufferKernel>] = &[
    Candidate::new(SimdLevel::Neon, neon::logsumexp),
    Candidate::new(SimdLevel::Portable, portable::logsumexp as BufferKernel),
];

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
const BUFFER_CANDIDATES: &[Candidate<BufferKernel>] =
    &[Candidate::new(SimdLevel::Portable, portable::logsumexp as BufferKernel)];

#[cfg(target_arch = "x86_64")]
const LANES_CANDIDATES: &[Candidate<LanesKernel>] = &[
    Candidate::new(SimdLevel::Sse2, x86::logsumexp_lanes),
    Candidate::new(SimdLevel::Portable, portable::logsumexp_lanes as LanesKernel),
];

#[cfg(target_arch = "aarch64")]
const LANES_CANDIDATES: &[Candidate<LanesKernel>] = &[
    Candidate::new(SimdLevel::Neon, neon::logsumexp_lanes),
    Candidate::new(SimdLevel::Portable, portable::logsumexp_lanes as LanesKernel),
];

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
const LANES_CANDIDATES: &[Candidate<LanesKernel>] =
    &[Candidate::new(SimdLevel::Portable, portable::logsumexp_lanes as LanesKernel)];

const BUFFER_DISPATCH: DispatchTable<BufferKernel> =
    DispatchTable::new("logsumexp_f32", scalar::logsumexp as BufferKernel, BUFFER_CANDIDATES);

const LANES_DISPATCH: DispatchTable<LanesKernel> = DispatchTable::new(
    "logsumexp_lanes_f32",
    scalar::logsumexp_lanes as LanesKernel,
    LANES_CANDIDATES,
);

static BUFFER_SELECTION: OnceLock<DispatchResult<BufferKernel>> = OnceLock::new();
static LANES_SELECTION: OnceLock<DispatchResult<LanesKernel>> = OnceLock::new();

fn buffer_kernel() -> DispatchResult<BufferKernel> {
    *BUFFER_SELECTION
        .get_or_init(|| BUFFER_DISPATCH.resolve(dispatch::global_mode(), capabilities()))
}

fn lanes_kernel() -> DispatchResult<LanesKernel> {
    *LANES_SELECTION
        .get_or_init(|| LANES_DISPATCH.resolve(dispatch::global_mode(), capabilities()))
}

/// Backend that serves buffers of `len` elements.
pub fn level_for_len(len: usize) -> SimdLevel {
    if len < LANES {
        SimdLevel::Scalar
    } else {
        buffer_kernel().level
    }
}

/// Backend that serves lane-packed input.
pub fn lanes_level() -> SimdLevel {
    lanes_kernel().level
}

#[inline]
fn small_logsumexp(input: &[f32]) -> Option<f32> {
    match *input {
        [a] => Some(a),
        [a, b] => Some(logsumexp2(a, b)),
        [a, b, c] => Some(logsumexp3(a, b, c)),
        _ => None,
    }
}

/// Requires a non-empty `input`.
pub fn logsumexp_f32(input: &[f32]) -> f32 {
    debug_assert!(!input.is_empty());
    if let Some(value) = small_logsumexp(input) {
        return value;
    }
    // SAFETY: the resolved kernel's ISA was checked against `capabilities()`
    // and the input holds at least one full lane.
    unsafe { (buffer_kernel().func)(input) }
}

/// Requires a non-empty `input`.
pub fn logsumexp_lanes_f32(input: &[Lane4]) -> f32 {
    debug_assert!(!input.is_empty());
    // SAFETY: see `logsumexp_f32`.
    unsafe { (lanes_kernel().func)(input) }
}

/// Runs the buffer reduction on a specific backend; `None` if unavailable.
pub fn logsumexp_f32_on(level: SimdLevel, input: &[f32]) -> Option<f32> {
    debug_assert!(!input.is_empty());
    let kernel = BUFFER_DISPATCH.select(level, capabilities())?;
    if let Some(value) = small_logsumexp(input) {
        return Some(value);
    }
    // SAFETY: `select` only returns kernels the CPU supports.
    Some(unsafe { kernel(input) })
}

/// Runs the lane reduction on a specific backend; `None` if unavailable.
pub fn logsumexp_lanes_f32_on(level: SimdLevel, input: &[Lane4]) -> Option<f32> {
    debug_assert!(!input.is_empty());
    let kernel = LANES_DISPATCH.select(level, capabilities())?;
    // SAFETY: `select` only returns kernels the CPU supports.
    Some(unsafe { kernel(input) })
}
