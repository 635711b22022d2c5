//! NEON kernels for aarch64.

use std::arch::aarch64::*;

use super::math::{
    horizontal_max, EXP_C1, EXP_C2, EXP_HI, EXP_LO, EXP_POLY, LANES, LOG2EF,
};
use super::Lane4;

#[inline]
#[target_feature(enable = "neon")]
pub(crate) unsafe fn exp_ps(x: float32x4_t) -> float32x4_t {
    let one = vdupq_n_f32(1.0);
    let x = vminq_f32(x, vdupq_n_f32(EXP_HI));
    let x = vmaxq_f32(x, vdupq_n_f32(EXP_LO));

    let n = vrndmq_f32(vaddq_f32(vmulq_f32(x, vdupq_n_f32(LOG2EF)), vdupq_n_f32(0.5)));

    let r = vsubq_f32(x, vmulq_f32(n, vdupq_n_f32(EXP_C1)));
    let r = vsubq_f32(r, vmulq_f32(n, vdupq_n_f32(EXP_C2)));
    let z = vmulq_f32(r, r);

    let mut y = vdupq_n_f32(EXP_POLY[0]);
    for &c in &EXP_POLY[1..] {
        y = vaddq_f32(vmulq_f32(y, r), vdupq_n_f32(c));
    }
    let y = vaddq_f32(vaddq_f32(vmulq_f32(y, z), r), one);

    let bias = vaddq_s32(vcvtq_s32_f32(n), vdupq_n_s32(0x7f));
    let pow2n = vreinterpretq_f32_s32(vshlq_n_s32::<23>(bias));
    vmulq_f32(y, pow2n)
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn hmax(v: float32x4_t) -> f32 {
    let mut lanes = [0.0f32; LANES];
    vst1q_f32(lanes.as_mut_ptr(), v);
    horizontal_max(lanes)
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn hsum(v: float32x4_t) -> f32 {
    let pair = vadd_f32(vget_low_f32(v), vget_high_f32(v));
    vget_lane_f32::<0>(vpadd_f32(pair, pair))
}

/// Requires `input.len() >= LANES`.
#[target_feature(enable = "neon")]
pub unsafe fn logsumexp(input: &[f32]) -> f32 {
    debug_assert!(input.len() >= LANES);
    let body = input.len() & !(LANES - 1);
    let ptr = input.as_ptr();

    let mut acc = vld1q_f32(ptr);
    let mut index = LANES;
    while index < body {
        acc = vmaxq_f32(acc, vld1q_f32(ptr.add(index)));
        index += LANES;
    }
    let tail = &input[body..];
    let max = tail.iter().fold(hmax(acc), |m, &value| m.max(value));

    let m = vdupq_n_f32(max);
    let mut sum = exp_ps(vsubq_f32(vld1q_f32(ptr), m));
    index = LANES;
    while index < body {
        sum = vaddq_f32(sum, exp_ps(vsubq_f32(vld1q_f32(ptr.add(index)), m)));
        index += LANES;
    }
    let total = tail
        .iter()
        .fold(hsum(sum), |s, &value| s + (value - max).exp());

    total.ln() + max
}

/// Requires a non-empty `input`.
#[target_feature(enable = "neon")]
pub unsafe fn logsumexp_lanes(input: &[Lane4]) -> f32 {
    debug_assert!(!input.is_empty());
    let mut acc = vld1q_f32(input[0].0.as_ptr());
    for lanes in &input[1..] {
        acc = vmaxq_f32(acc, vld1q_f32(lanes.0.as_ptr()));
    }
    let max = hmax(acc);

    let m = vdupq_n_f32(max);
    let mut sum = exp_ps(vsubq_f32(vld1q_f32(input[0].0.as_ptr()), m));
    for lanes in &input[1..] {
        sum = vaddq_f32(sum, exp_ps(vsubq_f32(vld1q_f32(lanes.0.as_ptr()), m)));
    }

    hsum(sum).ln() + max
}
