//! SSE2 kernels for x86_64.

use std::arch::x86_64::*;

use super::math::{
    horizontal_max, EXP_C1, EXP_C2, EXP_HI, EXP_LO, EXP_POLY, LANES, LOG2EF,
};
use super::Lane4;

#[inline]
#[target_feature(enable = "sse2")]
pub(crate) unsafe fn exp_ps(x: __m128) -> __m128 {
    let one = _mm_set1_ps(1.0);
    // NaN in the second operand wins, so NaN lanes pass the clamp.
    let x = _mm_min_ps(_mm_set1_ps(EXP_HI), x);
    let x = _mm_max_ps(_mm_set1_ps(EXP_LO), x);

    // n = floor(x * log2(e) + 0.5); cvttps truncates toward zero.
    let fx = _mm_add_ps(_mm_mul_ps(x, _mm_set1_ps(LOG2EF)), _mm_set1_ps(0.5));
    let truncated = _mm_cvtepi32_ps(_mm_cvttps_epi32(fx));
    let borrow = _mm_and_ps(_mm_cmpgt_ps(truncated, fx), one);
    let n = _mm_sub_ps(truncated, borrow);

    let r = _mm_sub_ps(x, _mm_mul_ps(n, _mm_set1_ps(EXP_C1)));
    let r = _mm_sub_ps(r, _mm_mul_ps(n, _mm_set1_ps(EXP_C2)));
    let z = _mm_mul_ps(r, r);

    let mut y = _mm_set1_ps(EXP_POLY[0]);
    for &c in &EXP_POLY[1..] {
        y = _mm_add_ps(_mm_mul_ps(y, r), _mm_set1_ps(c));
    }
    let y = _mm_add_ps(_mm_add_ps(_mm_mul_ps(y, z), r), one);

    let bias = _mm_add_epi32(_mm_cvttps_epi32(n), _mm_set1_epi32(0x7f));
    let pow2n = _mm_castsi128_ps(_mm_slli_epi32::<23>(bias));
    _mm_mul_ps(y, pow2n)
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn hmax(v: __m128) -> f32 {
    let mut lanes = [0.0f32; LANES];
    _mm_storeu_ps(lanes.as_mut_ptr(), v);
    horizontal_max(lanes)
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn hsum(v: __m128) -> f32 {
    let v = _mm_add_ps(v, _mm_movehl_ps(v, v));
    let v = _mm_add_ss(v, _mm_shuffle_ps::<0x01>(v, v));
    _mm_cvtss_f32(v)
}

/// Requires `input.len() >= LANES`.
#[target_feature(enable = "sse2")]
pub unsafe fn logsumexp(input: &[f32]) -> f32 {
    debug_assert!(input.len() >= LANES);
    let body = input.len() & !(LANES - 1);
    let ptr = input.as_ptr();

    let mut acc = _mm_loadu_ps(ptr);
    let mut index = LANES;
    while index < body {
        acc = _mm_max_ps(acc, _mm_loadu_ps(ptr.add(index)));
        index += LANES;
    }
    let tail = &input[body..];
    let max = tail.iter().fold(hmax(acc), |m, &value| m.max(value));

    let m = _mm_set1_ps(max);
    let mut sum = exp_ps(_mm_sub_ps(_mm_loadu_ps(ptr), m));
    index = LANES;
    while index < body {
        sum = _mm_add_ps(sum, exp_ps(_mm_sub_ps(_mm_loadu_ps(ptr.add(index)), m)));
        index += LANES;
    }
    let total = tail
        .iter()
        .fold(hsum(sum), |s, &value| s + (value - max).exp());

    total.ln() + max
}

/// Requires a non-empty `input`.
#[target_feature(enable = "sse2")]
pub unsafe fn logsumexp_lanes(input: &[Lane4]) -> f32 {
    debug_assert!(!input.is_empty());
    let mut acc = _mm_load_ps(input[0].0.as_ptr());
    for lanes in &input[1..] {
        acc = _mm_max_ps(acc, _mm_load_ps(lanes.0.as_ptr()));
    }
    let max = hmax(acc);

    let m = _mm_set1_ps(max);
    let mut sum = exp_ps(_mm_sub_ps(_mm_load_ps(input[0].0.as_ptr()), m));
    for lanes in &input[1..] {
        sum = _mm_add_ps(sum, exp_ps(_mm_sub_ps(_mm_load_ps(lanes.0.as_ptr()), m)));
    }

    hsum(sum).ln() + max
}
