//! `wide::f32x4` kernels for targets without a dedicated backend.

use wide::{f32x4, i32x4};

use super::math::{
    horizontal_max, horizontal_sum, EXP_C1, EXP_C2, EXP_HI, EXP_LO, EXP_POLY, LANES, LOG2EF,
};
use super::Lane4;

#[inline]
fn load(chunk: &[f32]) -> f32x4 {
    f32x4::from([chunk[0], chunk[1], chunk[2], chunk[3]])
}

#[inline]
pub(crate) fn exp4(x: f32x4) -> f32x4 {
    // `min`/`max` pick the non-NaN operand, so NaN lanes are restored after the clamp.
    let clamped = x.min(f32x4::splat(EXP_HI)).max(f32x4::splat(EXP_LO));
    let x = x.is_nan().blend(x, clamped);

    let n = (x * f32x4::splat(LOG2EF) + f32x4::splat(0.5)).floor();

    let r = x - n * f32x4::splat(EXP_C1) - n * f32x4::splat(EXP_C2);
    let z = r * r;
    let poly = EXP_POLY[1..]
        .iter()
        .fold(f32x4::splat(EXP_POLY[0]), |acc, &c| acc * r + f32x4::splat(c));
    let y = poly * z + r + f32x4::splat(1.0);

    let bits = (n.round_int() + i32x4::splat(0x7f)) << 23;
    y * bytemuck::cast::<i32x4, f32x4>(bits)
}

/// Requires `input.len() >= LANES`.
pub fn logsumexp(input: &[f32]) -> f32 {
    debug_assert!(input.len() >= LANES);
    let body = input.len() & !(LANES - 1);
    let (head, tail) = input.split_at(body);

    let mut chunks = head.chunks_exact(LANES);
    let mut acc = chunks.next().map(load).unwrap_or(f32x4::splat(f32::NEG_INFINITY));
    for chunk in chunks {
        acc = acc.max(load(chunk));
    }
    let max = tail
        .iter()
        .fold(horizontal_max(acc.into()), |m, &value| m.max(value));

    let m = f32x4::splat(max);
    let mut sum = f32x4::splat(0.0);
    for chunk in head.chunks_exact(LANES) {
        sum = sum + exp4(load(chunk) - m);
    }
    let total = tail
        .iter()
        .fold(horizontal_sum(sum.into()), |s, &value| s + (value - max).exp());

    total.ln() + max
}

/// Requires a non-empty `input`.
pub fn logsumexp_lanes(input: &[Lane4]) -> f32 {
    debug_assert!(!input.is_empty());
    let mut acc = f32x4::from(input[0].0);
    for lanes in &input[1..] {
        acc = acc.max(f32x4::from(lanes.0));
    }
    let max = horizontal_max(acc.into());

    let m = f32x4::splat(max);
    let mut sum = f32x4::splat(0.0);
    for lanes in input {
        sum = sum + exp4(f32x4::from(lanes.0) - m);
    }

    horizontal_sum(sum.into()).ln() + max
}
