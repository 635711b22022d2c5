//! Scalar kernels. The general path keeps four independent running maxima and
//! sums, the same layout as the vector backends, with `f32::exp` in place of
//! the polynomial.

use super::math::{horizontal_max, horizontal_sum, LANES};
use super::Lane4;

#[inline]
pub fn logsumexp2(a: f32, b: f32) -> f32 {
    let max = a.max(b);
    ((a - max).exp() + (b - max).exp()).ln() + max
}

#[inline]
pub fn logsumexp3(a: f32, b: f32, c: f32) -> f32 {
    let max = a.max(b).max(c);
    ((a - max).exp() + (b - max).exp() + (c - max).exp()).ln() + max
}

/// Requires `input.len() >= LANES`.
pub fn logsumexp(input: &[f32]) -> f32 {
    debug_assert!(input.len() >= LANES);
    let body = input.len() & !(LANES - 1);
    let (head, tail) = input.split_at(body);

    let mut maxima = [head[0], head[1], head[2], head[3]];
    for chunk in head[LANES..].chunks_exact(LANES) {
        for (lane, &value) in maxima.iter_mut().zip(chunk) {
            *lane = lane.max(value);
        }
    }
    let max = tail
        .iter()
        .fold(horizontal_max(maxima), |acc, &value| acc.max(value));

    let mut sums = [0.0f32; LANES];
    for chunk in head.chunks_exact(LANES) {
        for (lane, &value) in sums.iter_mut().zip(chunk) {
            *lane += (value - max).exp();
        }
    }
    let total = tail
        .iter()
        .fold(horizontal_sum(sums), |acc, &value| acc + (value - max).exp());

    total.ln() + max
}

/// Requires a non-empty `input`.
pub fn logsumexp_lanes(input: &[Lane4]) -> f32 {
    debug_assert!(!input.is_empty());
    let mut maxima = input[0].0;
    for lanes in &input[1..] {
        for (lane, &value) in maxima.iter_mut().zip(lanes.0.iter()) {
            *lane = lane.max(value);
        }
    }
    let max = horizontal_max(maxima);

    let mut sums = [0.0f32; LANES];
    for lanes in input {
        for (lane, &value) in sums.iter_mut().zip(lanes.0.iter()) {
            *lane += (value - max).exp();
        }
    }

    horizontal_sum(sums).ln() + max
}
