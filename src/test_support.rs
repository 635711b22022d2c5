use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Log-sum-exp evaluated in f64 with the max shift.
pub fn reference_logsumexp(values: &[f32]) -> f32 {
    let max = values
        .iter()
        .map(|&v| v as f64)
        .fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = values.iter().map(|&v| (v as f64 - max).exp()).sum();
    (sum.ln() + max) as f32
}

/// Deterministic uniform buffer in `[lo, hi)`.
pub fn seeded_buffer(len: usize, lo: f32, hi: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(lo..hi)).collect()
}

/// Asserts `actual` is within `rel * max(1, |expected|)` of `expected`.
#[track_caller]
pub fn assert_close(actual: f32, expected: f32, rel: f32) {
    let tolerance = rel * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual} (tolerance {tolerance})"
    );
}
