//! Constants and lane helpers shared by the vector kernels.
//!
//! The vector exponential is the Cephes `expf` polynomial: clamp, split
//! `x = n·ln2 + r` with a two-part ln2, evaluate a degree-5 polynomial in `r`
//! and scale by `2^n` through the float exponent bits. Relative error stays
//! around 1e-7 over `[-87, 88]`; arguments at or below `EXP_LO` come out as 0.

pub const LANES: usize = 4;

pub const EXP_HI: f32 = 88.376_26;
pub const EXP_LO: f32 = -88.376_26;
pub const LOG2EF: f32 = std::f32::consts::LOG2_E;
pub const EXP_C1: f32 = 0.693_359_375;
pub const EXP_C2: f32 = -2.121_944_4e-4;

/// Polynomial coefficients, highest degree first.
pub const EXP_POLY: [f32; 6] = [
    1.987_569_15e-4,
    1.398_199_95e-3,
    8.333_451_9e-3,
    4.166_579_59e-2,
    1.666_666_55e-1,
    5.000_000_12e-1,
];

/// Folds four lane maxima in the order `((l0, l1), l2), l3`.
#[inline]
pub fn horizontal_max(lanes: [f32; LANES]) -> f32 {
    lanes[0].max(lanes[1]).max(lanes[2]).max(lanes[3])
}

/// Pairwise lane sum, `(l0 + l2) + (l1 + l3)`.
#[inline]
pub fn horizontal_sum(lanes: [f32; LANES]) -> f32 {
    (lanes[0] + lanes[2]) + (lanes[1] + lanes[3])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_sum_pairs_opposite_lanes() {
        assert_eq!(horizontal_sum([1.0, 2.0, 3.0, 4.0]), 10.0);
        // Opposite lanes meet first, so the large values cancel exactly.
        assert_eq!(horizontal_sum([1.0e8, 1.0, -1.0e8, 1.0]), 2.0);
    }

    #[test]
    fn horizontal_max_finds_each_lane() {
        for lane in 0..LANES {
            let mut values = [0.0f32; LANES];
            values[lane] = 5.0;
            assert_eq!(horizontal_max(values), 5.0);
        }
    }
}
