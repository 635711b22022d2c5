//! Error types for stablelse

use crate::simd::SimdLevel;

/// Result type alias
pub type Result<T> = std::result::Result<T, LseError>;

/// Failures reported by the checked entry points.
///
/// The numeric kernels never fail on valid input; every variant here is a
/// caller contract violation or a configuration problem.
#[derive(Debug, thiserror::Error)]
pub enum LseError {
    /// The reduction was given no elements
    #[error("{op} requires at least one element")]
    EmptyInput {
        /// Operation that rejected the input
        op: &'static str,
    },

    /// A flat buffer could not be split into whole 4-wide lanes
    #[error("buffer of length {len} is not a multiple of the lane width {lanes}")]
    Misaligned {
        /// Length of the offending buffer
        len: usize,
        /// Lane width the buffer was packed into
        lanes: usize,
    },

    /// The requested backend is not available on this machine
    #[error("SIMD backend `{level}` is not available on this machine")]
    Unsupported {
        /// Backend that was requested
        level: SimdLevel,
    },

    /// Configuration file could not be parsed
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
