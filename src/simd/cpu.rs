use std::fmt;
use std::sync::OnceLock;

use super::SimdLevel;
use crate::config;

#[derive(Clone, Copy, Debug)]
pub struct SimdCapabilities {
    pub arch: &'static str,
    /// `wide::f32x4` kernels; compiled for every target.
    pub portable: bool,
    pub sse2: bool,
    pub neon: bool,
}

impl SimdCapabilities {
    pub fn feature_level(&self) -> SimdLevel {
        if self.sse2 {
            SimdLevel::Sse2
        } else if self.neon {
            SimdLevel::Neon
        } else if self.portable {
            SimdLevel::Portable
        } else {
            SimdLevel::Scalar
        }
    }

    /// Caps the capabilities at `max`, as requested by `STABLELSE_SIMD_MAX`.
    pub fn capped(mut self, max: SimdLevel) -> Self {
        match max {
            SimdLevel::Scalar => {
                self.portable = false;
                self.sse2 = false;
                self.neon = false;
            }
            SimdLevel::Portable => {
                self.sse2 = false;
                self.neon = false;
            }
            SimdLevel::Sse2 => {
                self.neon = false;
            }
            SimdLevel::Neon => {
                self.sse2 = false;
            }
        }
        self
    }
}

impl fmt::Display for SimdCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} (portable={}, sse2={}, neon={})",
            self.arch,
            self.feature_level(),
            self.portable,
            self.sse2,
            self.neon
        )
    }
}

static CAPABILITIES: OnceLock<SimdCapabilities> = OnceLock::new();

pub fn capabilities() -> &'static SimdCapabilities {
    CAPABILITIES.get_or_init(|| {
        let caps = detect();
        match config::config().max_level {
            Some(max) => caps.capped(max),
            None => caps,
        }
    })
}

#[cfg(target_arch = "x86_64")]
fn detect() -> SimdCapabilities {
    SimdCapabilities {
        arch: "x86_64",
        portable: true,
        sse2: std::arch::is_x86_feature_detected!("sse2"),
        neon: false,
    }
}

#[cfg(target_arch = "aarch64")]
fn detect() -> SimdCapabilities {
    SimdCapabilities {
        arch: "aarch64",
        portable: true,
        sse2: false,
        neon: std::arch::is_aarch64_feature_detected!("neon"),
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect() -> SimdCapabilities {
    SimdCapabilities {
        arch: "generic",
        portable: true,
        sse2: false,
        neon: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> SimdCapabilities {
        SimdCapabilities {
            arch: "test",
            portable: true,
            sse2: true,
            neon: true,
        }
    }

    #[test]
    fn capping_at_scalar_disables_every_vector_path() {
        let caps = full().capped(SimdLevel::Scalar);
        assert_eq!(caps.feature_level(), SimdLevel::Scalar);
        assert!(!caps.portable && !caps.sse2 && !caps.neon);
    }

    #[test]
    fn capping_at_portable_keeps_wide_kernels() {
        let caps = full().capped(SimdLevel::Portable);
        assert_eq!(caps.feature_level(), SimdLevel::Portable);
    }

    #[test]
    fn detected_capabilities_always_include_portable_unless_capped() {
        let caps = detect();
        assert!(caps.portable);
        assert!(caps.to_string().starts_with(caps.arch));
    }
}
