use std::fmt;

use serde::Deserialize;

use super::SimdCapabilities;
use crate::config;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimdMode {
    #[default]
    Auto,
    Portable,
    #[serde(alias = "off")]
    Disable,
}

impl SimdMode {
    /// Parses the values accepted by `STABLELSE_SIMD`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "0" | "false" | "off" | "disable" => Some(SimdMode::Disable),
            "1" | "true" | "on" | "auto" => Some(SimdMode::Auto),
            "portable" | "wide" => Some(SimdMode::Portable),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimdLevel {
    Scalar,
    Portable,
    Sse2,
    Neon,
}

impl SimdLevel {
    pub const ALL: [SimdLevel; 4] = [
        SimdLevel::Scalar,
        SimdLevel::Portable,
        SimdLevel::Sse2,
        SimdLevel::Neon,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            SimdLevel::Scalar => "scalar",
            SimdLevel::Portable => "portable",
            SimdLevel::Sse2 => "sse2",
            SimdLevel::Neon => "neon",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scalar" => Some(SimdLevel::Scalar),
            "portable" | "wide" => Some(SimdLevel::Portable),
            "sse2" | "sse" => Some(SimdLevel::Sse2),
            "neon" => Some(SimdLevel::Neon),
            _ => None,
        }
    }

    pub fn supported(self, caps: &SimdCapabilities) -> bool {
        match self {
            SimdLevel::Scalar => true,
            SimdLevel::Portable => caps.portable,
            SimdLevel::Sse2 => caps.sse2,
            SimdLevel::Neon => caps.neon,
        }
    }
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy)]
pub struct Candidate<F> {
    pub level: SimdLevel,
    pub func: F,
}

impl<F> Candidate<F> {
    pub const fn new(level: SimdLevel, func: F) -> Self {
        Self { level, func }
    }
}

#[derive(Clone, Copy)]
pub struct DispatchResult<F> {
    pub level: SimdLevel,
    pub func: F,
}

/// Kernel variants for one operation, best first.
pub struct DispatchTable<F: Copy + 'static> {
    name: &'static str,
    scalar: F,
    candidates: &'static [Candidate<F>],
}

impl<F: Copy + 'static> DispatchTable<F> {
    pub const fn new(name: &'static str, scalar: F, candidates: &'static [Candidate<F>]) -> Self {
        Self {
            name,
            scalar,
            candidates,
        }
    }

    pub fn resolve(&self, mode: SimdMode, caps: &SimdCapabilities) -> DispatchResult<F> {
        let chosen = match mode {
            SimdMode::Disable => None,
            SimdMode::Portable => self.select(SimdLevel::Portable, caps).map(|func| DispatchResult {
                level: SimdLevel::Portable,
                func,
            }),
            SimdMode::Auto => self
                .candidates
                .iter()
                .find(|candidate| candidate.level.supported(caps))
                .map(|candidate| DispatchResult {
                    level: candidate.level,
                    func: candidate.func,
                }),
        };
        let result = chosen.unwrap_or(DispatchResult {
            level: SimdLevel::Scalar,
            func: self.scalar,
        });
        log::debug!(
            "{} resolved to {} (mode={:?}, caps={})",
            self.name,
            result.level,
            mode,
            caps
        );
        result
    }

    /// Returns the kernel registered for `level`, if the machine can run it.
    pub fn select(&self, level: SimdLevel, caps: &SimdCapabilities) -> Option<F> {
        if level == SimdLevel::Scalar {
            return Some(self.scalar);
        }
        self.candidates
            .iter()
            .find(|candidate| candidate.level == level && level.supported(caps))
            .map(|candidate| candidate.func)
    }
}

pub fn global_mode() -> SimdMode {
    config::config().simd
}
