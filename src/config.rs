//! Process-wide settings, read once from an optional JSON file and the
//! environment. Environment variables win over the file.

use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::Result;
use crate::simd::{SimdLevel, SimdMode};

pub const CONFIG_ENV: &str = "STABLELSE_CONFIG";
pub const SIMD_ENV: &str = "STABLELSE_SIMD";
pub const SIMD_MAX_ENV: &str = "STABLELSE_SIMD_MAX";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LseConfig {
    /// Kernel selection policy.
    pub simd: SimdMode,
    /// Highest backend the dispatcher may pick.
    pub max_level: Option<SimdLevel>,
}

impl LseConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Applies `STABLELSE_SIMD` / `STABLELSE_SIMD_MAX` style overrides looked
    /// up through `lookup`. Unparseable values are logged and ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(SIMD_ENV) {
            match SimdMode::parse(&value) {
                Some(mode) => self.simd = mode,
                None => log::warn!("ignoring {SIMD_ENV}={value:?}"),
            }
        }
        if let Some(value) = lookup(SIMD_MAX_ENV) {
            match SimdLevel::parse(&value) {
                Some(level) => self.max_level = Some(level),
                None => log::warn!("ignoring {SIMD_MAX_ENV}={value:?}"),
            }
        }
        self
    }
}

static CONFIG: OnceLock<LseConfig> = OnceLock::new();

pub fn config() -> &'static LseConfig {
    CONFIG.get_or_init(load_config)
}

fn load_config() -> LseConfig {
    let base = match env::var(CONFIG_ENV) {
        Ok(path) => read_config_file(Path::new(&path)),
        Err(_) => LseConfig::default(),
    };
    base.with_overrides(|name| env::var(name).ok())
}

fn read_config_file(path: &Path) -> LseConfig {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("cannot read {}: {err}", path.display());
            return LseConfig::default();
        }
    };
    LseConfig::from_json(&text).unwrap_or_else(|err| {
        log::warn!("{}: {err}", path.display());
        LseConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn json_fields_default_when_missing() {
        let config = LseConfig::from_json("{}").unwrap();
        assert_eq!(config, LseConfig::default());

        let config = LseConfig::from_json(r#"{"simd": "off", "max_level": "portable"}"#).unwrap();
        assert_eq!(config.simd, SimdMode::Disable);
        assert_eq!(config.max_level, Some(SimdLevel::Portable));
    }

    #[test]
    fn json_rejects_unknown_values() {
        assert!(LseConfig::from_json(r#"{"simd": "turbo"}"#).is_err());
        assert!(LseConfig::from_json(r#"{"threads": 4}"#).is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let base = LseConfig {
            simd: SimdMode::Disable,
            max_level: Some(SimdLevel::Scalar),
        };
        let config =
            base.with_overrides(lookup(&[(SIMD_ENV, "auto"), (SIMD_MAX_ENV, "sse2")]));
        assert_eq!(config.simd, SimdMode::Auto);
        assert_eq!(config.max_level, Some(SimdLevel::Sse2));
    }

    #[test]
    fn bad_environment_values_are_ignored() {
        let base = LseConfig {
            simd: SimdMode::Portable,
            max_level: None,
        };
        let config = base.with_overrides(lookup(&[(SIMD_ENV, "sometimes"), (SIMD_MAX_ENV, "avx9")]));
        assert_eq!(config, base);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = read_config_file(Path::new("/nonexistent/stablelse.json"));
        assert_eq!(config, LseConfig::default());
    }
}
