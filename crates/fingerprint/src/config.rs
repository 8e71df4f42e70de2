use crate::error::{FingerprintError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHUNK_SIZE: usize = 2048;
pub const DEFAULT_KGRAM_K: usize = 64;
pub const DEFAULT_KGRAM_STEP: usize = 16;

pub const ENV_CHUNK_SIZE: &str = "ECU_IDENT_CHUNK_SIZE";
pub const ENV_KGRAM_K: &str = "ECU_IDENT_KGRAM_K";
pub const ENV_KGRAM_STEP: &str = "ECU_IDENT_KGRAM_STEP";

/// Sensitivity knobs for the fuzzy fingerprints.
///
/// A smaller `kgram_step` raises recall against shifted copies at the cost of
/// more hashing work and larger sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Window size for fixed chunk hashes, in bytes
    pub chunk_size: usize,

    /// Window length for k-gram hashes, in bytes
    pub kgram_k: usize,

    /// Distance between consecutive k-gram windows, in bytes
    pub kgram_step: usize,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            kgram_k: DEFAULT_KGRAM_K,
            kgram_step: DEFAULT_KGRAM_STEP,
        }
    }
}

impl FingerprintConfig {
    pub fn new(chunk_size: usize, kgram_k: usize, kgram_step: usize) -> Result<Self> {
        let config = Self {
            chunk_size,
            kgram_k,
            kgram_step,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("chunk_size", self.chunk_size),
            ("kgram_k", self.kgram_k),
            ("kgram_step", self.kgram_step),
        ] {
            if value == 0 {
                return Err(FingerprintError::ZeroParameter { name });
            }
        }
        Ok(())
    }

    /// Defaults overridden by `ECU_IDENT_CHUNK_SIZE`, `ECU_IDENT_KGRAM_K` and
    /// `ECU_IDENT_KGRAM_STEP`.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source. Unset, empty,
    /// unparsable and zero values keep the current setting.
    pub fn with_env_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            chunk_size: parse_positive(lookup(ENV_CHUNK_SIZE).as_deref(), self.chunk_size),
            kgram_k: parse_positive(lookup(ENV_KGRAM_K).as_deref(), self.kgram_k),
            kgram_step: parse_positive(lookup(ENV_KGRAM_STEP).as_deref(), self.kgram_step),
        }
    }
}

fn parse_positive(raw: Option<&str>, default_value: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn parse_positive_defaults_and_rejects_zero() {
        assert_eq!(parse_positive(None, 7), 7);
        assert_eq!(parse_positive(Some(""), 7), 7);
        assert_eq!(parse_positive(Some("  "), 7), 7);
        assert_eq!(parse_positive(Some("0"), 7), 7);
        assert_eq!(parse_positive(Some("abc"), 7), 7);
        assert_eq!(parse_positive(Some(" 8 "), 7), 8);
    }

    #[test]
    fn env_overrides_apply_per_key() {
        let vars: HashMap<&str, &str> = HashMap::from([(ENV_KGRAM_STEP, "8"), (ENV_KGRAM_K, "x")]);
        let config =
            FingerprintConfig::default().with_env_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(
            config,
            FingerprintConfig {
                chunk_size: DEFAULT_CHUNK_SIZE,
                kgram_k: DEFAULT_KGRAM_K,
                kgram_step: 8,
            }
        );
    }

    #[test]
    fn zero_parameters_are_rejected() {
        assert_eq!(
            FingerprintConfig::new(2048, 0, 16),
            Err(FingerprintError::ZeroParameter { name: "kgram_k" })
        );
        assert!(FingerprintConfig::new(1, 1, 1).is_ok());
    }
}
