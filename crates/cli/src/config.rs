use anyhow::{Context, Result};
use ecu_ident_fingerprint::FingerprintConfig;
use ecu_ident_indexer::ScanOptions;
use ecu_ident_search::EngineOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_DATA_ROOT: &str = "ECU_IDENT_DATA_ROOT";

/// Runtime configuration, layered as defaults, TOML file, environment and
/// command-line flags (later layers win).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Corpus root; `None` leaves the corpus empty
    pub data_root: Option<PathBuf>,

    pub fingerprint: FingerprintConfig,
    pub scan: ScanOptions,
    pub engine: EngineOptions,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub kgram_k: Option<usize>,
    pub kgram_step: Option<usize>,
}

impl AppConfig {
    pub fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base
            .with_env(|key| std::env::var(key).ok())
            .with_overrides(overrides);
        config
            .fingerprint
            .validate()
            .context("Invalid fingerprint configuration")?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("Config file {} is not valid TOML", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(root) = lookup(ENV_DATA_ROOT).filter(|v| !v.trim().is_empty()) {
            self.data_root = Some(PathBuf::from(root.trim()));
        }
        self.fingerprint = self.fingerprint.with_env_overrides(lookup);
        self
    }

    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(root) = &overrides.root {
            self.data_root = Some(root.clone());
        }
        if let Some(chunk_size) = overrides.chunk_size {
            self.fingerprint.chunk_size = chunk_size;
        }
        if let Some(k) = overrides.kgram_k {
            self.fingerprint.kgram_k = k;
        }
        if let Some(step) = overrides.kgram_step {
            self.fingerprint.kgram_step = step;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecu_ident_fingerprint::{ENV_CHUNK_SIZE, ENV_KGRAM_STEP};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn toml_sections_override_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
data_root = "/srv/corpus"

[fingerprint]
kgram_step = 8

[scan]
binary_extensions = ["bin", "ori"]
read_timeout_ms = 5000
"#,
        )
        .unwrap();

        assert_eq!(config.data_root, Some(PathBuf::from("/srv/corpus")));
        assert_eq!(config.fingerprint.kgram_step, 8);
        assert_eq!(config.fingerprint.chunk_size, 2048);
        assert_eq!(config.scan.binary_extensions, vec!["bin", "ori"]);
        assert_eq!(config.scan.description_extensions, vec!["a2l"]);
        assert_eq!(config.scan.read_timeout_ms, 5000);
        assert_eq!(config.engine, EngineOptions::default());
    }

    #[test]
    fn env_then_flags_take_precedence() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_DATA_ROOT, "/from/env"),
            (ENV_CHUNK_SIZE, "1024"),
            (ENV_KGRAM_STEP, "4"),
        ]);
        let overrides = ConfigOverrides {
            root: Some(PathBuf::from("/from/flag")),
            kgram_step: Some(2),
            ..ConfigOverrides::default()
        };

        let config = AppConfig::default()
            .with_env(|key| vars.get(key).map(|v| v.to_string()))
            .with_overrides(&overrides);

        assert_eq!(config.data_root, Some(PathBuf::from("/from/flag")));
        assert_eq!(config.fingerprint.chunk_size, 1024);
        assert_eq!(config.fingerprint.kgram_step, 2);
    }

    #[test]
    fn blank_env_root_is_ignored() {
        let config = AppConfig::default().with_env(|key| (key == ENV_DATA_ROOT).then(|| "  ".to_string()));
        assert_eq!(config.data_root, None);
    }

    #[test]
    fn invalid_toml_is_reported() {
        assert!(AppConfig::from_toml_str("data_root = [").is_err());
    }
}
