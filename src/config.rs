use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::layout::LayoutConfig;
use crate::network::Limits;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings read from the optional `--config` TOML file.
///
/// ```toml
/// [limits]
/// dist1 = 12
///
/// [layout]
/// iterations = 200
/// seed = 7
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub limits: Limits,
    pub layout: LayoutConfig,
}

impl ExplorerConfig {
    pub fn from_toml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path`, falling back to defaults when no path is given or the
    /// file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file missing, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config = Self::from_toml(&raw, path)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_builder_and_layout_defaults() {
        let config = ExplorerConfig::default();
        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.layout.iterations, 300);
        assert_eq!(config.layout.reheat_iterations, 150);
        assert_eq!(config.layout.ring_fractions, [0.15, 0.32, 0.45]);
    }

    #[test]
    fn partial_tables_keep_defaults() {
        let raw = r#"
[limits]
dist1 = 5

[layout]
seed = 42
padding = 20.0
"#;
        let config = ExplorerConfig::from_toml(raw, Path::new("inline.toml")).unwrap();
        assert_eq!(config.limits.dist1, 5);
        assert_eq!(config.limits.dist2, 15);
        assert_eq!(config.layout.seed, 42);
        assert_eq!(config.layout.padding, 20.0);
        assert_eq!(config.layout.velocity_decay, 0.4);
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = ExplorerConfig::default();
        config.limits.dist3 = 3;
        config.layout.charge_by_hop = [-400.0, -200.0, -100.0, -50.0];
        let raw = toml::to_string(&config).unwrap();
        let parsed = ExplorerConfig::from_toml(&raw, Path::new("roundtrip.toml")).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn missing_file_uses_defaults_but_bad_toml_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert_eq!(
            ExplorerConfig::load(Some(&missing)).unwrap(),
            ExplorerConfig::default()
        );
        assert_eq!(ExplorerConfig::load(None).unwrap(), ExplorerConfig::default());

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "[limits]\ndist1 = \"many\"\n").unwrap();
        assert!(matches!(
            ExplorerConfig::load(Some(&broken)),
            Err(ConfigError::Parse { .. })
        ));
    }
}
