use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid resolver config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Resolver settings, usually read from a flat TOML file.
///
/// ```toml
/// record_timeline = true
/// log_filter = "info,segue_runtime=debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Attach a `Timeline` of the pass to the returned state.
    pub record_timeline: bool,
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            record_timeline: true,
            log_filter: "info,segue_runtime=debug".to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}
