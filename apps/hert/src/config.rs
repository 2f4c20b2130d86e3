//! # Configuration
//!
//! Optional TOML configuration for the CLI. Flags always win over the file;
//! the file wins over built-in defaults.
//!
//! ```toml
//! [store]
//! path = "hert_refs.json"
//!
//! [output]
//! readable = true
//! ```

use hert_core::HertError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Store file used when neither flag nor config name one.
pub const DEFAULT_STORE_PATH: &str = "hert_refs.json";

/// Config file probed when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "hert.toml";

/// Parsed configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path of the reference store file.
    pub path: Option<PathBuf>,
}

/// `[output]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Default `decode`/`encode` output to the human-readable form.
    #[serde(default)]
    pub readable: bool,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicitly passed path must exist and parse; the probed default
    /// path is allowed to be absent (empty config) but not malformed.
    pub fn load(explicit: Option<&Path>) -> Result<Self, HertError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(HertError::IoError(format!(
                    "cannot read config {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        toml::from_str(&raw).map_err(|e| {
            HertError::SerializationError(format!("invalid config {}: {}", path.display(), e))
        })
    }

    /// Resolve the store path: flag > config > default.
    #[must_use]
    pub fn store_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.store.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH))
    }
}

// =============================================================================
// TESTS
// =============================================================================
