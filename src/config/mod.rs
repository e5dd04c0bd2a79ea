//! TOML-based configuration.
//!
//! Supports a config file (schemalens.toml) with environment variable
//! expansion in source paths.
//!
//! Example configuration:
//! ```toml
//! [cache]
//! path = "./ontology.db"
//!
//! [discovery]
//! min_confidence = 0.5
//!
//! [server]
//! port = 7878
//!
//! [sources.sqlite]
//! driver = "sqlite"
//! path = "./data/landscape.db"
//!
//! [sources.hana]
//! driver = "schema_file"
//! path = "${HANA_SCHEMA_EXPORT}"
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::metadata::{ProviderRegistry, SchemaFileProvider, SqliteCatalogProvider};

/// Default config file name, looked up in the working directory.
const CONFIG_FILE: &str = "schemalens.toml";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported driver '{driver}' for source '{source_id}'")]
    UnsupportedDriver { source_id: String, driver: String },
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Ontology cache location.
    pub cache: CacheSettings,

    /// Discovery engine tuning.
    pub discovery: DiscoverySettings,

    /// Web server settings.
    pub server: ServerSettings,

    /// Named metadata sources, keyed by source id.
    pub sources: HashMap<String, SourceSettings>,
}

/// Cache store settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Database file path. Defaults to `~/.schemalens/ontology.db`.
    pub path: Option<PathBuf>,
}

/// Discovery engine settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Minimum confidence a candidate needs to be persisted.
    pub min_confidence: f64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            min_confidence: crate::discovery::thresholds::MIN_PERSIST,
        }
    }
}

/// Web server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 7878 }
    }
}

/// One configured metadata source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceSettings {
    /// Provider driver: "sqlite" or "schema_file".
    pub driver: String,

    /// Path to the database file or schema document. Supports `${ENV_VAR}`
    /// expansion.
    pub path: String,
}

impl Settings {
    /// Load from `schemalens.toml` in the working directory, or defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self, SettingsError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&raw)?;
        Ok(settings)
    }

    /// Build the provider registry from the configured sources.
    pub fn build_registry(&self) -> Result<ProviderRegistry, SettingsError> {
        let mut registry = ProviderRegistry::new();
        for (source_id, source) in &self.sources {
            let path = expand_env(&source.path)?;
            match source.driver.as_str() {
                "sqlite" => {
                    registry.register(source_id, Arc::new(SqliteCatalogProvider::new(&path)));
                }
                "schema_file" => {
                    registry.register(source_id, Arc::new(SchemaFileProvider::new(&path)));
                }
                other => {
                    return Err(SettingsError::UnsupportedDriver {
                        source_id: source_id.clone(),
                        driver: other.to_string(),
                    });
                }
            }
        }
        Ok(registry)
    }
}

/// Expand `${VAR}` references against the process environment.
fn expand_env(value: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return Ok(result);
        };
        let name = &after[..end];
        let expanded =
            env::var(name).map_err(|_| SettingsError::MissingEnvVar(name.to_string()))?;
        result.push_str(&expanded);
        rest = &after[end + 1..];
    }
    result.push_str(rest);
    Ok(result)
}
