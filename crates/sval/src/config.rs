//! Rule configuration documents and loaders
//!
//! ```yaml
//! rules:
//!   user.email:
//!     type: email
//!     params:
//!       required: true
//!   items[].value:
//!     type: int
//!     params: { min: 0 }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::ConfigError;

/// File names searched by config discovery, in order
pub const DEFAULT_CONFIG_FILES: [&str; 3] = ["sval.yaml", "sval.yml", "sval.json"];

// ============================================================================
// Documents
// ============================================================================

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Rule path → rule definition
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

/// One rule definition
///
/// The type stays a plain string here so that an unknown name is reported
/// together with the rule path it was configured under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default)]
    pub params: Map<String, JsonValue>,
}

impl RuleConfig {
    pub fn new(rule_type: impl Into<String>) -> Self {
        Self {
            rule_type: rule_type.into(),
            params: Map::new(),
        }
    }

    /// Set one parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the rule at `path`
    pub fn with_rule(mut self, path: impl Into<String>, rule: RuleConfig) -> Self {
        self.rules.insert(path.into(), rule);
        self
    }

    /// Parse a YAML document
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        // An empty document is an empty rule set
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse a JSON document
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a config file, choosing the parser by extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = match format {
            ConfigFormat::Yaml => Self::from_yaml_str(&text)?,
            ConfigFormat::Json => Self::from_json_str(&text)?,
        };
        debug!(path = %path.display(), rules = config.rules.len(), "Loaded validation config");
        Ok(config)
    }

    /// Serialize back to YAML
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Format implied by a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Some(ConfigFormat::Yaml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(ConfigFormat::Json)
        } else {
            None
        }
    }
}

// ============================================================================
// Loaders
// ============================================================================

/// Source of a [`ValidatorConfig`]
pub trait ConfigLoader {
    fn load(&self) -> Result<ValidatorConfig, ConfigError>;
}

/// Loads a config from one file
#[derive(Debug, Clone)]
pub struct FileConfigLoader {
    pub path: PathBuf,
}

impl FileConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigLoader for FileConfigLoader {
    fn load(&self) -> Result<ValidatorConfig, ConfigError> {
        ValidatorConfig::from_path(&self.path)
    }
}

/// Loads a config that is already in memory
#[derive(Debug, Clone, Default)]
pub struct StaticConfigLoader {
    pub config: ValidatorConfig,
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<ValidatorConfig, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Find the first of [`DEFAULT_CONFIG_FILES`] present in `dir`
pub fn discover_config(dir: impl AsRef<Path>) -> Option<PathBuf> {
    let dir = dir.as_ref();
    let found = DEFAULT_CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file());
    if found.is_none() {
        warn!(dir = %dir.display(), "No validation config found");
    }
    found
}

/// Loader for the config discovered in the working directory
pub fn default_config_loader() -> Result<FileConfigLoader, ConfigError> {
    let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    discover_config(&cwd)
        .map(FileConfigLoader::new)
        .ok_or_else(|| ConfigError::NotFound(DEFAULT_CONFIG_FILES.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const YAML: &str = r#"
rules:
  user.email:
    type: email
    params:
      required: true
      strategy: rfc5321
  items[].value:
    type: int
    params: { min: 0, max: 10 }
  note:
    type: string
"#;

    #[test]
    fn test_from_yaml_str() {
        let config = ValidatorConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.rules.len(), 3);
        let email = &config.rules["user.email"];
        assert_eq!(email.rule_type, "email");
        assert_eq!(email.params["strategy"], json!("rfc5321"));
        assert_eq!(config.rules["items[].value"].params["max"], json!(10));
        assert!(config.rules["note"].params.is_empty());
    }

    #[test]
    fn test_from_json_str() {
        let config = ValidatorConfig::from_json_str(
            r#"{"rules": {"ip": {"type": "ip", "params": {"version": 4}}}}"#,
        )
        .unwrap();
        assert_eq!(config.rules["ip"].rule_type, "ip");
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            ValidatorConfig::from_yaml_str("rules: [1, 2"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            ValidatorConfig::from_json_str("{\"rules\": {\"a\": {}}}"),
            Err(ConfigError::Json(_))
        ));
        assert!(ValidatorConfig::from_yaml_str("ruels: {}").is_err());
        assert!(ValidatorConfig::from_yaml_str("").unwrap().rules.is_empty());
    }

    #[test]
    fn test_builder_round_trip_yaml() {
        let config = ValidatorConfig::new()
            .with_rule("name", RuleConfig::new("string").param("min_len", 2));
        let text = config.to_yaml_string().unwrap();
        assert_eq!(ValidatorConfig::from_yaml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_file_loader_by_extension() {
        let dir = TempDir::new().unwrap();
        let yaml = dir.path().join("rules.yml");
        fs::write(&yaml, YAML).unwrap();
        assert_eq!(FileConfigLoader::new(&yaml).load().unwrap().rules.len(), 3);

        let json = dir.path().join("rules.json");
        fs::write(&json, r#"{"rules": {"a": {"type": "int"}}}"#).unwrap();
        assert_eq!(FileConfigLoader::new(&json).load().unwrap().rules.len(), 1);

        let toml = dir.path().join("rules.toml");
        fs::write(&toml, "").unwrap();
        assert!(matches!(
            FileConfigLoader::new(&toml).load(),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            FileConfigLoader::new(dir.path().join("missing.yaml")).load(),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_discover_config_order() {
        let dir = TempDir::new().unwrap();
        assert!(discover_config(dir.path()).is_none());

        fs::write(dir.path().join("sval.json"), "{}").unwrap();
        assert_eq!(discover_config(dir.path()).unwrap(), dir.path().join("sval.json"));

        fs::write(dir.path().join("sval.yaml"), "rules: {}").unwrap();
        assert_eq!(discover_config(dir.path()).unwrap(), dir.path().join("sval.yaml"));
    }

    #[test]
    fn test_static_loader() {
        let loader = StaticConfigLoader {
            config: ValidatorConfig::new().with_rule("a", RuleConfig::new("int")),
        };
        assert_eq!(loader.load().unwrap().rules.len(), 1);
    }
}
