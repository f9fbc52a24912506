//! Configuration for the reconcile tooling
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/awplus/awplus.toml)
//! - User configuration (~/.awplus/config.toml)
//! - Project configuration (./awplus.toml)
//! - Environment variables
//! - Command-line arguments

use crate::error::{Error, ErrorContext, Result};
use crate::modules::network::State;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default settings
    pub defaults: Defaults,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Where facts documents are looked up
    pub facts: FactsConfig,

    /// Colors and output settings
    pub colors: ColorsConfig,
}

/// Default settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// State used when none is given on the command line
    pub state: State,

    /// Output format (human, json, yaml)
    pub output: String,

    /// Always show a before/after diff
    pub diff: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            state: State::Merged,
            output: "human".to_string(),
            diff: false,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no `-v` is given
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Facts lookup settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactsConfig {
    /// Directory holding `<resource>.yml` facts documents
    pub dir: Option<PathBuf>,
}

impl FactsConfig {
    /// Facts document for a resource, if the directory holds one
    pub fn path_for(&self, resource: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        ["yml", "yaml", "json"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", resource, ext)))
            .find(|path| path.exists())
    }
}

/// Colors configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    /// Enable colors
    pub enabled: bool,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from the standard locations, or only `config_path`
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(Error::FileNotFound(path.clone()));
            }
        }

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Explicit path takes priority
        if let Some(path) = explicit_path {
            paths.push(path.clone());
            return paths;
        }

        // System-wide config
        paths.push(PathBuf::from("/etc/awplus/awplus.toml"));

        // User config
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".awplus/config.toml"));
        }

        // Project config (current directory)
        paths.push(PathBuf::from("awplus.toml"));

        paths
    }

    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            _ => {
                // Try TOML first, then YAML
                match toml::from_str(&content) {
                    Ok(config) => config,
                    Err(_) => serde_yaml::from_str(&content).map_err(|e| {
                        Error::Config(format!(
                            "Failed to parse config file {}: {}",
                            path.display(),
                            e
                        ))
                    })?,
                }
            }
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one; values that differ from the
    /// defaults in `other` win
    fn merge(&self, other: Config) -> Config {
        let default = Config::default();
        Config {
            defaults: Defaults {
                state: if other.defaults.state != default.defaults.state {
                    other.defaults.state
                } else {
                    self.defaults.state
                },
                output: if other.defaults.output != default.defaults.output {
                    other.defaults.output
                } else {
                    self.defaults.output.clone()
                },
                diff: other.defaults.diff || self.defaults.diff,
            },
            logging: LoggingConfig {
                level: if other.logging.level != default.logging.level {
                    other.logging.level
                } else {
                    self.logging.level.clone()
                },
                format: if other.logging.format != default.logging.format {
                    other.logging.format
                } else {
                    self.logging.format.clone()
                },
            },
            facts: FactsConfig {
                dir: other.facts.dir.or_else(|| self.facts.dir.clone()),
            },
            colors: ColorsConfig {
                enabled: other.colors.enabled && self.colors.enabled,
            },
        }
    }

    fn apply_env_overrides(&mut self) {
        // AWPLUS_STATE
        if let Ok(state) = std::env::var("AWPLUS_STATE") {
            if let Ok(state) = state.parse() {
                self.defaults.state = state;
            }
        }

        // AWPLUS_LOG_LEVEL
        if let Ok(level) = std::env::var("AWPLUS_LOG_LEVEL") {
            self.logging.level = level;
        }

        // AWPLUS_LOG_FORMAT
        if let Ok(format) = std::env::var("AWPLUS_LOG_FORMAT") {
            self.logging.format = format;
        }

        // AWPLUS_FACTS_DIR
        if let Ok(dir) = std::env::var("AWPLUS_FACTS_DIR") {
            self.facts.dir = Some(PathBuf::from(dir));
        }

        // NO_COLOR
        if std::env::var("NO_COLOR").is_ok() {
            self.colors.enabled = false;
        }
    }

    fn validate(&self) -> Result<()> {
        if !matches!(self.defaults.output.as_str(), "human" | "json" | "yaml") {
            return Err(Error::InvalidConfig {
                key: "defaults.output".to_string(),
                message: format!(
                    "unknown output format '{}', expected human, json or yaml",
                    self.defaults.output
                ),
            });
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(Error::InvalidConfig {
                key: "logging.format".to_string(),
                message: format!(
                    "unknown log format '{}', expected text or json",
                    self.logging.format
                ),
            });
        }
        Ok(())
    }

    /// Load a single configuration file on top of the defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::default().merge_from_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.defaults.state, State::Merged);
        assert_eq!(config.defaults.output, "human");
        assert_eq!(config.logging.level, "warn");
        assert!(config.colors.enabled);
        assert!(config.facts.dir.is_none());
    }

    #[test]
    fn test_config_merge() {
        let base = Config {
            facts: FactsConfig {
                dir: Some(PathBuf::from("/var/lib/awplus/facts")),
            },
            ..Config::default()
        };
        let other = Config {
            defaults: Defaults {
                state: State::Replaced,
                ..Defaults::default()
            },
            ..Config::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.defaults.state, State::Replaced);
        assert_eq!(
            merged.facts.dir,
            Some(PathBuf::from("/var/lib/awplus/facts"))
        );
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[defaults]\nstate = \"overridden\"\noutput = \"json\"\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.defaults.state, State::Overridden);
        assert_eq!(config.defaults.output, "json");
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "colors:\n  enabled: false\nfacts:\n  dir: /tmp/facts").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(!config.colors.enabled);
        assert_eq!(config.facts.dir, Some(PathBuf::from("/tmp/facts")));
    }

    #[test]
    fn test_invalid_output_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[defaults]\noutput = \"xml\"").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_missing_explicit_path() {
        let path = PathBuf::from("/nonexistent/awplus.toml");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("AWPLUS_FACTS_DIR", "/srv/facts");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.facts.dir, Some(PathBuf::from("/srv/facts")));
        std::env::remove_var("AWPLUS_FACTS_DIR");
    }

    #[test]
    fn test_facts_path_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vxlan.yml"), "[]\n").unwrap();
        let facts = FactsConfig {
            dir: Some(dir.path().to_path_buf()),
        };
        assert_eq!(facts.path_for("vxlan"), Some(dir.path().join("vxlan.yml")));
        assert_eq!(facts.path_for("bgp"), None);
    }
}
