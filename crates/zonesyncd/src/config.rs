//! Daemon configuration
//!
//! The daemon itself is configured through environment variables; the
//! providers and records it reconciles come from the JSON document that
//! `ZONESYNC_CONFIG` points to.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::Level;
use zonesync_core::SyncConfig;

/// Settings read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub log_level: String,
    pub dry_run: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config_path = var("ZONESYNC_CONFIG")
            .filter(|p| !p.trim().is_empty())
            .context(
                "ZONESYNC_CONFIG is required. \
                Set it via: export ZONESYNC_CONFIG=/etc/zonesync/records.json",
            )?;

        let dry_run = match var("ZONESYNC_DRY_RUN") {
            None => false,
            Some(value) => match value.trim().to_lowercase().as_str() {
                "" | "0" | "false" | "no" => false,
                "1" | "true" | "yes" => true,
                other => anyhow::bail!(
                    "ZONESYNC_DRY_RUN '{}' is not valid. Use true or false",
                    other
                ),
            },
        };

        Ok(Self {
            config_path: PathBuf::from(config_path),
            log_level: var("ZONESYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            dry_run,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.level()?;

        if !self.config_path.is_file() {
            anyhow::bail!(
                "ZONESYNC_CONFIG does not point to a file: {}",
                self.config_path.display()
            );
        }

        Ok(())
    }

    /// The tracing level named by `log_level`
    pub fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

/// Read, parse and validate a desired-state document
pub fn load_sync_config(path: &Path) -> Result<SyncConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let sync = SyncConfig::from_json(&raw)
        .with_context(|| format!("Cannot parse {}", path.display()))?;
    sync.validate()
        .with_context(|| format!("Invalid desired state in {}", path.display()))?;
    Ok(sync)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_path_is_required() {
        assert!(Config::from_vars(vars(&[])).is_err());
        assert!(Config::from_vars(vars(&[("ZONESYNC_CONFIG", " ")])).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[("ZONESYNC_CONFIG", "/tmp/records.json")])).unwrap();
        assert_eq!(config.log_level, "info");
        assert!(!config.dry_run);
        assert_eq!(config.level().unwrap(), Level::INFO);
    }

    #[test]
    fn test_dry_run_and_level() {
        let config = Config::from_vars(vars(&[
            ("ZONESYNC_CONFIG", "/tmp/records.json"),
            ("ZONESYNC_DRY_RUN", "TRUE"),
            ("ZONESYNC_LOG_LEVEL", "Debug"),
        ]))
        .unwrap();
        assert!(config.dry_run);
        assert_eq!(config.level().unwrap(), Level::DEBUG);

        let bad = Config::from_vars(vars(&[
            ("ZONESYNC_CONFIG", "/tmp/records.json"),
            ("ZONESYNC_DRY_RUN", "sometimes"),
        ]));
        assert!(bad.is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let config = Config::from_vars(vars(&[
            ("ZONESYNC_CONFIG", "/tmp/records.json"),
            ("ZONESYNC_LOG_LEVEL", "verbose"),
        ]))
        .unwrap();
        assert!(config.level().is_err());
    }

    #[test]
    fn test_load_sync_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "providers": {{
                    "default/dummy": {{ "zones": ["example.com."], "type": "dummy" }}
                }},
                "records": [
                    {{ "provider": "default/dummy", "name": "www.example.com",
                       "ttl": 300, "data": {{ "a": ["192.0.2.1"] }} }}
                ]
            }}"#
        )
        .unwrap();

        let sync = load_sync_config(file.path()).unwrap();
        assert_eq!(sync.providers.len(), 1);
        assert_eq!(sync.records[0].spec.ttl(), 300);

        let config = Config {
            config_path: file.path().to_path_buf(),
            log_level: "info".to_string(),
            dry_run: false,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_unknown_provider_reference() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "records": [ {{ "provider": "nope", "name": "www.example.com",
                 "data": {{ "a": ["192.0.2.1"] }} }} ] }}"#
        )
        .unwrap();

        let err = load_sync_config(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown provider"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        assert!(load_sync_config(&path).is_err());

        let config = Config {
            config_path: path,
            log_level: "info".to_string(),
            dry_run: false,
        };
        assert!(config.validate().is_err());
    }
}
