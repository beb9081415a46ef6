//! Configuration for a synthesis run
//!
//! Handles loading and merging the settings a run needs: the app/stage it
//! targets, the component versions recorded by the previous deployment and
//! where reference records are exported to.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use tessera_core::error::{ConfigError, Result};
use tessera_core::{AppContext, LogLevel};

/// State carried over from the previous deployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Component logical name to the version it was deployed with
    #[serde(default)]
    pub versions: HashMap<String, u32>,
}

/// Synthesis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// App and stage the run targets
    #[serde(default)]
    pub app: AppContext,

    /// Log level for programs that let Tessera install the subscriber
    #[serde(default)]
    pub log_level: LogLevel,

    /// Previous deployment state
    #[serde(default)]
    pub state: StateConfig,

    /// File reference records are exported to, if any
    #[serde(default)]
    pub references_path: Option<String>,

    /// Additional configuration
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            app: AppContext::default(),
            log_level: LogLevel::default(),
            state: StateConfig::default(),
            references_path: None,
            extra: HashMap::new(),
        }
    }
}

impl SynthesisConfig {
    /// A default configuration for the given app and stage
    pub fn for_app(name: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            app: AppContext::new(name, stage),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    pub async fn load(path: Option<&str>) -> Result<Self> {
        let mut config = SynthesisConfig::default();

        if let Some(path) = path {
            info!("Loading configuration from {}", path);

            if !Path::new(path).exists() {
                warn!("Configuration file not found: {}", path);
                return Ok(config);
            }

            let content = fs::read_to_string(path)
                .await
                .map_err(|e| ConfigError::LoadFailed(format!("{}: {}", path, e)))?;

            config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseFailed(format!("{}: {}", path, e)))?;
        } else {
            info!("No configuration file specified, using defaults");
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.app.validate()?;

        if let Some(path) = &self.references_path {
            if path.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "References path cannot be empty".to_string(),
                ));
            }
        }

        if let Some((name, _)) = self.state.versions.iter().find(|(_, v)| **v == 0) {
            return Err(ConfigError::Invalid(format!(
                "Recorded version of \"{}\" cannot be zero",
                name
            )));
        }

        Ok(())
    }

    /// Merge with another configuration
    pub fn merge(&mut self, other: SynthesisConfig) {
        if !other.app.name.is_empty() {
            self.app.name = other.app.name;
        }
        if !other.app.stage.is_empty() {
            self.app.stage = other.app.stage;
        }
        if other.app.region.is_some() {
            self.app.region = other.app.region;
        }

        self.log_level = other.log_level;

        for (name, version) in other.state.versions {
            self.state.versions.insert(name, version);
        }

        if other.references_path.is_some() {
            self.references_path = other.references_path;
        }

        for (key, value) in other.extra {
            self.extra.insert(key, value);
        }
    }

    /// Version recorded for a component by the previous deployment
    pub fn previous_version(&self, name: &str) -> Option<u32> {
        self.state.versions.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_config() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();

        let config_json = r#"
        {
            "app": { "name": "shop", "stage": "prod", "region": "us-east-1" },
            "log_level": "debug",
            "state": { "versions": { "MyApi": 2 } },
            "references_path": "/tmp/references.json"
        }
        "#;

        fs::write(path, config_json).await.unwrap();

        let config = SynthesisConfig::load(Some(path)).await.unwrap();

        assert_eq!(config.app.name, "shop");
        assert_eq!(config.app.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.previous_version("MyApi"), Some(2));
        assert_eq!(config.previous_version("Other"), None);
        assert_eq!(
            config.references_path.as_deref(),
            Some("/tmp/references.json")
        );
    }

    #[tokio::test]
    async fn test_default_config() {
        let config = SynthesisConfig::load(None).await.unwrap();

        assert_eq!(config.app, AppContext::default());
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.state.versions.is_empty());
        assert!(config.references_path.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let config = SynthesisConfig::load(Some("/nonexistent/tessera.json"))
            .await
            .unwrap();
        assert_eq!(config, SynthesisConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();

        fs::write(path, r#"{ "app": { "name": "shop", "stage": "" } }"#)
            .await
            .unwrap();
        let err = SynthesisConfig::load(Some(path)).await.unwrap_err();
        assert!(err.to_string().contains("Stage cannot be empty"));

        fs::write(path, "not json").await.unwrap();
        let err = SynthesisConfig::load(Some(path)).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse configuration"));
    }

    #[test]
    fn test_merge_config() {
        let mut base = SynthesisConfig::for_app("shop", "dev");
        base.state.versions.insert("Api".to_string(), 1);

        let mut override_config = SynthesisConfig::for_app("shop", "prod");
        override_config.state.versions.insert("Web".to_string(), 3);
        override_config.references_path = Some("refs.json".to_string());

        base.merge(override_config);

        assert_eq!(base.app.stage, "prod");
        assert_eq!(base.previous_version("Api"), Some(1));
        assert_eq!(base.previous_version("Web"), Some(3));
        assert_eq!(base.references_path.as_deref(), Some("refs.json"));
    }
}
