//! App context.
//!
//! The app name and stage are the two constants every physical name and
//! every `RESOURCE_App` environment entry is derived from.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The app/stage pair a synthesis run targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppContext {
    /// App name
    pub name: String,

    /// Stage name, e.g. `dev` or `production`
    pub stage: String,

    /// Provider region, used by region-suffixed physical names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl AppContext {
    /// Create a context without a region.
    pub fn new(name: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage: stage.into(),
            region: None,
        }
    }

    /// Set the provider region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Check that app and stage are usable in names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("App name cannot be empty".to_string()));
        }
        if self.stage.trim().is_empty() {
            return Err(ConfigError::Invalid("Stage cannot be empty".to_string()));
        }
        Ok(())
    }

    /// The `{name, stage}` payload exposed to linked runtimes.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "name": self.name, "stage": self.stage })
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new("app", "dev")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(AppContext::new("shop", "dev").validate().is_ok());
        assert!(AppContext::new("", "dev").validate().is_err());
        assert!(AppContext::new("shop", " ").validate().is_err());
    }

    #[test]
    fn test_json_payload_omits_region() {
        let app = AppContext::new("shop", "prod").with_region("us-east-1");
        assert_eq!(
            app.to_json().to_string(),
            r#"{"name":"shop","stage":"prod"}"#
        );
    }

    #[test]
    fn test_deserialize_without_region() {
        let app: AppContext = serde_json::from_str(r#"{"name":"shop","stage":"dev"}"#).unwrap();
        assert_eq!(app.region, None);
    }
}
