//! Component versioning.
//!
//! Components whose generated resources change in a breaking way bump their
//! version. A deployment recorded with an older version must opt in to the
//! upgrade explicitly, and rolling back to an older component version is
//! refused.

use tessera_core::error::ComponentError;

/// Type tag of the node recording a component's version.
pub const VERSION_TYPE: &str = "tessera:tessera:Version";

/// Version information a component is constructed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentVersion {
    /// Current version of the component implementation
    pub version: u32,

    /// Shown when an older deployment is upgraded without opting in
    pub message: String,

    /// Opt-in to the upgrade, `v{version}`
    pub force_upgrade: Option<String>,
}

impl Default for ComponentVersion {
    fn default() -> Self {
        Self {
            version: 1,
            message: String::new(),
            force_upgrade: None,
        }
    }
}

impl ComponentVersion {
    /// Version `version` with its upgrade message
    pub fn new(version: u32, message: impl Into<String>) -> Self {
        Self {
            version,
            message: message.into(),
            force_upgrade: None,
        }
    }

    /// Opt in to the upgrade
    pub fn with_force_upgrade(mut self, force_upgrade: impl Into<String>) -> Self {
        self.force_upgrade = Some(force_upgrade.into());
        self
    }

    /// Whether a version node is recorded for this version
    pub fn is_recorded(&self) -> bool {
        self.version > 1
    }

    /// Name of the version node of component `name`
    pub fn node_name(name: &str) -> String {
        format!("{}Version", name)
    }

    /// Compare against the version the previous deployment recorded
    pub fn check(&self, type_tag: &str, previous: Option<u32>) -> Result<(), ComponentError> {
        let Some(previous) = previous else {
            return Ok(());
        };
        let class_name = type_tag.replace(':', ".");

        if let Some(force_upgrade) = &self.force_upgrade {
            if *force_upgrade != format!("v{}", self.version) {
                return Err(ComponentError::Version(format!(
                    "The value of \"forceUpgrade\" does not match the version of \"{}\" component.\nSet \"forceUpgrade\" to \"v{}\" to upgrade to the new version.",
                    class_name, self.version
                )));
            }
        }

        if previous < self.version && self.force_upgrade.is_none() {
            return Err(ComponentError::Version(self.message.clone()));
        }

        if previous > self.version {
            return Err(ComponentError::Version(format!(
                "It seems you are trying to use an older version of \"{}\".\nYou need to recreate this component to roll back.",
                class_name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPE: &str = "tessera:aws:Vpc";

    #[test]
    fn test_first_deployment_passes() {
        assert!(ComponentVersion::new(2, "upgrade").check(TYPE, None).is_ok());
        assert!(ComponentVersion::default().check(TYPE, Some(1)).is_ok());
    }

    #[test]
    fn test_upgrade_requires_opt_in() {
        let version = ComponentVersion::new(2, "Vpc v2 recreates the NAT gateways");
        assert_eq!(
            version.check(TYPE, Some(1)),
            Err(ComponentError::Version("Vpc v2 recreates the NAT gateways".to_string()))
        );
        assert!(version.clone().with_force_upgrade("v2").check(TYPE, Some(1)).is_ok());
    }

    #[test]
    fn test_mismatched_force_upgrade() {
        let err = ComponentVersion::new(2, "")
            .with_force_upgrade("v3")
            .check(TYPE, Some(1))
            .unwrap_err();
        assert!(err.to_string().contains("tessera.aws.Vpc"));
        assert!(err.to_string().contains("\"v2\""));
    }

    #[test]
    fn test_downgrade_is_refused() {
        let err = ComponentVersion::new(1, "").check(TYPE, Some(2)).unwrap_err();
        assert!(err.to_string().contains("older version"));
    }

    #[test]
    fn test_version_node() {
        assert!(!ComponentVersion::default().is_recorded());
        assert!(ComponentVersion::new(2, "").is_recorded());
        assert_eq!(ComponentVersion::node_name("MyVpc"), "MyVpcVersion");
    }
}
