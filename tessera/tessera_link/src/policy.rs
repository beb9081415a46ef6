//! Permission aggregation.
//!
//! Compute resources collect the permission descriptors of everything they
//! are linked to and turn them into a single policy document: one statement
//! per descriptor, in link order, followed by any extra permissions the
//! resource asked for directly.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use tessera_core::deferred::{Deferred, Input};
use tessera_core::error::LinkError;

use crate::linkable::Linkable;
use crate::model::{CapabilityDescriptor, LinkDefinition, Permission, PERMISSION};

/// Policy language version written into every document.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    /// Grant the actions
    Allow,
}

/// A single policy statement.
#[derive(Debug, Clone)]
pub struct PolicyStatement {
    /// Statement effect
    pub effect: Effect,

    /// Granted actions
    pub actions: Vec<String>,

    /// Resources the actions apply to
    pub resources: Vec<Input>,
}

impl From<&Permission> for PolicyStatement {
    fn from(permission: &Permission) -> Self {
        Self {
            effect: Effect::Allow,
            actions: permission.actions.clone(),
            resources: permission.resources.clone(),
        }
    }
}

/// An aggregated permission policy.
#[derive(Debug, Clone)]
pub struct PolicyDocument {
    /// Policy language version
    pub version: &'static str,

    /// Statements, one per permission descriptor
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// Whether the document grants anything.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// JSON form, resolved once every resource identifier is.
    pub fn to_json(&self) -> Deferred<Value> {
        let statements = self
            .statements
            .iter()
            .map(|statement| {
                let effect = statement.effect;
                let actions = statement.actions.clone();
                let resources = statement.resources.iter().map(Input::to_deferred).collect();
                Deferred::combine(resources).map(move |resources| {
                    serde_json::json!({
                        "Effect": effect,
                        "Action": actions,
                        "Resource": resources,
                    })
                })
            })
            .collect();

        let version = self.version;
        Deferred::combine(statements).map(move |statements| {
            serde_json::json!({
                "Version": version,
                "Statement": statements,
            })
        })
    }
}

/// Filter the include lists of `links` down to descriptors of one type.
///
/// Fails on the first node whose definition cannot be produced.
pub fn get_capabilities_by_type(
    descriptor_type: &str,
    links: &[Arc<dyn Linkable>],
) -> Result<Vec<CapabilityDescriptor>, LinkError> {
    let mut descriptors = Vec::new();
    for link in links {
        descriptors.extend(
            link_definition(link.as_ref())?
                .include
                .into_iter()
                .filter(|descriptor| descriptor.descriptor_type() == descriptor_type),
        );
    }
    Ok(descriptors)
}

fn link_definition(link: &dyn Linkable) -> Result<LinkDefinition, LinkError> {
    link.link().map_err(|e| {
        warn!(name = link.exported_name(), error = %e, "Link definition failed");
        LinkError::DefinitionFailed {
            name: link.exported_name().to_string(),
            reason: e.to_string(),
        }
    })
}

/// Aggregate every permission descriptor of `links`, then `extra`, into a
/// single policy document.
///
/// Statements are not de-duplicated.
pub fn aggregate_permissions(
    links: &[Arc<dyn Linkable>],
    extra: &[Permission],
) -> Result<PolicyDocument, LinkError> {
    let mut statements = Vec::new();

    for link in links {
        let definition = link_definition(link.as_ref())?;
        statements.extend(
            definition
                .include
                .iter()
                .filter(|descriptor| descriptor.descriptor_type() == PERMISSION)
                .filter_map(CapabilityDescriptor::as_permission)
                .map(PolicyStatement::from),
        );
    }
    statements.extend(extra.iter().map(PolicyStatement::from));

    Ok(PolicyDocument {
        version: POLICY_VERSION,
        statements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkable::StaticLinkable;
    use crate::model::{binding, permission};
    use serde_json::json;
    use tessera_core::id::Urn;
    use tessera_core::PropertyMap;

    fn node(name: &str, include: Vec<CapabilityDescriptor>) -> Arc<dyn Linkable> {
        let mut definition = LinkDefinition::default();
        definition.include = include;
        Arc::new(StaticLinkable::new(
            Urn::new("dev", "shop", "tessera:aws:Bucket", name),
            definition,
        ))
    }

    #[test]
    fn test_two_links_two_statements() {
        let links = vec![
            node("Photos", vec![permission(["s3:GetObject"], ["arn:aws:s3:::photos/*"])]),
            node("Videos", vec![permission(["s3:PutObject"], ["arn:aws:s3:::videos/*"])]),
        ];
        let policy = aggregate_permissions(&links, &[]).unwrap();

        assert_eq!(policy.statements.len(), 2);
        assert_eq!(policy.statements[0].actions, vec!["s3:GetObject".to_string()]);
        assert_eq!(
            policy.statements[0].resources[0].peek(),
            Some(json!("arn:aws:s3:::photos/*"))
        );
        assert_eq!(policy.statements[1].actions, vec!["s3:PutObject".to_string()]);
    }

    #[test]
    fn test_extra_permissions_are_appended_and_bindings_ignored() {
        let links = vec![node(
            "Cache",
            vec![
                binding("kv", PropertyMap::new()),
                permission(["dynamodb:*"], ["arn:aws:dynamodb:::table/cache"]),
            ],
        )];
        let extra = [Permission {
            actions: vec!["logs:*".to_string()],
            resources: vec![Input::from("*")],
        }];
        let policy = aggregate_permissions(&links, &extra).unwrap();

        assert_eq!(policy.statements.len(), 2);
        assert_eq!(policy.statements[1].actions, vec!["logs:*".to_string()]);
    }

    #[test]
    fn test_policy_json() {
        let links = vec![node("Photos", vec![permission(["s3:*"], ["arn:aws:s3:::photos"])])];
        let policy = aggregate_permissions(&links, &[]).unwrap();
        assert_eq!(
            policy.to_json().peek().unwrap(),
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Action": ["s3:*"],
                    "Resource": ["arn:aws:s3:::photos"]
                }]
            })
        );
    }

    #[test]
    fn test_get_capabilities_by_type() {
        let links = vec![
            node("A", vec![binding("queue", PropertyMap::new()), permission(["a"], ["*"])]),
            node("B", vec![binding("kv", PropertyMap::new())]),
        ];
        let bindings = get_capabilities_by_type("binding", &links).unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[1].as_binding().unwrap().kind, "kv");
        assert_eq!(get_capabilities_by_type("permission", &links).unwrap().len(), 1);
        assert!(get_capabilities_by_type("vpc", &links).unwrap().is_empty());
    }

    struct Broken(Urn);

    impl Linkable for Broken {
        fn urn(&self) -> &Urn {
            &self.0
        }

        fn link(&self) -> anyhow::Result<LinkDefinition> {
            anyhow::bail!("queue url is not available")
        }
    }

    #[test]
    fn test_failed_definitions_are_reported() {
        let links: Vec<Arc<dyn Linkable>> = vec![
            node("Photos", vec![permission(["s3:*"], ["arn:aws:s3:::photos"])]),
            Arc::new(Broken(Urn::new("dev", "shop", "tessera:aws:Queue", "Jobs"))),
        ];

        let err = get_capabilities_by_type(PERMISSION, &links).unwrap_err();
        assert_eq!(
            err,
            LinkError::DefinitionFailed {
                name: "Jobs".to_string(),
                reason: "queue url is not available".to_string(),
            }
        );
        assert_eq!(aggregate_permissions(&links, &[]).unwrap_err(), err);
    }
}
