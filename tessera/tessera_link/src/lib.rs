//! # Tessera Link
//!
//! This crate implements the cross-component link graph of the Tessera
//! framework. Any node can expose a name-addressable property bag plus a list
//! of capability descriptors; compute resources linked to such nodes receive
//! environment bindings and an aggregated permission policy without the leaf
//! resources knowing about each other.
//!
//! ## Core Components
//!
//! - **Model**: Link definitions and capability descriptors (permission, binding, open kinds)
//! - **Linkable**: The linkable protocol and the `is_linkable` check
//! - **Environment**: `RESOURCE_*` environment variables for linked nodes
//! - **Policy**: Permission aggregation into a single policy document
//! - **Registry**: Exported-name uniqueness for top-level linkables
//! - **Store**: Reference records published for other deployments
//! - **Resolver**: Read-only handles to resources published by another deployment
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tessera_core::{AppContext, Urn};
//! use tessera_link::{aggregate_permissions, build_environment, permission};
//! use tessera_link::{LinkDefinition, Linkable, StaticLinkable};
//!
//! let bucket: Arc<dyn Linkable> = Arc::new(StaticLinkable::new(
//!     Urn::new("dev", "shop", "tessera:aws:Bucket", "Photos"),
//!     LinkDefinition::default()
//!         .with_property("name", "shop-dev-photos")
//!         .with_include(permission(["s3:*"], ["arn:aws:s3:::shop-dev-photos"])),
//! ));
//!
//! let app = AppContext::new("shop", "dev");
//! let environment = build_environment(&app, &[bucket.clone()]).unwrap();
//! let policy = aggregate_permissions(&[bucket], &[]).unwrap();
//!
//! assert!(environment.contains_key("RESOURCE_Photos"));
//! assert_eq!(policy.statements.len(), 1);
//! ```

pub mod environment;
pub mod linkable;
pub mod model;
pub mod policy;
pub mod registry;
pub mod resolver;
pub mod store;

// Re-export commonly used types
pub use model::{
    binding, permission, Binding, CapabilityDescriptor, LinkDefinition, Permission, BINDING,
    PERMISSION,
};

pub use environment::{build_environment, build_link_data, LinkData, APP_ENV_KEY, ENV_PREFIX};
pub use linkable::{collect_links, is_linkable, LinkSource, Linkable, StaticLinkable};
pub use policy::{
    aggregate_permissions, get_capabilities_by_type, Effect, PolicyDocument, PolicyStatement,
};
pub use registry::{ExportedNameRegistry, RESERVED_NAME};
pub use resolver::{LinkRef, ReferenceResolver};
pub use store::{
    export_records, parse_records, write_records, InMemoryReferenceStore, PendingReference,
    ReferenceRecord, ReferenceStore,
};
