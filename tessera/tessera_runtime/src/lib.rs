//! Tessera Runtime - Component tree and synthesis session for Tessera
//!
//! This crate provides the pieces a synthesis run is built from: the
//! resource graph and its interception hooks, the component guard enforcing
//! naming conventions, the transformation pipeline, component versioning and
//! the session tying them together.

pub mod component;
pub mod config;
pub mod graph;
pub mod guard;
pub mod policy_table;
pub mod registry;
pub mod session;
pub mod transform;
pub mod version;

use tessera_core::error::Result;
use tessera_core::utils::logging::init_tracing;
use tracing::info;

pub use component::{ComponentHandle, ComponentOptions, LinkableComponent, WrappedResource};
pub use config::{StateConfig, SynthesisConfig};
pub use graph::{
    hook_fn, HookArgs, HookResult, InterceptionHook, Node, NodeKind, Registration, ResourceGraph,
    ResourceHandle,
};
pub use guard::{ComponentGuard, DeleteBeforeReplaceHook, RetainOnDeleteHook};
pub use policy_table::{naming_policy, NameStyle, NamingPolicy, SuffixRule};
pub use registry::{is_component_type, RegistryHook, TransformRegistry, COMPONENT_TYPE_PREFIX};
pub use session::{SynthesisOutput, SynthesisSession, WrapFn, LINKABLE_TYPE};
pub use transform::{apply_transform, fill_defaults, transform_resource, MutateFn, Transform};
pub use version::{ComponentVersion, VERSION_TYPE};

/// Load configuration, install the log subscriber and start a session.
///
/// A missing configuration file falls back to defaults. An already installed
/// subscriber is left in place.
pub async fn start(config_path: Option<&str>) -> Result<SynthesisSession> {
    let config = SynthesisConfig::load(config_path).await?;
    if !init_tracing(config.log_level) {
        info!("Tracing subscriber already installed");
    }
    Ok(SynthesisSession::new(config))
}
