//! Transform Registry
//!
//! Maps a type tag to the callbacks registered for it, so cross-cutting
//! policies ("every function gets 2048MB") can be injected without touching
//! the components that create those resources.
//!
//! Callbacks for a component's type run once, before the component registers
//! itself. Callbacks for provider types run when a matching resource is
//! registered anywhere in the session, through [`RegistryHook`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use tessera_core::error::TransformError;
use tessera_core::{Args, ResourceOptions};

use crate::graph::{HookArgs, HookResult, InterceptionHook, NodeKind};

/// Type-tag prefix of framework components.
pub const COMPONENT_TYPE_PREFIX: &str = "tessera:";

/// A registered per-type callback.
pub type TypeTransform =
    Arc<dyn Fn(&mut Args, &mut ResourceOptions) -> anyhow::Result<()> + Send + Sync>;

/// Whether a type tag names a framework component.
pub fn is_component_type(type_tag: &str) -> bool {
    type_tag.starts_with(COMPONENT_TYPE_PREFIX)
}

/// The per-run extension registry.
#[derive(Default)]
pub struct TransformRegistry {
    transforms: RwLock<HashMap<String, Vec<TypeTransform>>>,
}

impl TransformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every node of `type_tag`
    pub fn register<F>(&self, type_tag: impl Into<String>, callback: F)
    where
        F: Fn(&mut Args, &mut ResourceOptions) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let type_tag = type_tag.into();
        debug!(type_tag = %type_tag, "Registered transform");
        self.transforms
            .write()
            .entry(type_tag)
            .or_default()
            .push(Arc::new(callback));
    }

    /// Whether any callback is registered for `type_tag`
    pub fn contains(&self, type_tag: &str) -> bool {
        self.transforms.read().contains_key(type_tag)
    }

    /// Run every callback registered for `type_tag`, in registration order.
    ///
    /// `name` is the logical name of the node, used in error messages.
    pub fn apply(
        &self,
        type_tag: &str,
        name: &str,
        args: &mut Args,
        opts: &mut ResourceOptions,
    ) -> Result<usize, TransformError> {
        // Callbacks run outside the lock so they can register more transforms.
        let callbacks = match self.transforms.read().get(type_tag) {
            Some(callbacks) => callbacks.clone(),
            None => return Ok(0),
        };

        for callback in &callbacks {
            callback(args, opts).map_err(|source| TransformError::Callback {
                name: name.to_string(),
                source,
            })?;
        }

        debug!(type_tag, name, count = callbacks.len(), "Applied registered transforms");
        Ok(callbacks.len())
    }

    /// Total number of registered callbacks
    pub fn len(&self) -> usize {
        self.transforms.read().values().map(Vec::len).sum()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every callback
    pub fn clear(&self) {
        self.transforms.write().clear();
    }
}

/// Applies provider-type callbacks of a [`TransformRegistry`] to every
/// matching resource registration in the session.
pub struct RegistryHook {
    registry: Arc<TransformRegistry>,
}

impl RegistryHook {
    /// Create a hook backed by `registry`
    pub fn new(registry: Arc<TransformRegistry>) -> Self {
        Self { registry }
    }
}

impl InterceptionHook for RegistryHook {
    fn name(&self) -> &str {
        "registry"
    }

    fn intercept(&self, args: &HookArgs<'_>) -> anyhow::Result<Option<HookResult>> {
        // Components already ran their callbacks before registering.
        if args.kind == NodeKind::Component || !self.registry.contains(args.type_tag) {
            return Ok(None);
        }

        let mut props = args.props.clone();
        let mut opts = args.opts.clone();
        self.registry
            .apply(args.type_tag, args.name, &mut props, &mut opts)?;
        Ok(Some(HookResult { props, opts }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_callbacks_run_in_registration_order() {
        let registry = TransformRegistry::new();
        registry.register("tessera:aws:Function", |args, _| {
            args.set("memory", 1024);
            Ok(())
        });
        registry.register("tessera:aws:Function", |args, _| {
            args.set("memory", 2048);
            Ok(())
        });

        let mut args = Args::new().with("memory", 128);
        let mut opts = ResourceOptions::default();
        let count = registry
            .apply("tessera:aws:Function", "MyFunction", &mut args, &mut opts)
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(args.get("memory").unwrap().peek(), Some(json!(2048)));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unknown_type_is_untouched() {
        let registry = TransformRegistry::new();
        let mut args = Args::new().with("memory", 128);
        let mut opts = ResourceOptions::default();
        assert_eq!(
            registry
                .apply("tessera:aws:Queue", "Jobs", &mut args, &mut opts)
                .unwrap(),
            0
        );
        assert_eq!(args.get("memory").unwrap().peek(), Some(json!(128)));
    }

    #[test]
    fn test_callback_error_names_node() {
        let registry = TransformRegistry::new();
        registry.register("tessera:aws:Bucket", |_, _| anyhow::bail!("no public buckets"));

        let err = registry
            .apply(
                "tessera:aws:Bucket",
                "Uploads",
                &mut Args::new(),
                &mut ResourceOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Transform for \"Uploads\" failed: no public buckets");
    }

    #[test]
    fn test_hook_applies_provider_types_only() {
        let registry = Arc::new(TransformRegistry::new());
        registry.register("aws:lambda/function:Function", |args, opts| {
            args.set("memorySize", 2048);
            opts.protect = true;
            Ok(())
        });
        registry.register("tessera:aws:Function", |args, _| {
            args.set("touched", true);
            Ok(())
        });
        let hook = RegistryHook::new(registry.clone());

        let props = Args::new();
        let opts = ResourceOptions::default();
        let hook_args = HookArgs {
            kind: NodeKind::Resource,
            type_tag: "aws:lambda/function:Function",
            name: "MyFunctionFunction",
            props: &props,
            opts: &opts,
            parent_name: Some("MyFunction"),
            parent_type: Some("tessera:aws:Function"),
        };
        let result = hook.intercept(&hook_args).unwrap().unwrap();
        assert_eq!(result.props.get("memorySize").unwrap().peek(), Some(json!(2048)));
        assert!(result.opts.protect);

        let component_args = HookArgs {
            kind: NodeKind::Component,
            type_tag: "tessera:aws:Function",
            ..hook_args
        };
        assert!(hook.intercept(&component_args).unwrap().is_none());

        // Third-party component types are skipped by kind, not by prefix.
        registry.register("acme:index:Widget", |args, _| {
            args.set("touched", true);
            Ok(())
        });
        let widget_args = HookArgs {
            kind: NodeKind::Component,
            type_tag: "acme:index:Widget",
            ..hook_args
        };
        assert!(hook.intercept(&widget_args).unwrap().is_none());

        registry.clear();
        assert!(registry.is_empty());
    }
}
