//! Components
//!
//! A component is a named node that groups the resources and nested
//! components it creates. Every child passes through the hooks the component
//! installs when it is created: the component guard first, then the option
//! hooks, then any hooks supplied by the caller.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use tessera_core::error::Result;
use tessera_core::{Args, Deferred, ResourceOptions, Urn};
use tessera_link::{LinkDefinition, LinkSource, Linkable};

use crate::graph::{InterceptionHook, ResourceHandle};
use crate::session::SessionInner;
use crate::transform::{transform_resource, Transform};
use crate::version::ComponentVersion;

/// Options a component is created with
#[derive(Clone, Default)]
pub struct ComponentOptions {
    /// Options of the component node itself; `retain_on_delete` is inherited
    /// by its children. The parent is set by whoever creates the component.
    pub options: ResourceOptions,

    /// Hooks run for every child after the built-in ones
    pub hooks: Vec<Arc<dyn InterceptionHook>>,

    /// Version of the component implementation
    pub version: Option<ComponentVersion>,
}

impl ComponentOptions {
    /// Keep the component's resources when they are removed from the program
    pub fn retain_on_delete(mut self, retain: bool) -> Self {
        self.options.retain_on_delete = Some(retain);
        self
    }

    /// Add a hook run for every child
    pub fn with_hook(mut self, hook: Arc<dyn InterceptionHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Set the component version
    pub fn with_version(mut self, version: ComponentVersion) -> Self {
        self.version = Some(version);
        self
    }
}

impl fmt::Debug for ComponentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentOptions")
            .field("options", &self.options)
            .field("hooks", &self.hooks.len())
            .field("version", &self.version)
            .finish()
    }
}

/// A component created in a synthesis session
#[derive(Clone)]
pub struct ComponentHandle {
    node: ResourceHandle,
    session: Arc<SessionInner>,
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("urn", &self.node.urn().to_string())
            .finish()
    }
}

impl ComponentHandle {
    pub(crate) fn new(node: ResourceHandle, session: Arc<SessionInner>) -> Self {
        Self { node, session }
    }

    /// Identity of the component
    pub fn urn(&self) -> &Urn {
        self.node.urn()
    }

    /// Logical name
    pub fn name(&self) -> &str {
        self.node.name()
    }

    /// Type tag
    pub fn type_tag(&self) -> &str {
        self.node.type_tag()
    }

    /// Arguments the component was created with, after registered transforms
    pub fn args(&self) -> &Args {
        self.node.props()
    }

    /// Options the component was created with
    pub fn opts(&self) -> &ResourceOptions {
        self.node.opts()
    }

    /// A named output of the component
    pub fn output(&self, key: &str) -> Option<Deferred<Value>> {
        self.node.output(key)
    }

    /// Nodes created under this component so far
    pub fn children(&self) -> Vec<Urn> {
        self.node.children()
    }

    /// Create a provider resource owned by this component
    pub fn resource(
        &self,
        type_tag: &str,
        name: &str,
        props: Args,
        opts: ResourceOptions,
    ) -> Result<ResourceHandle> {
        self.session
            .create_resource(Some(self.urn()), type_tag, name, props, opts)
    }

    /// Create a provider resource after applying a caller-supplied transform
    /// to its name, props and options
    pub fn resource_with_transform(
        &self,
        type_tag: &str,
        name: &str,
        props: Args,
        transform: Option<&Transform>,
        opts: ResourceOptions,
    ) -> Result<ResourceHandle> {
        let (name, props, opts) = transform_resource(transform, name, props, opts)?;
        self.resource(type_tag, &name, props, opts)
    }

    /// Create a nested component
    pub fn component(
        &self,
        type_tag: &str,
        name: &str,
        args: Args,
        options: ComponentOptions,
    ) -> Result<ComponentHandle> {
        self.session
            .create_component(Some(self.urn()), type_tag, name, args, options)
    }

    /// Make the component linkable.
    ///
    /// Top-level components claim their exported name in the session, so
    /// this fails when another top-level linkable already uses it.
    pub fn into_linkable<F>(self, link: F) -> Result<Arc<LinkableComponent>>
    where
        F: Fn() -> anyhow::Result<LinkDefinition> + Send + Sync + 'static,
    {
        let session = self.session.clone();
        let linkable = Arc::new(LinkableComponent {
            component: self,
            link: Arc::new(link),
        });
        session.register_linkable(linkable.clone())?;
        Ok(linkable)
    }
}

impl LinkSource for ComponentHandle {
    fn source_name(&self) -> &str {
        self.name()
    }

    fn as_linkable(&self) -> Option<Arc<dyn Linkable>> {
        None
    }
}

type LinkFn = Arc<dyn Fn() -> anyhow::Result<LinkDefinition> + Send + Sync>;

/// A component exposing a link definition
#[derive(Clone)]
pub struct LinkableComponent {
    component: ComponentHandle,
    link: LinkFn,
}

impl LinkableComponent {
    /// The underlying component
    pub fn component(&self) -> &ComponentHandle {
        &self.component
    }
}

impl fmt::Debug for LinkableComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkableComponent")
            .field("urn", &self.component.urn().to_string())
            .finish()
    }
}

impl Linkable for LinkableComponent {
    fn urn(&self) -> &Urn {
        self.component.urn()
    }

    fn link(&self) -> anyhow::Result<LinkDefinition> {
        (self.link)()
    }
}

impl LinkSource for LinkableComponent {
    fn source_name(&self) -> &str {
        self.component.name()
    }

    fn as_linkable(&self) -> Option<Arc<dyn Linkable>> {
        Some(Arc::new(self.clone()))
    }
}

/// A provider resource made linkable through
/// [`SynthesisSession::wrap_linkable`](crate::session::SynthesisSession::wrap_linkable)
#[derive(Clone)]
pub struct WrappedResource {
    resource: ResourceHandle,
    link: crate::session::WrapFn,
}

impl WrappedResource {
    pub(crate) fn new(resource: ResourceHandle, link: crate::session::WrapFn) -> Self {
        Self { resource, link }
    }

    /// The underlying resource
    pub fn resource(&self) -> &ResourceHandle {
        &self.resource
    }
}

impl Linkable for WrappedResource {
    fn urn(&self) -> &Urn {
        self.resource.urn()
    }

    fn link(&self) -> anyhow::Result<LinkDefinition> {
        (self.link)(&self.resource)
    }
}
