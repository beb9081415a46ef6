//! Resource graph
//!
//! The graph records every component and provider resource created during a
//! synthesis run, with parent/child ownership. Each registration passes
//! through the interception hooks installed by the owning component and
//! then through the session-wide hooks, exactly once and in creation order,
//! before the node is recorded. Hooks may replace the props and options the
//! resource is created with.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use tessera_core::error::{ComponentError, Error, Result, TransformError};
use tessera_core::{AppContext, Args, Deferred, Resolver, ResourceOptions, Urn};

/// What kind of node was registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A framework component grouping other nodes
    Component,
    /// An underlying provider resource
    Resource,
}

/// What an interception hook sees of a registration
#[derive(Debug, Clone, Copy)]
pub struct HookArgs<'a> {
    /// Component or provider resource
    pub kind: NodeKind,

    /// Type tag of the node being registered
    pub type_tag: &'a str,

    /// Logical name of the node being registered
    pub name: &'a str,

    /// Props as left by the previous hook
    pub props: &'a Args,

    /// Options as left by the previous hook
    pub opts: &'a ResourceOptions,

    /// Logical name of the parent, if any
    pub parent_name: Option<&'a str>,

    /// Type tag of the parent, if any
    pub parent_type: Option<&'a str>,
}

/// Replacement props and options returned by a hook
#[derive(Debug, Clone)]
pub struct HookResult {
    /// Props the resource is created with
    pub props: Args,

    /// Options the resource is created with
    pub opts: ResourceOptions,
}

/// Invoked once for every registration the hook applies to.
///
/// Returning `Ok(None)` leaves the registration unchanged. Hooks run without
/// the graph lock held, so they may read the graph and outputs of other
/// nodes.
pub trait InterceptionHook: Send + Sync {
    /// Name used in logs and error messages
    fn name(&self) -> &str {
        "hook"
    }

    /// Inspect a registration and optionally replace its props and options
    fn intercept(&self, args: &HookArgs<'_>) -> anyhow::Result<Option<HookResult>>;
}

type HookFnInner = dyn Fn(&HookArgs<'_>) -> anyhow::Result<Option<HookResult>> + Send + Sync;

/// An interception hook backed by a closure
pub struct FnHook {
    name: String,
    f: Box<HookFnInner>,
}

impl InterceptionHook for FnHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn intercept(&self, args: &HookArgs<'_>) -> anyhow::Result<Option<HookResult>> {
        (self.f)(args)
    }
}

/// Wrap a closure as an interception hook.
pub fn hook_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn InterceptionHook>
where
    F: Fn(&HookArgs<'_>) -> anyhow::Result<Option<HookResult>> + Send + Sync + 'static,
{
    Arc::new(FnHook {
        name: name.into(),
        f: Box::new(f),
    })
}

/// A node recorded in the graph
#[derive(Debug, Clone)]
pub struct Node {
    /// Identity of the node
    pub urn: Urn,

    /// Component or provider resource
    pub kind: NodeKind,

    /// Type tag
    pub type_tag: String,

    /// Logical name
    pub name: String,

    /// Owning node
    pub parent: Option<Urn>,

    /// Owned nodes, in creation order
    pub children: Vec<Urn>,

    /// Final props, after every hook ran
    pub props: Args,

    /// Final options, after every hook ran
    pub opts: ResourceOptions,

    /// Values the provisioning runtime fills in
    pub outputs: IndexMap<String, Deferred<Value>>,
}

/// A registration request
#[derive(Debug, Clone)]
pub struct Registration {
    /// Component or provider resource
    pub kind: NodeKind,

    /// Type tag
    pub type_tag: String,

    /// Logical name
    pub name: String,

    /// Construction props
    pub props: Args,

    /// Construction options; `parent` decides which hooks apply
    pub opts: ResourceOptions,
}

impl Registration {
    /// A provider resource registration
    pub fn resource(
        type_tag: impl Into<String>,
        name: impl Into<String>,
        props: Args,
        opts: ResourceOptions,
    ) -> Self {
        Self {
            kind: NodeKind::Resource,
            type_tag: type_tag.into(),
            name: name.into(),
            props,
            opts,
        }
    }

    /// A component registration
    pub fn component(
        type_tag: impl Into<String>,
        name: impl Into<String>,
        props: Args,
        opts: ResourceOptions,
    ) -> Self {
        Self {
            kind: NodeKind::Component,
            ..Self::resource(type_tag, name, props, opts)
        }
    }
}

/// The hooks a registration passes through, captured from the graph so they
/// can run without holding its lock.
struct InterceptionPlan {
    parent_urn: Option<Urn>,
    parent_name: Option<String>,
    parent_type: Option<String>,
    hooks: Vec<Arc<dyn InterceptionHook>>,
}

impl InterceptionPlan {
    /// Run every hook in order and return the final registration.
    fn intercept(self, registration: Registration) -> Result<Registration> {
        let Registration {
            kind,
            type_tag,
            name,
            mut props,
            mut opts,
        } = registration;

        for hook in &self.hooks {
            let outcome = {
                let args = HookArgs {
                    kind,
                    type_tag: &type_tag,
                    name: &name,
                    props: &props,
                    opts: &opts,
                    parent_name: self.parent_name.as_deref(),
                    parent_type: self.parent_type.as_deref(),
                };
                hook.intercept(&args)
            };
            match outcome {
                Ok(Some(result)) => {
                    debug!(
                        hook = hook.name(),
                        name = %name,
                        type_tag = %type_tag,
                        "Hook replaced props"
                    );
                    props = result.props;
                    opts = result.opts;
                }
                Ok(None) => {}
                Err(e) => return Err(hook_error(&name, &type_tag, e)),
            }
        }
        // The parent is fixed once hooks start running.
        opts.parent = self.parent_urn;

        Ok(Registration {
            kind,
            type_tag,
            name,
            props,
            opts,
        })
    }
}

/// The component tree of one synthesis run
pub struct ResourceGraph {
    app: AppContext,
    nodes: IndexMap<Urn, Node>,
    hooks: HashMap<Urn, Vec<Arc<dyn InterceptionHook>>>,
    global_hooks: Vec<Arc<dyn InterceptionHook>>,
    resolvers: HashMap<(Urn, String), Resolver<Value>>,
}

impl fmt::Debug for ResourceGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGraph")
            .field("app", &self.app)
            .field("nodes", &self.nodes.len())
            .field("global_hooks", &self.global_hooks.len())
            .finish()
    }
}

impl ResourceGraph {
    /// Create an empty graph for `app`
    pub fn new(app: AppContext) -> Self {
        Self {
            app,
            nodes: IndexMap::new(),
            hooks: HashMap::new(),
            global_hooks: Vec::new(),
            resolvers: HashMap::new(),
        }
    }

    /// The app the graph's URNs are scoped to
    pub fn app(&self) -> &AppContext {
        &self.app
    }

    /// Install hooks that run for every node registered directly under `owner`
    pub fn install_hooks(&mut self, owner: &Urn, hooks: Vec<Arc<dyn InterceptionHook>>) {
        debug!(owner = %owner, count = hooks.len(), "Installing interception hooks");
        self.hooks.entry(owner.clone()).or_default().extend(hooks);
    }

    /// Install a hook that runs for every registration, after the owner's hooks
    pub fn add_global_hook(&mut self, hook: Arc<dyn InterceptionHook>) {
        self.global_hooks.push(hook);
    }

    /// Register a node
    pub fn register(&mut self, registration: Registration) -> Result<Urn> {
        let registration = self.plan(&registration)?.intercept(registration)?;
        self.insert(registration).map(|node| node.urn.clone())
    }

    /// Collect what the hooks of a registration need from the graph.
    fn plan(&self, registration: &Registration) -> Result<InterceptionPlan> {
        let parent_urn = registration.opts.parent.clone();
        let (parent_name, parent_type) = match &parent_urn {
            Some(urn) => {
                let parent = self.parent(urn, &registration.name)?;
                (Some(parent.name.clone()), Some(parent.type_tag.clone()))
            }
            None => (None, None),
        };

        let hooks = parent_urn
            .as_ref()
            .and_then(|urn| self.hooks.get(urn))
            .into_iter()
            .flatten()
            .chain(self.global_hooks.iter())
            .cloned()
            .collect();

        Ok(InterceptionPlan {
            parent_urn,
            parent_name,
            parent_type,
            hooks,
        })
    }

    fn parent(&self, urn: &Urn, name: &str) -> Result<&Node> {
        self.nodes.get(urn).ok_or_else(|| {
            ComponentError::ParentNotFound {
                parent: urn.to_string(),
                resource: name.to_string(),
            }
            .into()
        })
    }

    /// Record an intercepted registration.
    fn insert(&mut self, registration: Registration) -> Result<&Node> {
        let Registration {
            kind,
            type_tag,
            name,
            props,
            opts,
        } = registration;

        // The parent may have gone away while hooks ran unlocked.
        if let Some(parent) = &opts.parent {
            self.parent(parent, &name)?;
        }

        let urn = Urn::new(&self.app.stage, &self.app.name, &type_tag, &name);
        if self.nodes.contains_key(&urn) {
            return Err(ComponentError::DuplicateUrn(urn.to_string()).into());
        }

        if let Some(parent) = opts.parent.as_ref().and_then(|urn| self.nodes.get_mut(urn)) {
            parent.children.push(urn.clone());
        }

        debug!(urn = %urn, kind = ?kind, "Registered node");
        let node = Node {
            urn: urn.clone(),
            kind,
            type_tag,
            name,
            parent: opts.parent.clone(),
            children: Vec::new(),
            props,
            opts,
            outputs: IndexMap::new(),
        };
        let node: &Node = self.nodes.entry(urn).or_insert(node);
        Ok(node)
    }

    /// Look up a node
    pub fn get(&self, urn: &Urn) -> Option<&Node> {
        self.nodes.get(urn)
    }

    /// Every node, in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Nodes without a parent, in creation order
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|node| node.parent.is_none())
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing was registered
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A named output of a node, created pending on first access
    pub fn output(&mut self, urn: &Urn, key: &str) -> Option<Deferred<Value>> {
        let node = self.nodes.get_mut(urn)?;
        if let Some(value) = node.outputs.get(key) {
            return Some(value.clone());
        }
        let (value, resolver) = Deferred::pending();
        node.outputs.insert(key.to_string(), value.clone());
        self.resolvers.insert((urn.clone(), key.to_string()), resolver);
        Some(value)
    }

    /// Provide the value of a node's output.
    ///
    /// Returns `false` when the node does not exist or the output was
    /// already resolved.
    pub fn resolve_output(&mut self, urn: &Urn, key: &str, value: Value) -> bool {
        if self.output(urn, key).is_none() {
            return false;
        }
        match self.resolvers.remove(&(urn.clone(), key.to_string())) {
            Some(resolver) => {
                debug!(urn = %urn, key, "Resolved output");
                resolver.resolve(value);
                true
            }
            None => false,
        }
    }

    /// Drop every node and hook
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.hooks.clear();
        self.global_hooks.clear();
        self.resolvers.clear();
    }
}

fn hook_error(name: &str, type_tag: &str, err: anyhow::Error) -> Error {
    let err = match err.downcast::<ComponentError>() {
        Ok(e) => return e.into(),
        Err(err) => err,
    };
    match err.downcast::<TransformError>() {
        Ok(e) => e.into(),
        Err(source) => TransformError::Hook {
            name: name.to_string(),
            type_tag: type_tag.to_string(),
            source,
        }
        .into(),
    }
}

/// A registered node, shared with the graph it lives in
#[derive(Clone)]
pub struct ResourceHandle {
    node: Node,
    graph: Arc<RwLock<ResourceGraph>>,
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("urn", &self.node.urn.to_string())
            .finish()
    }
}

impl ResourceHandle {
    /// Register a node in a shared graph and return its handle
    ///
    /// Hooks run between two short lock scopes, never under the lock.
    pub fn register(graph: Arc<RwLock<ResourceGraph>>, registration: Registration) -> Result<Self> {
        let plan = graph.read().plan(&registration)?;
        let registration = plan.intercept(registration)?;
        let node = graph.write().insert(registration)?.clone();
        Ok(Self { node, graph })
    }

    /// Snapshot the node at `urn`
    pub fn new(graph: Arc<RwLock<ResourceGraph>>, urn: &Urn) -> Option<Self> {
        let node = graph.read().get(urn)?.clone();
        Some(Self { node, graph })
    }

    /// Identity of the node
    pub fn urn(&self) -> &Urn {
        &self.node.urn
    }

    /// Logical name
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Type tag
    pub fn type_tag(&self) -> &str {
        &self.node.type_tag
    }

    /// Props the node was created with
    pub fn props(&self) -> &Args {
        &self.node.props
    }

    /// Options the node was created with
    pub fn opts(&self) -> &ResourceOptions {
        &self.node.opts
    }

    /// Nodes created under this one so far
    pub fn children(&self) -> Vec<Urn> {
        self.graph
            .read()
            .get(&self.node.urn)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// A named output, resolved by the provisioning runtime
    pub fn output(&self, key: &str) -> Option<Deferred<Value>> {
        self.graph.write().output(&self.node.urn, key)
    }

    /// Provide a named output. This is the provisioning runtime's side.
    pub fn resolve_output(&self, key: &str, value: Value) -> bool {
        self.graph.write().resolve_output(&self.node.urn, key, value)
    }
}
