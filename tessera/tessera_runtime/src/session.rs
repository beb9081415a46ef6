//! Synthesis session
//!
//! A session owns all state of one synthesis run: the resource graph, the
//! transform registry, the exported-name registry and the reference store.
//! Nothing is process-global, so independent sessions (for example in
//! tests) never see each other's names or hooks, and [`SynthesisSession::reset`]
//! starts a fresh run without leaking anything from the previous one.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use tessera_core::error::Result;
use tessera_core::{AppContext, Args, Deferred, ResourceOptions, SessionId, Urn};
use tessera_link::{
    aggregate_permissions, build_environment, export_records, write_records, ExportedNameRegistry,
    InMemoryReferenceStore, LinkDefinition, Linkable, PendingReference, Permission, PolicyDocument,
    ReferenceRecord, ReferenceStore,
};

use crate::component::{ComponentHandle, ComponentOptions, LinkableComponent, WrappedResource};
use crate::config::SynthesisConfig;
use crate::graph::{InterceptionHook, Node, Registration, ResourceGraph, ResourceHandle};
use crate::guard::{ComponentGuard, DeleteBeforeReplaceHook, RetainOnDeleteHook};
use crate::registry::{RegistryHook, TransformRegistry};
use crate::version::{ComponentVersion, VERSION_TYPE};

/// Type tag of the generic linkable component.
pub const LINKABLE_TYPE: &str = "tessera:tessera:Linkable";

/// Link callback of a wrapped provider resource type.
pub type WrapFn = Arc<dyn Fn(&ResourceHandle) -> anyhow::Result<LinkDefinition> + Send + Sync>;

pub(crate) struct SessionInner {
    config: SynthesisConfig,
    id: RwLock<SessionId>,
    started_at: RwLock<DateTime<Utc>>,
    graph: Arc<RwLock<ResourceGraph>>,
    transforms: Arc<TransformRegistry>,
    names: Mutex<ExportedNameRegistry>,
    store: Arc<InMemoryReferenceStore>,
    wrappers: RwLock<HashMap<String, WrapFn>>,
    linkables: RwLock<Vec<Arc<dyn Linkable>>>,
}

impl SessionInner {
    fn app(&self) -> &AppContext {
        &self.config.app
    }

    fn install_session_hooks(&self) {
        self.graph
            .write()
            .add_global_hook(Arc::new(RegistryHook::new(self.transforms.clone())));
    }

    pub(crate) fn create_component(
        self: &Arc<Self>,
        parent: Option<&Urn>,
        type_tag: &str,
        name: &str,
        mut args: Args,
        options: ComponentOptions,
    ) -> Result<ComponentHandle> {
        let ComponentOptions {
            options: mut opts,
            hooks,
            version,
        } = options;
        opts.parent = parent.cloned();

        // Registered component transforms run before the component exists.
        self.transforms.apply(type_tag, name, &mut args, &mut opts)?;

        let node = ResourceHandle::register(
            self.graph.clone(),
            Registration::component(type_tag, name, args, opts),
        )?;

        let mut stack: Vec<Arc<dyn InterceptionHook>> = vec![
            Arc::new(ComponentGuard::new(name, type_tag, self.app().clone())),
            Arc::new(DeleteBeforeReplaceHook),
            Arc::new(RetainOnDeleteHook::new(node.opts().retain_on_delete)),
        ];
        stack.extend(hooks);
        self.graph.write().install_hooks(node.urn(), stack);

        let version = version.unwrap_or_default();
        version.check(type_tag, self.config.previous_version(name))?;
        if version.is_recorded() {
            let props = Args::new()
                .with("target", name)
                .with("version", u64::from(version.version));
            ResourceHandle::register(
                self.graph.clone(),
                Registration::component(
                    VERSION_TYPE,
                    ComponentVersion::node_name(name),
                    props,
                    ResourceOptions::with_parent(node.urn().clone()),
                ),
            )?;
        }

        info!("Created component: {} ({})", name, type_tag);
        Ok(ComponentHandle::new(node, self.clone()))
    }

    pub(crate) fn create_resource(
        &self,
        parent: Option<&Urn>,
        type_tag: &str,
        name: &str,
        props: Args,
        mut opts: ResourceOptions,
    ) -> Result<ResourceHandle> {
        opts.parent = parent.cloned();
        let resource = ResourceHandle::register(
            self.graph.clone(),
            Registration::resource(type_tag, name, props, opts),
        )?;

        if parent.is_none() {
            if let Some(link) = self.wrappers.read().get(type_tag).cloned() {
                self.register_linkable(Arc::new(WrappedResource::new(resource.clone(), link)))?;
            }
        }

        debug!(urn = %resource.urn(), "Created resource");
        Ok(resource)
    }

    pub(crate) fn register_linkable(&self, linkable: Arc<dyn Linkable>) -> Result<()> {
        let top_level = self
            .graph
            .read()
            .get(linkable.urn())
            .map_or(true, |node| node.parent.is_none());
        if !top_level {
            debug!(urn = %linkable.urn(), "Nested linkable is not exported");
            return Ok(());
        }

        self.names.lock().register(linkable.exported_name())?;
        self.linkables.write().push(linkable);
        Ok(())
    }
}

/// The result of a synthesis run
pub struct SynthesisOutput {
    /// Identifier of the run
    pub session_id: SessionId,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub finished_at: DateTime<Utc>,

    /// Every node, in creation order
    pub nodes: Vec<Node>,

    /// Published references, ordered by exported name
    pub references: Vec<PendingReference>,

    store: Arc<InMemoryReferenceStore>,
    references_path: Option<String>,
}

impl SynthesisOutput {
    /// Wait for every published reference to resolve, and write them to the
    /// configured references path if there is one.
    pub async fn export(&self) -> Result<Vec<ReferenceRecord>> {
        let records = export_records(self.store.as_ref()).await;
        if let Some(path) = &self.references_path {
            write_records(path, &records).await?;
            info!("Exported {} references to {}", records.len(), path);
        }
        Ok(records)
    }
}

/// One synthesis run
pub struct SynthesisSession {
    inner: Arc<SessionInner>,
}

impl SynthesisSession {
    /// Start a session
    pub fn new(config: SynthesisConfig) -> Self {
        let inner = Arc::new(SessionInner {
            graph: Arc::new(RwLock::new(ResourceGraph::new(config.app.clone()))),
            config,
            id: RwLock::new(SessionId::new()),
            started_at: RwLock::new(Utc::now()),
            transforms: Arc::new(TransformRegistry::new()),
            names: Mutex::new(ExportedNameRegistry::new()),
            store: Arc::new(InMemoryReferenceStore::new()),
            wrappers: RwLock::new(HashMap::new()),
            linkables: RwLock::new(Vec::new()),
        });
        inner.install_session_hooks();
        info!(
            session = %*inner.id.read(),
            app = %inner.config.app.name,
            stage = %inner.config.app.stage,
            "Started synthesis session"
        );
        Self { inner }
    }

    /// Identifier of the current run
    pub fn id(&self) -> SessionId {
        *self.inner.id.read()
    }

    /// Configuration of the session
    pub fn config(&self) -> &SynthesisConfig {
        &self.inner.config
    }

    /// App and stage of the session
    pub fn app(&self) -> &AppContext {
        self.inner.app()
    }

    /// The per-type transform registry
    pub fn transforms(&self) -> &TransformRegistry {
        &self.inner.transforms
    }

    /// Register a callback for every node of `type_tag`
    pub fn transform<F>(&self, type_tag: &str, callback: F)
    where
        F: Fn(&mut Args, &mut ResourceOptions) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.transforms.register(type_tag, callback);
    }

    /// Create a top-level component
    pub fn component(
        &self,
        type_tag: &str,
        name: &str,
        args: Args,
        options: ComponentOptions,
    ) -> Result<ComponentHandle> {
        self.inner
            .create_component(None, type_tag, name, args, options)
    }

    /// Create a top-level provider resource
    pub fn resource(
        &self,
        type_tag: &str,
        name: &str,
        props: Args,
        opts: ResourceOptions,
    ) -> Result<ResourceHandle> {
        self.inner.create_resource(None, type_tag, name, props, opts)
    }

    /// Claim the exported name of a linkable.
    ///
    /// Only top-level nodes are exported; nested linkables are accepted
    /// without a check.
    pub fn register_linkable(&self, linkable: Arc<dyn Linkable>) -> Result<()> {
        self.inner.register_linkable(linkable)
    }

    /// Create a generic top-level linkable exposing `definition`
    pub fn linkable(
        &self,
        name: &str,
        definition: LinkDefinition,
    ) -> Result<Arc<LinkableComponent>> {
        let args = Args::from(definition.properties.clone());
        self.component(LINKABLE_TYPE, name, args, ComponentOptions::default())?
            .into_linkable(move || Ok(definition.clone()))
    }

    /// Make every provider resource of `type_tag` linkable.
    ///
    /// Top-level resources of that type created afterwards claim their
    /// exported name like any other top-level linkable.
    pub fn wrap_linkable<F>(&self, type_tag: &str, link: F)
    where
        F: Fn(&ResourceHandle) -> anyhow::Result<LinkDefinition> + Send + Sync + 'static,
    {
        debug!(type_tag, "Wrapped provider type as linkable");
        self.inner
            .wrappers
            .write()
            .insert(type_tag.to_string(), Arc::new(link));
    }

    /// The linkable view of a provider resource, if its type was wrapped
    pub fn link_source(&self, resource: &ResourceHandle) -> Option<Arc<dyn Linkable>> {
        let link = self.inner.wrappers.read().get(resource.type_tag()).cloned()?;
        Some(Arc::new(WrappedResource::new(resource.clone(), link)))
    }

    /// Top-level linkables registered so far, in registration order
    pub fn linkables(&self) -> Vec<Arc<dyn Linkable>> {
        self.inner.linkables.read().clone()
    }

    /// Environment variables for a compute resource linked to `links`
    pub fn environment(
        &self,
        links: &[Arc<dyn Linkable>],
    ) -> Result<IndexMap<String, Deferred<String>>> {
        Ok(build_environment(self.app(), links)?)
    }

    /// Permission policy for a compute resource linked to `links`
    pub fn permissions(
        &self,
        links: &[Arc<dyn Linkable>],
        extra: &[Permission],
    ) -> Result<PolicyDocument> {
        Ok(aggregate_permissions(links, extra)?)
    }

    /// Number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.inner.graph.read().len()
    }

    /// Publish a reference for every top-level linkable and return the run's
    /// nodes.
    ///
    /// Publication is best-effort: a linkable whose definition cannot be
    /// produced yet is skipped.
    pub fn finish(&self) -> SynthesisOutput {
        let inner = &self.inner;
        for linkable in inner.linkables.read().iter() {
            match PendingReference::capture(linkable.as_ref()) {
                Ok(reference) => inner.store.publish(reference),
                Err(e) => {
                    debug!(
                        name = linkable.exported_name(),
                        error = %e,
                        "Skipping reference publication"
                    );
                }
            }
        }

        let nodes: Vec<Node> = inner.graph.read().nodes().cloned().collect();
        info!(
            session = %self.id(),
            nodes = nodes.len(),
            references = inner.store.len(),
            "Finished synthesis"
        );

        SynthesisOutput {
            session_id: self.id(),
            started_at: *inner.started_at.read(),
            finished_at: Utc::now(),
            nodes,
            references: inner.store.list(),
            store: inner.store.clone(),
            references_path: inner.config.references_path.clone(),
        }
    }

    /// Drop all per-run state and start a new run
    pub fn reset(&self) {
        let inner = &self.inner;
        inner.graph.write().clear();
        inner.transforms.clear();
        inner.names.lock().clear();
        inner.store.clear();
        inner.wrappers.write().clear();
        inner.linkables.write().clear();
        *inner.id.write() = SessionId::new();
        *inner.started_at.write() = Utc::now();
        inner.install_session_hooks();
        info!(session = %*inner.id.read(), "Reset synthesis session");
    }
}
