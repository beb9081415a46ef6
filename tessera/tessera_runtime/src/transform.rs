//! Transformation pipeline.
//!
//! Components let callers customize the arguments of the resources they
//! create. A [`Transform`] is either a partial set of arguments merged on top
//! of the component's arguments, or a mutator that edits them in place.
//! Mutators may overwrite any field, including the ones the component
//! considers structural.

use std::fmt;
use std::sync::Arc;

use tessera_core::error::TransformError;
use tessera_core::{Args, ResourceOptions};

/// Mutator callback: receives the arguments, the resource options and the
/// logical name of the resource being created.
pub type MutateFn =
    Arc<dyn Fn(&mut Args, &mut ResourceOptions, &str) -> anyhow::Result<()> + Send + Sync>;

/// A caller-supplied customization of resource construction arguments.
#[derive(Clone)]
pub enum Transform {
    /// Shallow-merged on top of the base arguments; the override wins
    Override(Args),

    /// Invoked with the base arguments, which it edits in place
    Mutate(MutateFn),
}

impl Transform {
    /// A mutator with access to arguments, options and the resource name.
    pub fn mutate<F>(f: F) -> Self
    where
        F: Fn(&mut Args, &mut ResourceOptions, &str) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Transform::Mutate(Arc::new(f))
    }

    /// A mutator that only touches the arguments.
    pub fn mutate_args<F>(f: F) -> Self
    where
        F: Fn(&mut Args) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::mutate(move |args, _, _| f(args))
    }
}

impl From<Args> for Transform {
    fn from(args: Args) -> Self {
        Transform::Override(args)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Override(args) => f.debug_tuple("Override").field(args).finish(),
            Transform::Mutate(_) => f.write_str("Mutate(..)"),
        }
    }
}

/// Apply a transform to construction arguments.
pub fn apply_transform(spec: Option<&Transform>, base: Args) -> Result<Args, TransformError> {
    let (_, args, _) = transform_resource(spec, "", base, ResourceOptions::default())?;
    Ok(args)
}

/// Apply a transform to the `(name, args, opts)` triple a resource is
/// constructed with.
///
/// The name is passed to mutators and returned unchanged, so callers can
/// destructure the result straight into a resource registration.
pub fn transform_resource(
    spec: Option<&Transform>,
    name: &str,
    mut base: Args,
    mut opts: ResourceOptions,
) -> Result<(String, Args, ResourceOptions), TransformError> {
    match spec {
        None => {}
        Some(Transform::Override(args)) => base.merge(args),
        Some(Transform::Mutate(f)) => {
            f(&mut base, &mut opts, name).map_err(|source| TransformError::Callback {
                name: name.to_string(),
                source,
            })?;
        }
    }
    Ok((name.to_string(), base, opts))
}

/// Fill every field of `args` that is still unset from `defaults`.
///
/// Components call this after applying transforms so the values they need
/// only win where neither the registry nor the caller set one.
pub fn fill_defaults(args: &mut Args, defaults: &Args) {
    for (key, value) in defaults.iter() {
        if args.is_unset(key) {
            args.set(key.clone(), value.clone());
        }
    }
}
