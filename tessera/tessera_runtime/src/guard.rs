//! Component tree guard
//!
//! Every component installs a [`ComponentGuard`] for the nodes registered
//! directly under it. The guard enforces that child names are prefixed with
//! the component's name, and assigns app/stage-prefixed physical names
//! according to the naming-policy table. The other two hooks here carry
//! resource options down from the component.

use serde_json::Value;
use tracing::debug;

use tessera_core::error::ComponentError;
use tessera_core::naming::physical_name;
use tessera_core::{AppContext, Args, Input};

use crate::graph::{HookArgs, HookResult, InterceptionHook};
use crate::policy_table::{naming_policy, NameStyle, NamingPolicy, SuffixRule, NAME_TAG, TAGS_FIELD};

/// CloudFront functions must be created before the old one is removed.
pub const CLOUDFRONT_FUNCTION_TYPE: &str = "aws:cloudfront/function:Function";

/// Prefix check and physical naming for one component's children.
#[derive(Debug, Clone)]
pub struct ComponentGuard {
    component_name: String,
    component_type: String,
    app: AppContext,
}

impl ComponentGuard {
    /// Create the guard of a component
    pub fn new(
        component_name: impl Into<String>,
        component_type: impl Into<String>,
        app: AppContext,
    ) -> Self {
        Self {
            component_name: component_name.into(),
            component_type: component_type.into(),
            app,
        }
    }

    fn check_prefix(&self, args: &HookArgs<'_>) -> Result<(), ComponentError> {
        // Nested components of the same type name their own children.
        if args.type_tag == self.component_type || args.name.starts_with(&self.component_name) {
            return Ok(());
        }
        Err(ComponentError::UnprefixedName {
            component: self.component_name.clone(),
            resource: args.name.to_string(),
            type_tag: args.type_tag.to_string(),
        })
    }

    fn field_name(
        &self,
        args: &HookArgs<'_>,
        max_length: usize,
        style: NameStyle,
        suffix: SuffixRule,
    ) -> anyhow::Result<Input> {
        let name = args.name;
        match suffix {
            SuffixRule::None => Ok(Input::from(style.apply(physical_name(
                &self.app, max_length, name, "",
            )))),
            SuffixRule::Region => {
                let region = self.app.region.as_deref().ok_or_else(|| {
                    anyhow::anyhow!(
                        "\"{}\" ({}) needs a region-suffixed name but no region is configured",
                        name,
                        args.type_tag
                    )
                })?;
                let suffix = format!("-{}", region.to_lowercase().replace('-', ""));
                Ok(Input::from(style.apply(physical_name(
                    &self.app, max_length, name, &suffix,
                ))))
            }
            SuffixRule::FifoFlag { flag_field, suffix } => {
                let flag = args
                    .props
                    .get(flag_field)
                    .map(Input::to_deferred)
                    .unwrap_or_else(|| Value::Null.into());
                let app = self.app.clone();
                let name = name.to_string();
                let value = flag.map(move |flag| {
                    let suffix = if flag == Value::Bool(true) { suffix } else { "" };
                    Value::String(style.apply(physical_name(&app, max_length, &name, suffix)))
                });
                Ok(Input::Deferred(value))
            }
        }
    }

    fn tagged(&self, props: &Args, max_length: usize, name: &str) -> Option<Input> {
        let physical = Value::String(physical_name(&self.app, max_length, name, ""));
        match props.get(TAGS_FIELD) {
            None => Some(Input::from(serde_json::json!({ NAME_TAG: physical }))),
            Some(input) if input.is_unset() => {
                Some(Input::from(serde_json::json!({ NAME_TAG: physical })))
            }
            Some(Input::Known(Value::Object(tags))) => {
                let named = tags
                    .get(NAME_TAG)
                    .map_or(false, |v| !v.is_null() && v != &Value::String(String::new()));
                if named {
                    return None;
                }
                let mut tags = tags.clone();
                tags.insert(NAME_TAG.to_string(), physical);
                Some(Input::Known(Value::Object(tags)))
            }
            // Deferred or non-object tags are left to the caller.
            Some(_) => None,
        }
    }
}

impl InterceptionHook for ComponentGuard {
    fn name(&self) -> &str {
        "component-guard"
    }

    fn intercept(&self, args: &HookArgs<'_>) -> anyhow::Result<Option<HookResult>> {
        self.check_prefix(args)?;

        let policy = naming_policy(args.type_tag).ok_or_else(|| {
            ComponentError::MissingNamingPolicy {
                component: self.component_name.clone(),
                resource: args.name.to_string(),
                type_tag: args.type_tag.to_string(),
            }
        })?;

        let (field, value) = match *policy {
            NamingPolicy::Internal | NamingPolicy::Manual | NamingPolicy::Unprefixed => {
                return Ok(None)
            }
            NamingPolicy::Field {
                field,
                max_length,
                style,
                suffix,
            } => {
                if !args.props.is_unset(field) {
                    return Ok(None);
                }
                (field, self.field_name(args, max_length, style, suffix)?)
            }
            NamingPolicy::Tag { max_length } => {
                match self.tagged(args.props, max_length, args.name) {
                    Some(tags) => (TAGS_FIELD, tags),
                    None => return Ok(None),
                }
            }
        };

        debug!(name = args.name, type_tag = args.type_tag, field, "Assigned physical name");
        let mut props = args.props.clone();
        props.set(field, value);
        Ok(Some(HookResult {
            props,
            opts: args.opts.clone(),
        }))
    }
}

/// Forces `delete_before_replace = false` on CloudFront functions, so a
/// renamed function is created and attached before the old one is removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteBeforeReplaceHook;

impl InterceptionHook for DeleteBeforeReplaceHook {
    fn name(&self) -> &str {
        "delete-before-replace"
    }

    fn intercept(&self, args: &HookArgs<'_>) -> anyhow::Result<Option<HookResult>> {
        if args.type_tag != CLOUDFRONT_FUNCTION_TYPE {
            return Ok(None);
        }
        let mut opts = args.opts.clone();
        opts.delete_before_replace = Some(false);
        Ok(Some(HookResult {
            props: args.props.clone(),
            opts,
        }))
    }
}

/// Children inherit the component's `retain_on_delete` unless they set it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetainOnDeleteHook {
    retain_on_delete: Option<bool>,
}

impl RetainOnDeleteHook {
    /// Create the hook from the component's own setting
    pub fn new(retain_on_delete: Option<bool>) -> Self {
        Self { retain_on_delete }
    }
}

impl InterceptionHook for RetainOnDeleteHook {
    fn name(&self) -> &str {
        "retain-on-delete"
    }

    fn intercept(&self, args: &HookArgs<'_>) -> anyhow::Result<Option<HookResult>> {
        if args.opts.retain_on_delete.is_some() || self.retain_on_delete.is_none() {
            return Ok(None);
        }
        let mut opts = args.opts.clone();
        opts.retain_on_delete = self.retain_on_delete;
        Ok(Some(HookResult {
            props: args.props.clone(),
            opts,
        }))
    }
}
