//! Integration tests for tessera_runtime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tessera_core::error::{ComponentError, Error, LinkError, TransformError};
use tessera_core::{Args, ResourceOptions};
use tessera_link::{permission, LinkDefinition, Linkable, ReferenceResolver};
use tessera_runtime::*;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

// Initialize tracing for tests
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn session() -> SynthesisSession {
    init_tracing();
    SynthesisSession::new(SynthesisConfig::for_app("shop", "dev"))
}

fn bucket_definition(name: &str) -> LinkDefinition {
    let arn = format!("arn:aws:s3:::{}", name);
    LinkDefinition::default()
        .with_property("name", name)
        .with_include(permission(["s3:*"], [arn.clone(), format!("{}/*", arn)]))
}

#[test]
fn test_exported_names_are_case_insensitive() {
    let session = session();
    session.linkable("Foo", LinkDefinition::default()).unwrap();

    let err = session.linkable("foo", LinkDefinition::default()).unwrap_err();
    info!("Duplicate rejected: {}", err);
    assert!(matches!(err, Error::Link(LinkError::DuplicateName(_))));
}

#[test]
fn test_app_is_reserved() {
    let session = session();
    let err = session.linkable("App", LinkDefinition::default()).unwrap_err();
    assert!(matches!(err, Error::Link(LinkError::ReservedName(_))));
}

#[test]
fn test_component_children_follow_naming_rules() {
    let session = session();
    let api = session
        .component("tessera:aws:Api", "MyApi", Args::new(), ComponentOptions::default())
        .unwrap();

    let err = api
        .resource("aws:iam/role:Role", "Role", Args::new(), ResourceOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Component(ComponentError::UnprefixedName { .. })));

    let err = api
        .resource(
            "acme:index/widget:Widget",
            "MyApiWidget",
            Args::new(),
            ResourceOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Component(ComponentError::MissingNamingPolicy { .. })));

    let function = api
        .resource(
            "aws:lambda/function:Function",
            "MyApiHandler",
            Args::new(),
            ResourceOptions::default(),
        )
        .unwrap();
    assert_eq!(
        function.props().get("name").and_then(|name| name.as_str()),
        Some("shop-dev-MyApiHandler")
    );
    assert_eq!(api.children(), vec![function.urn().clone()]);
}

#[test]
fn test_region_suffix_needs_a_region() {
    let session = session();
    let api = session
        .component("tessera:aws:Api", "MyApi", Args::new(), ComponentOptions::default())
        .unwrap();

    let err = api
        .resource("aws:iam/role:Role", "MyApiRole", Args::new(), ResourceOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Transform(TransformError::Hook { .. })));
}

#[test]
fn test_children_inherit_retain_on_delete() {
    let session = session();
    let site = session
        .component(
            "tessera:aws:StaticSite",
            "Site",
            Args::new(),
            ComponentOptions::default().retain_on_delete(true),
        )
        .unwrap();

    let assets = site
        .resource(
            "aws:s3/bucketV2:BucketV2",
            "SiteAssets",
            Args::new(),
            ResourceOptions::default(),
        )
        .unwrap();
    assert_eq!(assets.opts().retain_on_delete, Some(true));

    let logs = site
        .resource(
            "aws:cloudwatch/logGroup:LogGroup",
            "SiteLogs",
            Args::new(),
            ResourceOptions {
                retain_on_delete: Some(false),
                ..ResourceOptions::default()
            },
        )
        .unwrap();
    assert_eq!(logs.opts().retain_on_delete, Some(false));
}

#[test]
fn test_caller_transforms() {
    let session = session();
    let api = session
        .component("tessera:aws:Api", "MyApi", Args::new(), ComponentOptions::default())
        .unwrap();
    let base = Args::new().with("timeout", 3).with("memory", 128);

    let merged = api
        .resource_with_transform(
            "aws:lambda/function:Function",
            "MyApiA",
            base.clone(),
            Some(&Transform::from(Args::new().with("timeout", 10))),
            ResourceOptions::default(),
        )
        .unwrap();
    assert_eq!(merged.props().get("timeout").and_then(|v| v.peek()), Some(json!(10)));
    assert_eq!(merged.props().get("memory").and_then(|v| v.peek()), Some(json!(128)));

    let mutated = api
        .resource_with_transform(
            "aws:lambda/function:Function",
            "MyApiB",
            base,
            Some(&Transform::mutate_args(|args| {
                args.set("memory", 256);
                Ok(())
            })),
            ResourceOptions::default(),
        )
        .unwrap();
    assert_eq!(mutated.props().get("memory").and_then(|v| v.peek()), Some(json!(256)));
    assert_eq!(mutated.props().get("timeout").and_then(|v| v.peek()), Some(json!(3)));
}

#[test]
fn test_registered_transforms_apply_by_type() {
    let session = session();
    session.transform("aws:lambda/function:Function", |args, _| {
        args.set("runtime", "nodejs20.x");
        Ok(())
    });
    session.transform("tessera:aws:Api", |args, opts| {
        args.set("cors", true);
        opts.protect = true;
        Ok(())
    });

    let api = session
        .component("tessera:aws:Api", "MyApi", Args::new(), ComponentOptions::default())
        .unwrap();
    assert_eq!(api.args().get("cors").and_then(|v| v.peek()), Some(Value::Bool(true)));
    assert!(api.opts().protect);

    let function = api
        .resource(
            "aws:lambda/function:Function",
            "MyApiHandler",
            Args::new(),
            ResourceOptions::default(),
        )
        .unwrap();
    assert_eq!(
        function.props().get("runtime").and_then(|v| v.peek()),
        Some(json!("nodejs20.x"))
    );

    session.transform("aws:sns/topic:Topic", |_, _| anyhow::bail!("topics are disabled"));
    let err = session
        .resource("aws:sns/topic:Topic", "Alerts", Args::new(), ResourceOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Transform(_)));
}

#[test]
fn test_component_transforms_run_once() {
    let session = session();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    session.transform("acme:index:Widget", move |args, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        args.set("size", 3);
        Ok(())
    });

    let widget = session
        .component("acme:index:Widget", "MyWidget", Args::new(), ComponentOptions::default())
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(widget.args().get("size").and_then(|v| v.peek()), Some(json!(3)));
}

#[tokio::test]
async fn test_component_hooks_can_read_sibling_outputs() {
    let session = session();
    let jobs = session
        .resource("aws:sqs/queue:Queue", "Jobs", Args::new(), ResourceOptions::default())
        .unwrap();

    let queue = jobs.clone();
    let inject_arn = hook_fn("queue-arn", move |args| {
        if args.kind == NodeKind::Component {
            return Ok(None);
        }
        let arn = queue.output("arn").ok_or_else(|| anyhow::anyhow!("queue is gone"))?;
        Ok(Some(HookResult {
            props: args.props.clone().with("queueArn", arn),
            opts: args.opts.clone(),
        }))
    });
    let api = session
        .component(
            "tessera:aws:Api",
            "MyApi",
            Args::new(),
            ComponentOptions::default().with_hook(inject_arn),
        )
        .unwrap();

    let function = api
        .resource(
            "aws:lambda/function:Function",
            "MyApiHandler",
            Args::new(),
            ResourceOptions::default(),
        )
        .unwrap();
    assert_eq!(api.children(), vec![function.urn().clone()]);

    let arn = function.props().get("queueArn").unwrap().to_deferred();
    assert!(jobs.resolve_output("arn", json!("arn:aws:sqs:us-east-1:123:jobs")));
    assert_eq!(arn.resolve().await, json!("arn:aws:sqs:us-east-1:123:jobs"));
}

#[tokio::test]
async fn test_environment_and_permissions() {
    let session = session();
    let empty = session.environment(&[]).unwrap();
    assert_eq!(empty.keys().collect::<Vec<_>>(), vec!["RESOURCE_App"]);
    let app: Value = serde_json::from_str(&empty["RESOURCE_App"].resolve().await).unwrap();
    assert_eq!(app, json!({ "name": "shop", "stage": "dev" }));

    let photos: Arc<dyn Linkable> = session
        .linkable("Photos", bucket_definition("shop-dev-photos"))
        .unwrap();
    let environment = session.environment(&[photos.clone()]).unwrap();
    let value: Value =
        serde_json::from_str(&environment["RESOURCE_Photos"].resolve().await).unwrap();
    assert_eq!(value, json!({ "name": "shop-dev-photos", "type": LINKABLE_TYPE }));

    let extra = permission(["sqs:SendMessage"], ["arn:aws:sqs:us-east-1:123:jobs"]);
    let policy = session
        .permissions(&[photos], &[extra.as_permission().unwrap().clone()])
        .unwrap();
    assert_eq!(policy.statements.len(), 2);
    assert_eq!(policy.statements[0].actions, vec!["s3:*"]);
    assert_eq!(policy.statements[1].actions, vec!["sqs:SendMessage"]);
}

#[tokio::test]
async fn test_publication_is_best_effort() {
    let session = session();
    session.linkable("Photos", bucket_definition("shop-dev-photos")).unwrap();
    session
        .component("tessera:aws:Queue", "Jobs", Args::new(), ComponentOptions::default())
        .unwrap()
        .into_linkable(|| anyhow::bail!("queue url is not known yet"))
        .unwrap();

    let output = session.finish();
    assert_eq!(output.references.len(), 1);
    assert_eq!(output.references[0].exported_name, "Photos");

    let records = output.export().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].type_tag, LINKABLE_TYPE);
}

#[test]
fn test_wrapped_provider_types_claim_names() {
    let session = session();
    session.wrap_linkable("aws:dynamodb/table:Table", |table| {
        Ok(LinkDefinition::default().with_property("name", table.name()))
    });

    let table = session
        .resource("aws:dynamodb/table:Table", "Orders", Args::new(), ResourceOptions::default())
        .unwrap();
    assert!(session.link_source(&table).is_some());
    assert_eq!(session.linkables().len(), 1);

    let err = session.linkable("orders", LinkDefinition::default()).unwrap_err();
    assert!(matches!(err, Error::Link(LinkError::DuplicateName(_))));
}

#[test]
fn test_reset_isolates_runs() {
    let session = session();
    session.linkable("Foo", LinkDefinition::default()).unwrap();
    let first = session.finish();

    session.reset();
    assert_ne!(session.id(), first.session_id);
    session.linkable("Foo", LinkDefinition::default()).unwrap();

    let second = session.finish();
    assert_eq!(second.nodes.len(), 1);
    assert_eq!(second.references.len(), 1);
}

#[test]
fn test_version_upgrade_needs_opt_in() {
    init_tracing();
    let mut config = SynthesisConfig::for_app("shop", "dev");
    config.state.versions.insert("MyVpc".to_string(), 1);
    let session = SynthesisSession::new(config);

    let version = ComponentVersion::new(2, "Vpc v2 replaces the NAT gateways");
    let err = session
        .component(
            "tessera:aws:Vpc",
            "MyVpc",
            Args::new(),
            ComponentOptions::default().with_version(version.clone()),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Component(ComponentError::Version(_))));

    session.reset();
    let vpc = session
        .component(
            "tessera:aws:Vpc",
            "MyVpc",
            Args::new(),
            ComponentOptions::default().with_version(version.with_force_upgrade("v2")),
        )
        .unwrap();
    assert_eq!(vpc.children().len(), 1);
}

#[tokio::test]
async fn test_references_round_trip_across_deployments() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("references.json");

    let mut config = SynthesisConfig::for_app("shop", "prod");
    config.references_path = Some(path.to_string_lossy().to_string());
    let producer = SynthesisSession::new(config);
    producer.linkable("Photos", bucket_definition("shop-prod-photos")).unwrap();
    producer.finish().export().await.unwrap();

    let app = producer.app().clone();
    let resolver = ReferenceResolver::from_path(app, &path).await.unwrap();
    let photos: Arc<dyn Linkable> = Arc::new(resolver.get("Photos").unwrap());

    let consumer = SynthesisSession::new(SynthesisConfig::for_app("shop", "prod"));
    let policy = consumer.permissions(&[photos.clone()], &[]).unwrap();
    assert_eq!(policy.statements.len(), 1);
    assert_eq!(policy.statements[0].resources.len(), 2);

    let environment = consumer.environment(&[photos]).unwrap();
    let value: Value =
        serde_json::from_str(&environment["RESOURCE_Photos"].resolve().await).unwrap();
    assert_eq!(value["name"], "shop-prod-photos");
}

#[tokio::test]
async fn test_start_without_config_file() {
    let session = start(Some("/nonexistent/tessera.json")).await.unwrap();
    assert_eq!(session.node_count(), 0);
}
