//! Integration tests for tessera_core.

use serde_json::{json, Value};
use tessera_core::naming::{hash_to_pretty_string, physical_name, sanitize};
use tessera_core::{resolve_properties, Args, AppContext, Deferred, Input, Urn};

#[tokio::test]
async fn test_deferred_properties_resolve_together() {
    let (arn, resolver) = Deferred::<Value>::pending();
    let args = Args::new()
        .with("name", "shop-dev-photos")
        .with("arn", arn.clone());
    assert!(!args.to_object().is_known());

    let object = args.to_object();
    assert!(resolver.resolve(json!("arn:aws:s3:::shop-dev-photos")));
    let object = object.resolve().await;
    assert_eq!(
        Value::Object(object),
        json!({ "name": "shop-dev-photos", "arn": "arn:aws:s3:::shop-dev-photos" })
    );

    // Every clone sees the same value.
    assert_eq!(arn.resolve().await, json!("arn:aws:s3:::shop-dev-photos"));
}

#[tokio::test]
async fn test_combine_preserves_order() {
    let (second, resolver) = Deferred::<u32>::pending();
    let all = Deferred::combine(vec![Deferred::known(1), second, Deferred::known(3)]);
    assert_eq!(all.peek(), None);
    resolver.resolve(2);
    assert_eq!(all.resolve().await, vec![1, 2, 3]);
}

#[test]
fn test_known_properties_resolve_immediately() {
    let args = Args::from_json(json!({ "timeout": 10, "tags": { "team": "data" } }));
    let object = resolve_properties(args.as_map());
    assert!(object.is_known());
    assert_eq!(
        object.peek().map(Value::Object),
        Some(json!({ "timeout": 10, "tags": { "team": "data" } }))
    );
}

#[test]
fn test_unset_fields() {
    let mut args = Args::new().with("memory", Value::Null).with("timeout", 3);
    assert!(args.is_unset("memory"));
    assert!(args.is_unset("runtime"));
    assert!(!args.is_unset("timeout"));

    args.merge(&Args::new().with("memory", 256));
    assert!(matches!(args.get("memory"), Some(Input::Known(v)) if v == &json!(256)));
}

#[test]
fn test_physical_names_from_loaded_context() {
    let app: AppContext =
        serde_json::from_value(json!({ "name": "shop", "stage": "pr-1234" })).unwrap();
    assert_eq!(physical_name(&app, 64, &sanitize("photo bucket"), ""), "shop-pr-1234-Photobucket");

    let name = physical_name(&app, 16, "VeryLongQueueName", ".fifo");
    assert!(name.len() <= 16);
    assert!(name.ends_with(".fifo"));
}

#[test]
fn test_pretty_hash_is_stable_across_calls() {
    let urn = Urn::new("dev", "shop", "tessera:aws:Bucket", "Photos").to_string();
    let first = hash_to_pretty_string(&urn, 8);
    assert_eq!(first, hash_to_pretty_string(&urn, 8));
    assert_eq!(first.len(), 8);
}
