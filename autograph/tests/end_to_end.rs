use std::sync::Arc;

use autograph::prelude::*;
use autograph::{AutographConfig, EngineConfig};
use autograph_test::RecordingAdapter;
use serde_json::{json, Value};

const CONFIG: &str = r#"
autograph:
  mutation:
    transactions: false
  query:
    limit: 2
"#;

fn blog() -> Vec<Model> {
    let user = Model::builder("user")
        .field(Field::builder("id").primary())
        .field(Field::builder("name"))
        .field(Field::builder("password").private().setter(Setter::transform(|call: SetterCall| async move {
            let plain = call.value.as_str().unwrap_or_default();
            let mut out = Record::new();
            out.insert("password_hash".into(), Value::String(plain.chars().rev().collect()));
            Ok(out)
        })))
        .hooks(HookSet::new().on_create(|_| async {
            let mut stamp = Record::new();
            stamp.insert("created_by".into(), json!("system"));
            Ok(stamp)
        }))
        .build()
        .unwrap();
    let post = Model::builder("post")
        .field(Field::builder("id").primary())
        .field(Field::builder("title"))
        .field(Field::builder("author").column("author_id").relationship("user").nullable(false))
        .build()
        .unwrap();
    vec![user, post]
}

#[tokio::test]
async fn configured_schema_serves_a_small_blog() {
    let config = AutographConfig::from_yaml_str(CONFIG, "test").unwrap();
    let engine: EngineConfig = config.section().unwrap();
    let adapter = RecordingAdapter::new(MemoryAdapter::from_config(&engine));
    let mut schema = Schema::from_config(Arc::new(adapter.clone()), &engine);
    for model in blog() {
        schema.register(model).unwrap();
    }

    let users = schema
        .execute(
            "user_create",
            json!({ "data": [{ "name": "Ada", "password": "secret" }, { "name": "Grace" }] }),
            Context::empty(),
        )
        .await
        .unwrap();
    assert_eq!(users[0]["password_hash"], "terces");
    assert_eq!(users[1]["created_by"], "system");
    assert!(adapter.begun().is_empty());

    for title in ["one", "two", "three"] {
        schema
            .execute("post_create", json!({ "data": [{ "title": title, "author": "1" }] }), Context::empty())
            .await
            .unwrap();
    }

    let first = schema.execute("post_many", json!({ "order": "title:asc" }), Context::empty()).await.unwrap();
    assert_eq!(first["items"].as_array().unwrap().len(), 2);
    assert_eq!(first["items"][0]["title"], "one");
    assert_eq!(first["has_more"], true);

    let rest = schema
        .execute(
            "post_many",
            json!({ "order": "title:asc", "cursor": first["cursor"] }),
            Context::empty(),
        )
        .await
        .unwrap();
    assert_eq!(rest["items"][0]["title"], "two");
    assert_eq!(rest["has_more"], false);

    let source = Arc::new(first["items"][0].as_object().unwrap().clone());
    let author = schema
        .resolve_field("post", "author", source, Value::Null, Context::empty())
        .await
        .unwrap();
    assert_eq!(author["name"], "Ada");
    assert!(schema.resolvers().field("user", "password").is_none());

    let deleted = schema.execute("post_delete", json!({ "ids": ["1", "2"] }), Context::empty()).await.unwrap();
    assert_eq!(deleted, json!(["1", "2"]));
}

#[tokio::test]
async fn errors_render_as_structured_json() {
    let mut schema = Schema::new(Arc::new(MemoryAdapter::new()));
    for model in blog() {
        schema.register(model).unwrap();
    }

    let err = schema.execute("user", json!({ "id": "99" }), Context::empty()).await.unwrap_err();

    assert_eq!(
        err.to_json(),
        json!({ "code": "NOT_FOUND", "entity": "user", "args": { "id": "99" } })
    );
}
