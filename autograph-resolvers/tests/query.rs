use std::sync::Arc;

use autograph_core::{AutographError, Context, ResolveInfo};
use autograph_data::{Direction, Field, Getter, GetterCall, Lookup, Model, Order};
use autograph_memory::MemoryAdapter;
use autograph_resolvers::{resolve_field, QueryResolver};
use autograph_test::{post_model, record, user_model, RecordingAdapter};
use serde_json::{json, Value};

fn users(adapter: &RecordingAdapter) -> QueryResolver {
    QueryResolver::new(Arc::new(user_model()), Arc::new(adapter.clone()))
}

fn call(source: Value) -> GetterCall {
    GetterCall {
        source: Arc::new(record(source)),
        args: Value::Null,
        context: Context::empty(),
        info: ResolveInfo::new("post", "author"),
    }
}

#[test]
fn order_arguments_map_to_columns() {
    let query = users(&RecordingAdapter::memory());

    assert_eq!(
        query.resolve_order(Some("age:desc")),
        Some(Order::new("user_age", Some(Direction::Desc)))
    );
    assert_eq!(query.resolve_order(Some("name")), Some(Order::new("name", None)));
    assert_eq!(query.resolve_order(Some("unknownField")), Some(Order::new("unknownField", None)));
    assert_eq!(query.resolve_order(Some("age:sideways")), None);
    assert_eq!(query.resolve_order(Some("age; drop table")), None);
    assert_eq!(query.resolve_order(None), None);
}

#[tokio::test]
async fn get_one_reports_missing_records() {
    let adapter = RecordingAdapter::memory();
    let query = users(&adapter);

    let err = query
        .get_one("42", &Context::empty(), &ResolveInfo::new("Query", "user"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_json()["entity"], "user");
    assert_eq!(err.to_json()["args"], json!({ "id": "42" }));
}

#[tokio::test]
async fn get_one_returns_the_stored_record() {
    let adapter = RecordingAdapter::memory();
    adapter.inner().seed("user", record(json!({ "name": "Ada" }))).unwrap();
    let query = users(&adapter);

    let found = query
        .get_one("1", &Context::empty(), &ResolveInfo::new("Query", "user"))
        .await
        .unwrap();

    assert_eq!(found, record(json!({ "id": "1", "name": "Ada" })));
    assert_eq!(adapter.queries()[0].lookup, Lookup::Id("1".into()));
}

#[tokio::test]
async fn query_many_passes_cursor_and_order_through() {
    let adapter = RecordingAdapter::memory();
    let query = users(&adapter);

    let page = query
        .query_many(Some("opaque".into()), Some("age:asc"), &Context::empty())
        .await
        .unwrap();

    assert!(page.is_empty());
    let sent = adapter.queries();
    assert_eq!(sent[0].name, "user");
    assert_eq!(
        sent[0].lookup,
        Lookup::Cursor {
            cursor: Some("opaque".into()),
            order: Some(Order::new("user_age", Some(Direction::Asc))),
        }
    );
}

#[tokio::test]
async fn query_many_drops_malformed_orders() {
    let adapter = RecordingAdapter::memory();
    let query = users(&adapter);

    query.query_many(None, Some("name:up"), &Context::empty()).await.unwrap();

    assert_eq!(adapter.queries()[0].lookup, Lookup::Cursor { cursor: None, order: None });
}

#[tokio::test]
async fn pages_walk_the_collection() {
    let adapter = RecordingAdapter::new(MemoryAdapter::new().with_page_size(2));
    for name in ["a", "b", "c"] {
        adapter.inner().seed("user", record(json!({ "name": name }))).unwrap();
    }
    let query = users(&adapter);

    let first = query.query_many(None, None, &Context::empty()).await.unwrap();
    assert_eq!(first.len(), 2);
    assert!(first.has_more);

    let rest = query.query_many(first.cursor, None, &Context::empty()).await.unwrap();
    assert_eq!(rest.items[0]["name"], "c");
    assert!(!rest.has_more);
}

#[tokio::test]
async fn plain_fields_read_their_column() {
    let model = user_model();
    let query = users(&RecordingAdapter::memory());
    let source = json!({ "id": "1", "name": "Ada", "user_age": 36 });

    let age = resolve_field(model.field("age").unwrap(), &query, call(source.clone())).await.unwrap();
    let email = resolve_field(model.field("email").unwrap(), &query, call(source)).await.unwrap();

    assert_eq!(age, 36);
    assert_eq!(email, Value::Null);
}

#[tokio::test]
async fn aliased_and_disabled_getters() {
    let query = users(&RecordingAdapter::memory());
    let alias = Field::builder("display").getter(Getter::Alias("name".into())).build();
    let hidden = Field::builder("name").getter(Getter::Disabled).build();

    let source = json!({ "name": "Ada" });
    assert_eq!(resolve_field(&alias, &query, call(source.clone())).await.unwrap(), "Ada");
    assert_eq!(resolve_field(&hidden, &query, call(source)).await.unwrap(), Value::Null);
}

#[tokio::test]
async fn relationships_fetch_the_target() {
    let adapter = RecordingAdapter::memory();
    adapter.inner().seed("user", record(json!({ "name": "Ada" }))).unwrap();
    let posts = post_model();
    let query = QueryResolver::new(Arc::new(post_model()), Arc::new(adapter.clone()));

    let author = resolve_field(posts.field("author").unwrap(), &query, call(json!({ "author_id": 1 })))
        .await
        .unwrap();

    assert_eq!(author, json!({ "id": "1", "name": "Ada" }));
    assert_eq!(adapter.queries()[0].name, "user");
}

#[tokio::test]
async fn required_relationship_without_target_is_not_found() {
    let adapter = RecordingAdapter::memory();
    let posts = post_model();
    let query = QueryResolver::new(Arc::new(post_model()), Arc::new(adapter.clone()));

    let err = resolve_field(posts.field("author").unwrap(), &query, call(json!({ "author_id": "9" })))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_json()["entity"], "user");
    assert_eq!(err.to_json()["args"], json!({ "id": "9" }));
}

#[tokio::test]
async fn nullable_relationship_without_target_is_null() {
    let adapter = RecordingAdapter::memory();
    let model = Model::builder("post")
        .field(Field::builder("editor").relationship("user"))
        .build()
        .unwrap();
    let query = QueryResolver::new(Arc::new(post_model()), Arc::new(adapter.clone()));

    let editor = resolve_field(model.field("editor").unwrap(), &query, call(json!({})))
        .await
        .unwrap();

    assert_eq!(editor, Value::Null);
    assert!(adapter.queries().is_empty());
}

#[tokio::test]
async fn custom_getters_receive_source_and_args() {
    let query = users(&RecordingAdapter::memory());
    let field = Field::builder("greeting")
        .getter_fn(|call: GetterCall| async move {
            let name = call.source.get("name").and_then(Value::as_str).unwrap_or("stranger");
            let punctuation = call.args.get("punctuation").and_then(Value::as_str).unwrap_or(".");
            Ok(Value::String(format!("Hello, {name}{punctuation}")))
        })
        .build();

    let mut greeting = call(json!({ "name": "Ada" }));
    greeting.args = json!({ "punctuation": "!" });

    assert_eq!(resolve_field(&field, &query, greeting).await.unwrap(), "Hello, Ada!");
}

#[tokio::test]
async fn required_custom_getter_returning_null_is_not_found() {
    let query = users(&RecordingAdapter::memory());
    let field = Field::builder("manager")
        .relationship("user")
        .nullable(false)
        .getter_fn(|_| async { Ok::<_, AutographError>(Value::Null) })
        .build();

    let err = resolve_field(&field, &query, call(json!({}))).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_json()["entity"], "user");
}
