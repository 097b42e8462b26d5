use std::future::{ready, Ready};
use std::sync::{Arc, Mutex};

use autograph_core::{AutographError, Context, Operation, Record, ResolveInfo};
use autograph_data::{Field, HookCall, HookSet, Model, Setter, SetterCall};
use autograph_memory::MemoryAdapter;
use autograph_resolvers::{MutationOptions, MutationPipeline};
use autograph_test::{record, user_builder, user_model, RecordingAdapter};
use serde_json::json;

type Journal = Arc<Mutex<Vec<&'static str>>>;

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn note(journal: &Journal, label: &'static str) -> impl Fn(HookCall) -> Ready<Result<(), AutographError>> + Send + Sync {
    let journal = Arc::clone(journal);
    move |_| {
        journal.lock().unwrap().push(label);
        ready(Ok(()))
    }
}

fn note_data(journal: &Journal, label: &'static str) -> impl Fn(HookCall) -> Ready<Result<Record, AutographError>> + Send + Sync {
    let journal = Arc::clone(journal);
    move |_| {
        journal.lock().unwrap().push(label);
        ready(Ok(Record::new()))
    }
}

fn pipeline(model: Model, adapter: &RecordingAdapter) -> MutationPipeline {
    MutationPipeline::new(Arc::new(model), Arc::new(adapter.clone()), MutationOptions::default())
}

fn info() -> ResolveInfo {
    ResolveInfo::new("Mutation", "user_create")
}

#[tokio::test]
async fn create_returns_one_record_per_item_in_order() {
    let adapter = RecordingAdapter::memory();
    let model = user_builder()
        .hooks(HookSet::new().on_create(|_| async { Ok(record(json!({ "name": "hooked", "role": "member" }))) }))
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let items = vec![record(json!({ "name": "Ada", "age": 36 })), record(json!({ "name": "Linus" }))];
    let results = pipeline.create(items, &Context::empty(), &info()).await;

    let records: Vec<Record> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(records[0], record(json!({ "id": "1", "name": "Ada", "user_age": 36, "role": "member" })));
    assert_eq!(records[1], record(json!({ "id": "2", "name": "Linus", "role": "member" })));
    assert_eq!(adapter.mutations_of(Operation::Create).len(), 2);
}

#[tokio::test]
async fn update_of_missing_record_fails_before_any_write() {
    let adapter = RecordingAdapter::memory();
    let pipeline = pipeline(user_model(), &adapter);

    let results = pipeline
        .update(vec![record(json!({ "id": "404", "name": "Ghost" }))], &Context::empty(), &info())
        .await;

    let err = results.into_iter().next().unwrap().unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_json()["args"]["id"], "404");
    assert_eq!(adapter.mutation_count(), 0);
}

#[tokio::test]
async fn update_requires_an_identity() {
    let adapter = RecordingAdapter::memory();
    let pipeline = pipeline(user_model(), &adapter);

    let results = pipeline.update(vec![record(json!({ "name": "Ada" }))], &Context::empty(), &info()).await;

    assert_eq!(results[0].as_ref().unwrap_err().code(), "INVALID_ARGUMENTS");
    assert_eq!(adapter.mutation_count(), 0);
}

#[tokio::test]
async fn every_failing_setter_is_reported() {
    let adapter = RecordingAdapter::memory();
    let reject = |message: &'static str| {
        Setter::transform(move |_: SetterCall| async move { Err(AutographError::custom(message)) })
    };
    let model = Model::builder("user")
        .field(Field::builder("name").setter(reject("too short")))
        .field(Field::builder("email").setter(reject("taken")))
        .field(Field::builder("age"))
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let results = pipeline
        .create(vec![record(json!({ "name": "A", "email": "a@b.c", "age": 3 }))], &Context::empty(), &info())
        .await;

    let err = results.into_iter().next().unwrap().unwrap_err();
    let errors = err.field_errors().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors["name"].to_string(), "too short");
    assert_eq!(errors["email"].to_string(), "taken");
    assert_eq!(adapter.mutation_count(), 0);
}

#[tokio::test]
async fn unknown_input_fields_are_field_errors() {
    let adapter = RecordingAdapter::memory();
    let pipeline = pipeline(user_model(), &adapter);

    let results = pipeline
        .create(vec![record(json!({ "name": "Ada", "shoe_size": 38 }))], &Context::empty(), &info())
        .await;

    let err = results.into_iter().next().unwrap().unwrap_err();
    assert_eq!(err.field_errors().unwrap()["shoe_size"].code(), "UNKNOWN_FIELD");
}

#[tokio::test]
async fn primary_and_write_disabled_fields_are_never_written() {
    let adapter = RecordingAdapter::memory();
    adapter.inner().seed("user", record(json!({ "name": "Ada" }))).unwrap();
    let model = user_builder()
        .field(Field::builder("password").setter(Setter::NoWrite))
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let results = pipeline
        .update(
            vec![record(json!({ "id": "1", "name": "Ada L.", "password": "hunter2" }))],
            &Context::empty(),
            &info(),
        )
        .await;

    assert!(results[0].is_ok());
    let written = adapter.mutations()[0].clone();
    assert_eq!(written.id.as_deref(), Some("1"));
    assert_eq!(written.data, Some(record(json!({ "name": "Ada L." }))));
}

#[tokio::test]
async fn items_with_an_identity_update_through_create() {
    let adapter = RecordingAdapter::memory();
    adapter.inner().seed("user", record(json!({ "name": "Ada" }))).unwrap();
    let pipeline = pipeline(user_model(), &adapter);

    let results = pipeline
        .create(vec![record(json!({ "id": 1, "email": "ada@example.com" }))], &Context::empty(), &info())
        .await;

    assert_eq!(results[0].as_ref().unwrap()["name"], "Ada");
    assert_eq!(adapter.mutations_of(Operation::Update).len(), 1);
    assert_eq!(adapter.inner().count("user"), 1);
}

#[tokio::test]
async fn earlier_sources_win_the_merge() {
    let adapter = RecordingAdapter::memory();
    let model = Model::builder("user")
        .field(Field::builder("name"))
        .field(
            Field::builder("b")
                .setter(Setter::NoWrite)
                .hooks(HookSet::new().on_create(|_| async { Ok(record(json!({ "x": "from b", "y": "from b" }))) })),
        )
        .field(
            Field::builder("a")
                .setter(Setter::NoWrite)
                .hooks(HookSet::new().on_create(|_| async { Ok(record(json!({ "x": "from a", "name": "from a" }))) })),
        )
        .hooks(HookSet::new().on_mutation(|_| async { Ok(record(json!({ "y": "from model" }))) }))
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let results = pipeline.create(vec![record(json!({ "name": "Ada" }))], &Context::empty(), &info()).await;

    let created = results.into_iter().next().unwrap().unwrap();
    assert_eq!(created["name"], "Ada");
    assert_eq!(created["x"], "from a");
    assert_eq!(created["y"], "from model");
}

#[tokio::test]
async fn stages_run_in_pipeline_order() {
    let adapter = RecordingAdapter::memory();
    let log = journal();
    let resolve_log = Arc::clone(&log);
    let after_log = Arc::clone(&log);
    let model = user_builder()
        .field(
            Field::builder("nickname")
                .setter(Setter::transform(move |call: SetterCall| {
                    resolve_log.lock().unwrap().push("resolve");
                    let mut out = Record::new();
                    out.insert("nickname".into(), call.value);
                    ready(Ok(out))
                }))
                .set_create_after_data(move |_| {
                    after_log.lock().unwrap().push("setter-after-data");
                    ready(Ok(()))
                })
                .hooks(
                    HookSet::new()
                        .on_access(note(&log, "access"))
                        .on_create(note_data(&log, "field-create"))
                        .on_mutation(note_data(&log, "field-mutation"))
                        .on_create_after_data(note(&log, "field-create-after-data"))
                        .on_mutation_after_data(note(&log, "field-mutation-after-data")),
                ),
        )
        .hooks(
            HookSet::new()
                .on_create(note_data(&log, "model-create"))
                .on_mutation(note_data(&log, "model-mutation"))
                .on_create_after_data(note(&log, "model-create-after-data"))
                .on_mutation_after_data(note(&log, "model-mutation-after-data")),
        )
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let results = pipeline.create(vec![record(json!({ "nickname": "ada" }))], &Context::empty(), &info()).await;

    assert!(results[0].is_ok());
    assert_eq!(
        *log.lock().unwrap(),
        [
            "access",
            "resolve",
            "model-create",
            "model-mutation",
            "field-create",
            "field-mutation",
            "setter-after-data",
            "field-create-after-data",
            "field-mutation-after-data",
            "model-create-after-data",
            "model-mutation-after-data",
        ]
    );
}

#[tokio::test]
async fn access_failures_propagate_unaggregated() {
    let adapter = RecordingAdapter::memory();
    let model = user_builder()
        .field(
            Field::builder("salary")
                .hooks(HookSet::new().on_access(|_| async { Err(AutographError::custom("forbidden")) })),
        )
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let results = pipeline.create(vec![record(json!({ "salary": 1 }))], &Context::empty(), &info()).await;

    let err = results.into_iter().next().unwrap().unwrap_err();
    assert_eq!(err.code(), "CUSTOM_ERROR");
    assert_eq!(adapter.mutation_count(), 0);
}

#[tokio::test]
async fn update_hooks_see_the_existing_record() {
    let adapter = RecordingAdapter::memory();
    adapter.inner().seed("user", record(json!({ "name": "Ada" }))).unwrap();
    let model = user_builder()
        .hooks(HookSet::new().on_update(|call| async move {
            let previous = call.source().and_then(|r| r.get("name")).cloned().unwrap_or_default();
            Ok(record(json!({ "previous_name": previous })))
        }))
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let results = pipeline
        .update(vec![record(json!({ "id": "1", "name": "Grace" }))], &Context::empty(), &info())
        .await;

    let updated = results.into_iter().next().unwrap().unwrap();
    assert_eq!(updated["name"], "Grace");
    assert_eq!(updated["previous_name"], "Ada");
}

#[tokio::test]
async fn post_write_failure_exposes_the_committed_record() {
    let adapter = RecordingAdapter::memory();
    let model = user_builder()
        .field(
            Field::builder("avatar")
                .setter(Setter::NoWrite)
                .set_create_after_data(|_| async { Err(AutographError::custom("upload failed")) }),
        )
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let results = pipeline
        .create(vec![record(json!({ "name": "Ada", "avatar": "ada.png" }))], &Context::empty(), &info())
        .await;

    let err = results.into_iter().next().unwrap().unwrap_err();
    assert!(err.is_after_commit());
    assert_eq!(err.committed_record(), Some(&record(json!({ "id": "1", "name": "Ada" }))));
    assert!(err.field_errors().unwrap().contains_key("avatar"));
    assert_eq!(adapter.inner().count("user"), 1);
}

#[tokio::test]
async fn model_after_hook_failure_is_post_commit() {
    let adapter = RecordingAdapter::memory();
    let model = user_builder()
        .hooks(HookSet::new().on_mutation_after_data(|_| async { Err(AutographError::custom("audit down")) }))
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let results = pipeline.create(vec![record(json!({ "name": "Ada" }))], &Context::empty(), &info()).await;

    match results.into_iter().next().unwrap().unwrap_err() {
        AutographError::AfterCommit { id, record, cause, .. } => {
            assert_eq!(id.as_deref(), Some("1"));
            assert_eq!(record["name"], "Ada");
            assert_eq!(cause.code(), "CUSTOM_ERROR");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn post_commit_errors_name_the_id_under_its_column() {
    let adapter = RecordingAdapter::new(MemoryAdapter::new().with_id_column("user_id"));
    let model = Model::builder("user")
        .field(Field::builder("id").column("user_id").primary())
        .field(Field::builder("name"))
        .field(
            Field::builder("avatar")
                .setter(Setter::NoWrite)
                .set_create_after_data(|_| async { Err(AutographError::custom("upload failed")) }),
        )
        .hooks(HookSet::new().on_create_after_data(|_| async { Err(AutographError::custom("audit down")) }))
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let results = pipeline
        .create(
            vec![record(json!({ "name": "Ada", "avatar": "ada.png" })), record(json!({ "name": "Grace" }))],
            &Context::empty(),
            &info(),
        )
        .await;
    let mut errors = results.into_iter().map(Result::unwrap_err);

    let field_failure = errors.next().unwrap();
    assert_eq!(field_failure.to_json()["id"], "1");
    assert_eq!(field_failure.to_json()["cause"]["code"], "FIELD_ERRORS");
    assert_eq!(field_failure.to_json()["cause"]["id"], "1");

    let model_failure = errors.next().unwrap();
    assert_eq!(model_failure.to_json()["id"], "2");
    assert_eq!(model_failure.committed_record().unwrap()["user_id"], "2");
}

#[tokio::test]
async fn siblings_fail_independently() {
    let adapter = RecordingAdapter::memory();
    let model = user_builder()
        .field(Field::builder("age_check").setter(Setter::transform(|call: SetterCall| async move {
            match call.value.as_i64() {
                Some(age) if age >= 0 => Ok(Record::new()),
                _ => Err(AutographError::custom("negative")),
            }
        })))
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let items = vec![
        record(json!({ "name": "Ada", "age_check": 36 })),
        record(json!({ "name": "Bad", "age_check": -1 })),
    ];
    let results = pipeline.create(items, &Context::empty(), &info()).await;

    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err().code(), "FIELD_ERRORS");
    assert_eq!(adapter.inner().count("user"), 1);
}

#[tokio::test]
async fn adapter_without_record_is_a_mutation_error() {
    let adapter = RecordingAdapter::memory();
    adapter.return_nothing();
    let pipeline = pipeline(user_model(), &adapter);

    let results = pipeline.create(vec![record(json!({ "name": "Ada" }))], &Context::empty(), &info()).await;

    let err = results.into_iter().next().unwrap().unwrap_err();
    assert_eq!(err.code(), "MUTATION_ERROR");
    assert_eq!(err.to_json()["operation"], "create");
    assert_eq!(adapter.inner().count("user"), 0);
}

#[tokio::test]
async fn storage_failures_propagate_unchanged() {
    let adapter = RecordingAdapter::memory();
    adapter.fail_mutations("disk full");
    let pipeline = pipeline(user_model(), &adapter);

    let results = pipeline.create(vec![record(json!({ "name": "Ada" }))], &Context::empty(), &info()).await;

    let err = results.into_iter().next().unwrap().unwrap_err();
    assert_eq!(err.code(), "STORAGE_ERROR");
    assert!(err.to_string().contains("disk full"));
}

#[tokio::test]
async fn delete_runs_hooks_and_returns_ids() {
    let adapter = RecordingAdapter::memory();
    adapter.inner().seed("user", record(json!({ "name": "Ada" }))).unwrap();
    let log = journal();
    let model = user_builder()
        .field(Field::builder("avatar").hooks(
            HookSet::new()
                .on_delete(note(&log, "field-delete"))
                .on_delete_after_data(note(&log, "field-delete-after-data")),
        ))
        .hooks(
            HookSet::new()
                .on_delete(note(&log, "model-delete"))
                .on_mutation(note_data(&log, "model-mutation"))
                .on_delete_after_data(note(&log, "model-delete-after-data")),
        )
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let results = pipeline.delete(vec!["1".into()], &Context::empty(), &info()).await;

    assert_eq!(results.into_iter().map(Result::unwrap).collect::<Vec<_>>(), ["1"]);
    assert_eq!(
        *log.lock().unwrap(),
        [
            "model-delete",
            "model-mutation",
            "field-delete",
            "model-delete-after-data",
            "field-delete-after-data",
        ]
    );
    let written = adapter.mutations_of(Operation::Delete);
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].data, None);
    assert_eq!(adapter.inner().count("user"), 0);
}

#[tokio::test]
async fn delete_of_missing_record_never_reaches_the_adapter() {
    let adapter = RecordingAdapter::memory();
    let pipeline = pipeline(user_model(), &adapter);

    let results = pipeline.delete(vec!["7".into()], &Context::empty(), &info()).await;

    assert!(results[0].as_ref().unwrap_err().is_not_found());
    assert_eq!(adapter.mutation_count(), 0);
}

#[tokio::test]
async fn failed_delete_hooks_are_aggregated() {
    let adapter = RecordingAdapter::memory();
    adapter.inner().seed("user", record(json!({ "name": "Ada" }))).unwrap();
    let model = user_builder()
        .field(Field::builder("posts").hooks(HookSet::new().on_delete(|_| async { Err(AutographError::custom("has posts")) })))
        .field(Field::builder("team").hooks(HookSet::new().on_mutation(|_| async { Err(AutographError::custom("owner")) })))
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let results = pipeline.delete(vec!["1".into()], &Context::empty(), &info()).await;

    let err = results.into_iter().next().unwrap().unwrap_err();
    assert_eq!(err.field_errors().unwrap().len(), 2);
    assert_eq!(adapter.mutation_count(), 0);
}

#[tokio::test]
async fn post_delete_failure_carries_the_deleted_record() {
    let adapter = RecordingAdapter::memory();
    adapter.inner().seed("user", record(json!({ "name": "Ada" }))).unwrap();
    let model = user_builder()
        .hooks(HookSet::new().on_delete_after_data(|_| async { Err(AutographError::custom("cleanup failed")) }))
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let results = pipeline.delete(vec!["1".into()], &Context::empty(), &info()).await;

    let err = results.into_iter().next().unwrap().unwrap_err();
    assert!(err.is_after_commit());
    assert_eq!(err.committed_record().unwrap()["name"], "Ada");
    assert_eq!(adapter.inner().count("user"), 0);
}

#[tokio::test]
async fn hooks_receive_the_caller_context() {
    #[derive(Debug)]
    struct Tenant(&'static str);

    let adapter = RecordingAdapter::memory();
    let model = user_builder()
        .hooks(HookSet::new().on_create(|call| async move {
            let tenant = call.context.get::<Tenant>().map(|t| t.0).unwrap_or("none");
            Ok(record(json!({ "tenant": tenant })))
        }))
        .build()
        .unwrap();
    let pipeline = pipeline(model, &adapter);

    let results = pipeline
        .create(vec![record(json!({ "name": "Ada" }))], &Context::new(Tenant("acme")), &info())
        .await;

    assert_eq!(results[0].as_ref().unwrap()["tenant"], "acme");
}
