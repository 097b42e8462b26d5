//! Ready-made models and records for tests.

use autograph_core::Record;
use autograph_data::{Field, Model};
use serde_json::Value;

/// The object inside `value`; anything else gives an empty record.
///
/// ```ignore
/// let ada = record(json!({ "name": "Ada", "age": 36 }));
/// ```
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// `user` with fields `id` (primary), `name`, `email` and `age` stored in
/// the `user_age` column.
pub fn user_model() -> Model {
    user_builder().build().unwrap_or_else(|err| panic!("user fixture: {err}"))
}

/// The fields of [`user_model`], open for more fields and hooks.
pub fn user_builder() -> autograph_data::ModelBuilder {
    Model::builder("user")
        .field(Field::builder("id").primary())
        .field(Field::builder("name"))
        .field(Field::builder("email"))
        .field(Field::builder("age").column("user_age"))
}

/// `post` with fields `id` (primary), `title` and a required `author`
/// relationship to `user` stored in `author_id`.
pub fn post_model() -> Model {
    Model::builder("post")
        .field(Field::builder("id").primary())
        .field(Field::builder("title"))
        .field(
            Field::builder("author")
                .column("author_id")
                .relationship("user")
                .nullable(false),
        )
        .build()
        .unwrap_or_else(|err| panic!("post fixture: {err}"))
}
