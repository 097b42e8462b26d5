//! Read resolution of a single field against a source record.

use autograph_core::{id_string, AutographError};
use autograph_data::{Field, Getter, GetterCall};
use serde_json::{json, Value};

use crate::query::QueryResolver;

/// Produces the value of `field` for `call.source`.
///
/// Plain fields read `source[key]` (the alias if any, else the column) and
/// give `null` when the key is absent. Relationship fields treat that value
/// as a foreign key and fetch the target record. A non-nullable field that
/// ends up with nothing fails with `NotFound`.
pub async fn resolve_field(field: &Field, query: &QueryResolver, call: GetterCall) -> Result<Value, AutographError> {
    let key = match field.getter() {
        Getter::Disabled => return Ok(Value::Null),
        Getter::Resolve(getter) => {
            let args = call.args.clone();
            let value = getter(call).await?;
            if value.is_null() && !field.is_nullable() {
                return Err(AutographError::not_found(field.relationship().unwrap_or(field.name()), args));
            }
            return Ok(value);
        }
        Getter::Alias(key) => key.as_str(),
        Getter::Column => field.column(),
    };

    let value = call.source.get(key).cloned().unwrap_or(Value::Null);
    let Some(target) = field.relationship() else {
        return Ok(value);
    };

    let related = match id_string(&value) {
        Some(id) => query.fetch(target, &id, &call.context).await?,
        None => None,
    };
    match related {
        Some(record) => Ok(Value::Object(record)),
        None if field.is_nullable() => Ok(Value::Null),
        None => Err(AutographError::not_found(target, json!({ "id": value }))),
    }
}
