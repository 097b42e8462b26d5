//! Field-error aggregation and additive record merging.

use std::collections::BTreeMap;
use std::future::Future;

use autograph_core::{AutographError, Record};
use futures_util::future::join_all;

/// Runs every field operation of one stage concurrently and waits for all
/// of them.
///
/// Successful values come back in input order. If any operation failed, the
/// stage fails with a single [`AutographError::FieldErrors`] naming every
/// failed field.
pub async fn settle_fields<T, F>(
    entity: &str,
    id: Option<&str>,
    ops: Vec<(String, F)>,
) -> Result<Vec<(String, T)>, AutographError>
where
    F: Future<Output = Result<T, AutographError>>,
{
    let (names, futures): (Vec<String>, Vec<F>) = ops.into_iter().unzip();
    let results = join_all(futures).await;

    let mut values = Vec::with_capacity(names.len());
    let mut errors = BTreeMap::new();
    for (name, result) in names.into_iter().zip(results) {
        match result {
            Ok(value) => values.push((name, value)),
            Err(err) => {
                errors.insert(name, err);
            }
        }
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(AutographError::FieldErrors {
            entity: entity.to_string(),
            id: id.map(str::to_string),
            errors,
        })
    }
}

/// Copies every entry of `contribution` whose key is not yet in `target`.
///
/// Keys already present always win, so merging contributions in order gives
/// earlier sources precedence over later ones.
pub fn merge_additive(target: &mut Record, contribution: Record) {
    for (key, value) in contribution {
        target.entry(key).or_insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autograph_core::BoxFuture;
    use serde_json::json;

    fn record(pairs: &[(&str, serde_json::Value)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn existing_keys_are_never_overwritten() {
        let mut target = record(&[("name", json!("Ada"))]);
        merge_additive(&mut target, record(&[("name", json!("Bob")), ("role", json!("admin"))]));
        merge_additive(&mut target, record(&[("role", json!("guest"))]));
        assert_eq!(target, record(&[("name", json!("Ada")), ("role", json!("admin"))]));
    }

    #[tokio::test]
    async fn all_successes_keep_input_order() {
        let ops: Vec<(String, BoxFuture<'static, Result<i32, AutographError>>)> = vec![
            ("b".to_string(), Box::pin(async { Ok(2) })),
            ("a".to_string(), Box::pin(async { Ok(1) })),
        ];
        let values = settle_fields("user", None, ops).await.unwrap();
        assert_eq!(values, vec![("b".to_string(), 2), ("a".to_string(), 1)]);
    }

    #[tokio::test]
    async fn every_failure_is_reported() {
        let ops: Vec<(String, BoxFuture<'static, Result<(), AutographError>>)> = vec![
            ("email".to_string(), Box::pin(async { Err(AutographError::custom("taken")) })),
            ("name".to_string(), Box::pin(async { Ok(()) })),
            ("age".to_string(), Box::pin(async { Err(AutographError::custom("negative")) })),
        ];
        let err = settle_fields("user", Some("4"), ops).await.unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(errors.keys().collect::<Vec<_>>(), ["age", "email"]);
        assert_eq!(err.to_json()["id"], "4");
    }
}
