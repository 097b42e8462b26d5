use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::types::{Operation, Record};

/// Every failure the engine reports to a serving layer.
///
/// Each variant carries the entity name and, where one exists, the offending
/// id or field, so [`AutographError::to_json`] can render a structured API
/// error without parsing messages.
pub enum AutographError {
    /// A required single-item fetch returned nothing.
    NotFound { entity: String, args: Value },
    /// One or more per-field operations of a stage failed. Holds every
    /// failure of the stage, keyed by field name.
    FieldErrors {
        entity: String,
        id: Option<String>,
        errors: BTreeMap<String, AutographError>,
    },
    /// The adapter returned no record for a create or update.
    Mutation {
        entity: String,
        operation: Operation,
        id: Option<String>,
        message: String,
    },
    /// A mutation transport carried neither an id nor data.
    InvalidQuery { entity: String },
    /// A stage after the commit failed. The write is durable; `record` is the
    /// committed record (the removed record for deletes). `id` is `None` only
    /// when the adapter returned a record without its primary column.
    AfterCommit {
        entity: String,
        id: Option<String>,
        record: Record,
        cause: Box<AutographError>,
    },
    /// One or more items of a batch failed. Indices refer to input positions.
    ///
    /// `committed` holds the output of every item that did succeed; those
    /// writes are durable.
    Batch {
        entity: String,
        committed: Vec<(usize, Value)>,
        failures: Vec<(usize, AutographError)>,
    },
    /// An input key does not name a field of the model.
    UnknownField { entity: String, field: String },
    /// Resolver arguments could not be interpreted.
    InvalidArguments(String),
    /// The storage adapter failed. Passed through unmodified.
    Storage(Box<dyn std::error::Error + Send + Sync>),
    /// Raised by user hooks, transforms and getters.
    Custom(String),
}

impl AutographError {
    pub fn not_found(entity: impl Into<String>, args: Value) -> Self {
        AutographError::NotFound {
            entity: entity.into(),
            args,
        }
    }

    pub fn custom(message: impl Into<String>) -> Self {
        AutographError::Custom(message.into())
    }

    /// Wrap any adapter or driver error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        AutographError::Storage(Box::new(err))
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AutographError::NotFound { .. } => "NOT_FOUND",
            AutographError::FieldErrors { .. } => "FIELD_ERRORS",
            AutographError::Mutation { .. } => "MUTATION_ERROR",
            AutographError::InvalidQuery { .. } => "USE_MUTATION_INVALID_QUERY",
            AutographError::AfterCommit { .. } => "AFTER_COMMIT_ERRORS",
            AutographError::Batch { .. } => "BATCH_ERRORS",
            AutographError::UnknownField { .. } => "UNKNOWN_FIELD",
            AutographError::InvalidArguments(_) => "INVALID_ARGUMENTS",
            AutographError::Storage(_) => "STORAGE_ERROR",
            AutographError::Custom(_) => "CUSTOM_ERROR",
        }
    }

    /// Per-field failures, if this is a `FieldErrors` (directly or as the
    /// cause of an `AfterCommit`).
    pub fn field_errors(&self) -> Option<&BTreeMap<String, AutographError>> {
        match self {
            AutographError::FieldErrors { errors, .. } => Some(errors),
            AutographError::AfterCommit { cause, .. } => cause.field_errors(),
            _ => None,
        }
    }

    /// The durable record behind a post-commit failure.
    pub fn committed_record(&self) -> Option<&Record> {
        match self {
            AutographError::AfterCommit { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn is_after_commit(&self) -> bool {
        matches!(self, AutographError::AfterCommit { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AutographError::NotFound { .. })
    }

    /// Structured rendering: `{ "code": ..., ...context }`.
    pub fn to_json(&self) -> Value {
        match self {
            AutographError::NotFound { entity, args } => json!({
                "code": self.code(),
                "entity": entity,
                "args": args,
            }),
            AutographError::FieldErrors { entity, id, errors } => {
                let fields: serde_json::Map<String, Value> = errors
                    .iter()
                    .map(|(name, err)| (name.clone(), err.to_json()))
                    .collect();
                json!({
                    "code": self.code(),
                    "entity": entity,
                    "id": id,
                    "fields": fields,
                })
            }
            AutographError::Mutation {
                entity,
                operation,
                id,
                message,
            } => json!({
                "code": self.code(),
                "entity": entity,
                "operation": operation.as_str(),
                "id": id,
                "message": message,
            }),
            AutographError::InvalidQuery { entity } => json!({
                "code": self.code(),
                "entity": entity,
            }),
            AutographError::AfterCommit {
                entity,
                id,
                record,
                cause,
            } => json!({
                "code": self.code(),
                "entity": entity,
                "id": id,
                "record": record,
                "cause": cause.to_json(),
            }),
            AutographError::Batch {
                entity,
                committed,
                failures,
            } => {
                let items: Vec<Value> = failures
                    .iter()
                    .map(|(index, err)| json!({ "index": index, "error": err.to_json() }))
                    .collect();
                let committed: Vec<Value> = committed
                    .iter()
                    .map(|(index, value)| json!({ "index": index, "value": value }))
                    .collect();
                json!({
                    "code": self.code(),
                    "entity": entity,
                    "items": items,
                    "committed": committed,
                })
            }
            AutographError::UnknownField { entity, field } => json!({
                "code": self.code(),
                "entity": entity,
                "field": field,
            }),
            AutographError::InvalidArguments(message) | AutographError::Custom(message) => json!({
                "code": self.code(),
                "message": message,
            }),
            AutographError::Storage(err) => json!({
                "code": self.code(),
                "message": err.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for AutographError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutographError::NotFound { entity, args } => write!(f, "{entity} not found: {args}"),
            AutographError::FieldErrors { entity, errors, .. } => {
                write!(f, "{entity}: {} field error(s)", errors.len())?;
                for (name, err) in errors {
                    write!(f, "\n  - {name}: {err}")?;
                }
                Ok(())
            }
            AutographError::Mutation {
                entity,
                operation,
                message,
                ..
            } => write!(f, "{entity} ({operation}): {message}"),
            AutographError::InvalidQuery { entity } => {
                write!(f, "{entity}: mutation needs an id, data, or both")
            }
            AutographError::AfterCommit { entity, id, cause, .. } => match id {
                Some(id) => write!(f, "{entity} {id} committed, but a later stage failed: {cause}"),
                None => write!(f, "{entity} committed, but a later stage failed: {cause}"),
            },
            AutographError::Batch {
                entity,
                committed,
                failures,
            } => {
                write!(
                    f,
                    "{entity}: {} item(s) failed, {} committed",
                    failures.len(),
                    committed.len()
                )?;
                for (index, err) in failures {
                    write!(f, "\n  - [{index}] {err}")?;
                }
                Ok(())
            }
            AutographError::UnknownField { entity, field } => {
                write!(f, "{entity} has no field `{field}`")
            }
            AutographError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            AutographError::Storage(err) => write!(f, "Storage error: {err}"),
            AutographError::Custom(msg) => f.write_str(msg),
        }
    }
}

impl std::fmt::Debug for AutographError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({self})", self.code())
    }
}

impl std::error::Error for AutographError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AutographError::Storage(err) => Some(err.as_ref()),
            AutographError::AfterCommit { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AutographError {
    fn from(err: serde_json::Error) -> Self {
        AutographError::InvalidArguments(err.to_string())
    }
}
