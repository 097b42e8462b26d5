//! Model definitions.
//!
//! A [`Model`] is built once through [`ModelBuilder`] and shared behind an
//! `Arc` by every resolver generated for it.

use std::collections::BTreeMap;
use std::fmt;

use autograph_core::Operation;

use crate::field::{Field, FieldBuilder};
use crate::hooks::HookSet;

/// Errors raised while building a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    DuplicateField { model: String, field: String },
    MultiplePrimary { model: String, fields: Vec<String> },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::DuplicateField { model, field } => {
                write!(f, "Model `{model}` declares field `{field}` more than once")
            }
            ModelError::MultiplePrimary { model, fields } => {
                write!(f, "Model `{model}` has several primary fields: {}", fields.join(", "))
            }
        }
    }
}

impl std::error::Error for ModelError {}

impl From<FieldBuilder> for Field {
    fn from(builder: FieldBuilder) -> Self {
        builder.build()
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    fields: BTreeMap<String, Field>,
    hooks: HookSet,
    mutation_create: Option<String>,
    mutation_update: Option<String>,
    mutation_delete: Option<String>,
}

impl Model {
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    /// Name of the primary field, `"id"` when none is flagged.
    pub fn primary_key(&self) -> &str {
        self.fields
            .values()
            .find(|f| f.is_primary())
            .map(Field::name)
            .unwrap_or("id")
    }

    /// Storage column of the primary field. Adapters key committed records
    /// by this column.
    pub fn primary_column(&self) -> &str {
        self.column_for(self.primary_key())
    }

    /// Storage column for a field name; unknown names map to themselves.
    pub fn column_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.fields.get(name).map(Field::column).unwrap_or(name)
    }

    /// Entry-point name for a mutation, `None` when that entry point is disabled.
    pub fn mutation_name(&self, op: Operation) -> Option<&str> {
        match op {
            Operation::Create => self.mutation_create.as_deref(),
            Operation::Update => self.mutation_update.as_deref(),
            Operation::Delete => self.mutation_delete.as_deref(),
        }
    }

    pub fn query_name(&self) -> &str {
        &self.name
    }

    pub fn query_many_name(&self) -> String {
        format!("{}_many", self.name)
    }
}

pub struct ModelBuilder {
    name: String,
    fields: Vec<Field>,
    hooks: HookSet,
    mutation_create: Option<String>,
    mutation_update: Option<String>,
    mutation_delete: Option<String>,
}

impl ModelBuilder {
    fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            mutation_create: Some(format!("{name}_create")),
            mutation_update: Some(format!("{name}_update")),
            mutation_delete: Some(format!("{name}_delete")),
            name,
            fields: Vec::new(),
            hooks: HookSet::new(),
        }
    }

    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    /// Renames a mutation entry point.
    pub fn mutation_name(mut self, op: Operation, name: impl Into<String>) -> Self {
        *self.slot(op) = Some(name.into());
        self
    }

    /// Disables a mutation entry point.
    pub fn without_mutation(mut self, op: Operation) -> Self {
        *self.slot(op) = None;
        self
    }

    fn slot(&mut self, op: Operation) -> &mut Option<String> {
        match op {
            Operation::Create => &mut self.mutation_create,
            Operation::Update => &mut self.mutation_update,
            Operation::Delete => &mut self.mutation_delete,
        }
    }

    pub fn build(self) -> Result<Model, ModelError> {
        let primaries: Vec<String> = self
            .fields
            .iter()
            .filter(|f| f.is_primary())
            .map(|f| f.name().to_string())
            .collect();
        if primaries.len() > 1 {
            return Err(ModelError::MultiplePrimary {
                model: self.name,
                fields: primaries,
            });
        }

        let mut fields = BTreeMap::new();
        for field in self.fields {
            let key = field.name().to_string();
            if fields.contains_key(&key) {
                return Err(ModelError::DuplicateField {
                    model: self.name,
                    field: key,
                });
            }
            fields.insert(key, field);
        }

        Ok(Model {
            name: self.name,
            fields,
            hooks: self.hooks,
            mutation_create: self.mutation_create,
            mutation_update: self.mutation_update,
            mutation_delete: self.mutation_delete,
        })
    }
}
