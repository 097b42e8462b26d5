//! Field definitions: storage mapping, read and write resolution, hooks.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use autograph_core::{AutographError, BoxFuture, Context, Record, ResolveInfo};
use serde_json::Value;

use crate::hooks::HookSet;

/// Arguments handed to write transforms.
#[derive(Debug, Clone)]
pub struct SetterCall {
    /// The raw input value for this field.
    pub value: Value,
    /// Pre-mutation record for update transforms, committed record for
    /// after-data transforms, `None` for create transforms.
    pub source: Option<Arc<Record>>,
    pub context: Context,
    pub info: ResolveInfo,
}

/// Arguments handed to custom read resolvers.
#[derive(Debug, Clone)]
pub struct GetterCall {
    pub source: Arc<Record>,
    pub args: Value,
    pub context: Context,
    pub info: ResolveInfo,
}

/// Turns one input value into zero or more entries of the written record.
pub type TransformFn =
    Arc<dyn Fn(SetterCall) -> BoxFuture<'static, Result<Record, AutographError>> + Send + Sync>;

/// Runs against the committed record; its outcome carries no data.
pub type AfterDataFn =
    Arc<dyn Fn(SetterCall) -> BoxFuture<'static, Result<(), AutographError>> + Send + Sync>;

pub type GetterFn =
    Arc<dyn Fn(GetterCall) -> BoxFuture<'static, Result<Value, AutographError>> + Send + Sync>;

/// How an input value reaches the written record.
#[derive(Clone)]
pub enum Setter {
    /// The field is never written, even when present in input.
    NoWrite,
    /// Written unchanged under the given storage key.
    RenameTo(String),
    /// Written as whatever the transform returns.
    Transform(TransformFn),
}

impl Setter {
    pub fn transform<F, Fut>(f: F) -> Self
    where
        F: Fn(SetterCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Record, AutographError>> + Send + 'static,
    {
        Setter::Transform(Arc::new(
            move |call| -> BoxFuture<'static, Result<Record, AutographError>> { Box::pin(f(call)) },
        ))
    }

    /// Entries this setter contributes for `call.value`.
    pub async fn resolve(&self, call: SetterCall) -> Result<Record, AutographError> {
        match self {
            Setter::NoWrite => Ok(Record::new()),
            Setter::RenameTo(key) => {
                let mut entries = Record::new();
                entries.insert(key.clone(), call.value);
                Ok(entries)
            }
            Setter::Transform(f) => f(call).await,
        }
    }

    pub fn writes(&self) -> bool {
        !matches!(self, Setter::NoWrite)
    }
}

impl fmt::Debug for Setter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setter::NoWrite => f.write_str("NoWrite"),
            Setter::RenameTo(key) => f.debug_tuple("RenameTo").field(key).finish(),
            Setter::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// How a field is read from a source record.
#[derive(Clone)]
pub enum Getter {
    /// No read resolver is generated.
    Disabled,
    /// Read `source[column]`.
    Column,
    /// Read `source[key]`.
    Alias(String),
    Resolve(GetterFn),
}

impl fmt::Debug for Getter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Getter::Disabled => f.write_str("Disabled"),
            Getter::Column => f.write_str("Column"),
            Getter::Alias(key) => f.debug_tuple("Alias").field(key).finish(),
            Getter::Resolve(_) => f.write_str("Resolve(..)"),
        }
    }
}

/// One attribute of a model. Built with [`Field::builder`]; immutable after.
#[derive(Clone)]
pub struct Field {
    name: String,
    column: String,
    primary: bool,
    private: bool,
    nullable: bool,
    relationship: Option<String>,
    getter: Getter,
    set_create: Setter,
    set_update: Setter,
    set_create_after_data: Option<AfterDataFn>,
    set_update_after_data: Option<AfterDataFn>,
    hooks: HookSet,
}

impl Field {
    pub fn builder(name: impl Into<String>) -> FieldBuilder {
        FieldBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Target model name when the value is a foreign key.
    pub fn relationship(&self) -> Option<&str> {
        self.relationship.as_deref()
    }

    pub fn getter(&self) -> &Getter {
        &self.getter
    }

    /// Fields with a disabled getter or the private flag get no read resolver.
    pub fn is_readable(&self) -> bool {
        !self.private && !matches!(self.getter, Getter::Disabled)
    }

    pub fn set_create(&self) -> &Setter {
        &self.set_create
    }

    pub fn set_update(&self) -> &Setter {
        &self.set_update
    }

    pub fn set_create_after_data(&self) -> Option<&AfterDataFn> {
        self.set_create_after_data.as_ref()
    }

    pub fn set_update_after_data(&self) -> Option<&AfterDataFn> {
        self.set_update_after_data.as_ref()
    }

    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("primary", &self.primary)
            .field("private", &self.private)
            .field("nullable", &self.nullable)
            .field("relationship", &self.relationship)
            .field("getter", &self.getter)
            .field("set_create", &self.set_create)
            .field("set_update", &self.set_update)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Builder for [`Field`].
///
/// Setter defaults are resolved in [`build`](Self::build): an absent
/// `setter` writes the raw value under the column, and `set_create` /
/// `set_update` fall back to `setter`.
pub struct FieldBuilder {
    name: String,
    column: Option<String>,
    primary: bool,
    private: bool,
    nullable: bool,
    relationship: Option<String>,
    getter: Getter,
    setter: Option<Setter>,
    set_create: Option<Setter>,
    set_update: Option<Setter>,
    set_create_after_data: Option<AfterDataFn>,
    set_update_after_data: Option<AfterDataFn>,
    hooks: HookSet,
}

impl FieldBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: None,
            primary: false,
            private: false,
            nullable: true,
            relationship: None,
            getter: Getter::Column,
            setter: None,
            set_create: None,
            set_update: None,
            set_create_after_data: None,
            set_update_after_data: None,
            hooks: HookSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn relationship(mut self, target: impl Into<String>) -> Self {
        self.relationship = Some(target.into());
        self
    }

    pub fn getter(mut self, getter: Getter) -> Self {
        self.getter = getter;
        self
    }

    pub fn getter_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn(GetterCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, AutographError>> + Send + 'static,
    {
        self.getter(Getter::Resolve(Arc::new(
            move |call| -> BoxFuture<'static, Result<Value, AutographError>> { Box::pin(f(call)) },
        )))
    }

    pub fn setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn set_create(mut self, setter: Setter) -> Self {
        self.set_create = Some(setter);
        self
    }

    pub fn set_update(mut self, setter: Setter) -> Self {
        self.set_update = Some(setter);
        self
    }

    pub fn set_create_after_data<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(SetterCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AutographError>> + Send + 'static,
    {
        self.set_create_after_data = Some(after_data_fn(f));
        self
    }

    pub fn set_update_after_data<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(SetterCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AutographError>> + Send + 'static,
    {
        self.set_update_after_data = Some(after_data_fn(f));
        self
    }

    pub fn hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> Field {
        let column = self.column.unwrap_or_else(|| self.name.clone());
        let setter = self
            .setter
            .unwrap_or_else(|| Setter::RenameTo(column.clone()));
        Field {
            set_create: self.set_create.unwrap_or_else(|| setter.clone()),
            set_update: self.set_update.unwrap_or(setter),
            name: self.name,
            column,
            primary: self.primary,
            private: self.private,
            nullable: self.nullable,
            relationship: self.relationship,
            getter: self.getter,
            set_create_after_data: self.set_create_after_data,
            set_update_after_data: self.set_update_after_data,
            hooks: self.hooks,
        }
    }
}

fn after_data_fn<F, Fut>(f: F) -> AfterDataFn
where
    F: Fn(SetterCall) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), AutographError>> + Send + 'static,
{
    Arc::new(move |call| -> BoxFuture<'static, Result<(), AutographError>> { Box::pin(f(call)) })
}
