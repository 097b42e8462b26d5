//! Hook stages and the per-model / per-field hook registry.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use autograph_core::{AutographError, BoxFuture, Context, Operation, Record, ResolveInfo};

/// Arguments handed to every hook.
///
/// `source` is the record the hook is about: the pre-mutation record for
/// update and delete, the committed record for after-data stages, and `None`
/// for pre-write create stages.
#[derive(Debug, Clone)]
pub struct HookCall {
    pub source: Option<Arc<Record>>,
    pub context: Context,
    pub info: ResolveInfo,
}

impl HookCall {
    pub fn source(&self) -> Option<&Record> {
        self.source.as_deref()
    }
}

/// Hook that contributes entries to the record being written.
pub type DataHook =
    Arc<dyn Fn(HookCall) -> BoxFuture<'static, Result<Record, AutographError>> + Send + Sync>;

/// Hook run for its side effects only.
pub type EffectHook =
    Arc<dyn Fn(HookCall) -> BoxFuture<'static, Result<(), AutographError>> + Send + Sync>;

/// Every point of the pipeline where a hook may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookStage {
    OnAccess,
    OnCreate,
    OnUpdate,
    OnDelete,
    OnMutation,
    OnCreateAfterData,
    OnUpdateAfterData,
    OnDeleteAfterData,
    OnMutationAfterData,
}

/// Which handler signature a stage takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Data,
    Effect,
}

impl HookStage {
    pub const ALL: [HookStage; 9] = [
        HookStage::OnAccess,
        HookStage::OnCreate,
        HookStage::OnUpdate,
        HookStage::OnDelete,
        HookStage::OnMutation,
        HookStage::OnCreateAfterData,
        HookStage::OnUpdateAfterData,
        HookStage::OnDeleteAfterData,
        HookStage::OnMutationAfterData,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HookStage::OnAccess => "on-access",
            HookStage::OnCreate => "on-create",
            HookStage::OnUpdate => "on-update",
            HookStage::OnDelete => "on-delete",
            HookStage::OnMutation => "on-mutation",
            HookStage::OnCreateAfterData => "on-create-after-data",
            HookStage::OnUpdateAfterData => "on-update-after-data",
            HookStage::OnDeleteAfterData => "on-delete-after-data",
            HookStage::OnMutationAfterData => "on-mutation-after-data",
        }
    }

    pub fn kind(self) -> HookKind {
        match self {
            HookStage::OnCreate | HookStage::OnUpdate | HookStage::OnMutation => HookKind::Data,
            _ => HookKind::Effect,
        }
    }

    pub fn is_after_data(self) -> bool {
        matches!(
            self,
            HookStage::OnCreateAfterData
                | HookStage::OnUpdateAfterData
                | HookStage::OnDeleteAfterData
                | HookStage::OnMutationAfterData
        )
    }

    /// The operation-specific pre-write stage.
    pub fn before(op: Operation) -> Self {
        match op {
            Operation::Create => HookStage::OnCreate,
            Operation::Update => HookStage::OnUpdate,
            Operation::Delete => HookStage::OnDelete,
        }
    }

    /// The operation-specific after-data stage.
    pub fn after(op: Operation) -> Self {
        match op {
            Operation::Create => HookStage::OnCreateAfterData,
            Operation::Update => HookStage::OnUpdateAfterData,
            Operation::Delete => HookStage::OnDeleteAfterData,
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookStage {
    type Err = AutographError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| AutographError::InvalidArguments(format!("unknown hook stage `{s}`")))
    }
}

#[derive(Clone)]
enum Hook {
    Data(DataHook),
    Effect(EffectHook),
}

/// Stage → handler mapping. Registration goes through typed methods, so a
/// stage always holds a handler of its own [`HookKind`]. An empty slot is a
/// no-op when run.
///
/// ```ignore
/// let hooks = HookSet::new()
///     .on_create(|_call| async {
///         let mut extra = Record::new();
///         extra.insert("role".into(), json!("member"));
///         Ok(extra)
///     })
///     .on_delete_after_data(|call| async move {
///         tracing::info!(source = ?call.source(), "deleted");
///         Ok(())
///     });
/// ```
#[derive(Clone, Default)]
pub struct HookSet {
    slots: HashMap<HookStage, Hook>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_access<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(HookCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AutographError>> + Send + 'static,
    {
        self.with_effect(HookStage::OnAccess, hook)
    }

    pub fn on_create<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(HookCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Record, AutographError>> + Send + 'static,
    {
        self.with_data(HookStage::OnCreate, hook)
    }

    pub fn on_update<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(HookCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Record, AutographError>> + Send + 'static,
    {
        self.with_data(HookStage::OnUpdate, hook)
    }

    /// Fires for create, update and delete. Its contribution is merged into
    /// the written record for create and update, and ignored for delete.
    pub fn on_mutation<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(HookCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Record, AutographError>> + Send + 'static,
    {
        self.with_data(HookStage::OnMutation, hook)
    }

    pub fn on_delete<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(HookCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AutographError>> + Send + 'static,
    {
        self.with_effect(HookStage::OnDelete, hook)
    }

    pub fn on_create_after_data<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(HookCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AutographError>> + Send + 'static,
    {
        self.with_effect(HookStage::OnCreateAfterData, hook)
    }

    pub fn on_update_after_data<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(HookCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AutographError>> + Send + 'static,
    {
        self.with_effect(HookStage::OnUpdateAfterData, hook)
    }

    pub fn on_delete_after_data<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(HookCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AutographError>> + Send + 'static,
    {
        self.with_effect(HookStage::OnDeleteAfterData, hook)
    }

    pub fn on_mutation_after_data<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(HookCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AutographError>> + Send + 'static,
    {
        self.with_effect(HookStage::OnMutationAfterData, hook)
    }

    fn with_data<F, Fut>(mut self, stage: HookStage, hook: F) -> Self
    where
        F: Fn(HookCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Record, AutographError>> + Send + 'static,
    {
        debug_assert_eq!(stage.kind(), HookKind::Data);
        let hook: DataHook = Arc::new(
            move |call| -> BoxFuture<'static, Result<Record, AutographError>> {
                Box::pin(hook(call))
            },
        );
        self.slots.insert(stage, Hook::Data(hook));
        self
    }

    fn with_effect<F, Fut>(mut self, stage: HookStage, hook: F) -> Self
    where
        F: Fn(HookCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AutographError>> + Send + 'static,
    {
        debug_assert_eq!(stage.kind(), HookKind::Effect);
        let hook: EffectHook = Arc::new(
            move |call| -> BoxFuture<'static, Result<(), AutographError>> { Box::pin(hook(call)) },
        );
        self.slots.insert(stage, Hook::Effect(hook));
        self
    }

    pub fn data(&self, stage: HookStage) -> Option<&DataHook> {
        match self.slots.get(&stage) {
            Some(Hook::Data(hook)) => Some(hook),
            _ => None,
        }
    }

    pub fn effect(&self, stage: HookStage) -> Option<&EffectHook> {
        match self.slots.get(&stage) {
            Some(Hook::Effect(hook)) => Some(hook),
            _ => None,
        }
    }

    pub fn contains(&self, stage: HookStage) -> bool {
        self.slots.contains_key(&stage)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registered stages, in pipeline order.
    pub fn stages(&self) -> Vec<HookStage> {
        let mut stages: Vec<HookStage> = self.slots.keys().copied().collect();
        stages.sort();
        stages
    }

    /// Run a data stage. An empty slot contributes nothing.
    pub async fn run_data(&self, stage: HookStage, call: HookCall) -> Result<Record, AutographError> {
        match self.data(stage) {
            Some(hook) => hook(call).await,
            None => Ok(Record::new()),
        }
    }

    /// Run an effect stage. An empty slot does nothing.
    pub async fn run_effect(&self, stage: HookStage, call: HookCall) -> Result<(), AutographError> {
        match self.effect(stage) {
            Some(hook) => hook(call).await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.stages().iter().map(|s| s.as_str())).finish()
    }
}
