use crate::config::TrashOptions;
use crate::error::TrashError;
use crate::hooks::{HookAbort, HookChain, HookContext, Next, Transition};
use crate::model::{Relation, Trashable};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use trashcan_data::is_valid_identifier;

/// Trash configuration of one model: options, resolved cascade relations and
/// lifecycle hooks.
///
/// Built once, handed to [`Registry::register`], and read-only afterwards.
///
/// ```ignore
/// registry.register(
///     ModelConfig::<User>::new(TrashOptions::new().cascade(["notes"]))
///         .before_trash("audit", |ctx| {
///             tracing::info!(id = %ctx.id, "trashing user");
///             Ok(())
///         }),
/// )?;
/// ```
pub struct ModelConfig<E> {
    options: TrashOptions,
    cascade: Vec<Relation<E>>,
    trash_hooks: HookChain,
    recover_hooks: HookChain,
}

impl<E> std::fmt::Debug for ModelConfig<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("options", &self.options)
            .field("cascade", &self.cascade)
            .finish_non_exhaustive()
    }
}

impl<E: Trashable> Default for ModelConfig<E> {
    fn default() -> Self {
        Self::new(TrashOptions::default())
    }
}

impl<E: Trashable> ModelConfig<E> {
    pub fn new(options: TrashOptions) -> Self {
        Self {
            options,
            cascade: Vec::new(),
            trash_hooks: HookChain::new(),
            recover_hooks: HookChain::new(),
        }
    }

    pub fn options(&self) -> &TrashOptions {
        &self.options
    }

    pub fn marker_column(&self) -> &str {
        &self.options.marker_column
    }

    /// Cascade relations in application order. Empty until registered.
    pub fn cascade(&self) -> &[Relation<E>] {
        &self.cascade
    }

    pub fn hooks(&self, transition: Transition) -> &HookChain {
        match transition {
            Transition::Trash => &self.trash_hooks,
            Transition::Recover => &self.recover_hooks,
        }
    }

    pub fn before_trash<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&HookContext) -> Result<(), HookAbort> + Send + Sync + 'static,
    {
        self.trash_hooks.before(name, hook);
        self
    }

    pub fn after_trash<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&HookContext) -> Result<(), HookAbort> + Send + Sync + 'static,
    {
        self.trash_hooks.after(name, hook);
        self
    }

    pub fn around_trash<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: for<'a> Fn(HookContext, Next<'a>) -> BoxFuture<'a, Result<(), TrashError>> + Send + Sync + 'static,
    {
        self.trash_hooks.around(name, hook);
        self
    }

    pub fn before_recover<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&HookContext) -> Result<(), HookAbort> + Send + Sync + 'static,
    {
        self.recover_hooks.before(name, hook);
        self
    }

    pub fn after_recover<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&HookContext) -> Result<(), HookAbort> + Send + Sync + 'static,
    {
        self.recover_hooks.after(name, hook);
        self
    }

    pub fn around_recover<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: for<'a> Fn(HookContext, Next<'a>) -> BoxFuture<'a, Result<(), TrashError>> + Send + Sync + 'static,
    {
        self.recover_hooks.around(name, hook);
        self
    }

    /// Check the options against `E` and bind cascade names to relations.
    fn resolve(&mut self) -> Result<(), TrashError> {
        let column = &self.options.marker_column;
        if !is_valid_identifier(column) {
            return Err(TrashError::configuration::<E>(format!(
                "invalid marker column '{column}'"
            )));
        }
        if !E::has_column(column) {
            return Err(TrashError::configuration::<E>(format!(
                "marker column '{column}' is not a column of {}",
                E::table_name()
            )));
        }

        let mut declared = E::relations();
        let mut seen = HashSet::new();
        let mut cascade = Vec::with_capacity(self.options.cascade.len());
        for name in &self.options.cascade {
            if !seen.insert(name.as_str()) {
                return Err(TrashError::configuration::<E>(format!(
                    "relation '{name}' is listed twice in cascade"
                )));
            }
            let idx = declared
                .iter()
                .position(|relation| relation.name() == name)
                .ok_or_else(|| TrashError::configuration::<E>(format!("unknown relation '{name}'")))?;
            cascade.push(declared.swap_remove(idx));
        }
        self.cascade = cascade;
        Ok(())
    }
}

struct Registered {
    marker_column: String,
    config: Arc<dyn Any + Send + Sync>,
}

/// Trash configurations keyed by model type.
///
/// A model registers once; a second registration is rejected rather than
/// merged, so the configuration seen by the engine never changes.
#[derive(Default)]
pub struct Registry {
    models: DashMap<TypeId, Registered>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store the configuration of `E`.
    pub fn register<E: Trashable>(&self, mut config: ModelConfig<E>) -> Result<(), TrashError> {
        config.resolve()?;
        match self.models.entry(TypeId::of::<E>()) {
            Entry::Occupied(_) => Err(TrashError::configuration::<E>("model is already registered")),
            Entry::Vacant(slot) => {
                tracing::debug!(
                    model = E::model_name(),
                    table = E::table_name(),
                    marker_column = %config.marker_column(),
                    cascade = ?config.options.cascade,
                    "registered trashable model"
                );
                slot.insert(Registered {
                    marker_column: config.marker_column().to_string(),
                    config: Arc::new(config),
                });
                Ok(())
            }
        }
    }

    /// Configuration of `E`.
    pub fn get<E: Trashable>(&self) -> Result<Arc<ModelConfig<E>>, TrashError> {
        let config = self
            .models
            .get(&TypeId::of::<E>())
            .map(|entry| Arc::clone(&entry.config))
            .ok_or_else(|| TrashError::configuration::<E>("model is not registered"))?;
        config
            .downcast::<ModelConfig<E>>()
            .map_err(|_| TrashError::configuration::<E>("registered configuration has an unexpected type"))
    }

    pub fn is_registered<E: 'static>(&self) -> bool {
        self.models.contains_key(&TypeId::of::<E>())
    }

    /// Marker column of whichever model registered under `model`.
    pub fn marker_column_of(&self, model: TypeId) -> Option<String> {
        self.models.get(&model).map(|entry| entry.marker_column.clone())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

/// The process-wide registry.
pub fn global() -> Arc<Registry> {
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(Registry::new())))
}

/// Register `E` in the process-wide registry.
pub fn register_model<E: Trashable>(config: ModelConfig<E>) -> Result<(), TrashError> {
    global().register(config)
}
