//! # trashcan-core — soft deletion for trashcan entities
//!
//! A trashable model carries a nullable timestamp column (the *marker*,
//! `deleted_at` by default). `NULL` means the row is active; a timestamp means
//! it is trashed. This crate provides:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Registry`] | Per-model configuration: marker column, cascade relations, hooks |
//! | [`Scope`] | Queries that hide trashed rows unless asked otherwise |
//! | [`TrashEngine`] | `trash` / `recover` with one-level cascades inside a transaction |
//! | [`HookChain`] | `before`, `around` and `after` handlers that can cancel a call |
//!
//! ```ignore
//! let registry = Arc::new(Registry::new());
//! registry.register(ModelConfig::<Note>::default())?;
//! registry.register(ModelConfig::<User>::new(TrashOptions::new().cascade(["notes"])))?;
//!
//! let engine = TrashEngine::new(store, registry);
//! engine.trash(&mut user).await?;
//! assert_eq!(engine.count(&engine.all::<User>()?).await?, 0);
//! engine.recover(&mut user).await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod model;
pub mod registry;
pub mod scope;

pub use config::{TrashOptions, TrashSettings, DEFAULT_MARKER_COLUMN};
pub use engine::TrashEngine;
pub use error::TrashError;
pub use hooks::{AroundHook, HookAbort, HookChain, HookContext, Next, Transition};
pub use model::{Relation, Trashable};
pub use registry::{global, register_model, ModelConfig, Registry};
pub use scope::{Scope, Visibility};

pub mod prelude {
    //! Re-exports of the most commonly used soft-deletion types.
    pub use crate::{
        HookAbort, HookContext, ModelConfig, Next, Registry, Relation, Scope, TrashEngine, TrashError, TrashOptions,
        Trashable, Transition,
    };
    pub use trashcan_data::prelude::*;
}
