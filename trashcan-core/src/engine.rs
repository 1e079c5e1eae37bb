use crate::error::TrashError;
use crate::hooks::{HookContext, Next, Transition, NOT_RUN};
use crate::model::Trashable;
use crate::registry::{self, ModelConfig, Registry};
use crate::scope::Scope;
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use std::sync::Arc;
use trashcan_data::{Assignment, DataError, Entity, Page, Pageable, QueryBuilder, Store, StoreTx};

/// Runs trash and recover against a [`Store`] using the configurations held
/// in a [`Registry`].
///
/// Every call follows the same sequence:
///
/// 1. look up the model configuration (nothing is written if it is missing);
/// 2. plan the cascade queries from the in-memory record;
/// 3. run the `before` hooks;
/// 4. inside one store transaction and the `around` hooks, update the record's
///    own marker column and then each cascade relation in configured order;
/// 5. commit, update the in-memory marker, run the `after` hooks.
///
/// The first store failure is returned as is and the transaction is dropped
/// uncommitted. Concurrent calls on the same record are not serialized here;
/// the writes are idempotent and the store decides which one lands last.
pub struct TrashEngine<S> {
    store: S,
    registry: Arc<Registry>,
}

struct OwnWrite {
    table: &'static str,
    id_column: &'static str,
    id: String,
    assignments: Vec<Assignment>,
}

struct CascadeStep {
    relation: String,
    query: QueryBuilder,
    assignments: Vec<Assignment>,
}

impl<S: Store> TrashEngine<S> {
    pub fn new(store: S, registry: Arc<Registry>) -> Self {
        Self { store, registry }
    }

    /// Engine over the process-wide registry.
    pub fn with_global_registry(store: S) -> Self {
        Self::new(store, registry::global())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Default scope of `E`: active rows only.
    pub fn all<E: Trashable>(&self) -> Result<Scope<E>, TrashError> {
        let config = self.registry.get::<E>()?;
        Ok(Scope::new(config.marker_column()))
    }

    /// Every row of `E`, trashed or not.
    pub fn with_deleted<E: Trashable>(&self) -> Result<Scope<E>, TrashError> {
        Ok(self.all::<E>()?.with_deleted())
    }

    /// Only the trashed rows of `E`.
    pub fn deleted_only<E: Trashable>(&self) -> Result<Scope<E>, TrashError> {
        Ok(self.all::<E>()?.deleted_only())
    }

    /// Whether the in-memory `entity` carries a trash marker.
    pub fn is_trashed<E: Trashable>(&self, entity: &E) -> Result<bool, TrashError> {
        let config = self.registry.get::<E>()?;
        Ok(entity.marker(config.marker_column()).is_some())
    }

    pub async fn count<E: Entity>(&self, scope: &Scope<E>) -> Result<u64, TrashError> {
        Ok(self.store.count(&scope.to_query()).await?)
    }

    pub async fn fetch<E>(&self, scope: &Scope<E>) -> Result<Vec<E>, TrashError>
    where
        E: Entity + for<'r> sqlx::FromRow<'r, S::Row>,
    {
        Ok(self.store.fetch_all(&scope.to_query()).await?)
    }

    /// One page of `scope` together with the total number of matching rows.
    ///
    /// The sort column of `pageable` must be one of `E`'s columns.
    pub async fn fetch_page<E>(&self, scope: &Scope<E>, pageable: &Pageable) -> Result<Page<E>, TrashError>
    where
        E: Entity + for<'r> sqlx::FromRow<'r, S::Row>,
    {
        if let Some((column, _)) = pageable.sort_order() {
            if !E::has_column(column) {
                return Err(TrashError::Store(DataError::Other(format!(
                    "cannot sort {} by unknown column '{column}'",
                    E::table_name()
                ))));
            }
        }
        let query = scope.to_query();
        let total = self.store.count(&query.clone().without_paging()).await?;
        let content = self.store.fetch_all(&query.page(pageable)).await?;
        Ok(Page::new(content, pageable, total))
    }

    /// Re-read `entity` from the store, ignoring visibility.
    pub async fn reload<E>(&self, entity: &mut E) -> Result<(), TrashError>
    where
        E: Entity + for<'r> sqlx::FromRow<'r, S::Row>,
    {
        let fresh = self
            .store
            .find_by_id::<E>(entity.id())
            .await?
            .ok_or_else(|| DataError::NotFound(format!("{} {}", E::table_name(), entity.id().to_string())))?;
        *entity = fresh;
        Ok(())
    }

    /// Mark `entity` and its cascaded dependents as trashed.
    ///
    /// Trashing an already trashed record sets a new timestamp. Cascades only
    /// reach dependents that are currently active.
    pub async fn trash<E: Trashable>(&self, entity: &mut E) -> Result<(), TrashError> {
        self.transition(entity, Transition::Trash, Some(Utc::now()))
            .await
    }

    /// Clear the trash marker of `entity` and of all its cascaded dependents,
    /// trashed ones included. Validation rules are never consulted.
    pub async fn recover<E: Trashable>(&self, entity: &mut E) -> Result<(), TrashError> {
        self.transition(entity, Transition::Recover, None).await
    }

    async fn transition<E: Trashable>(
        &self,
        entity: &mut E,
        transition: Transition,
        value: Option<DateTime<Utc>>,
    ) -> Result<(), TrashError> {
        let config = self.registry.get::<E>()?;
        let column = config.marker_column().to_string();
        let ctx = HookContext {
            model: E::model_name(),
            table: E::table_name(),
            id: entity.id().to_string(),
            transition,
            marker_column: column.clone(),
        };
        let own = OwnWrite {
            table: E::table_name(),
            id_column: E::id_column(),
            id: ctx.id.clone(),
            assignments: vec![Assignment::new(column.as_str(), value)],
        };
        let plan = self.plan(&config, entity, transition, value);
        let hooks = config.hooks(transition);

        hooks.run_before(&ctx).inspect_err(|err| log_abort(&ctx, err))?;

        let mut tx = self.store.begin().await?;
        let mut failure: Option<DataError> = None;
        let mut rows = 0u64;
        let mut executed = false;
        let outcome = {
            let tx = &mut tx;
            let failure = &mut failure;
            let rows = &mut rows;
            let executed = &mut executed;
            let own = &own;
            let plan = plan.as_slice();
            let body = Next::new(move || {
                async move {
                    match apply(tx, own, plan).await {
                        Ok(touched) => {
                            *rows = touched;
                            *executed = true;
                            Ok(())
                        }
                        Err(err) => {
                            let mirror = TrashError::Store(DataError::Other(err.to_string()));
                            *failure = Some(err);
                            Err(mirror)
                        }
                    }
                }
                .boxed()
            });
            hooks.run_around(&ctx, body).await
        };

        // A hook may swallow the body's error; the store error still wins.
        if let Some(err) = failure {
            return Err(TrashError::Store(err));
        }
        outcome.inspect_err(|err| log_abort(&ctx, err))?;
        // The chain can finish without ever polling the writes to completion.
        if !executed {
            let err = TrashError::HookAbort {
                hook: hooks.outermost_around().unwrap_or_default().to_string(),
                transition,
                reason: NOT_RUN.to_string(),
            };
            log_abort(&ctx, &err);
            return Err(err);
        }
        tx.commit().await?;

        entity.set_marker(&column, value);
        tracing::info!(
            model = ctx.model,
            id = %ctx.id,
            %transition,
            rows,
            "transition committed"
        );

        hooks.run_after(&ctx).inspect_err(|err| log_abort(&ctx, err))
    }

    fn plan<E: Trashable>(
        &self,
        config: &ModelConfig<E>,
        entity: &E,
        transition: Transition,
        value: Option<DateTime<Utc>>,
    ) -> Vec<CascadeStep> {
        config
            .cascade()
            .iter()
            .map(|relation| {
                let column = self
                    .registry
                    .marker_column_of(relation.target())
                    .unwrap_or_else(|| config.marker_column().to_string());
                let members = relation.members(entity);
                let query = match transition {
                    Transition::Trash => members.where_null(&column),
                    Transition::Recover => members,
                };
                CascadeStep {
                    relation: relation.name().to_string(),
                    query,
                    assignments: vec![Assignment::new(column, value)],
                }
            })
            .collect()
    }
}

/// Write the record, then each cascade step. Returns the rows touched.
async fn apply<T: StoreTx>(tx: &mut T, own: &OwnWrite, plan: &[CascadeStep]) -> Result<u64, DataError> {
    let mut rows = tx
        .update_columns(own.table, own.id_column, &own.id, &own.assignments)
        .await?;
    if rows == 0 {
        return Err(DataError::NotFound(format!("{} {}", own.table, own.id)));
    }
    for step in plan {
        let touched = tx.update_all(&step.query, &step.assignments).await?;
        tracing::debug!(relation = %step.relation, touched, "cascade applied");
        rows += touched;
    }
    Ok(rows)
}

fn log_abort(ctx: &HookContext, err: &TrashError) {
    if let TrashError::HookAbort { hook, reason, .. } = err {
        tracing::warn!(
            model = ctx.model,
            id = %ctx.id,
            transition = %ctx.transition,
            %hook,
            %reason,
            "transition aborted by hook"
        );
    }
}
