use crate::entity::Entity;
use crate::error::DataError;
use crate::query::{Assignment, QueryBuilder};
use std::future::Future;

/// Read side of a persistence backend, plus the factory for write transactions.
///
/// Reads go through [`QueryBuilder`] so that callers control every filter,
/// including visibility predicates. Writes only happen through a [`StoreTx`].
///
/// Uses RPITIT (return-position `impl Trait` in traits) — no `async-trait` needed.
pub trait Store: Send + Sync {
    /// Row type the backend decodes entities from.
    type Row: sqlx::Row;
    /// Write transaction handed out by [`Store::begin`].
    type Tx: StoreTx;

    /// Open a write transaction. Stores without transactions may return a
    /// handle that writes through immediately; see the backend's docs.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, DataError>> + Send;

    /// Count the rows matched by `query`.
    fn count(&self, query: &QueryBuilder) -> impl Future<Output = Result<u64, DataError>> + Send;

    /// Fetch every row matched by `query`.
    fn fetch_all<E>(&self, query: &QueryBuilder) -> impl Future<Output = Result<Vec<E>, DataError>> + Send
    where
        E: Entity + for<'r> sqlx::FromRow<'r, Self::Row>;

    /// Fetch one row by primary key, ignoring any visibility scope.
    fn find_by_id<E>(&self, id: &E::Id) -> impl Future<Output = Result<Option<E>, DataError>> + Send
    where
        E: Entity + for<'r> sqlx::FromRow<'r, Self::Row>;
}

/// Write side of a persistence backend.
///
/// Neither method runs validation or per-row hooks. Dropping a transaction
/// without calling [`StoreTx::commit`] discards its writes.
pub trait StoreTx: Send {
    /// Set columns on a single row identified by primary key, regardless of
    /// any visibility scope. Returns the number of rows touched.
    fn update_columns(
        &mut self,
        table: &str,
        id_column: &str,
        id: &str,
        assignments: &[Assignment],
    ) -> impl Future<Output = Result<u64, DataError>> + Send;

    /// Set columns on every row matched by `query`. Returns the number of rows touched.
    fn update_all(
        &mut self,
        query: &QueryBuilder,
        assignments: &[Assignment],
    ) -> impl Future<Output = Result<u64, DataError>> + Send;

    /// Make every write of this transaction visible.
    fn commit(self) -> impl Future<Output = Result<(), DataError>> + Send;
}
