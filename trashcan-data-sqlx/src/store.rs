use crate::error::SqlxErrorExt;
use crate::tx::SqlxTx;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::Sqlite;
use trashcan_data::{DataError, Entity, QueryBuilder, Store, Value};

pub(crate) type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

pub(crate) fn bind_value(query: SqliteQuery<'_>, value: Value) -> SqliteQuery<'_> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Text(text) => query.bind(text),
        Value::Timestamp(ts) => query.bind(ts),
    }
}

/// [`Store`] backed by an `sqlx::SqlitePool`.
///
/// Writes go through [`SqlxTx`], so a trash or recover call commits its own
/// row and every cascaded row together or not at all.
///
/// # Example
///
/// ```ignore
/// let store = SqlxStore::connect("sqlite://app.db").await?;
/// let visible = store.count(&QueryBuilder::new("users").where_null("deleted_at")).await?;
/// ```
#[derive(Clone)]
pub struct SqlxStore {
    pool: SqlitePool,
}

impl SqlxStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect a new pool to `url`.
    pub async fn connect(url: &str) -> Result<Self, DataError> {
        let pool = SqlitePool::connect(url)
            .await
            .map_err(|e| e.into_data_error())?;
        Ok(Self::new(pool))
    }

    /// Get the underlying pool reference.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl Store for SqlxStore {
    type Row = SqliteRow;
    type Tx = SqlxTx;

    async fn begin(&self) -> Result<SqlxTx, DataError> {
        let tx = self.pool.begin().await.map_err(|e| e.into_data_error())?;
        Ok(SqlxTx(tx))
    }

    async fn count(&self, query: &QueryBuilder) -> Result<u64, DataError> {
        let (sql, params) = query.build_count();
        tracing::trace!(%sql, "count");
        let mut q = sqlx::query_scalar::<_, i64>(&sql);
        for param in params {
            q = q.bind(param);
        }
        let count = q
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;
        Ok(count.max(0) as u64)
    }

    async fn fetch_all<E>(&self, query: &QueryBuilder) -> Result<Vec<E>, DataError>
    where
        E: Entity + for<'r> sqlx::FromRow<'r, Self::Row>,
    {
        let (sql, params) = query.build_select("*");
        tracing::trace!(%sql, "fetch_all");
        let mut q = sqlx::query_as::<_, E>(&sql);
        for param in params {
            q = q.bind(param);
        }
        q.fetch_all(&self.pool)
            .await
            .map_err(|e| e.into_data_error())
    }

    async fn find_by_id<E>(&self, id: &E::Id) -> Result<Option<E>, DataError>
    where
        E: Entity + for<'r> sqlx::FromRow<'r, Self::Row>,
    {
        let (sql, params) = QueryBuilder::for_entity::<E>()
            .where_eq(E::id_column(), &id.to_string())
            .build_select("*");
        tracing::trace!(%sql, "find_by_id");
        let mut q = sqlx::query_as::<_, E>(&sql);
        for param in params {
            q = q.bind(param);
        }
        q.fetch_optional(&self.pool)
            .await
            .map_err(|e| e.into_data_error())
    }
}
