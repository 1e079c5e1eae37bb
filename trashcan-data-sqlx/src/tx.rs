//! Write transactions for [`SqlxStore`](crate::SqlxStore).
//!
//! A [`SqlxTx`] is committed explicitly; dropping it rolls back every write
//! made through it.

use crate::error::SqlxErrorExt;
use crate::store::bind_value;
use sqlx::{Sqlite, Transaction};
use std::ops::{Deref, DerefMut};
use trashcan_data::{Assignment, DataError, QueryBuilder, StoreTx};

/// A wrapper around SQLx [`Transaction`] implementing [`StoreTx`].
///
/// # Example
///
/// ```ignore
/// let mut tx = store.begin().await?;
/// tx.update_all(&QueryBuilder::new("notes").where_eq("user_id", "7"), &[
///     Assignment::new("deleted_at", Some(Utc::now())),
/// ]).await?;
/// tx.commit().await?;
/// ```
pub struct SqlxTx(pub Transaction<'static, Sqlite>);

impl Deref for SqlxTx {
    type Target = Transaction<'static, Sqlite>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SqlxTx {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl SqlxTx {
    /// Unwraps the `SqlxTx` into the inner `Transaction`.
    pub fn into_inner(self) -> Transaction<'static, Sqlite> {
        self.0
    }

    async fn execute_update(&mut self, query: &QueryBuilder, assignments: &[Assignment]) -> Result<u64, DataError> {
        let (sql, values) = query
            .build_update(assignments)
            .map_err(|e| e.into_data_error())?;
        tracing::debug!(%sql, "executing update");
        let mut q = sqlx::query(&sql);
        for value in values {
            q = bind_value(q, value);
        }
        let result = q
            .execute(&mut *self.0)
            .await
            .map_err(|e| e.into_data_error())?;
        Ok(result.rows_affected())
    }
}

impl StoreTx for SqlxTx {
    async fn update_columns(
        &mut self,
        table: &str,
        id_column: &str,
        id: &str,
        assignments: &[Assignment],
    ) -> Result<u64, DataError> {
        let query = QueryBuilder::new(table)
            .key_column(id_column)
            .where_eq(id_column, id);
        self.execute_update(&query, assignments).await
    }

    async fn update_all(&mut self, query: &QueryBuilder, assignments: &[Assignment]) -> Result<u64, DataError> {
        self.execute_update(query, assignments).await
    }

    async fn commit(self) -> Result<(), DataError> {
        self.into_inner()
            .commit()
            .await
            .map_err(|e| e.into_data_error())
    }
}
