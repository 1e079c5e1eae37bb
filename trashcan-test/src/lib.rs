//! Test utilities for trashcan.
//!
//! [`TestDb`] opens a private in-memory SQLite database, applies a schema and
//! hands out a [`SqlxStore`] over it. [`init_tracing`] routes `tracing`
//! output through the test harness, filtered by `RUST_LOG`.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use trashcan_data::DataError;
use trashcan_data_sqlx::{SqlxErrorExt, SqlxStore};

/// In-memory SQLite database for tests.
///
/// The pool holds exactly one connection that never expires: every new
/// SQLite connection to `:memory:` would otherwise see an empty database.
/// Keep that in mind inside hooks, since a second query issued while a write
/// transaction is open waits for the same connection.
pub struct TestDb {
    store: SqlxStore,
}

impl TestDb {
    /// Create a database and run `schema` (any number of `;`-separated statements).
    pub async fn with_schema(schema: &str) -> Result<Self, DataError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| e.into_data_error())?;
        sqlx::raw_sql(schema)
            .execute(&pool)
            .await
            .map_err(|e| e.into_data_error())?;
        Ok(Self {
            store: SqlxStore::new(pool),
        })
    }

    /// Run one statement and return the rowid of the last inserted row.
    pub async fn insert(&self, sql: &str) -> Result<i64, DataError> {
        let result = sqlx::query(sql)
            .execute(self.pool())
            .await
            .map_err(|e| e.into_data_error())?;
        Ok(result.last_insert_rowid())
    }

    pub fn store(&self) -> SqlxStore {
        self.store.clone()
    }

    pub fn pool(&self) -> &SqlitePool {
        self.store.pool()
    }
}

/// Install a fmt subscriber writing through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
