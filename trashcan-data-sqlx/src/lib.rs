//! # trashcan-data-sqlx — SQLx backend for the trashcan data layer
//!
//! This crate provides the [SQLx](https://github.com/launchbadge/sqlx)-specific
//! implementation of the [`Store`](trashcan_data::Store) and
//! [`StoreTx`](trashcan_data::StoreTx) traits from [`trashcan-data`], backed
//! by SQLite.
//!
//! # What's in this crate
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqlxStore`] | Store wrapper holding an `sqlx::SqlitePool` |
//! | [`SqlxTx`] | Transaction wrapper — explicit commit, rollback on drop |
//! | [`SqlxErrorExt`] | Extension trait to convert `sqlx::Error` → `DataError` (`.into_data_error()`) |
//! | [`SqlxResult<T>`] | Type alias for `Result<T, DataError>` |
//!
//! # Timestamps
//!
//! Marker columns are bound as `chrono::DateTime<Utc>` and read back the same
//! way, so entity structs declare them as `Option<DateTime<Utc>>`.
//!
//! # Error bridging
//!
//! Due to Rust's orphan rules, `From<sqlx::Error> for DataError` can't be
//! implemented here. Use the [`SqlxErrorExt`] trait instead:
//!
//! ```ignore
//! use trashcan_data_sqlx::SqlxErrorExt;
//!
//! sqlx::query("INSERT INTO users DEFAULT VALUES")
//!     .execute(store.pool())
//!     .await
//!     .map_err(|e| e.into_data_error())?;
//! ```

pub mod error;
pub mod store;
pub mod tx;

pub use error::{SqlxErrorExt, SqlxResult};
pub use store::SqlxStore;
pub use tx::SqlxTx;

/// Re-exports of the most commonly used types from both `trashcan-data` and this crate.
pub mod prelude {
    pub use crate::{SqlxErrorExt, SqlxStore, SqlxTx};
    pub use trashcan_data::prelude::*;
}
