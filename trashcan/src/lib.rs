//! Trashcan — soft deletion for SQL-backed entities.
//!
//! This facade crate re-exports the trashcan sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use trashcan::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature  | Default | Crate                       |
//! |----------|---------|-----------------------------|
//! | `sqlite` | **yes** | `trashcan-data-sqlx`        |
//! | `test`   | no      | `trashcan-test`             |
//! | `full`   | no      | All of the above            |

// Re-export sub-crates as public modules so they're accessible as
// `trashcan::trashcan_core`, `trashcan::trashcan_data`, etc.
pub extern crate trashcan_core;
pub extern crate trashcan_data;

// Re-export everything from trashcan-core at the top level for convenience.
pub use trashcan_core::*;

pub use trashcan_data::{DataError, Entity, Page, Pageable, QueryBuilder, Store, StoreTx};

#[cfg(feature = "sqlite")]
pub use trashcan_data_sqlx;

#[cfg(feature = "sqlite")]
pub use trashcan_data_sqlx::SqlxStore;

#[cfg(feature = "test")]
pub use trashcan_test;

/// Engine over the SQLite store.
#[cfg(feature = "sqlite")]
pub type SqliteTrashEngine = TrashEngine<SqlxStore>;

/// Unified prelude — import everything with `use trashcan::prelude::*`.
///
/// Includes the core prelude plus types from all enabled feature crates.
pub mod prelude {
    pub use trashcan_core::prelude::*;

    #[cfg(feature = "sqlite")]
    pub use trashcan_data_sqlx::prelude::*;

    #[cfg(feature = "sqlite")]
    pub use crate::SqliteTrashEngine;
}
