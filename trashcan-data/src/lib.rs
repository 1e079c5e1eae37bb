pub mod entity;
pub mod error;
pub mod page;
pub mod query;
pub mod store;

pub use entity::Entity;
pub use error::DataError;
pub use page::{Page, Pageable};
pub use query::{is_valid_identifier, Assignment, QueryBuilder, QueryError, Value};
pub use store::{Store, StoreTx};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{Assignment, Entity, Page, Pageable, QueryBuilder, Store, StoreTx, Value};
}
