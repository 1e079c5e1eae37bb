use chrono::{DateTime, Utc};
use std::any::TypeId;
use std::sync::Arc;
use trashcan_data::{Entity, QueryBuilder};

/// An entity whose rows can be trashed and recovered.
///
/// The marker accessors receive the configured column name so one struct can
/// back several models that use different columns on the same table.
///
/// # Example
///
/// ```ignore
/// impl Trashable for User {
///     fn marker(&self, _column: &str) -> Option<DateTime<Utc>> {
///         self.deleted_at
///     }
///
///     fn set_marker(&mut self, _column: &str, value: Option<DateTime<Utc>>) {
///         self.deleted_at = value;
///     }
///
///     fn relations() -> Vec<Relation<Self>> {
///         vec![Relation::has_many::<Note>("notes", "user_id")]
///     }
/// }
/// ```
pub trait Trashable: Entity + Sized {
    /// Current value of `column` on this instance.
    fn marker(&self, column: &str) -> Option<DateTime<Utc>>;

    /// Overwrite the in-memory value of `column`.
    fn set_marker(&mut self, column: &str, value: Option<DateTime<Utc>>);

    /// Named dependent collections that may be listed in the cascade options.
    fn relations() -> Vec<Relation<Self>> {
        Vec::new()
    }
}

type MembersFn<E> = dyn Fn(&E) -> QueryBuilder + Send + Sync;

/// A named, typed accessor from a parent record to its dependent rows.
pub struct Relation<E> {
    name: String,
    target: TypeId,
    target_model: &'static str,
    members: Arc<MembersFn<E>>,
}

impl<E: Entity> Relation<E> {
    /// Relation whose members are selected by `members(parent)`.
    ///
    /// The returned builder must target `C`'s table and carry no visibility
    /// predicate of its own.
    pub fn new<C: Entity>(
        name: impl Into<String>,
        members: impl Fn(&E) -> QueryBuilder + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            target: TypeId::of::<C>(),
            target_model: C::model_name(),
            members: Arc::new(members),
        }
    }

    /// Rows of `C` whose `foreign_key` equals the parent's id.
    pub fn has_many<C: Entity>(name: impl Into<String>, foreign_key: &'static str) -> Self {
        Self::new::<C>(name, move |parent: &E| {
            QueryBuilder::for_entity::<C>().where_eq(foreign_key, &parent.id().to_string())
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type id of the dependent entity.
    pub fn target(&self) -> TypeId {
        self.target
    }

    pub fn target_model(&self) -> &'static str {
        self.target_model
    }

    /// Query selecting every member of this relation for `parent`.
    pub fn members(&self, parent: &E) -> QueryBuilder {
        (self.members)(parent)
    }
}

impl<E> Clone for Relation<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            target: self.target,
            target_model: self.target_model,
            members: Arc::clone(&self.members),
        }
    }
}

impl<E> std::fmt::Debug for Relation<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("target", &self.target_model)
            .finish()
    }
}
