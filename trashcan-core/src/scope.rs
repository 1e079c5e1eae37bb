use std::marker::PhantomData;
use trashcan_data::{Entity, Pageable, QueryBuilder};

/// Which rows a [`Scope`] sees with respect to the marker column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// `marker IS NULL` (the default).
    Active,
    /// No marker predicate.
    All,
    /// `marker IS NOT NULL`.
    TrashedOnly,
}

/// A query over a trashable model with default visibility.
///
/// The marker predicate is not kept among the filters. It is derived from
/// [`Visibility`] each time the scope is rendered, so a scope switched to
/// [`Scope::with_deleted`] stays unfiltered however it is composed afterwards,
/// and the order of `with_deleted` and `limit` calls does not matter.
///
/// ```ignore
/// let recent = engine.all::<User>()?.order_by("id", false).limit(10).with_deleted();
/// let count = engine.count(&recent).await?;
/// ```
pub struct Scope<E> {
    query: QueryBuilder,
    marker_column: String,
    visibility: Visibility,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Scope<E> {
    /// Default scope of `E`: only rows whose `marker_column` is `NULL`.
    pub fn new(marker_column: impl Into<String>) -> Self {
        Self {
            query: QueryBuilder::for_entity::<E>(),
            marker_column: marker_column.into(),
            visibility: Visibility::Active,
            _entity: PhantomData,
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn marker_column(&self) -> &str {
        &self.marker_column
    }

    /// Drop the marker predicate: trashed and active rows alike.
    pub fn with_deleted(mut self) -> Self {
        self.visibility = Visibility::All;
        self
    }

    /// Only trashed rows.
    pub fn deleted_only(mut self) -> Self {
        self.visibility = Visibility::TrashedOnly;
        self
    }

    /// Back to the default visibility.
    pub fn active(mut self) -> Self {
        self.visibility = Visibility::Active;
        self
    }

    /// Apply arbitrary builder calls to the user filters.
    pub fn filter(mut self, f: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        self.query = f(self.query);
        self
    }

    pub fn where_eq(self, column: &str, value: &str) -> Self {
        self.filter(|q| q.where_eq(column, value))
    }

    pub fn where_not_eq(self, column: &str, value: &str) -> Self {
        self.filter(|q| q.where_not_eq(column, value))
    }

    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.filter(|q| q.where_like(column, pattern))
    }

    pub fn where_gt(self, column: &str, value: &str) -> Self {
        self.filter(|q| q.where_gt(column, value))
    }

    pub fn where_lt(self, column: &str, value: &str) -> Self {
        self.filter(|q| q.where_lt(column, value))
    }

    pub fn where_in(self, column: &str, values: &[&str]) -> Self {
        self.filter(|q| q.where_in(column, values))
    }

    pub fn order_by(self, column: &str, ascending: bool) -> Self {
        self.filter(|q| q.order_by(column, ascending))
    }

    pub fn limit(self, limit: u64) -> Self {
        self.filter(|q| q.limit(limit))
    }

    pub fn offset(self, offset: u64) -> Self {
        self.filter(|q| q.offset(offset))
    }

    pub fn page(self, pageable: &Pageable) -> Self {
        self.filter(|q| q.page(pageable))
    }

    /// Render the scope, marker predicate included.
    pub fn to_query(&self) -> QueryBuilder {
        let query = self.query.clone();
        match self.visibility {
            Visibility::Active => query.where_null(&self.marker_column),
            Visibility::All => query,
            Visibility::TrashedOnly => query.where_not_null(&self.marker_column),
        }
    }
}

impl<E> Clone for Scope<E> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            marker_column: self.marker_column.clone(),
            visibility: self.visibility,
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for Scope<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("query", &self.query)
            .field("marker_column", &self.marker_column)
            .field("visibility", &self.visibility)
            .finish()
    }
}
