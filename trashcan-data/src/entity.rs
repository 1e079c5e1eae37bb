/// Trait representing a persisted record with a table name, id column, and column list.
///
/// Intended to be implemented manually next to a `sqlx::FromRow` derive.
///
/// # Example
///
/// ```ignore
/// impl Entity for Note {
///     type Id = i64;
///     fn table_name() -> &'static str { "notes" }
///     fn id_column() -> &'static str { "id" }
///     fn columns() -> &'static [&'static str] { &["id", "user_id", "body", "deleted_at"] }
///     fn id(&self) -> &i64 { &self.id }
/// }
/// ```
pub trait Entity: Send + Sync + Unpin + 'static {
    type Id: Send + Sync + ToString + 'static;

    fn table_name() -> &'static str;
    fn id_column() -> &'static str;
    fn columns() -> &'static [&'static str];
    fn id(&self) -> &Self::Id;

    /// Short model name used in logs and error messages.
    fn model_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Whether `column` is one of this entity's declared columns.
    fn has_column(column: &str) -> bool {
        Self::columns().iter().any(|c| *c == column)
    }
}
