use crate::entity::Entity;
use crate::page::Pageable;
use chrono::{DateTime, Utc};

/// A column value written by an UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<Option<DateTime<Utc>>> for Value {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        match value {
            Some(ts) => Value::Timestamp(ts),
            None => Value::Null,
        }
    }
}

/// `column = value` in the SET clause of an UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Value,
}

impl Assignment {
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// A fluent query builder for SELECT, COUNT and bulk UPDATE statements.
///
/// Values are bound with `?` placeholders, in clause order.
///
/// # Example
///
/// ```ignore
/// let q = QueryBuilder::new("notes")
///     .where_eq("user_id", "7")
///     .where_null("deleted_at")
///     .order_by("id", true)
///     .limit(10);
/// let (sql, params) = q.build_select("*");
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    key_column: String,
    conditions: Vec<Condition>,
    order: Vec<(String, bool)>,
    limit_val: Option<u64>,
    offset_val: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(String, String),
    NotEq(String, String),
    Like(String, String),
    Gt(String, String),
    Lt(String, String),
    In(String, Vec<String>),
    IsNull(String),
    IsNotNull(String),
}

impl QueryBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            key_column: "id".to_string(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit_val: None,
            offset_val: None,
        }
    }

    /// Create a builder targeting `E`'s table and primary key column.
    pub fn for_entity<E: Entity>() -> Self {
        Self::new(E::table_name()).key_column(E::id_column())
    }

    /// Primary key column, used when a paged UPDATE has to select its rows first.
    pub fn key_column(mut self, column: &str) -> Self {
        self.key_column = column.to_string();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn where_eq(mut self, column: &str, value: &str) -> Self {
        self.conditions
            .push(Condition::Eq(column.to_string(), value.to_string()));
        self
    }

    pub fn where_not_eq(mut self, column: &str, value: &str) -> Self {
        self.conditions
            .push(Condition::NotEq(column.to_string(), value.to_string()));
        self
    }

    pub fn where_like(mut self, column: &str, pattern: &str) -> Self {
        self.conditions
            .push(Condition::Like(column.to_string(), pattern.to_string()));
        self
    }

    pub fn where_gt(mut self, column: &str, value: &str) -> Self {
        self.conditions
            .push(Condition::Gt(column.to_string(), value.to_string()));
        self
    }

    pub fn where_lt(mut self, column: &str, value: &str) -> Self {
        self.conditions
            .push(Condition::Lt(column.to_string(), value.to_string()));
        self
    }

    pub fn where_in(mut self, column: &str, values: &[&str]) -> Self {
        self.conditions.push(Condition::In(
            column.to_string(),
            values.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    pub fn where_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::IsNull(column.to_string()));
        self
    }

    pub fn where_not_null(mut self, column: &str) -> Self {
        self.conditions
            .push(Condition::IsNotNull(column.to_string()));
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_val = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_val = Some(offset);
        self
    }

    /// Apply `LIMIT`/`OFFSET` and the optional sort from a [`Pageable`].
    ///
    /// A sort column that is not a plain identifier is ignored.
    pub fn page(mut self, pageable: &Pageable) -> Self {
        if let Some((column, ascending)) = pageable.sort_order() {
            if is_valid_identifier(column) {
                self = self.order_by(column, ascending);
            }
        }
        self.limit(pageable.size).offset(pageable.offset())
    }

    /// Drop ordering and paging, keeping only the filters. Used for totals.
    pub fn without_paging(mut self) -> Self {
        self.order.clear();
        self.limit_val = None;
        self.offset_val = None;
        self
    }

    /// Build a SELECT query returning `(sql, bind_values)`.
    ///
    /// The `columns` parameter determines which columns to select (e.g., `"*"` or `"id, name"`).
    pub fn build_select(&self, columns: &str) -> (String, Vec<String>) {
        let mut sql = format!("SELECT {columns} FROM {}", self.table);
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params);
        self.append_order(&mut sql);
        self.append_limit_offset(&mut sql);
        (sql, params)
    }

    /// Build a COUNT query returning `(sql, bind_values)`.
    ///
    /// A paged builder counts the rows of its page.
    pub fn build_count(&self) -> (String, Vec<String>) {
        if self.is_paged() {
            let (inner, params) = self.build_select(&self.key_column);
            return (format!("SELECT COUNT(*) FROM ({inner})"), params);
        }
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params);
        (sql, params)
    }

    /// Build an UPDATE setting `assignments` on every row the builder matches.
    ///
    /// `NULL` is written literally; other values are bound ahead of the WHERE
    /// parameters. When the builder carries `LIMIT`/`OFFSET` the matching
    /// rows are selected by key in a subquery.
    pub fn build_update(&self, assignments: &[Assignment]) -> Result<(String, Vec<Value>), QueryError> {
        if assignments.is_empty() {
            return Err(QueryError::EmptyUpdate {
                table: self.table.clone(),
            });
        }
        let mut values = Vec::new();
        let mut sets = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            if !is_valid_identifier(&assignment.column) {
                return Err(QueryError::InvalidIdentifier {
                    kind: "column",
                    ident: assignment.column.clone(),
                });
            }
            match &assignment.value {
                Value::Null => sets.push(format!("{} = NULL", assignment.column)),
                value => {
                    sets.push(format!("{} = ?", assignment.column));
                    values.push(value.clone());
                }
            }
        }

        let mut sql = format!("UPDATE {} SET {}", self.table, sets.join(", "));
        let mut params = Vec::new();
        if self.is_paged() {
            let key = &self.key_column;
            let mut inner = format!("SELECT {key} FROM {}", self.table);
            self.append_where(&mut inner, &mut params);
            self.append_order(&mut inner);
            self.append_limit_offset(&mut inner);
            sql.push_str(&format!(" WHERE {key} IN ({inner})"));
        } else {
            self.append_where(&mut sql, &mut params);
        }
        values.extend(params.into_iter().map(Value::Text));
        Ok((sql, values))
    }

    fn is_paged(&self) -> bool {
        self.limit_val.is_some() || self.offset_val.is_some()
    }

    fn append_where(&self, sql: &mut String, params: &mut Vec<String>) {
        if self.conditions.is_empty() {
            return;
        }
        sql.push_str(" WHERE ");
        let mut first = true;
        for cond in &self.conditions {
            if !first {
                sql.push_str(" AND ");
            }
            first = false;
            let clause = match cond {
                Condition::Eq(col, val) => Self::bind_clause("=", col, val, params),
                Condition::NotEq(col, val) => Self::bind_clause("!=", col, val, params),
                Condition::Like(col, pat) => Self::bind_clause("LIKE", col, pat, params),
                Condition::Gt(col, val) => Self::bind_clause(">", col, val, params),
                Condition::Lt(col, val) => Self::bind_clause("<", col, val, params),
                Condition::In(col, vals) => {
                    params.extend(vals.iter().cloned());
                    let placeholders = vec!["?"; vals.len()];
                    format!("{col} IN ({})", placeholders.join(", "))
                }
                Condition::IsNull(col) => format!("{col} IS NULL"),
                Condition::IsNotNull(col) => format!("{col} IS NOT NULL"),
            };
            sql.push_str(&clause);
        }
    }

    fn bind_clause(op: &str, col: &str, val: &str, params: &mut Vec<String>) -> String {
        params.push(val.to_string());
        format!("{col} {op} ?")
    }

    fn append_order(&self, sql: &mut String) {
        if self.order.is_empty() {
            return;
        }
        sql.push_str(" ORDER BY ");
        let clauses: Vec<_> = self
            .order
            .iter()
            .map(|(col, asc)| {
                if *asc {
                    format!("{col} ASC")
                } else {
                    format!("{col} DESC")
                }
            })
            .collect();
        sql.push_str(&clauses.join(", "));
    }

    fn append_limit_offset(&self, sql: &mut String) {
        match (self.limit_val, self.offset_val) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            // SQLite requires a LIMIT before OFFSET; -1 means unbounded.
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    InvalidIdentifier { kind: &'static str, ident: String },
    EmptyUpdate { table: String },
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
            QueryError::EmptyUpdate { table } => {
                write!(f, "UPDATE on {table} has no columns to set")
            }
        }
    }
}

impl std::error::Error for QueryError {}

/// Conservative identifier check: dot-separated segments of `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(ident: &str) -> bool {
    !ident.is_empty() && ident.split('.').all(is_valid_segment)
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_simple_select() {
        let (sql, params) = QueryBuilder::new("users").build_select("*");
        assert_eq!(sql, "SELECT * FROM users");
        assert!(params.is_empty());
    }

    #[test]
    fn test_complex_query() {
        let (sql, params) = QueryBuilder::new("users")
            .where_eq("status", "active")
            .where_like("name", "%alice%")
            .where_null("deleted_at")
            .order_by("id", true)
            .limit(10)
            .offset(20)
            .build_select("id, name");
        assert_eq!(
            sql,
            "SELECT id, name FROM users WHERE status = ? AND name LIKE ? AND deleted_at IS NULL ORDER BY id ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(params, vec!["active", "%alice%"]);
    }

    #[test]
    fn test_count_query() {
        let (sql, params) = QueryBuilder::new("users")
            .where_not_null("deleted_at")
            .build_count();
        assert_eq!(sql, "SELECT COUNT(*) FROM users WHERE deleted_at IS NOT NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_paged_count_counts_the_page() {
        let (sql, _) = QueryBuilder::new("users").limit(1).build_count();
        assert_eq!(sql, "SELECT COUNT(*) FROM (SELECT id FROM users LIMIT 1)");
    }

    #[test]
    fn test_placeholders_follow_clause_order() {
        let (sql, params) = QueryBuilder::new("users")
            .where_eq("status", "active")
            .where_in("role", &["admin", "user"])
            .build_select("*");
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE status = ? AND role IN (?, ?)"
        );
        assert_eq!(params, vec!["active", "admin", "user"]);
    }

    #[test]
    fn test_update_binds_set_values_first() {
        let (sql, values) = QueryBuilder::new("notes")
            .where_eq("user_id", "7")
            .where_null("deleted_at")
            .build_update(&[Assignment::new("deleted_at", Some(ts()))])
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE notes SET deleted_at = ? WHERE user_id = ? AND deleted_at IS NULL"
        );
        assert_eq!(values, vec![Value::Timestamp(ts()), Value::Text("7".into())]);
    }

    #[test]
    fn test_update_writes_null_literally() {
        let (sql, values) = QueryBuilder::new("notes")
            .where_eq("user_id", "7")
            .build_update(&[Assignment::new("deleted_at", Value::Null)])
            .unwrap();
        assert_eq!(sql, "UPDATE notes SET deleted_at = NULL WHERE user_id = ?");
        assert_eq!(values, vec![Value::Text("7".into())]);
    }

    #[test]
    fn test_paged_update_uses_key_subquery() {
        let (sql, _) = QueryBuilder::new("notes")
            .key_column("note_id")
            .where_null("deleted_at")
            .order_by("note_id", false)
            .limit(5)
            .build_update(&[Assignment::new("deleted_at", Some(ts()))])
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE notes SET deleted_at = ? WHERE note_id IN (SELECT note_id FROM notes WHERE deleted_at IS NULL ORDER BY note_id DESC LIMIT 5)"
        );
    }

    #[test]
    fn test_update_rejects_bad_input() {
        let err = QueryBuilder::new("notes").build_update(&[]).unwrap_err();
        assert!(matches!(err, QueryError::EmptyUpdate { .. }));

        let err = QueryBuilder::new("notes")
            .build_update(&[Assignment::new("deleted_at; drop", Value::Null)])
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_page_applies_sort_and_window() {
        let pageable = Pageable {
            page: 2,
            size: 5,
            sort: Some("name,desc".into()),
        };
        let (sql, _) = QueryBuilder::new("users").page(&pageable).build_select("*");
        assert_eq!(sql, "SELECT * FROM users ORDER BY name DESC LIMIT 5 OFFSET 10");
    }

    #[test]
    fn test_page_ignores_sort_that_is_not_an_identifier() {
        for sort in ["id LIMIT 0 --", "id; DROP TABLE notes", "name)"] {
            let pageable = Pageable {
                page: 0,
                size: 3,
                sort: Some(sort.into()),
            };
            let (sql, _) = QueryBuilder::new("users").page(&pageable).build_select("*");
            assert_eq!(sql, "SELECT * FROM users LIMIT 3 OFFSET 0", "sort {sort:?}");
        }
    }

    #[test]
    fn test_offset_without_limit() {
        let (sql, _) = QueryBuilder::new("users").offset(3).build_select("*");
        assert_eq!(sql, "SELECT * FROM users LIMIT -1 OFFSET 3");
    }

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("deleted_at"));
        assert!(is_valid_identifier("notes.deleted_at"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1col"));
        assert!(!is_valid_identifier("users;drop"));
    }
}
