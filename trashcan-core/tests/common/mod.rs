#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::sync::Arc;
use trashcan_core::{ModelConfig, Registry, Relation, TrashEngine, TrashOptions, Trashable};
use trashcan_data::{Entity, QueryBuilder, Store};
use trashcan_data_sqlx::SqlxStore;
use trashcan_test::TestDb;

pub const SCHEMA: &str = "
CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    deleted_at DATETIME,
    trashed_at DATETIME
);
CREATE TABLE notes (
    id INTEGER PRIMARY KEY,
    user_id INTEGER,
    body TEXT,
    deleted_at DATETIME
);
";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entity for User {
    type Id = i64;

    fn table_name() -> &'static str {
        "users"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "name", "deleted_at", "trashed_at"]
    }

    fn id(&self) -> &i64 {
        &self.id
    }
}

impl Trashable for User {
    fn marker(&self, _column: &str) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_marker(&mut self, _column: &str, value: Option<DateTime<Utc>>) {
        self.deleted_at = value;
    }

    fn relations() -> Vec<Relation<Self>> {
        vec![
            Relation::has_many::<Note>("notes", "user_id"),
            Relation::new::<Note>("orphans", |_: &User| QueryBuilder::for_entity::<Note>().where_null("user_id")),
        ]
    }
}

/// The `users` table seen through the `trashed_at` column.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Archive {
    pub id: i64,
    pub name: String,
    pub trashed_at: Option<DateTime<Utc>>,
}

impl Entity for Archive {
    type Id = i64;

    fn table_name() -> &'static str {
        "users"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "name", "deleted_at", "trashed_at"]
    }

    fn id(&self) -> &i64 {
        &self.id
    }
}

impl Trashable for Archive {
    fn marker(&self, _column: &str) -> Option<DateTime<Utc>> {
        self.trashed_at
    }

    fn set_marker(&mut self, _column: &str, value: Option<DateTime<Utc>>) {
        self.trashed_at = value;
    }

    fn relations() -> Vec<Relation<Self>> {
        vec![Relation::has_many::<Note>("notes", "user_id")]
    }
}

#[derive(Debug, Clone, sqlx::FromRow, garde::Validate)]
pub struct Note {
    #[garde(skip)]
    pub id: i64,
    #[garde(skip)]
    pub user_id: Option<i64>,
    #[garde(required, length(min = 1))]
    pub body: Option<String>,
    #[garde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entity for Note {
    type Id = i64;

    fn table_name() -> &'static str {
        "notes"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "user_id", "body", "deleted_at"]
    }

    fn id(&self) -> &i64 {
        &self.id
    }
}

impl Trashable for Note {
    fn marker(&self, _column: &str) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_marker(&mut self, _column: &str, value: Option<DateTime<Utc>>) {
        self.deleted_at = value;
    }

    fn relations() -> Vec<Relation<Self>> {
        vec![Relation::new::<Archive>("author", |note: &Note| {
            let author = note.user_id.unwrap_or_default().to_string();
            QueryBuilder::for_entity::<Archive>().where_eq("id", &author)
        })]
    }
}

/// A relation pointing at a table that does not exist.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Broken {
    pub id: i64,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entity for Broken {
    type Id = i64;

    fn table_name() -> &'static str {
        "users"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "deleted_at"]
    }

    fn id(&self) -> &i64 {
        &self.id
    }
}

impl Trashable for Broken {
    fn marker(&self, _column: &str) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_marker(&mut self, _column: &str, value: Option<DateTime<Utc>>) {
        self.deleted_at = value;
    }

    fn relations() -> Vec<Relation<Self>> {
        vec![
            Relation::has_many::<Note>("notes", "user_id"),
            Relation::new::<Note>("missing", |parent: &Broken| {
                QueryBuilder::new("no_such_table").where_eq("user_id", &parent.id.to_string())
            }),
        ]
    }
}

pub struct Fixture {
    pub db: TestDb,
    pub engine: TrashEngine<SqlxStore>,
}

impl Fixture {
    /// Fresh database with `Note` registered on its own and `User` cascading to `notes`.
    pub async fn new() -> Self {
        let registry = Registry::new();
        registry.register(ModelConfig::<Note>::default()).unwrap();
        registry
            .register(ModelConfig::<User>::new(TrashOptions::new().cascade(["notes"])))
            .unwrap();
        Self::with_registry(registry).await
    }

    pub async fn with_registry(registry: Registry) -> Self {
        trashcan_test::init_tracing();
        let db = TestDb::with_schema(SCHEMA).await.unwrap();
        let engine = TrashEngine::new(db.store(), Arc::new(registry));
        Self { db, engine }
    }

    pub async fn user(&self, name: &str) -> User {
        let id = self
            .db
            .insert(&format!("INSERT INTO users (name) VALUES ('{name}')"))
            .await
            .unwrap();
        self.db.store().find_by_id::<User>(&id).await.unwrap().unwrap()
    }

    pub async fn note(&self, user_id: i64, body: Option<&str>) -> Note {
        let body = body.map_or("NULL".to_string(), |b| format!("'{b}'"));
        let id = self
            .db
            .insert(&format!("INSERT INTO notes (user_id, body) VALUES ({user_id}, {body})"))
            .await
            .unwrap();
        self.db.store().find_by_id::<Note>(&id).await.unwrap().unwrap()
    }

    pub async fn note_marker(&self, id: i64) -> Option<DateTime<Utc>> {
        self.db.store().find_by_id::<Note>(&id).await.unwrap().unwrap().deleted_at
    }

    pub async fn user_marker(&self, id: i64) -> Option<DateTime<Utc>> {
        self.db.store().find_by_id::<User>(&id).await.unwrap().unwrap().deleted_at
    }

    pub async fn archive_marker(&self, id: i64) -> Option<DateTime<Utc>> {
        self.db.store().find_by_id::<Archive>(&id).await.unwrap().unwrap().trashed_at
    }
}
