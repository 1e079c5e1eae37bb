use chrono::{DateTime, Utc};
use std::sync::Arc;
use trashcan::prelude::*;
use trashcan_test::TestDb;

#[derive(Debug, Clone, sqlx::FromRow)]
struct User {
    id: i64,
    deleted_at: Option<DateTime<Utc>>,
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
        &["id", "deleted_at"]
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
        vec![Relation::has_many::<Note>("notes", "user_id")]
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct Note {
    id: i64,
    deleted_at: Option<DateTime<Utc>>,
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
        &["id", "user_id", "deleted_at"]
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
}

#[tokio::test]
async fn user_and_notes_through_the_facade() {
    trashcan_test::init_tracing();
    let db = TestDb::with_schema(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, deleted_at DATETIME);
         CREATE TABLE notes (id INTEGER PRIMARY KEY, user_id INTEGER, deleted_at DATETIME);",
    )
    .await
    .unwrap();
    let user_id = db.insert("INSERT INTO users DEFAULT VALUES").await.unwrap();
    let note_id = db
        .insert(&format!("INSERT INTO notes (user_id) VALUES ({user_id})"))
        .await
        .unwrap();

    let registry = Registry::new();
    registry.register(ModelConfig::<Note>::default()).unwrap();
    registry
        .register(ModelConfig::<User>::new(TrashOptions::new().cascade(["notes"])))
        .unwrap();
    let engine: SqliteTrashEngine = TrashEngine::new(db.store(), Arc::new(registry));

    let mut user = engine.store().find_by_id::<User>(&user_id).await.unwrap().unwrap();
    let mut note = engine.store().find_by_id::<Note>(&note_id).await.unwrap().unwrap();
    assert_eq!(engine.count(&engine.all::<User>().unwrap()).await.unwrap(), 1);

    engine.trash(&mut user).await.unwrap();
    engine.reload(&mut note).await.unwrap();
    assert!(user.deleted_at.is_some());
    assert!(note.deleted_at.is_some());
    assert_eq!(engine.count(&engine.all::<User>().unwrap()).await.unwrap(), 0);
    assert_eq!(engine.count(&engine.with_deleted::<User>().unwrap()).await.unwrap(), 1);

    engine.recover(&mut user).await.unwrap();
    engine.reload(&mut note).await.unwrap();
    assert!(user.deleted_at.is_none());
    assert!(note.deleted_at.is_none());
    assert_eq!(engine.count(&engine.all::<User>().unwrap()).await.unwrap(), 1);
    assert_eq!(engine.count(&engine.with_deleted::<User>().unwrap()).await.unwrap(), 1);
}
