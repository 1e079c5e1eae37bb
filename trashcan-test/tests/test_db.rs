use trashcan_data::{QueryBuilder, Store};
use trashcan_test::{init_tracing, TestDb};

#[tokio::test]
async fn schema_and_inserts_share_one_database() {
    init_tracing();
    let db = TestDb::with_schema(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, deleted_at DATETIME);
         CREATE TABLE notes (id INTEGER PRIMARY KEY, user_id INTEGER, deleted_at DATETIME);",
    )
    .await
    .unwrap();

    let first = db.insert("INSERT INTO users DEFAULT VALUES").await.unwrap();
    let second = db.insert("INSERT INTO users DEFAULT VALUES").await.unwrap();
    assert_eq!((first, second), (1, 2));

    let count = db.store().count(&QueryBuilder::new("users")).await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(db.store().count(&QueryBuilder::new("notes")).await.unwrap(), 0);
}

#[tokio::test]
async fn bad_schema_is_reported() {
    let result = TestDb::with_schema("CREATE TABLE (").await;
    assert!(result.is_err());
}
