//! SQLite storage integration tests.
//!
//! Run with: cargo test --test storage_sqlite --features sqlite
//!
//! Uses in-memory database by default, no external dependencies required.

mod storage;

use std::sync::Arc;

use positional::storage::{ColumnKind, SqliteSequenceStore};
use positional::{PositionOrder, RecordKey, Scope, SequenceStore};
use sqlx::sqlite::SqlitePoolOptions;

/// Get SQLite connection string (in-memory for tests)
fn sqlite_uri() -> String {
    std::env::var("SQLITE_URI").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

async fn connect_and_create() -> SqliteSequenceStore {
    // One connection: every in-memory connection is a separate database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&sqlite_uri())
        .await
        .expect("Failed to connect to SQLite");

    let store = SqliteSequenceStore::new(pool);
    store
        .ensure_table(
            &storage::sequence_store_tests::spec(),
            ColumnKind::Integer,
            &[("list_id", ColumnKind::Integer)],
        )
        .await
        .expect("Failed to create table");
    store
}

#[tokio::test]
async fn test_sqlite_sequence_store() {
    println!("=== SQLite SequenceStore Tests ===");
    println!("Connecting to: {}", sqlite_uri());

    let store = connect_and_create().await;

    run_sequence_store_tests!(&store);

    println!("=== All SQLite SequenceStore tests PASSED ===");
}

#[tokio::test]
async fn test_sqlite_ensure_table_is_idempotent() {
    let store = connect_and_create().await;

    store
        .ensure_table(
            &storage::sequence_store_tests::spec(),
            ColumnKind::Integer,
            &[("list_id", ColumnKind::Integer)],
        )
        .await
        .expect("second ensure_table should succeed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sqlite_atomic_writes_run_on_spawned_tasks() {
    let store: Arc<dyn SequenceStore> = Arc::new(connect_and_create().await);
    let spec = storage::sequence_store_tests::spec();
    let scope = Scope::new().with("list_id", 900);
    for id in 901..=904 {
        store
            .insert(&spec, &scope, &RecordKey::from(id), None)
            .await
            .unwrap();
    }

    let task = {
        let (store, spec, scope) = (store.clone(), spec.clone(), scope.clone());
        tokio::spawn(async move {
            let (a, b) = (RecordKey::from(901), RecordKey::from(904));
            store.commit_move(&spec, &scope, &a, 0, 2).await?;
            store.commit_swap(&spec, &scope, (&a, 2), (&b, 3)).await?;
            store
                .remove(&spec, &scope, &RecordKey::from(902), 0)
                .await?;
            store
                .renumber(&spec, &scope, &[b, RecordKey::from(903), a])
                .await
        })
    };
    task.await.unwrap().unwrap();

    let entries = store
        .entries(&spec, &scope, Some(PositionOrder::Ascending))
        .await
        .unwrap();
    let keys: Vec<RecordKey> = entries.into_iter().map(|entry| entry.key).collect();
    assert_eq!(
        keys,
        vec![
            RecordKey::from(904),
            RecordKey::from(903),
            RecordKey::from(901)
        ]
    );
}
