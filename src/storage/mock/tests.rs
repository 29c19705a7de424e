use crate::config::SequenceSpec;
use crate::interfaces::{
    Entry, PositionRange, RecordKey, Scope, SequenceStore, Shift, ShiftDirection, StorageError,
};
use crate::position::PositionOrder;

use super::*;

fn spec() -> SequenceSpec {
    SequenceSpec::for_table("items")
}

fn row(key: &str, position: i64) -> (RecordKey, i64) {
    (RecordKey::from(key), position)
}

async fn positions(store: &MockSequenceStore, scope: &Scope) -> Vec<(RecordKey, i64)> {
    store
        .entries(&spec(), scope, Some(PositionOrder::Ascending))
        .await
        .unwrap()
        .into_iter()
        .map(|Entry { key, position }| (key, position))
        .collect()
}

#[tokio::test]
async fn test_insert_appends_when_position_missing() {
    let store = MockSequenceStore::new();
    let scope = Scope::all();

    assert_eq!(
        store
            .insert(&spec(), &scope, &"a".into(), None)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        store
            .insert(&spec(), &scope, &"b".into(), None)
            .await
            .unwrap(),
        1
    );
    assert_eq!(store.max_position(&spec(), &scope).await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_insert_duplicate_key_fails() {
    let store = MockSequenceStore::new();
    let scope = Scope::all();

    store
        .insert(&spec(), &scope, &"a".into(), None)
        .await
        .unwrap();
    let result = store.insert(&spec(), &scope, &"a".into(), None).await;

    assert!(matches!(result, Err(StorageError::DuplicateKey { .. })));
    assert_eq!(store.row_count("items").await, 1);
}

#[tokio::test]
async fn test_shift_respects_scope() {
    let store = MockSequenceStore::new();
    let left = Scope::new().with("list_id", 1);
    let right = Scope::new().with("list_id", 2);

    store.seed("items", left.clone(), "a", 0).await;
    store.seed("items", right.clone(), "b", 0).await;

    let shift = Shift::new(PositionRange::After(-1), ShiftDirection::Increment);
    let touched = store.shift(&spec(), &left, &shift).await.unwrap();

    assert_eq!(touched, 1);
    assert_eq!(positions(&store, &left).await, vec![row("a", 1)]);
    assert_eq!(positions(&store, &right).await, vec![row("b", 0)]);
}

#[tokio::test]
async fn test_injected_write_failure_discards_unit() {
    let store = MockSequenceStore::new();
    let scope = Scope::all();
    store.seed("items", scope.clone(), "a", 0).await;
    store.seed("items", scope.clone(), "b", 1).await;

    store.set_fail_on_write(Some(2)).await;
    let result = store
        .commit_swap(&spec(), &scope, (&"a".into(), 0), (&"b".into(), 1))
        .await;
    store.set_fail_on_write(None).await;

    assert!(matches!(result, Err(StorageError::Injected(_))));
    assert_eq!(
        positions(&store, &scope).await,
        vec![row("a", 0), row("b", 1)]
    );
}

#[tokio::test]
async fn test_injected_read_failure() {
    let store = MockSequenceStore::new();
    store.set_fail_on_read(true).await;

    let result = store.count(&spec(), &Scope::all()).await;
    assert!(matches!(result, Err(StorageError::Injected(_))));
}

#[tokio::test]
async fn test_entries_without_order_keep_insertion_order() {
    let store = MockSequenceStore::new();
    let scope = Scope::all();
    store.seed("items", scope.clone(), "a", 2).await;
    store.seed("items", scope.clone(), "b", 0).await;

    let entries = store.entries(&spec(), &scope, None).await.unwrap();
    assert_eq!(entries, vec![Entry::new("a", 2), Entry::new("b", 0)]);

    let entries = store
        .entries(&spec(), &scope, Some(PositionOrder::Descending))
        .await
        .unwrap();
    assert_eq!(entries, vec![Entry::new("a", 2), Entry::new("b", 0)]);
}
