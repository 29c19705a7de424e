//! SequenceStore interface tests.
//!
//! These tests verify the contract of the SequenceStore trait.
//! Each storage implementation should run these tests.
//!
//! All tests share the `items` table (`id`, `list_id`, `position`); every
//! test works in its own `list_id` with ids `list_id * 100 + n`.

use positional::interfaces::{
    Entry, PositionRange, RecordKey, Scope, SequenceStore, Shift, ShiftDirection, StorageError,
};
use positional::{PositionOrder, SequenceSpec};

pub fn spec() -> SequenceSpec {
    SequenceSpec::for_table("items")
}

fn list(id: i64) -> Scope {
    Scope::new().with("list_id", id)
}

fn key(id: i64) -> RecordKey {
    RecordKey::from(id)
}

/// Insert `count` rows `list_id * 100 + 1..` at positions `0..count`.
async fn fill<S: SequenceStore>(store: &S, list_id: i64, count: i64) {
    for n in 1..=count {
        store
            .insert(&spec(), &list(list_id), &key(list_id * 100 + n), None)
            .await
            .expect("insert should succeed");
    }
}

/// `(id, position)` pairs in ascending position order.
async fn snapshot<S: SequenceStore>(store: &S, list_id: i64) -> Vec<(i64, i64)> {
    store
        .entries(&spec(), &list(list_id), Some(PositionOrder::Ascending))
        .await
        .expect("entries should succeed")
        .into_iter()
        .map(|Entry { key, position }| match key {
            RecordKey::Int(id) => (id, position),
            RecordKey::Text(id) => panic!("unexpected text key {id}"),
        })
        .collect()
}

// =============================================================================
// Aggregate reads
// =============================================================================

pub async fn test_empty_sequence<S: SequenceStore>(store: &S) {
    let scope = list(1);

    assert_eq!(store.max_position(&spec(), &scope).await.unwrap(), None);
    assert_eq!(store.count(&spec(), &scope).await.unwrap(), 0);
    assert!(store
        .entries(&spec(), &scope, None)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        store.position_of(&spec(), &scope, &key(101)).await.unwrap(),
        None
    );
}

// =============================================================================
// SequenceStore::insert tests
// =============================================================================

pub async fn test_insert_appends<S: SequenceStore>(store: &S) {
    fill(store, 2, 3).await;

    assert_eq!(snapshot(store, 2).await, vec![(201, 0), (202, 1), (203, 2)]);
    assert_eq!(
        store.max_position(&spec(), &list(2)).await.unwrap(),
        Some(2)
    );
    assert_eq!(store.count(&spec(), &list(2)).await.unwrap(), 3);
    assert_eq!(
        store
            .position_of(&spec(), &list(2), &key(202))
            .await
            .unwrap(),
        Some(1)
    );
}

pub async fn test_insert_explicit_position<S: SequenceStore>(store: &S) {
    let position = store
        .insert(&spec(), &list(3), &key(301), Some(9))
        .await
        .unwrap();
    assert_eq!(position, 9);

    let next = store
        .insert(&spec(), &list(3), &key(302), None)
        .await
        .unwrap();
    assert_eq!(next, 10, "append continues after the highest position");
}

pub async fn test_insert_initial_position<S: SequenceStore>(store: &S) {
    let spec = spec().with_initial_position(1);
    let position = store
        .insert(&spec, &list(4), &key(401), None)
        .await
        .unwrap();
    assert_eq!(position, 1);
}

pub async fn test_insert_duplicate_key<S: SequenceStore>(store: &S) {
    fill(store, 5, 1).await;

    let result = store.insert(&spec(), &list(5), &key(501), None).await;

    assert!(
        matches!(result, Err(StorageError::DuplicateKey { .. })),
        "duplicate key should be rejected, got {result:?}"
    );
    assert_eq!(store.count(&spec(), &list(5)).await.unwrap(), 1);
}

// =============================================================================
// SequenceStore::shift tests
// =============================================================================

pub async fn test_shift_between_excludes_key<S: SequenceStore>(store: &S) {
    fill(store, 6, 5).await;

    let shift =
        Shift::new(PositionRange::Between(1, 3), ShiftDirection::Increment).excluding(key(603));
    let touched = store.shift(&spec(), &list(6), &shift).await.unwrap();

    assert_eq!(touched, 2);
    assert_eq!(
        snapshot(store, 6).await,
        vec![(601, 0), (602, 2), (603, 2), (604, 4), (605, 4)]
    );
}

pub async fn test_shift_after_decrements<S: SequenceStore>(store: &S) {
    fill(store, 7, 4).await;

    let shift = Shift::new(PositionRange::After(1), ShiftDirection::Decrement);
    let touched = store.shift(&spec(), &list(7), &shift).await.unwrap();

    assert_eq!(touched, 2);
    assert_eq!(
        snapshot(store, 7).await,
        vec![(701, 0), (702, 1), (703, 1), (704, 2)]
    );
}

// =============================================================================
// SequenceStore::commit_move tests
// =============================================================================

pub async fn test_commit_move_earlier<S: SequenceStore>(store: &S) {
    fill(store, 8, 5).await;

    store
        .commit_move(&spec(), &list(8), &key(804), 3, 1)
        .await
        .unwrap();

    assert_eq!(
        snapshot(store, 8).await,
        vec![(801, 0), (804, 1), (802, 2), (803, 3), (805, 4)]
    );
}

pub async fn test_commit_move_later<S: SequenceStore>(store: &S) {
    fill(store, 9, 5).await;

    store
        .commit_move(&spec(), &list(9), &key(902), 1, 3)
        .await
        .unwrap();

    assert_eq!(
        snapshot(store, 9).await,
        vec![(901, 0), (903, 1), (904, 2), (902, 3), (905, 4)]
    );
}

pub async fn test_commit_move_missing_record_rolls_back<S: SequenceStore>(store: &S) {
    fill(store, 10, 3).await;

    let result = store
        .commit_move(&spec(), &list(10), &key(1099), 2, 0)
        .await;

    assert!(
        matches!(result, Err(StorageError::RecordNotFound { .. })),
        "missing record should fail, got {result:?}"
    );
    assert_eq!(
        snapshot(store, 10).await,
        vec![(1001, 0), (1002, 1), (1003, 2)],
        "sibling shift must be rolled back"
    );
}

// =============================================================================
// SequenceStore::remove tests
// =============================================================================

pub async fn test_remove_closes_gap<S: SequenceStore>(store: &S) {
    fill(store, 11, 5).await;

    store
        .remove(&spec(), &list(11), &key(1102), 1)
        .await
        .unwrap();

    assert_eq!(
        snapshot(store, 11).await,
        vec![(1101, 0), (1103, 1), (1104, 2), (1105, 3)]
    );
}

pub async fn test_remove_missing_record<S: SequenceStore>(store: &S) {
    fill(store, 12, 2).await;

    let result = store.remove(&spec(), &list(12), &key(1299), 0).await;

    assert!(matches!(result, Err(StorageError::RecordNotFound { .. })));
    assert_eq!(snapshot(store, 12).await, vec![(1201, 0), (1202, 1)]);
}

// =============================================================================
// SequenceStore::commit_swap tests
// =============================================================================

pub async fn test_commit_swap<S: SequenceStore>(store: &S) {
    fill(store, 13, 4).await;

    store
        .commit_swap(&spec(), &list(13), (&key(1301), 0), (&key(1304), 3))
        .await
        .unwrap();

    assert_eq!(
        snapshot(store, 13).await,
        vec![(1304, 0), (1302, 1), (1303, 2), (1301, 3)]
    );
}

pub async fn test_commit_swap_is_atomic<S: SequenceStore>(store: &S) {
    fill(store, 14, 3).await;

    // The first write succeeds, the second finds no row.
    let result = store
        .commit_swap(&spec(), &list(14), (&key(1401), 0), (&key(1499), 2))
        .await;

    assert!(matches!(result, Err(StorageError::RecordNotFound { .. })));
    assert_eq!(
        snapshot(store, 14).await,
        vec![(1401, 0), (1402, 1), (1403, 2)],
        "first write must be rolled back"
    );
}

// =============================================================================
// SequenceStore::renumber tests
// =============================================================================

pub async fn test_renumber<S: SequenceStore>(store: &S) {
    fill(store, 15, 3).await;

    let keys = [key(1503), key(1501), key(1502)];
    store.renumber(&spec(), &list(15), &keys).await.unwrap();

    assert_eq!(
        snapshot(store, 15).await,
        vec![(1503, 0), (1501, 1), (1502, 2)]
    );
}

// =============================================================================
// Ordering and isolation tests
// =============================================================================

pub async fn test_entries_descending<S: SequenceStore>(store: &S) {
    fill(store, 16, 3).await;

    let entries = store
        .entries(&spec(), &list(16), Some(PositionOrder::Descending))
        .await
        .unwrap();

    assert_eq!(
        entries,
        vec![
            Entry::new(1603i64, 2),
            Entry::new(1602i64, 1),
            Entry::new(1601i64, 0)
        ]
    );
}

pub async fn test_scope_isolation<S: SequenceStore>(store: &S) {
    fill(store, 17, 3).await;
    fill(store, 18, 3).await;

    store
        .commit_move(&spec(), &list(17), &key(1703), 2, 0)
        .await
        .unwrap();
    store
        .remove(&spec(), &list(17), &key(1701), 1)
        .await
        .unwrap();

    assert_eq!(snapshot(store, 17).await, vec![(1703, 0), (1702, 1)]);
    assert_eq!(
        snapshot(store, 18).await,
        vec![(1801, 0), (1802, 1), (1803, 2)]
    );
}

pub async fn test_null_scope<S: SequenceStore>(store: &S) {
    let unlisted = Scope::new().with("list_id", None::<i64>);

    for id in [1901, 1902] {
        store
            .insert(&spec(), &unlisted, &key(id), None)
            .await
            .unwrap();
    }

    assert_eq!(store.count(&spec(), &unlisted).await.unwrap(), 2);
    assert_eq!(
        store.max_position(&spec(), &unlisted).await.unwrap(),
        Some(1)
    );
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all SequenceStore interface tests against a store implementation.
#[macro_export]
macro_rules! run_sequence_store_tests {
    ($store:expr) => {
        use $crate::storage::sequence_store_tests::*;

        // aggregate reads
        test_empty_sequence($store).await;
        println!("  test_empty_sequence: PASSED");

        // insert tests
        test_insert_appends($store).await;
        println!("  test_insert_appends: PASSED");

        test_insert_explicit_position($store).await;
        println!("  test_insert_explicit_position: PASSED");

        test_insert_initial_position($store).await;
        println!("  test_insert_initial_position: PASSED");

        test_insert_duplicate_key($store).await;
        println!("  test_insert_duplicate_key: PASSED");

        // shift tests
        test_shift_between_excludes_key($store).await;
        println!("  test_shift_between_excludes_key: PASSED");

        test_shift_after_decrements($store).await;
        println!("  test_shift_after_decrements: PASSED");

        // move tests
        test_commit_move_earlier($store).await;
        println!("  test_commit_move_earlier: PASSED");

        test_commit_move_later($store).await;
        println!("  test_commit_move_later: PASSED");

        test_commit_move_missing_record_rolls_back($store).await;
        println!("  test_commit_move_missing_record_rolls_back: PASSED");

        // remove tests
        test_remove_closes_gap($store).await;
        println!("  test_remove_closes_gap: PASSED");

        test_remove_missing_record($store).await;
        println!("  test_remove_missing_record: PASSED");

        // swap tests
        test_commit_swap($store).await;
        println!("  test_commit_swap: PASSED");

        test_commit_swap_is_atomic($store).await;
        println!("  test_commit_swap_is_atomic: PASSED");

        // renumber tests
        test_renumber($store).await;
        println!("  test_renumber: PASSED");

        // ordering and isolation tests
        test_entries_descending($store).await;
        println!("  test_entries_descending: PASSED");

        test_scope_isolation($store).await;
        println!("  test_scope_isolation: PASSED");

        test_null_scope($store).await;
        println!("  test_null_scope: PASSED");
    };
}
