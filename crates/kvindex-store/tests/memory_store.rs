#![cfg(feature = "memory")]

use kvindex_store::{MemoryStore, Store, Transaction};

fn mem_store() -> MemoryStore {
    let store = MemoryStore::new();
    let mut txn = store.begin(false).unwrap();
    txn.create_bucket("test").unwrap();
    txn.commit().unwrap();
    store
}

const BUCKET: &str = "test";

#[test]
fn put_and_get() {
    let store = mem_store();
    let txn = store.begin(false).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    txn.put(&b, b"key1", b"value1").unwrap();
    txn.commit().unwrap();

    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    let result = txn.get(&b, b"key1").unwrap().unwrap();
    assert_eq!(&*result, b"value1");
}

#[test]
fn get_missing_key_returns_none() {
    let store = mem_store();
    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    let result = txn.get(&b, b"nonexistent").unwrap();
    assert!(result.is_none());
}

#[test]
fn put_and_delete() {
    let store = mem_store();
    let txn = store.begin(false).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    txn.put(&b, b"key1", b"value1").unwrap();
    txn.commit().unwrap();

    let txn = store.begin(false).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    txn.delete(&b, b"key1").unwrap();
    txn.commit().unwrap();

    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    let result = txn.get(&b, b"key1").unwrap();
    assert!(result.is_none());
}

#[test]
fn put_batch() {
    let store = mem_store();
    let txn = store.begin(false).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    txn.put_batch(
        &b,
        &[
            (b"accounts:1:email" as &[u8], b"a@test.com" as &[u8]),
            (b"accounts:1:name", b"Alice"),
            (b"accounts:1:status", b"active"),
        ],
    )
    .unwrap();
    txn.commit().unwrap();

    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    assert_eq!(&*txn.get(&b, b"accounts:1:email").unwrap().unwrap(), b"a@test.com");
    assert_eq!(&*txn.get(&b, b"accounts:1:name").unwrap().unwrap(), b"Alice");
    assert_eq!(&*txn.get(&b, b"accounts:1:status").unwrap().unwrap(), b"active");
}

#[test]
fn scan_prefix_returns_matching_pairs() {
    let store = mem_store();
    let txn = store.begin(false).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    txn.put(&b, b"accounts:1:email", b"a@test.com").unwrap();
    txn.put(&b, b"accounts:1:name", b"Alice").unwrap();
    txn.put(&b, b"accounts:2:email", b"b@test.com").unwrap();
    txn.put(&b, b"other:1:foo", b"bar").unwrap();
    txn.commit().unwrap();

    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    let entries: Vec<_> = txn
        .scan_prefix(&b, b"accounts:1:")
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(&*entries[0].0, b"accounts:1:email");
    assert_eq!(&*entries[0].1, b"a@test.com");
    assert_eq!(&*entries[1].0, b"accounts:1:name");
    assert_eq!(&*entries[1].1, b"Alice");
}

#[test]
fn scan_prefix_no_matches() {
    let store = mem_store();
    let txn = store.begin(false).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    txn.put(&b, b"accounts:1:email", b"a@test.com").unwrap();
    txn.commit().unwrap();

    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    let entries: Vec<_> = txn.scan_prefix(&b, b"contacts:").unwrap().map(|r| r.unwrap()).collect();
    assert!(entries.is_empty());
}

#[test]
fn scan_from_is_unbounded_above() {
    let store = mem_store();
    let txn = store.begin(false).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    txn.put(&b, b"a", b"1").unwrap();
    txn.put(&b, b"b", b"2").unwrap();
    txn.put(&b, b"c", b"3").unwrap();
    txn.commit().unwrap();

    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    let entries: Vec<_> = txn.scan_from(&b, b"b").unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(&*entries[0].0, b"b");
    assert_eq!(&*entries[1].0, b"c");
}

#[test]
fn read_only_rejects_put() {
    let store = mem_store();
    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    let result = txn.put(&b, b"key1", b"value1");
    assert!(result.is_err());
}

#[test]
fn read_only_rejects_put_batch() {
    let store = mem_store();
    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    let result = txn.put_batch(&b, &[(b"key1" as &[u8], b"value1" as &[u8])]);
    assert!(result.is_err());
}

#[test]
fn read_only_rejects_delete() {
    let store = mem_store();
    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    let result = txn.delete(&b, b"key1");
    assert!(result.is_err());
}

#[test]
fn read_only_rejects_create_bucket() {
    let store = mem_store();
    let mut txn = store.begin(true).unwrap();
    assert!(txn.create_bucket("other").is_err());
}

#[test]
fn overwrite_key() {
    let store = mem_store();
    let txn = store.begin(false).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    txn.put(&b, b"key1", b"old").unwrap();
    txn.commit().unwrap();

    let txn = store.begin(false).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    txn.put(&b, b"key1", b"new").unwrap();
    txn.commit().unwrap();

    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    let result = txn.get(&b, b"key1").unwrap().unwrap();
    assert_eq!(&*result, b"new");
}

#[test]
fn rollback_discards_writes() {
    let store = mem_store();
    let txn = store.begin(false).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    txn.put(&b, b"key1", b"value1").unwrap();
    txn.rollback().unwrap();

    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    let result = txn.get(&b, b"key1").unwrap();
    assert!(result.is_none());
}

#[test]
fn rollback_does_not_affect_committed_data() {
    let store = mem_store();
    let txn = store.begin(false).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    txn.put(&b, b"key1", b"value1").unwrap();
    txn.commit().unwrap();

    let txn = store.begin(false).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    txn.put(&b, b"key2", b"value2").unwrap();
    txn.delete(&b, b"key1").unwrap();
    txn.rollback().unwrap();

    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    assert!(txn.get(&b, b"key1").unwrap().is_some());
    assert!(txn.get(&b, b"key2").unwrap().is_none());
}

#[test]
fn empty_value() {
    let store = mem_store();
    let txn = store.begin(false).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    txn.put(&b, b"index:key", b"").unwrap();
    txn.commit().unwrap();

    let txn = store.begin(true).unwrap();
    let b = txn.bucket(BUCKET).unwrap();
    let result = txn.get(&b, b"index:key").unwrap().unwrap();
    assert_eq!(&*result, b"");
}

#[test]
fn bucket_isolation() {
    let store = MemoryStore::new();
    let mut txn = store.begin(false).unwrap();
    txn.create_bucket("bucket_a").unwrap();
    txn.create_bucket("bucket_b").unwrap();
    let a = txn.bucket("bucket_a").unwrap();
    let bk = txn.bucket("bucket_b").unwrap();
    txn.put(&a, b"key1", b"value_a").unwrap();
    txn.put(&bk, b"key1", b"value_b").unwrap();
    txn.commit().unwrap();

    let txn = store.begin(true).unwrap();
    let a = txn.bucket("bucket_a").unwrap();
    let bk = txn.bucket("bucket_b").unwrap();
    assert_eq!(&*txn.get(&a, b"key1").unwrap().unwrap(), b"value_a");
    assert_eq!(&*txn.get(&bk, b"key1").unwrap().unwrap(), b"value_b");
}

#[test]
fn bucket_on_missing_name_returns_error() {
    let store = MemoryStore::new();
    let txn = store.begin(true).unwrap();
    assert!(txn.bucket("nonexistent").is_err());
}

#[test]
fn drop_bucket_removes_data() {
    let store = MemoryStore::new();
    let mut txn = store.begin(false).unwrap();
    txn.create_bucket("temp").unwrap();
    let b = txn.bucket("temp").unwrap();
    txn.put(&b, b"key1", b"value1").unwrap();
    txn.commit().unwrap();

    let mut txn = store.begin(false).unwrap();
    txn.drop_bucket("temp").unwrap();
    txn.commit().unwrap();

    let txn = store.begin(true).unwrap();
    assert!(txn.bucket("temp").is_err());
}
