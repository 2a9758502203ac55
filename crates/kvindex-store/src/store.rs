use std::borrow::Cow;

use crate::error::StoreError;

/// An ordered, transactional key-value store organised into named buckets.
///
/// This is the external collaborator the indexing engine is built on: it
/// only needs transactions, named buckets, and a forward-seekable cursor
/// over a bucket's keys in lexicographic order. `kvindex-engine` never
/// assumes anything about durability, replication, or on-disk format
/// beyond that ordering guarantee.
pub trait Store {
    type Txn<'a>: Transaction
    where
        Self: 'a;

    fn begin(&self, read_only: bool) -> Result<Self::Txn<'_>, StoreError>;
}

/// A single transaction against a [`Store`].
///
/// `Cf` is the resolved bucket handle type: cheap to clone, opaque to the
/// caller. Every data method takes one, obtained via [`Transaction::bucket`].
pub trait Transaction {
    type Cf: Clone;

    /// Resolve (but do not create) a bucket by name.
    fn bucket(&self, name: &str) -> Result<Self::Cf, StoreError>;

    /// Create a bucket if it doesn't already exist.
    fn create_bucket(&mut self, name: &str) -> Result<(), StoreError>;

    /// Drop a bucket and all of its entries.
    fn drop_bucket(&mut self, name: &str) -> Result<(), StoreError>;

    fn get<'c>(&self, bucket: &'c Self::Cf, key: &[u8]) -> Result<Option<Cow<'c, [u8]>>, StoreError>;

    fn put(&self, bucket: &Self::Cf, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    fn put_batch(&self, bucket: &Self::Cf, entries: &[(&[u8], &[u8])]) -> Result<(), StoreError>;

    fn delete(&self, bucket: &Self::Cf, key: &[u8]) -> Result<(), StoreError>;

    /// All entries whose key begins with `prefix`, in ascending key order.
    fn scan_prefix<'c>(
        &'c self,
        bucket: &'c Self::Cf,
        prefix: &[u8],
    ) -> Result<Box<dyn Iterator<Item = Result<(Cow<'c, [u8]>, Cow<'c, [u8]>), StoreError>> + 'c>, StoreError>;

    /// All entries with key `>= start`, in ascending key order, unbounded above.
    ///
    /// This is the forward-seekable cursor primitive the compound-index
    /// search algorithm drives directly: it seeks to an arbitrary composite
    /// key and walks forward, applying its own prefix/condition bounds.
    fn scan_from<'c>(
        &'c self,
        bucket: &'c Self::Cf,
        start: &[u8],
    ) -> Result<Box<dyn Iterator<Item = Result<(Cow<'c, [u8]>, Cow<'c, [u8]>), StoreError>> + 'c>, StoreError>;

    fn commit(self) -> Result<(), StoreError>;
    fn rollback(self) -> Result<(), StoreError>;
}

/// Smallest key strictly greater than every key with the given prefix.
///
/// `None` if `prefix` is all `0xFF` bytes (or empty), meaning there is no
/// such bound and the caller should treat the range as unbounded above.
pub fn increment_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut out = prefix.to_vec();
    while let Some(&last) = out.last() {
        if last == 0xFF {
            out.pop();
        } else {
            *out.last_mut().unwrap() += 1;
            return Some(out);
        }
    }
    None
}
