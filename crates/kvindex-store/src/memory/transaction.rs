use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, MutexGuard};

use crate::error::StoreError;
use crate::store::Transaction;

use super::store::{Bucket, MemoryStore};

/// Pre-resolved bucket handle for the memory backend.
#[derive(Clone)]
pub struct MemoryBucket {
    pub(crate) name: String,
    pub(crate) data: Arc<Bucket>,
}

/// Buckets pulled into this transaction's view, loaded lazily on first use.
struct Snapshot {
    data: HashMap<String, Arc<Bucket>>,
}

impl Snapshot {
    fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    fn ensure(&mut self, store: &MemoryStore, name: &str) -> Result<(), StoreError> {
        if !self.data.contains_key(name) {
            match store.snapshot_bucket(name) {
                Some(data) => {
                    self.data.insert(name.to_string(), data);
                }
                None => return Err(StoreError::BucketNotFound(name.to_string())),
            }
        }
        Ok(())
    }

    fn get_bucket(&self, name: &str) -> Result<&Arc<Bucket>, StoreError> {
        self.data
            .get(name)
            .ok_or_else(|| StoreError::BucketNotFound(name.to_string()))
    }

    fn get_bucket_mut(&mut self, name: &str) -> Result<&mut Bucket, StoreError> {
        let arc = self
            .data
            .get_mut(name)
            .ok_or_else(|| StoreError::BucketNotFound(name.to_string()))?;
        Ok(Arc::make_mut(arc))
    }
}

pub struct MemoryTransaction<'a> {
    snapshot: RefCell<Option<Snapshot>>,
    dirty: RefCell<HashSet<String>>,
    store: &'a MemoryStore,
    read_only: bool,
    _write_guard: Option<MutexGuard<'a, ()>>,
}

impl<'a> MemoryTransaction<'a> {
    pub(crate) fn new_read_only(store: &'a MemoryStore) -> Self {
        Self {
            snapshot: RefCell::new(Some(Snapshot::new())),
            dirty: RefCell::new(HashSet::new()),
            store,
            read_only: true,
            _write_guard: None,
        }
    }

    pub(crate) fn new_writable(store: &'a MemoryStore, guard: MutexGuard<'a, ()>) -> Self {
        Self {
            snapshot: RefCell::new(Some(Snapshot::new())),
            dirty: RefCell::new(HashSet::new()),
            store,
            read_only: false,
            _write_guard: Some(guard),
        }
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }
}

impl<'a> Transaction for MemoryTransaction<'a> {
    type Cf = MemoryBucket;

    fn bucket(&self, name: &str) -> Result<Self::Cf, StoreError> {
        let mut snap = self.snapshot.borrow_mut();
        let snap = snap.as_mut().ok_or(StoreError::TransactionConsumed)?;
        snap.ensure(self.store, name)?;
        let data = Arc::clone(snap.get_bucket(name)?);
        Ok(MemoryBucket {
            name: name.to_string(),
            data,
        })
    }

    fn create_bucket(&mut self, name: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.store.create_bucket(name);
        let snap = self
            .snapshot
            .get_mut()
            .as_mut()
            .ok_or(StoreError::TransactionConsumed)?;
        snap.data
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Bucket::new()));
        self.dirty.get_mut().insert(name.to_string());
        Ok(())
    }

    fn drop_bucket(&mut self, name: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.store.drop_bucket(name);
        let snap = self
            .snapshot
            .get_mut()
            .as_mut()
            .ok_or(StoreError::TransactionConsumed)?;
        snap.data.remove(name);
        self.dirty.get_mut().remove(name);
        Ok(())
    }

    fn get<'c>(&self, bucket: &'c Self::Cf, key: &[u8]) -> Result<Option<Cow<'c, [u8]>>, StoreError> {
        Ok(bucket.data.get(key).map(|v| Cow::Borrowed(v.as_slice())))
    }

    fn put(&self, bucket: &Self::Cf, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.dirty.borrow_mut().insert(bucket.name.clone());
        let mut snap = self.snapshot.borrow_mut();
        let snap = snap.as_mut().ok_or(StoreError::TransactionConsumed)?;
        let data = snap.get_bucket_mut(&bucket.name)?;
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn put_batch(&self, bucket: &Self::Cf, entries: &[(&[u8], &[u8])]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.dirty.borrow_mut().insert(bucket.name.clone());
        let mut snap = self.snapshot.borrow_mut();
        let snap = snap.as_mut().ok_or(StoreError::TransactionConsumed)?;
        let data = snap.get_bucket_mut(&bucket.name)?;
        for (key, value) in entries {
            data.insert(key.to_vec(), value.to_vec());
        }
        Ok(())
    }

    fn delete(&self, bucket: &Self::Cf, key: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.dirty.borrow_mut().insert(bucket.name.clone());
        let mut snap = self.snapshot.borrow_mut();
        let snap = snap.as_mut().ok_or(StoreError::TransactionConsumed)?;
        let data = snap.get_bucket_mut(&bucket.name)?;
        data.remove(key);
        Ok(())
    }

    fn scan_prefix<'c>(
        &'c self,
        bucket: &'c Self::Cf,
        prefix: &[u8],
    ) -> Result<
        Box<dyn Iterator<Item = Result<(Cow<'c, [u8]>, Cow<'c, [u8]>), StoreError>> + 'c>,
        StoreError,
    > {
        let prefix = prefix.to_vec();
        Ok(Box::new(
            bucket
                .data
                .range(prefix.clone()..)
                .take_while(move |(k, _)| k.starts_with(&prefix))
                .map(|(k, v)| Ok((Cow::Borrowed(k.as_slice()), Cow::Borrowed(v.as_slice())))),
        ))
    }

    fn scan_from<'c>(
        &'c self,
        bucket: &'c Self::Cf,
        start: &[u8],
    ) -> Result<
        Box<dyn Iterator<Item = Result<(Cow<'c, [u8]>, Cow<'c, [u8]>), StoreError>> + 'c>,
        StoreError,
    > {
        let start = start.to_vec();
        Ok(Box::new(
            bucket
                .data
                .range(start..)
                .map(|(k, v)| Ok((Cow::Borrowed(k.as_slice()), Cow::Borrowed(v.as_slice())))),
        ))
    }

    fn commit(self) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }

        let snapshot = self
            .snapshot
            .into_inner()
            .ok_or(StoreError::TransactionConsumed)?;

        let dirty_set = self.dirty.into_inner();
        let dirty: HashMap<String, Arc<Bucket>> = snapshot
            .data
            .into_iter()
            .filter(|(name, _)| dirty_set.contains(name))
            .collect();

        if dirty.is_empty() {
            return Ok(());
        }

        self.store.commit(dirty);
        Ok(())
    }

    fn rollback(self) -> Result<(), StoreError> {
        if self.snapshot.into_inner().is_none() {
            return Err(StoreError::TransactionConsumed);
        }
        Ok(())
    }
}
