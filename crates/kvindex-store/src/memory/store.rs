use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use arc_swap::ArcSwap;
use imbl::OrdMap;

use crate::error::StoreError;
use crate::store::Store;

use super::transaction::MemoryTransaction;

pub(crate) type Bucket = OrdMap<Vec<u8>, Vec<u8>>;

/// An in-memory [`Store`] backed by persistent (structural-sharing) ordered
/// maps. Read transactions see an immutable snapshot taken at `begin`; a
/// single write transaction is admitted at a time via `write_lock`.
pub struct MemoryStore {
    buckets: RwLock<HashMap<String, Arc<ArcSwap<Bucket>>>>,
    write_lock: Mutex<()>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn acquire_write_lock(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|e| StoreError::Storage(format!("write lock poisoned: {e}")))
    }

    /// Snapshot a single bucket, if it exists. Loaded lazily by transactions
    /// on first access so a transaction never pays for buckets it never
    /// touches.
    pub(crate) fn snapshot_bucket(&self, name: &str) -> Option<Arc<Bucket>> {
        let buckets = self.buckets.read().unwrap();
        let arc_swap = buckets.get(name)?;
        Some(arc_swap.load_full())
    }

    pub(crate) fn create_bucket(&self, name: &str) {
        let mut buckets = self.buckets.write().unwrap();
        buckets
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(ArcSwap::new(Arc::new(OrdMap::new()))));
    }

    pub(crate) fn drop_bucket(&self, name: &str) {
        let mut buckets = self.buckets.write().unwrap();
        buckets.remove(name);
    }

    /// Publish the buckets touched by a committing write transaction. The
    /// caller must already hold `write_lock`, so no conflict detection is
    /// required here.
    pub(crate) fn commit(&self, dirty: HashMap<String, Arc<Bucket>>) {
        let buckets = self.buckets.read().unwrap();
        for (name, data) in dirty {
            if let Some(arc_swap) = buckets.get(&name) {
                arc_swap.store(data);
            }
        }
    }
}

impl Store for MemoryStore {
    type Txn<'a> = MemoryTransaction<'a>;

    fn begin(&self, read_only: bool) -> Result<Self::Txn<'_>, StoreError> {
        if read_only {
            Ok(MemoryTransaction::new_read_only(self))
        } else {
            let guard = self.acquire_write_lock()?;
            Ok(MemoryTransaction::new_writable(self, guard))
        }
    }
}
