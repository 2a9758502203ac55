use std::path::Path;

use rocksdb::{MultiThreaded, OptimisticTransactionDB, Options};

use crate::error::StoreError;
use crate::store::Store;

use super::transaction::RocksTransaction;

type DB = OptimisticTransactionDB<MultiThreaded>;

/// A [`Store`] backed by RocksDB's optimistic transaction API. Each bucket
/// maps onto a column family.
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = DB::list_cf(&opts, path).unwrap_or_default();

        let db = if cfs.is_empty() {
            DB::open(&opts, path)
        } else {
            DB::open_cf(&opts, path, &cfs)
        }
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &DB {
        &self.db
    }
}

impl Store for RocksStore {
    type Txn<'a> = RocksTransaction<'a>;

    fn begin(&self, read_only: bool) -> Result<Self::Txn<'_>, StoreError> {
        RocksTransaction::new(&self.db, read_only)
    }
}
