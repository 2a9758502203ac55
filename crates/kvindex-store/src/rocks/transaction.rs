use std::borrow::Cow;

use rocksdb::{Direction, IteratorMode, MultiThreaded, OptimisticTransactionDB, Options};

use crate::error::StoreError;
use crate::store::Transaction;

type DB = OptimisticTransactionDB<MultiThreaded>;

pub struct RocksTransaction<'db> {
    txn: Option<rocksdb::Transaction<'db, DB>>,
    db: &'db DB,
    read_only: bool,
}

impl<'db> RocksTransaction<'db> {
    pub(crate) fn new(db: &'db DB, read_only: bool) -> Result<Self, StoreError> {
        let txn = db.transaction();
        Ok(Self {
            txn: Some(txn),
            db,
            read_only,
        })
    }

    fn txn(&self) -> Result<&rocksdb::Transaction<'db, DB>, StoreError> {
        self.txn.as_ref().ok_or(StoreError::TransactionConsumed)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }
}

impl<'db> Transaction for RocksTransaction<'db> {
    /// The rocksdb column family handle is tied to `&DB`'s lifetime, not the
    /// transaction's, so buckets here are resolved by name on every call
    /// instead of caching a handle.
    type Cf = String;

    fn bucket(&self, name: &str) -> Result<Self::Cf, StoreError> {
        if self.db.cf_handle(name).is_none() {
            return Err(StoreError::BucketNotFound(name.to_string()));
        }
        Ok(name.to_string())
    }

    fn create_bucket(&mut self, name: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        if self.db.cf_handle(name).is_some() {
            return Ok(());
        }
        self.db
            .create_cf(name, &Options::default())
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn drop_bucket(&mut self, name: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.db
            .drop_cf(name)
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn get<'c>(&self, bucket: &'c Self::Cf, key: &[u8]) -> Result<Option<Cow<'c, [u8]>>, StoreError> {
        let cf = self
            .db
            .cf_handle(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.clone()))?;
        let data = self
            .txn()?
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(data.map(|v| Cow::Owned(v)))
    }

    fn put(&self, bucket: &Self::Cf, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        let cf = self
            .db
            .cf_handle(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.clone()))?;
        self.txn()?
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn put_batch(&self, bucket: &Self::Cf, entries: &[(&[u8], &[u8])]) -> Result<(), StoreError> {
        self.check_writable()?;
        let cf = self
            .db
            .cf_handle(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.clone()))?;
        let txn = self.txn()?;
        for (key, value) in entries {
            txn.put_cf(&cf, key, value)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    fn delete(&self, bucket: &Self::Cf, key: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        let cf = self
            .db
            .cf_handle(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.clone()))?;
        self.txn()?
            .delete_cf(&cf, key)
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn scan_prefix<'c>(
        &'c self,
        bucket: &'c Self::Cf,
        prefix: &[u8],
    ) -> Result<
        Box<dyn Iterator<Item = Result<(Cow<'c, [u8]>, Cow<'c, [u8]>), StoreError>> + 'c>,
        StoreError,
    > {
        let cf = self
            .db
            .cf_handle(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.clone()))?;
        let prefix_owned = prefix.to_vec();
        let iter = self
            .txn()?
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));
        Ok(Box::new(
            iter.take_while(move |item| match item {
                Ok((key, _)) => key.starts_with(&prefix_owned),
                Err(_) => true,
            })
            .map(|item| {
                item.map(|(k, v)| (Cow::Owned(k.into_vec()), Cow::Owned(v.into_vec())))
                    .map_err(|e| StoreError::Storage(e.to_string()))
            }),
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
        let cf = self
            .db
            .cf_handle(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.clone()))?;
        let iter = self
            .txn()?
            .iterator_cf(&cf, IteratorMode::From(start, Direction::Forward));
        Ok(Box::new(iter.map(|item| {
            item.map(|(k, v)| (Cow::Owned(k.into_vec()), Cow::Owned(v.into_vec())))
                .map_err(|e| StoreError::Storage(e.to_string()))
        })))
    }

    fn commit(mut self) -> Result<(), StoreError> {
        let txn = self.txn.take().ok_or(StoreError::TransactionConsumed)?;
        txn.commit().map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn rollback(mut self) -> Result<(), StoreError> {
        let txn = self.txn.take().ok_or(StoreError::TransactionConsumed)?;
        txn.rollback()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }
}
