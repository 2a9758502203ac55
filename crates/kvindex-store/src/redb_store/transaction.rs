use std::borrow::Cow;

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::StoreError;
use crate::store::Transaction;

enum Inner {
    Read(redb::ReadTransaction),
    Write(redb::WriteTransaction),
    Consumed,
}

pub struct RedbTransaction<'db> {
    inner: Inner,
    #[allow(dead_code)]
    db: &'db Database,
    read_only: bool,
}

impl<'db> RedbTransaction<'db> {
    pub(crate) fn new(db: &'db Database, read_only: bool) -> Result<Self, StoreError> {
        let inner = if read_only {
            Inner::Read(
                db.begin_read()
                    .map_err(|e| StoreError::Storage(e.to_string()))?,
            )
        } else {
            Inner::Write(
                db.begin_write()
                    .map_err(|e| StoreError::Storage(e.to_string()))?,
            )
        };
        Ok(Self {
            inner,
            db,
            read_only,
        })
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }

    /// Write transactions can't hand out a table handle that outlives the
    /// call (it borrows the open transaction mutably on next write), so a
    /// scan against one is collected eagerly instead of streamed.
    fn collect_from_write(
        txn: &redb::WriteTransaction,
        bucket: &str,
        start: &[u8],
        upper: Option<&[u8]>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let def: TableDefinition<'_, &[u8], &[u8]> = TableDefinition::new(bucket);
        let table = txn
            .open_table(def)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let range = if let Some(upper) = upper {
            table.range::<&[u8]>(start..upper)
        } else {
            table.range::<&[u8]>(start..)
        }
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        range
            .map(|entry| {
                let (k, v) = entry.map_err(|e| StoreError::Storage(e.to_string()))?;
                Ok((k.value().to_vec(), v.value().to_vec()))
            })
            .collect()
    }
}

impl<'db> Transaction for RedbTransaction<'db> {
    type Cf = String;

    fn bucket(&self, name: &str) -> Result<Self::Cf, StoreError> {
        let def: TableDefinition<'_, &[u8], &[u8]> = TableDefinition::new(name);
        let opened = match &self.inner {
            Inner::Read(txn) => txn.open_table(def).map(|_| ()),
            Inner::Write(txn) => txn.open_table(def).map(|_| ()),
            Inner::Consumed => return Err(StoreError::TransactionConsumed),
        };
        opened.map_err(|_| StoreError::BucketNotFound(name.to_string()))?;
        Ok(name.to_string())
    }

    fn create_bucket(&mut self, name: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        let def: TableDefinition<'_, &[u8], &[u8]> = TableDefinition::new(name);
        match &self.inner {
            Inner::Write(txn) => {
                txn.open_table(def)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                Ok(())
            }
            Inner::Consumed => Err(StoreError::TransactionConsumed),
            Inner::Read(_) => unreachable!("check_writable excludes read transactions"),
        }
    }

    fn drop_bucket(&mut self, name: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        let def: TableDefinition<'_, &[u8], &[u8]> = TableDefinition::new(name);
        match &self.inner {
            Inner::Write(txn) => {
                txn.delete_table(def)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                Ok(())
            }
            Inner::Consumed => Err(StoreError::TransactionConsumed),
            Inner::Read(_) => unreachable!("check_writable excludes read transactions"),
        }
    }

    fn get<'c>(&self, bucket: &'c Self::Cf, key: &[u8]) -> Result<Option<Cow<'c, [u8]>>, StoreError> {
        let def: TableDefinition<'_, &[u8], &[u8]> = TableDefinition::new(bucket.as_str());
        let value = match &self.inner {
            Inner::Read(txn) => {
                let table = txn
                    .open_table(def)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                table.get(key).map_err(|e| StoreError::Storage(e.to_string()))?
            }
            Inner::Write(txn) => {
                let table = txn
                    .open_table(def)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                table.get(key).map_err(|e| StoreError::Storage(e.to_string()))?
            }
            Inner::Consumed => return Err(StoreError::TransactionConsumed),
        };
        Ok(value.map(|v| Cow::Owned(v.value().to_vec())))
    }

    fn put(&self, bucket: &Self::Cf, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        let def: TableDefinition<'_, &[u8], &[u8]> = TableDefinition::new(bucket.as_str());
        match &self.inner {
            Inner::Write(txn) => {
                let mut table = txn
                    .open_table(def)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                table
                    .insert(key, value)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                Ok(())
            }
            Inner::Consumed => Err(StoreError::TransactionConsumed),
            Inner::Read(_) => unreachable!("check_writable excludes read transactions"),
        }
    }

    fn put_batch(&self, bucket: &Self::Cf, entries: &[(&[u8], &[u8])]) -> Result<(), StoreError> {
        self.check_writable()?;
        let def: TableDefinition<'_, &[u8], &[u8]> = TableDefinition::new(bucket.as_str());
        match &self.inner {
            Inner::Write(txn) => {
                let mut table = txn
                    .open_table(def)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                for (key, value) in entries {
                    table
                        .insert(*key, *value)
                        .map_err(|e| StoreError::Storage(e.to_string()))?;
                }
                Ok(())
            }
            Inner::Consumed => Err(StoreError::TransactionConsumed),
            Inner::Read(_) => unreachable!("check_writable excludes read transactions"),
        }
    }

    fn delete(&self, bucket: &Self::Cf, key: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        let def: TableDefinition<'_, &[u8], &[u8]> = TableDefinition::new(bucket.as_str());
        match &self.inner {
            Inner::Write(txn) => {
                let mut table = txn
                    .open_table(def)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                table
                    .remove(key)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                Ok(())
            }
            Inner::Consumed => Err(StoreError::TransactionConsumed),
            Inner::Read(_) => unreachable!("check_writable excludes read transactions"),
        }
    }

    fn scan_prefix<'c>(
        &'c self,
        bucket: &'c Self::Cf,
        prefix: &[u8],
    ) -> Result<
        Box<dyn Iterator<Item = Result<(Cow<'c, [u8]>, Cow<'c, [u8]>), StoreError>> + 'c>,
        StoreError,
    > {
        let upper = crate::store::increment_prefix(prefix);
        match &self.inner {
            Inner::Read(txn) => {
                let def: TableDefinition<'_, &[u8], &[u8]> = TableDefinition::new(bucket.as_str());
                let table = txn
                    .open_table(def)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                let range = if let Some(ref upper) = upper {
                    table.range::<&[u8]>(prefix..upper.as_slice())
                } else {
                    table.range::<&[u8]>(prefix..)
                }
                .map_err(|e| StoreError::Storage(e.to_string()))?;
                Ok(Box::new(range.map(|entry| {
                    let (k, v) = entry.map_err(|e| StoreError::Storage(e.to_string()))?;
                    Ok((Cow::Owned(k.value().to_vec()), Cow::Owned(v.value().to_vec())))
                })))
            }
            Inner::Write(txn) => {
                let entries = Self::collect_from_write(txn, bucket, prefix, upper.as_deref())?;
                Ok(Box::new(
                    entries
                        .into_iter()
                        .map(|(k, v)| Ok((Cow::Owned(k), Cow::Owned(v)))),
                ))
            }
            Inner::Consumed => Err(StoreError::TransactionConsumed),
        }
    }

    fn scan_from<'c>(
        &'c self,
        bucket: &'c Self::Cf,
        start: &[u8],
    ) -> Result<
        Box<dyn Iterator<Item = Result<(Cow<'c, [u8]>, Cow<'c, [u8]>), StoreError>> + 'c>,
        StoreError,
    > {
        match &self.inner {
            Inner::Read(txn) => {
                let def: TableDefinition<'_, &[u8], &[u8]> = TableDefinition::new(bucket.as_str());
                let table = txn
                    .open_table(def)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                let range = table
                    .range::<&[u8]>(start..)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                Ok(Box::new(range.map(|entry| {
                    let (k, v) = entry.map_err(|e| StoreError::Storage(e.to_string()))?;
                    Ok((Cow::Owned(k.value().to_vec()), Cow::Owned(v.value().to_vec())))
                })))
            }
            Inner::Write(txn) => {
                let entries = Self::collect_from_write(txn, bucket, start, None)?;
                Ok(Box::new(
                    entries
                        .into_iter()
                        .map(|(k, v)| Ok((Cow::Owned(k), Cow::Owned(v)))),
                ))
            }
            Inner::Consumed => Err(StoreError::TransactionConsumed),
        }
    }

    fn commit(mut self) -> Result<(), StoreError> {
        let inner = std::mem::replace(&mut self.inner, Inner::Consumed);
        match inner {
            Inner::Write(txn) => txn.commit().map_err(|e| StoreError::Storage(e.to_string())),
            Inner::Read(_) => Ok(()),
            Inner::Consumed => Err(StoreError::TransactionConsumed),
        }
    }

    fn rollback(mut self) -> Result<(), StoreError> {
        let inner = std::mem::replace(&mut self.inner, Inner::Consumed);
        match inner {
            Inner::Write(txn) => {
                txn.abort().map_err(|e| StoreError::Storage(e.to_string()))?;
                Ok(())
            }
            Inner::Read(_) => Ok(()),
            Inner::Consumed => Err(StoreError::TransactionConsumed),
        }
    }
}
