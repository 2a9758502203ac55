use std::path::Path;

use redb::Database;

use crate::error::StoreError;
use crate::store::Store;

use super::transaction::RedbTransaction;

/// A [`Store`] backed by `redb`. Each bucket is a redb table of
/// `&[u8] -> &[u8]`.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(Self { db })
    }
}

impl Store for RedbStore {
    type Txn<'a> = RedbTransaction<'a>;

    fn begin(&self, read_only: bool) -> Result<Self::Txn<'_>, StoreError> {
        RedbTransaction::new(&self.db, read_only)
    }
}
