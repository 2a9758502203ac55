use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use kvindex_engine::{Index, JsonExtractor, JsonLdExtractor, NullDocumentLoader, ValueExtractor};
use kvindex_query::Query;
use kvindex_store::{Store, Transaction};

use crate::collection::Collection;
use crate::config::DatabaseConfig;
use crate::context::QueryContext;
use crate::error::DbError;
use crate::reference::sha1_reference;

/// Owns the underlying key-value store plus a name-keyed cache of
/// [`Collection`]s (spec §5). A collection is created on first access and
/// cached for the database's lifetime, parameterized by whichever value
/// extractor that first access supplied; later calls for the same name
/// return the cached instance regardless of what extractor they pass.
pub struct Database<S: Store> {
    store: S,
    config: DatabaseConfig,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl<S: Store> Database<S> {
    pub fn new(store: S, config: DatabaseConfig) -> Self {
        Self {
            store,
            config,
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Collection backed by the JSON value extractor (spec §4.3).
    pub fn collection_json(&self, name: &str) -> Arc<Collection> {
        self.collection(name, Arc::new(JsonExtractor))
    }

    /// Collection backed by the JSON-LD value extractor (spec §4.3), using
    /// the database's configured document loader, or one that refuses
    /// every remote fetch if none was configured.
    pub fn collection_json_ld(&self, name: &str) -> Arc<Collection> {
        let loader = self
            .config
            .document_loader
            .clone()
            .unwrap_or_else(|| Arc::new(NullDocumentLoader));
        self.collection(name, Arc::new(JsonLdExtractor::new(loader)))
    }

    /// Collection backed by a caller-supplied extractor.
    pub fn collection(&self, name: &str, extractor: Arc<dyn ValueExtractor>) -> Arc<Collection> {
        if let Some(existing) = self.collections.read().expect("collection cache lock poisoned").get(name) {
            return existing.clone();
        }
        let mut collections = self.collections.write().expect("collection cache lock poisoned");
        collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Collection::new(name, extractor, sha1_reference())))
            .clone()
    }

    pub fn begin(&self, read_only: bool) -> Result<DatabaseTransaction<'_, S>, DbError> {
        let txn = self.store.begin(read_only)?;
        Ok(DatabaseTransaction { txn })
    }
}

/// One transaction against a [`Database`] (spec §4.5, §5). Delegates
/// straight into [`Collection`]'s own transaction-scoped methods; the only
/// work this type adds is creating buckets ahead of a write, since that
/// needs `&mut` access to the transaction that `Collection` itself isn't
/// handed.
pub struct DatabaseTransaction<'db, S: Store + 'db> {
    txn: S::Txn<'db>,
}

impl<'db, S: Store + 'db> DatabaseTransaction<'db, S> {
    pub fn add(&mut self, collection: &Collection, documents: &[Vec<u8>]) -> Result<(), DbError> {
        collection.ensure_buckets(&mut self.txn)?;
        collection.add(&self.txn, documents)
    }

    pub fn delete(&self, collection: &Collection, document: &[u8]) -> Result<(), DbError> {
        collection.delete(&self.txn, document)
    }

    pub fn add_index(&mut self, collection: &Collection, index: Index) -> Result<(), DbError> {
        collection.add_index(&mut self.txn, index)
    }

    pub fn drop_index(&mut self, collection: &Collection, name: &str) -> Result<(), DbError> {
        collection.drop_index(&mut self.txn, name)
    }

    pub fn find(&self, collection: &Collection, ctx: &QueryContext, query: &Query) -> Result<Vec<Vec<u8>>, DbError> {
        collection.find(&self.txn, ctx, query)
    }

    pub fn iterate(
        &self,
        collection: &Collection,
        ctx: &QueryContext,
        query: &Query,
        walker: impl FnMut(&[u8]) -> Result<(), DbError>,
    ) -> Result<(), DbError> {
        collection.iterate(&self.txn, ctx, query, walker)
    }

    pub fn index_iterate(
        &self,
        collection: &Collection,
        ctx: &QueryContext,
        query: &Query,
        ref_walker: impl FnMut(&[u8], &[u8]) -> Result<(), DbError>,
    ) -> Result<(), DbError> {
        collection.index_iterate(&self.txn, ctx, query, ref_walker)
    }

    pub fn commit(self) -> Result<(), DbError> {
        self.txn.commit()?;
        Ok(())
    }

    pub fn rollback(self) -> Result<(), DbError> {
        self.txn.rollback()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvindex_engine::{FieldIndexer, Path, Scalar};
    use kvindex_query::Predicate;
    use kvindex_store::MemoryStore;

    #[test]
    fn end_to_end_add_index_find_delete() {
        let db = Database::new(MemoryStore::new(), DatabaseConfig::default());
        let widgets = db.collection_json("widgets");

        let mut txn = db.begin(false).unwrap();
        txn.add_index(&widgets, Index::new("by_name", vec![FieldIndexer::new(Path::Json("name".into()))]))
            .unwrap();
        let bolt = br#"{"name":"bolt"}"#.to_vec();
        let nut = br#"{"name":"nut"}"#.to_vec();
        txn.add(&widgets, &[bolt.clone(), nut.clone()]).unwrap();

        let query = Query::new(Predicate::eq(Path::Json("name".into()), Scalar::Str("bolt".into())));
        let found = txn.find(&widgets, &QueryContext::none(), &query).unwrap();
        assert_eq!(found, vec![bolt.clone()]);

        txn.delete(&widgets, &bolt).unwrap();
        let found = txn.find(&widgets, &QueryContext::none(), &query).unwrap();
        assert!(found.is_empty());

        txn.commit().unwrap();
    }

    #[test]
    fn collections_are_cached_by_name() {
        let db = Database::new(MemoryStore::new(), DatabaseConfig::default());
        let a = db.collection_json("widgets");
        let b = db.collection_json("widgets");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
