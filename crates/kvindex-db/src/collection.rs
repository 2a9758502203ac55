use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use kvindex_engine::{EngineError, Index, PredicateKind, QueryPart, Scalar, ValueExtractor};
use kvindex_query::Query;
use kvindex_store::{StoreError, Transaction};

use crate::context::QueryContext;
use crate::error::DbError;
use crate::planner::{self, Plan};
use crate::reference::ReferenceFn;

/// A named bucket of documents plus its registered indexes (spec §4.5).
/// Cached by [`crate::Database`] per name; concurrent lookups share the
/// same `Arc<Collection>`, so the index list lives behind a lock rather
/// than requiring `&mut` access to mutate.
pub struct Collection {
    name: String,
    extractor: Arc<dyn ValueExtractor>,
    indexes: RwLock<Vec<Index>>,
    reference_fn: ReferenceFn,
}

impl Collection {
    pub(crate) fn new(name: impl Into<String>, extractor: Arc<dyn ValueExtractor>, reference_fn: ReferenceFn) -> Self {
        Self {
            name: name.into(),
            extractor,
            indexes: RwLock::new(Vec::new()),
            reference_fn,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indexes(&self) -> Vec<Index> {
        self.indexes.read().expect("index list lock poisoned").clone()
    }

    pub fn reference_of(&self, document: &[u8]) -> Vec<u8> {
        (self.reference_fn)(document)
    }

    fn documents_bucket_name(&self) -> String {
        format!("{}/_documents", self.name)
    }

    fn index_bucket_name(&self, index_name: &str) -> String {
        format!("{}/{index_name}", self.name)
    }

    /// Create the documents bucket and every currently-registered index's
    /// bucket if they don't already exist. Called before any write so
    /// `add`/`delete` can assume every bucket they touch is already there.
    pub(crate) fn ensure_buckets<T: Transaction>(&self, txn: &mut T) -> Result<(), DbError> {
        txn.create_bucket(&self.documents_bucket_name())?;
        let names: Vec<String> = self
            .indexes
            .read()
            .expect("index list lock poisoned")
            .iter()
            .map(|idx| self.index_bucket_name(idx.name()))
            .collect();
        for name in names {
            txn.create_bucket(&name)?;
        }
        Ok(())
    }

    /// spec §4.5 `add(documents)`: one transaction, every registered index
    /// updated alongside the document bucket.
    pub fn add<T: Transaction>(&self, txn: &T, documents: &[Vec<u8>]) -> Result<(), DbError> {
        let doc_bucket = txn.bucket(&self.documents_bucket_name())?;
        let indexes = self.indexes.read().expect("index list lock poisoned");
        for document in documents {
            let reference = self.reference_of(document);
            for index in indexes.iter() {
                let index_bucket = txn.bucket(&self.index_bucket_name(index.name()))?;
                index.add(txn, &index_bucket, &reference, document, self.extractor.as_ref())?;
            }
            txn.put(&doc_bucket, &reference, document)?;
        }
        Ok(())
    }

    /// spec §4.5 `delete(document)`.
    pub fn delete<T: Transaction>(&self, txn: &T, document: &[u8]) -> Result<(), DbError> {
        let doc_bucket = txn.bucket(&self.documents_bucket_name())?;
        let reference = self.reference_of(document);
        let indexes = self.indexes.read().expect("index list lock poisoned");
        for index in indexes.iter() {
            let index_bucket = txn.bucket(&self.index_bucket_name(index.name()))?;
            index.delete(txn, &index_bucket, &reference, document, self.extractor.as_ref())?;
        }
        txn.delete(&doc_bucket, &reference)?;
        Ok(())
    }

    /// spec §4.5 `addIndex(idx)`: idempotent by name; a newly-registered
    /// index is backfilled against every document already in the
    /// collection, in the same transaction. If the index's bucket already
    /// exists on disk but isn't in the in-memory list — a prior `addIndex`
    /// crashed after creating the bucket but before registering it — the
    /// backfill is skipped rather than run again, since it may have already
    /// completed against some or all documents.
    pub fn add_index<T: Transaction>(&self, txn: &mut T, index: Index) -> Result<(), DbError> {
        if self
            .indexes
            .read()
            .expect("index list lock poisoned")
            .iter()
            .any(|existing| existing.name() == index.name())
        {
            return Ok(());
        }

        let bucket_name = self.index_bucket_name(index.name());
        let bucket_already_existed = txn.bucket(&bucket_name).is_ok();
        txn.create_bucket(&bucket_name)?;
        txn.create_bucket(&self.documents_bucket_name())?;

        if !bucket_already_existed {
            let index_bucket = txn.bucket(&bucket_name)?;
            let doc_bucket = txn.bucket(&self.documents_bucket_name())?;

            let entries: Vec<(Vec<u8>, Vec<u8>)> = txn
                .scan_prefix(&doc_bucket, &[])?
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            for (reference, document) in &entries {
                index.add(txn, &index_bucket, reference, document, self.extractor.as_ref())?;
            }
        }

        self.indexes.write().expect("index list lock poisoned").push(index);
        Ok(())
    }

    /// spec §4.5 `dropIndex(name)`: removes the index from the list and its
    /// bucket from the store. A name that isn't registered is a no-op.
    pub fn drop_index<T: Transaction>(&self, txn: &mut T, name: &str) -> Result<(), DbError> {
        let mut indexes = self.indexes.write().expect("index list lock poisoned");
        let Some(pos) = indexes.iter().position(|idx| idx.name() == name) else {
            return Ok(());
        };
        txn.drop_bucket(&self.index_bucket_name(name))?;
        indexes.remove(pos);
        Ok(())
    }

    /// spec §4.5 `find(ctx, query)`: `iterate` collected into a `Vec`.
    pub fn find<T: Transaction>(&self, txn: &T, ctx: &QueryContext, query: &Query) -> Result<Vec<Vec<u8>>, DbError> {
        let mut results = Vec::new();
        self.iterate(txn, ctx, query, |document| {
            results.push(document.to_vec());
            Ok(())
        })?;
        Ok(results)
    }

    /// spec §4.5 `iterate(query, walker)`: planner picks `FullTableScan` or
    /// `ResultScan`; `walker`'s error aborts the scan and is surfaced as-is.
    pub fn iterate<T: Transaction>(
        &self,
        txn: &T,
        ctx: &QueryContext,
        query: &Query,
        mut walker: impl FnMut(&[u8]) -> Result<(), DbError>,
    ) -> Result<(), DbError> {
        let indexes = self.indexes.read().expect("index list lock poisoned");
        let plan = planner::pick_plan(&indexes, query);
        drop(indexes);

        match plan {
            Plan::FullTableScan => {
                let doc_bucket = match txn.bucket(&self.documents_bucket_name()) {
                    Ok(b) => b,
                    Err(StoreError::BucketNotFound(_)) => return Ok(()),
                    Err(e) => return Err(e.into()),
                };
                for entry in txn.scan_prefix(&doc_bucket, &[])? {
                    let (_, document) = entry?;
                    ctx.check()?;
                    if self.document_matches(query.as_query_parts().as_slice(), document.as_ref())? {
                        walker(&document)?;
                    }
                }
                Ok(())
            }
            Plan::ResultScan { index } => {
                let parts = query.as_query_parts();
                let residual = index.query_parts_outside_index(&parts);
                let doc_bucket = txn.bucket(&self.documents_bucket_name())?;
                let index_bucket = txn.bucket(&self.index_bucket_name(index.name()))?;

                let mut seen = HashSet::new();
                let mut abort: Option<DbError> = None;
                let result = index.iterate(txn, &index_bucket, &parts, |_k, reference| {
                    if !seen.insert(reference.to_vec()) {
                        return Ok(());
                    }
                    if let Err(e) = ctx.check() {
                        abort = Some(e);
                        return Err(EngineError::Aborted("context cancelled".into()));
                    }
                    let document = match txn.get(&doc_bucket, reference) {
                        Ok(Some(d)) => d,
                        Ok(None) => return Ok(()),
                        Err(e) => {
                            abort = Some(e.into());
                            return Err(EngineError::Aborted("store error fetching document".into()));
                        }
                    };
                    match self.document_matches(&residual, document.as_ref()) {
                        Ok(true) => {}
                        Ok(false) => return Ok(()),
                        Err(e) => {
                            abort = Some(e);
                            return Err(EngineError::Aborted("residual filter error".into()));
                        }
                    }
                    if let Err(e) = walker(&document) {
                        abort = Some(e);
                        return Err(EngineError::Aborted("walker error".into()));
                    }
                    Ok(())
                });
                match result {
                    Ok(()) => Ok(()),
                    Err(EngineError::Aborted(_)) => Err(abort.expect("Aborted always carries a side-channel error")),
                    Err(e) => Err(e.into()),
                }
            }
            Plan::IndexScan { .. } => unreachable!("pick_plan never returns IndexScan"),
        }
    }

    /// spec §4.5 `indexIterate(query, refWalker)`: requires a registered
    /// index that covers the query exactly, with no residual predicates;
    /// yields references straight from the index, no document fetch.
    pub fn index_iterate<T: Transaction>(
        &self,
        txn: &T,
        ctx: &QueryContext,
        query: &Query,
        mut ref_walker: impl FnMut(&[u8], &[u8]) -> Result<(), DbError>,
    ) -> Result<(), DbError> {
        let indexes = self.indexes.read().expect("index list lock poisoned");
        let index = planner::pick_index_plan(&indexes, query).ok_or(DbError::NoIndex)?;
        drop(indexes);

        let index_bucket = txn.bucket(&self.index_bucket_name(index.name()))?;
        let parts = query.as_query_parts();
        let mut seen = HashSet::new();
        let mut abort: Option<DbError> = None;
        let result = index.iterate(txn, &index_bucket, &parts, |composite_key, reference| {
            if !seen.insert(reference.to_vec()) {
                return Ok(());
            }
            if let Err(e) = ctx.check() {
                abort = Some(e);
                return Err(EngineError::Aborted("context cancelled".into()));
            }
            if let Err(e) = ref_walker(composite_key, reference) {
                abort = Some(e);
                return Err(EngineError::Aborted("walker error".into()));
            }
            Ok(())
        });
        match result {
            Ok(()) => Ok(()),
            Err(EngineError::Aborted(_)) => Err(abort.expect("Aborted always carries a side-channel error")),
            Err(e) => Err(e.into()),
        }
    }

    /// AND over every part (spec §4.6): a full table scan applies this to
    /// the entire query; a result scan applies it only to the residual.
    fn document_matches(&self, parts: &[&dyn QueryPart], document: &[u8]) -> Result<bool, DbError> {
        for part in parts {
            let values = self.extractor.extract(document, part.path())?;
            if !values.iter().any(|v| condition_holds(part.kind(), v)) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn condition_holds(kind: &PredicateKind, value: &Scalar) -> bool {
    match kind {
        PredicateKind::Eq(v) => value.encode() == v.encode(),
        PredicateKind::Range(lo, hi) => value.encode() >= lo.encode() && value.encode() <= hi.encode(),
        PredicateKind::Prefix(v) => value.encode().starts_with(&v.encode()),
        PredicateKind::NotNil => true,
    }
}
