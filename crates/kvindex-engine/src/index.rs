use kvindex_store::Transaction;

use crate::error::EngineError;
use crate::extract::ValueExtractor;
use crate::field_indexer::FieldIndexer;
use crate::key;
use crate::query_part::{PredicateKind, QueryPart};
use crate::transform;

/// Ordered list of [`FieldIndexer`]s plus a stable name (spec §3). Owns one
/// bucket: a flat keyspace of `composite_key ++ 0x10 ++ reference` entries
/// (spec §6) that this type treats, level by level, as a tree of nested
/// sub-buckets during add/delete/iterate.
#[derive(Clone)]
pub struct Index {
    name: String,
    indexers: Vec<FieldIndexer>,
}

impl Index {
    pub fn new(name: impl Into<String>, indexers: Vec<FieldIndexer>) -> Self {
        Self {
            name: name.into(),
            indexers,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indexers(&self) -> &[FieldIndexer] {
        &self.indexers
    }

    /// Recursive over the indexer list (spec §4.4). At every level, every
    /// branch produced by that level's scalars is explored before moving to
    /// the next — the source's historic `return`-inside-the-loop bug, which
    /// only explored the first branch at intermediate levels, is not
    /// reproduced here (spec §9).
    pub fn add<T: Transaction>(
        &self,
        txn: &T,
        bucket: &T::Cf,
        reference: &[u8],
        document: &[u8],
        extractor: &dyn ValueExtractor,
    ) -> Result<(), EngineError> {
        self.write_level(txn, bucket, reference, document, extractor, 0, &[], true)
    }

    /// Same traversal as [`Index::add`]; at the leaf level removes the
    /// reference from each sub-bucket instead of inserting it. Sub-buckets
    /// have no separate existence in the flat physical layout, so an empty
    /// one needs no explicit removal beyond deleting its last entry.
    pub fn delete<T: Transaction>(
        &self,
        txn: &T,
        bucket: &T::Cf,
        reference: &[u8],
        document: &[u8],
        extractor: &dyn ValueExtractor,
    ) -> Result<(), EngineError> {
        self.write_level(txn, bucket, reference, document, extractor, 0, &[], false)
    }

    fn write_level<T: Transaction>(
        &self,
        txn: &T,
        bucket: &T::Cf,
        reference: &[u8],
        document: &[u8],
        extractor: &dyn ValueExtractor,
        level: usize,
        prefix: &[u8],
        inserting: bool,
    ) -> Result<(), EngineError> {
        let indexer = &self.indexers[level];
        let scalars = indexer.scalars(extractor, document)?;
        let components: Vec<Vec<u8>> = if scalars.is_empty() {
            vec![key::ABSENT.to_vec()]
        } else {
            scalars.iter().map(|s| s.encode()).collect()
        };
        let is_leaf = level + 1 == self.indexers.len();

        for component in &components {
            let composite = key::compose(prefix, component);
            if is_leaf {
                let leaf = key::leaf_key(&composite, reference);
                if inserting {
                    txn.put(bucket, &leaf, &[])?;
                } else {
                    txn.delete(bucket, &leaf)?;
                }
            } else {
                self.write_level(txn, bucket, reference, document, extractor, level + 1, &composite, inserting)?;
            }
        }
        Ok(())
    }

    /// Score in `[0, 1]`: the fraction of this index's indexer list covered,
    /// prefix-wise, by `query` (spec §4.4). Stops at the first level with no
    /// predicate at that path — an index prefix can't be skipped.
    pub fn is_match(&self, query: &[&dyn QueryPart]) -> f64 {
        if self.indexers.is_empty() {
            return 0.0;
        }
        let (matched, _) = self.matched_levels(query);
        matched.len() as f64 / self.indexers.len() as f64
    }

    /// The predicate list minus, for each level in the matching prefix, the
    /// first predicate at that level (spec §4.4). Duplicate predicates at an
    /// already-consumed path, and predicates at paths this index doesn't
    /// cover, come back as residuals.
    pub fn query_parts_outside_index<'q>(&self, query: &[&'q dyn QueryPart]) -> Vec<&'q dyn QueryPart> {
        let (_, used) = self.matched_levels(query);
        query
            .iter()
            .zip(used)
            .filter(|(_, used)| !used)
            .map(|(part, _)| *part)
            .collect()
    }

    /// For each indexer level in order, the first not-yet-used query part
    /// whose path matches that level's path; stops at the first level with
    /// no match. Returns the matched parts (one per covered level, in level
    /// order) and a per-query-index "was this one consumed" flag.
    fn matched_levels<'q>(&self, query: &[&'q dyn QueryPart]) -> (Vec<&'q dyn QueryPart>, Vec<bool>) {
        let mut used = vec![false; query.len()];
        let mut matched = Vec::with_capacity(self.indexers.len());
        for indexer in &self.indexers {
            let found = query
                .iter()
                .enumerate()
                .find(|(i, part)| !used[*i] && part.path() == indexer.path());
            match found {
                Some((i, part)) => {
                    used[i] = true;
                    matched.push(*part);
                }
                None => break,
            }
        }
        (matched, used)
    }

    /// Cursor-driven multi-level search (spec §4.4). `query` must already be
    /// the matching-prefix predicate list for this index, in level order
    /// (callers get this from [`Index::matched_levels`] via
    /// [`Index::is_match`]/[`Index::query_parts_outside_index`], or build it
    /// the same way); an empty list is `NoMatchingKeys`.
    pub fn iterate<T: Transaction>(
        &self,
        txn: &T,
        bucket: &T::Cf,
        query: &[&dyn QueryPart],
        mut emit: impl FnMut(&[u8], &[u8]) -> Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        let (matched, _) = self.matched_levels(query);
        if matched.is_empty() {
            return Err(EngineError::NoMatchingKeys);
        }
        let matchers: Vec<Matcher> = matched
            .iter()
            .zip(self.indexers.iter())
            .map(|(part, indexer)| Matcher::build(*part, indexer))
            .collect();

        let mut cursor: Vec<u8> = Vec::new();
        self.walk(txn, bucket, &matchers, 0, &[], &mut cursor, &mut emit)
    }

    fn walk<T: Transaction>(
        &self,
        txn: &T,
        bucket: &T::Cf,
        matchers: &[Matcher],
        level: usize,
        prefix: &[u8],
        cursor: &mut Vec<u8>,
        emit: &mut impl FnMut(&[u8], &[u8]) -> Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        let matcher = &matchers[level];
        let more_matchers_remain = level + 1 < matchers.len();

        for (term, condition) in &matcher.entries {
            let mut seek = key::compose(prefix, term);
            if cursor.as_slice() > seek.as_slice() {
                seek = cursor.clone();
            }
            loop {
                let mut iter = txn.scan_from(bucket, &seek)?;
                let Some(next) = iter.next() else { break };
                drop(iter);
                let (k, _v) = next?;
                if !k.starts_with(prefix) {
                    break;
                }
                let component = key::component_at(&k, level).unwrap_or(&[]);
                if !condition.matches(component) {
                    // The absent-value sentinel is the empty component and
                    // sorts before every real value, so a leading `NotNil`
                    // (or empty `Prefix`) can fail here while present-valued
                    // keys still remain further on in this prefix. Only jump
                    // past the whole prefix when the failing component sorts
                    // above the matcher's range; otherwise step past just
                    // this one key and keep scanning.
                    if component.is_empty() {
                        *cursor = advance_past(&k);
                    } else {
                        *cursor = key::prefix_upper_bound(prefix);
                    }
                    break;
                }
                let new_prefix = key::compose(prefix, component);
                if more_matchers_remain {
                    let before = cursor.clone();
                    self.walk(txn, bucket, matchers, level + 1, &new_prefix, cursor, emit)?;
                    if cursor.as_slice() <= before.as_slice() || cursor.as_slice() <= k.as_ref() {
                        *cursor = advance_past(&k);
                    }
                } else {
                    self.emit_subtree(txn, bucket, &new_prefix, &mut *emit)?;
                    *cursor = key::prefix_upper_bound(&new_prefix);
                }
                seek = cursor.clone();
            }
        }
        Ok(())
    }

    /// "Open the sub-bucket at K and iterate every reference in it" (spec
    /// §4.4). Scans every physical key under `composite` and recovers each
    /// entry's reference positionally, by stripping the known
    /// `composite ++ 0x10` prefix, rather than splitting the physical key on
    /// the delimiter: a reference is a raw digest, not a delimited scalar,
    /// and can itself contain the delimiter byte.
    fn emit_subtree<T: Transaction>(
        &self,
        txn: &T,
        bucket: &T::Cf,
        composite: &[u8],
        emit: &mut impl FnMut(&[u8], &[u8]) -> Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        let sub_prefix = key::sub_bucket_prefix(composite);
        for entry in txn.scan_prefix(bucket, &sub_prefix)? {
            let (physical_key, _) = entry?;
            let reference = &physical_key[sub_prefix.len()..];
            emit(composite, reference)?;
        }
        Ok(())
    }
}

/// Smallest key strictly greater than `key` itself (not merely greater than
/// everything sharing `key` as a prefix): forces the cursor's monotonic
/// guard forward by exactly one entry when a recursive call made no
/// progress, preventing livelock (spec §4.4, §9).
fn advance_past(key: &[u8]) -> Vec<u8> {
    kvindex_store::increment_prefix(key).unwrap_or_else(|| {
        let mut out = key.to_vec();
        out.push(0xFF);
        out
    })
}

/// Runtime binding of a predicate to an index level: pre-transformed seek
/// terms paired with the byte-level condition to re-apply at each visited
/// key (spec glossary "Matcher").
struct Matcher {
    entries: Vec<(Vec<u8>, Condition)>,
}

impl Matcher {
    fn build(part: &dyn QueryPart, indexer: &FieldIndexer) -> Self {
        let entries = match part.kind() {
            PredicateKind::Eq(v) => transform::apply(v.clone(), indexer.tokenizer(), indexer.transformer())
                .into_iter()
                .map(|t| {
                    let encoded = t.encode();
                    (encoded.clone(), Condition::Eq(encoded))
                })
                .collect(),
            PredicateKind::Range(lo, hi) => {
                let lo = indexer.transform_bound(lo).encode();
                let hi = indexer.transform_bound(hi).encode();
                vec![(lo.clone(), Condition::Range(lo, hi))]
            }
            PredicateKind::Prefix(v) => {
                let encoded = indexer.transform_bound(v).encode();
                vec![(encoded.clone(), Condition::Prefix(encoded))]
            }
            PredicateKind::NotNil => vec![(Vec::new(), Condition::NotNil)],
        };
        Matcher { entries }
    }
}

/// Condition semantics per predicate (spec §4.4), applied to a single-level
/// byte component.
enum Condition {
    Eq(Vec<u8>),
    Range(Vec<u8>, Vec<u8>),
    Prefix(Vec<u8>),
    NotNil,
}

impl Condition {
    fn matches(&self, component: &[u8]) -> bool {
        match self {
            Condition::Eq(v) => component == v.as_slice(),
            Condition::Range(lo, hi) => component >= lo.as_slice() && component <= hi.as_slice(),
            // An empty prefix matches every non-empty key at this level
            // (spec §8), not the absent-value sentinel.
            Condition::Prefix(p) => !component.is_empty() && component.starts_with(p.as_slice()),
            Condition::NotNil => !component.is_empty(),
        }
    }
}
