use kvindex_engine::Index;
use kvindex_query::Query;

/// What `find`/`iterate`/`indexIterate` run against the store (spec §4.6).
pub enum Plan {
    /// No registered index scores above zero: walk every document, applying
    /// the whole query as a residual filter.
    FullTableScan,
    /// An index covers part (or all) of the query: walk its matched
    /// sub-tree, fetch each candidate document, and apply whatever
    /// predicates the index didn't cover as a residual filter.
    ResultScan { index: Index },
    /// An index covers the query exactly with no residual: the index's own
    /// references are the answer, no document fetch required.
    IndexScan { index: Index },
}

/// Highest-scoring index wins; ties keep the first-registered candidate
/// (spec §4.6). Falls back to [`Plan::FullTableScan`] when nothing scores
/// above zero.
pub fn pick_plan(indexes: &[Index], query: &Query) -> Plan {
    let parts = query.as_query_parts();
    let mut best: Option<(&Index, f64)> = None;
    for index in indexes {
        let score = index.is_match(&parts);
        if score <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }
    match best {
        Some((index, _)) => Plan::ResultScan { index: index.clone() },
        None => Plan::FullTableScan,
    }
}

/// The index `indexIterate` (spec §4.5) is allowed to use: an exact match
/// (score `1.0`) with no residual predicates left over. `None` means no
/// registered index qualifies.
pub fn pick_index_plan(indexes: &[Index], query: &Query) -> Option<Index> {
    let parts = query.as_query_parts();
    indexes
        .iter()
        .find(|index| index.is_match(&parts) == 1.0 && index.query_parts_outside_index(&parts).is_empty())
        .cloned()
}
