use kvindex_engine::QueryPart;

use crate::predicate::Predicate;

/// Ordered sequence of predicate parts joined by AND (spec §3). No OR: the
/// spec's non-goals exclude disjunctive queries entirely.
#[derive(Debug, Clone, Default)]
pub struct Query {
    parts: Vec<Predicate>,
}

impl Query {
    /// Start a query from a single predicate.
    pub fn new(part: Predicate) -> Self {
        Self { parts: vec![part] }
    }

    /// Append another AND-joined predicate.
    pub fn and(mut self, part: Predicate) -> Self {
        self.parts.push(part);
        self
    }

    pub fn parts(&self) -> &[Predicate] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Predicate parts as the trait-object slice `kvindex-engine`'s `Index`
    /// matches and iterates against.
    pub fn as_query_parts(&self) -> Vec<&dyn QueryPart> {
        self.parts.iter().map(|p| p as &dyn QueryPart).collect()
    }
}
