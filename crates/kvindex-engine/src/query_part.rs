use crate::path::Path;
use crate::scalar::Scalar;

/// The shape of a single predicate, independent of how `kvindex-query`
/// represents it. `Index` matches and iterates against this rather than a
/// concrete `Predicate` type, so the codec crate never depends on the query
/// crate (spec §9's "interface abstraction instead of inheritance" applies
/// here too, at the engine/query seam rather than the JSON/JSON-LD one).
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateKind {
    Eq(Scalar),
    Range(Scalar, Scalar),
    Prefix(Scalar),
    NotNil,
}

/// One AND-joined part of a query, as `Index` needs to see it: a path to
/// match against a `FieldIndexer`'s path, and the condition to apply at that
/// level (spec §3, §4.4).
pub trait QueryPart {
    fn path(&self) -> &Path;
    fn kind(&self) -> &PredicateKind;
}
