mod predicate;
mod query;

pub use predicate::Predicate;
pub use query::Query;

pub use kvindex_engine::{Path, PredicateKind, QueryPart, Scalar};
