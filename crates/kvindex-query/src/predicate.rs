use kvindex_engine::{Path, PredicateKind, QueryPart, Scalar};

/// One AND-joined condition on a field (spec §3, §6). Equality of two
/// predicates is by path only (used by the planner's residual computation),
/// so this is not `#[derive(PartialEq)]` on the whole variant — see
/// [`Predicate::same_path`].
#[derive(Debug, Clone)]
pub struct Predicate {
    path: Path,
    kind: PredicateKind,
}

impl Predicate {
    pub fn eq(path: Path, value: Scalar) -> Self {
        Self {
            path,
            kind: PredicateKind::Eq(value),
        }
    }

    pub fn range(path: Path, lo: Scalar, hi: Scalar) -> Self {
        Self {
            path,
            kind: PredicateKind::Range(lo, hi),
        }
    }

    pub fn prefix(path: Path, value: Scalar) -> Self {
        Self {
            path,
            kind: PredicateKind::Prefix(value),
        }
    }

    pub fn not_nil(path: Path) -> Self {
        Self {
            path,
            kind: PredicateKind::NotNil,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &PredicateKind {
        &self.kind
    }

    /// Path-only equality (spec §3): two predicates on the same path are
    /// the same predicate for index-matching purposes, regardless of what
    /// they assert there.
    pub fn same_path(&self, other: &Predicate) -> bool {
        self.path == other.path
    }
}

impl QueryPart for Predicate {
    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> &PredicateKind {
        &self.kind
    }
}
