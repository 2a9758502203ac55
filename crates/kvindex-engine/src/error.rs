use std::fmt;

use kvindex_store::StoreError;

#[derive(Debug)]
pub enum EngineError {
    Store(StoreError),
    InvalidJson(String),
    InvalidValue(String),
    UnsupportedLeaf(String),
    InvalidQuery(String),
    NoMatchingKeys,
    /// Sentinel used by callers (`kvindex-db`'s walker/cancellation
    /// plumbing) to stop an `Index::iterate` walk early for a reason this
    /// crate doesn't itself model — the real cause travels out-of-band in a
    /// side channel the caller inspects after `iterate` returns.
    Aborted(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::InvalidJson(msg) => write!(f, "invalid JSON: {msg}"),
            Self::InvalidValue(msg) => write!(f, "invalid value: {msg}"),
            Self::UnsupportedLeaf(msg) => write!(f, "unsupported leaf: {msg}"),
            Self::InvalidQuery(msg) => write!(f, "invalid query: {msg}"),
            Self::NoMatchingKeys => write!(f, "no matching keys for query"),
            Self::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
