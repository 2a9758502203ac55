use std::fmt;

use kvindex_engine::EngineError;
use kvindex_store::StoreError;

/// Top-level error type for `kvindex-db` (spec §4.5, §7).
#[derive(Debug)]
pub enum DbError {
    Store(StoreError),
    Engine(EngineError),
    /// `indexIterate` was asked for a query no registered index covers
    /// exactly (score `1.0`, no residual predicates).
    NoIndex,
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Store(e) => write!(f, "store error: {e}"),
            DbError::Engine(e) => write!(f, "engine error: {e}"),
            DbError::NoIndex => write!(f, "no index exactly covers this query"),
            DbError::Cancelled => write!(f, "query cancelled"),
            DbError::DeadlineExceeded => write!(f, "query deadline exceeded"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<StoreError> for DbError {
    fn from(e: StoreError) -> Self {
        DbError::Store(e)
    }
}

impl From<EngineError> for DbError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Store(se) => DbError::Store(se),
            other => DbError::Engine(other),
        }
    }
}
