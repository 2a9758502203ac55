mod collection;
mod config;
mod context;
mod database;
mod error;
mod planner;
mod reference;

pub use collection::Collection;
pub use config::DatabaseConfig;
pub use context::QueryContext;
pub use database::{Database, DatabaseTransaction};
pub use error::DbError;
pub use planner::Plan;
pub use reference::{sha1_reference, ReferenceFn};

pub use kvindex_engine::{
    DocumentLoader, EngineError, FieldIndexer, Index, JsonExtractor, JsonLdExtractor, NullDocumentLoader, Path,
    Scalar, ValueExtractor,
};
pub use kvindex_query::{Predicate, Query};
