mod error;
mod extract;
mod field_indexer;
mod index;
mod key;
mod path;
mod query_part;
mod scalar;
mod transform;

pub use error::EngineError;
pub use extract::{DocumentLoader, JsonExtractor, JsonLdExtractor, NullDocumentLoader, ValueExtractor};
pub use field_indexer::FieldIndexer;
pub use index::Index;
pub use path::Path;
pub use query_part::{PredicateKind, QueryPart};
pub use scalar::{must_parse, Scalar};
pub use transform::{to_lower, whitespace_tokenizer, Tokenizer, Transformer};

pub mod key_codec {
    //! Low-level composite-key helpers (spec §4.1, §6), re-exported under a
    //! named module rather than flattened into the crate root since callers
    //! outside `Index` rarely need them directly.
    pub use crate::key::{compose, component_at, leaf_key, prefix_upper_bound, split, sub_bucket_prefix, ABSENT, DELIMITER};
}
