use crate::error::EngineError;
use crate::extract::ValueExtractor;
use crate::path::Path;
use crate::scalar::Scalar;
use crate::transform::{self, Tokenizer, Transformer};

/// One level of an [`crate::index::Index`]: a path plus the optional
/// tokenizer/transformer applied to the scalars found there (spec §4.3).
///
/// Two indexers are equal iff their paths are equal — tokenizer and
/// transformer are function pointers, not part of identity (spec §3), so
/// this is a manual `PartialEq` rather than a derive.
#[derive(Clone)]
pub struct FieldIndexer {
    path: Path,
    tokenizer: Option<Tokenizer>,
    transformer: Option<Transformer>,
}

impl FieldIndexer {
    pub fn new(path: Path) -> Self {
        Self {
            path,
            tokenizer: None,
            transformer: None,
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn with_transformer(mut self, transformer: Transformer) -> Self {
        self.transformer = Some(transformer);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn transformer(&self) -> Option<Transformer> {
        self.transformer
    }

    pub fn tokenizer(&self) -> Option<Tokenizer> {
        self.tokenizer
    }

    /// Collect the scalars this indexer produces for `document`: extract at
    /// `self.path`, then tokenize-then-transform each raw scalar (spec
    /// §4.3). Order and duplicates are preserved; the index bucket
    /// deduplicates identical composite keys naturally.
    pub fn scalars(
        &self,
        extractor: &dyn ValueExtractor,
        document: &[u8],
    ) -> Result<Vec<Scalar>, EngineError> {
        let raw = extractor.extract(document, &self.path)?;
        let mut out = Vec::with_capacity(raw.len());
        for scalar in raw {
            out.extend(transform::apply(scalar, self.tokenizer, self.transformer));
        }
        Ok(out)
    }

    /// Apply this indexer's transformer (not its tokenizer — a query bound
    /// is a single literal, not a document value to split) to a predicate's
    /// seek scalar, as spec §3 requires for bound comparison.
    pub fn transform_bound(&self, scalar: &Scalar) -> Scalar {
        match self.transformer {
            Some(t) => t(scalar),
            None => scalar.clone(),
        }
    }
}

impl PartialEq for FieldIndexer {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::JsonExtractor;
    use crate::transform::{to_lower, whitespace_tokenizer};

    #[test]
    fn equality_is_by_path_only() {
        let a = FieldIndexer::new(Path::Json("subject".into()));
        let b = FieldIndexer::new(Path::Json("subject".into())).with_transformer(to_lower);
        assert_eq!(a, b);
    }

    #[test]
    fn different_paths_are_unequal() {
        let a = FieldIndexer::new(Path::Json("a".into()));
        let b = FieldIndexer::new(Path::Json("b".into()));
        assert_ne!(a, b);
    }

    #[test]
    fn scalars_tokenizes_then_transforms() {
        let indexer = FieldIndexer::new(Path::Json("text".into()))
            .with_tokenizer(whitespace_tokenizer)
            .with_transformer(to_lower);
        let doc = br#"{"text":"The Quick Fox"}"#;
        let scalars = indexer.scalars(&JsonExtractor, doc).unwrap();
        assert_eq!(
            scalars,
            vec![
                Scalar::Str("the".into()),
                Scalar::Str("quick".into()),
                Scalar::Str("fox".into()),
            ]
        );
    }

    #[test]
    fn scalars_empty_when_field_absent() {
        let indexer = FieldIndexer::new(Path::Json("missing".into()));
        let scalars = indexer.scalars(&JsonExtractor, br#"{"other":1}"#).unwrap();
        assert!(scalars.is_empty());
    }
}
