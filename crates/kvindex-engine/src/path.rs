use std::fmt;

/// A field indexer's location inside a document. The variant determines
/// which [`crate::extract::ValueExtractor`] understands it (spec §4.2).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Path {
    /// Dotted JSON path; `#` traverses one level of array ("a.b.#.c").
    Json(String),
    /// Ordered list of IRIs, walked against an expanded JSON-LD document.
    JsonLd(Vec<String>),
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Json(p) => write!(f, "{p}"),
            Path::JsonLd(iris) => write!(f, "{}", iris.join(" -> ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_paths_equal_by_string() {
        assert_eq!(Path::Json("a.b".into()), Path::Json("a.b".into()));
        assert_ne!(Path::Json("a.b".into()), Path::Json("a.c".into()));
    }

    #[test]
    fn different_variants_are_unequal() {
        assert_ne!(Path::Json("a".into()), Path::JsonLd(vec!["a".into()]));
    }
}
