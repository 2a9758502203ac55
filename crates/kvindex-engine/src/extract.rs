use std::sync::Arc;

use iref::Iri;
use json_ld::{JsonLdProcessor, RemoteDocument};
use json_syntax::Parse;

use crate::error::EngineError;
use crate::path::Path;
use crate::scalar::Scalar;

/// Collects scalars at a [`Path`] from a document's raw bytes (spec §4.2).
/// A `Collection` is built against exactly one implementation, chosen once
/// at creation time — not a class hierarchy, per the §4.6 design note. Each
/// implementation rejects the `Path` variant it doesn't understand with
/// `EngineError::InvalidQuery`.
pub trait ValueExtractor: Send + Sync {
    fn extract(&self, document: &[u8], path: &Path) -> Result<Vec<Scalar>, EngineError>;
}

/// Plain JSON path extractor: dotted segments, `#` traverses one array
/// level.
pub struct JsonExtractor;

impl ValueExtractor for JsonExtractor {
    fn extract(&self, document: &[u8], path: &Path) -> Result<Vec<Scalar>, EngineError> {
        let Path::Json(dotted) = path else {
            return Err(EngineError::InvalidQuery(
                "JSON extractor requires a Path::Json".into(),
            ));
        };
        let value: serde_json::Value =
            serde_json::from_slice(document).map_err(|e| EngineError::InvalidJson(e.to_string()))?;
        let segments: Vec<&str> = dotted.split('.').collect();
        let mut out = Vec::new();
        collect_json(&value, &segments, &mut out)?;
        Ok(out)
    }
}

fn collect_json(value: &serde_json::Value, segments: &[&str], out: &mut Vec<Scalar>) -> Result<(), EngineError> {
    match segments.split_first() {
        None => leaf_scalars(value, out),
        Some((&"#", rest)) => match value {
            serde_json::Value::Array(items) => {
                for item in items {
                    collect_json(item, rest, out)?;
                }
                Ok(())
            }
            // Not an array at this level: nothing to traverse, not an error.
            _ => Ok(()),
        },
        Some((head, rest)) => match value.get(head) {
            Some(next) => collect_json(next, rest, out),
            None => Ok(()),
        },
    }
}

/// The leaf of a path: null yields nothing, an array flattens, an object is
/// `UnsupportedLeaf`, and string/number/boolean convert to a `Scalar`.
fn leaf_scalars(value: &serde_json::Value, out: &mut Vec<Scalar>) -> Result<(), EngineError> {
    match value {
        serde_json::Value::Null => Ok(()),
        serde_json::Value::Array(items) => {
            for item in items {
                leaf_scalars(item, out)?;
            }
            Ok(())
        }
        serde_json::Value::Object(_) => Err(EngineError::UnsupportedLeaf(
            "object found at an indexed leaf path".into(),
        )),
        scalar => {
            out.push(Scalar::from_json(scalar)?);
            Ok(())
        }
    }
}

/// Caller-supplied document fetcher for JSON-LD `@context` resolution
/// (spec §6 `documentLoader` configuration option). Synchronous: the
/// `json_ld` crate's own `Loader` trait is async, but this engine's
/// concurrency model is synchronous on the calling thread (spec §5), so the
/// adapter below drives the real loader with `pollster` instead of exposing
/// async up through this crate's public API.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, iri: &Iri) -> Result<json_syntax::Value, EngineError>;
}

/// A loader that refuses every remote fetch, suitable for documents whose
/// `@context` is already embedded inline.
pub struct NullDocumentLoader;

impl DocumentLoader for NullDocumentLoader {
    fn load(&self, iri: &Iri) -> Result<json_syntax::Value, EngineError> {
        Err(EngineError::InvalidJson(format!(
            "no document loader configured to resolve {iri}"
        )))
    }
}

struct LoaderAdapter<'a> {
    inner: &'a dyn DocumentLoader,
}

impl json_ld::Loader for LoaderAdapter<'_> {
    async fn load(&self, url: &Iri) -> json_ld::LoadingResult<iref::IriBuf> {
        let document = self
            .inner
            .load(url)
            .map_err(|e| json_ld::loader::LoadError::new(url.to_owned(), e))?;
        Ok(RemoteDocument::new(Some(url.to_owned()), None, document))
    }
}

/// JSON-LD path extractor (spec §4.2): expands the document, then walks an
/// ordered list of IRIs through the expanded node graph.
pub struct JsonLdExtractor {
    loader: Arc<dyn DocumentLoader>,
}

impl JsonLdExtractor {
    pub fn new(loader: Arc<dyn DocumentLoader>) -> Self {
        Self { loader }
    }
}

impl ValueExtractor for JsonLdExtractor {
    fn extract(&self, document: &[u8], path: &Path) -> Result<Vec<Scalar>, EngineError> {
        let Path::JsonLd(iris) = path else {
            return Err(EngineError::InvalidQuery(
                "JSON-LD extractor requires a Path::JsonLd".into(),
            ));
        };
        let text = std::str::from_utf8(document).map_err(|e| EngineError::InvalidJson(e.to_string()))?;
        let (syntax_value, _) =
            json_syntax::Value::parse_str(text).map_err(|e| EngineError::InvalidJson(e.to_string()))?;
        let remote = RemoteDocument::new(None, None, syntax_value);
        let adapter = LoaderAdapter {
            inner: self.loader.as_ref(),
        };
        let expanded = pollster::block_on(remote.expand(&adapter))
            .map_err(|e| EngineError::InvalidJson(format!("JSON-LD expansion failed: {e}")))?;

        let mut out = Vec::new();
        for object in expanded.objects() {
            collect_jsonld(object, iris, &mut out);
        }
        Ok(out)
    }
}

/// Recursive descent over the expanded graph, per spec §4.2: at an object
/// level, an exhausted IRI list emits the node's `@value`/`@id`/`@list`/
/// `@set` leaf; otherwise descend into the array at the head IRI and
/// recurse on the tail. `@list` is always transparently traversed. A
/// missing head IRI yields no values; arrays are flattened at every level;
/// unsupported leaf shapes are silently dropped.
fn collect_jsonld(object: &json_ld::object::Object, iris: &[String], out: &mut Vec<Scalar>) {
    if let Some(list) = object.as_list() {
        for item in list.iter() {
            collect_jsonld(item, iris, out);
        }
        return;
    }

    match iris.split_first() {
        None => collect_jsonld_leaf(object, out),
        Some((head, tail)) => {
            let Some(node) = object.as_node() else {
                return;
            };
            let Ok(head_iri) = Iri::new(head.as_str()) else {
                return;
            };
            for value in node.get(head_iri) {
                collect_jsonld(value, tail, out);
            }
        }
    }
}

fn collect_jsonld_leaf(object: &json_ld::object::Object, out: &mut Vec<Scalar>) {
    if let Some(list) = object.as_list() {
        for item in list.iter() {
            collect_jsonld_leaf(item, out);
        }
        return;
    }
    if let Some(value) = object.as_value() {
        if let Some(scalar) = jsonld_literal_to_scalar(value) {
            out.push(scalar);
        }
        return;
    }
    if let Some(node) = object.as_node() {
        if let Some(id) = node.id() {
            out.push(Scalar::Str(id.to_string()));
        }
    }
}

fn jsonld_literal_to_scalar(value: &json_ld::object::Value) -> Option<Scalar> {
    use json_ld::object::value::Literal;
    match value.as_literal()? {
        Literal::String(s) => Some(Scalar::Str(s.to_string())),
        Literal::Boolean(b) => Some(Scalar::Bool(*b)),
        Literal::Number(n) => n.as_f64().map(Scalar::Float),
        _ => None,
    }
}
