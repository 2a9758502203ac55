use std::sync::Arc;

use sha1::{Digest, Sha1};

/// A document's reference is whatever this function derives from its raw
/// bytes (spec §4.2 "reference"); the default is its SHA-1 digest, matching
/// the source's choice of a fixed-width, content-addressed key.
pub type ReferenceFn = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

pub fn sha1_reference() -> ReferenceFn {
    Arc::new(|document: &[u8]| Sha1::digest(document).to_vec())
}
