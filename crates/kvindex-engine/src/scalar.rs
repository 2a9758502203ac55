use std::cmp::Ordering;

use crate::error::EngineError;

/// A single indexable value.
///
/// Closed over four variants: no runtime type introspection, no
/// user-extensible scalar kinds. Each variant has exactly one canonical byte
/// encoding (see [`Scalar::encode`]), which is what actually lands in the
/// store — lexicographic order on that encoding is the index's sort order.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
}

impl Scalar {
    /// Canonical big-endian byte encoding.
    ///
    /// Float encoding is the raw big-endian bit pattern of the IEEE-754
    /// double, not a sort-preserving transform: this does not order
    /// negatives correctly against positives or against each other. Range
    /// queries over floats are only reliable for non-negative values. This
    /// reproduces the source behavior verbatim (see `DESIGN.md`).
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Scalar::Str(s) => s.as_bytes().to_vec(),
            Scalar::Float(f) => f.to_be_bytes().to_vec(),
            Scalar::Bool(b) => vec![if *b { 0x01 } else { 0x00 }],
            Scalar::Bytes(b) => b.clone(),
        }
    }

    /// Parse a scalar out of a `serde_json::Value` leaf.
    ///
    /// Null and array/object values are rejected here; callers that want
    /// "null means no value" semantics (value extractors) filter nulls out
    /// before calling this, since `InvalidValue` is for genuinely
    /// unconvertible leaves, not absent ones.
    pub fn from_json(v: &serde_json::Value) -> Result<Scalar, EngineError> {
        match v {
            serde_json::Value::String(s) => Ok(Scalar::Str(s.clone())),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Scalar::Float)
                .ok_or_else(|| EngineError::InvalidValue(format!("number out of range: {n}"))),
            serde_json::Value::Bool(b) => Ok(Scalar::Bool(*b)),
            other => Err(EngineError::InvalidValue(format!(
                "cannot convert {other} to a scalar"
            ))),
        }
    }
}

impl Eq for Scalar {}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordering used by tests and by `Predicate::Range` bound validation. The
/// on-disk index order is defined by [`Scalar::encode`], not by this impl.
impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        self.encode().cmp(&other.encode())
    }
}

/// `mustParse` (spec §6): accept string/float64/bool literals supplied by
/// query predicate builders, reject anything else.
pub fn must_parse(v: &serde_json::Value) -> Result<Scalar, EngineError> {
    match v {
        serde_json::Value::String(_) | serde_json::Value::Number(_) | serde_json::Value::Bool(_) => {
            Scalar::from_json(v)
        }
        other => Err(EngineError::InvalidValue(format!(
            "invalid scalar literal: {other}"
        ))),
    }
}
