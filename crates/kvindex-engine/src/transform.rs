use regex::Regex;
use std::sync::LazyLock;

use crate::scalar::Scalar;

/// Splits one scalar into many. Only applied to [`Scalar::Str`]; other
/// variants pass through as a singleton (spec §4.3).
pub type Tokenizer = fn(&Scalar) -> Vec<Scalar>;

/// Applied to every scalar a tokenizer produces, and to a query predicate's
/// bound before it is compared against an indexed value (spec §3, §4.4).
pub type Transformer = fn(&Scalar) -> Scalar;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").unwrap());

/// Splits a string scalar on contiguous non-whitespace runs. Non-string
/// scalars pass through unchanged.
pub fn whitespace_tokenizer(scalar: &Scalar) -> Vec<Scalar> {
    match scalar {
        Scalar::Str(s) => WHITESPACE_RUN
            .find_iter(s)
            .map(|m| Scalar::Str(m.as_str().to_string()))
            .collect(),
        other => vec![other.clone()],
    }
}

/// Unicode lowercase for string scalars; identity for everything else.
pub fn to_lower(scalar: &Scalar) -> Scalar {
    match scalar {
        Scalar::Str(s) => Scalar::Str(s.to_lowercase()),
        other => other.clone(),
    }
}

/// Apply an optional tokenizer then an optional transformer to one raw
/// scalar, in the order spec §4.3 requires (tokenize, then transform each
/// result).
pub fn apply(scalar: Scalar, tokenizer: Option<Tokenizer>, transformer: Option<Transformer>) -> Vec<Scalar> {
    let tokenized = match tokenizer {
        Some(t) => t(&scalar),
        None => vec![scalar],
    };
    match transformer {
        Some(tr) => tokenized.iter().map(tr).collect(),
        None => tokenized,
    }
}
