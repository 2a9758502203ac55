/// Delimiter separating composite-key components. A control character that
/// does not occur in normal JSON string content; the codec does not escape
/// it, so a string scalar containing this byte will be mis-split on read
/// back (spec §4.1, accepted as a known limitation).
pub const DELIMITER: u8 = 0x10;

/// The absent-value sentinel: the empty byte sequence, used as a
/// composite-key component when a document has no value at an indexer's
/// path. Distinguishable from any non-empty encoded scalar.
pub const ABSENT: &[u8] = &[];

/// Concatenate already-encoded components into one composite key, joined by
/// [`DELIMITER`]. An empty `prefix` with a single additional component
/// yields that component verbatim (no leading delimiter).
pub fn compose(prefix: &[u8], component: &[u8]) -> Vec<u8> {
    if prefix.is_empty() {
        return component.to_vec();
    }
    let mut out = Vec::with_capacity(prefix.len() + 1 + component.len());
    out.extend_from_slice(prefix);
    out.push(DELIMITER);
    out.extend_from_slice(component);
    out
}

/// Split a composite key into its components. A key with `n - 1`
/// delimiters yields `n` components; an empty component (leading, trailing,
/// or between two delimiters) is preserved as the empty slice.
pub fn split(key: &[u8]) -> Vec<&[u8]> {
    key.split(|&b| b == DELIMITER).collect()
}

/// The component at `depth` in a composite key, if the key has that many
/// components. Used by the cursor walk to read back the value at the
/// current recursion level without re-splitting the whole key each time.
pub fn component_at(key: &[u8], depth: usize) -> Option<&[u8]> {
    split(key).into_iter().nth(depth)
}

/// Smallest byte sequence guaranteed to sort after every key sharing
/// `prefix`, used to jump the cursor past a prefix region whose condition
/// just failed (spec §4.4: "seeking to `P ⨁ 0xFFFFFFFF`").
pub fn prefix_upper_bound(prefix: &[u8]) -> Vec<u8> {
    let mut out = prefix.to_vec();
    out.push(DELIMITER);
    out.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
    out
}

/// The physical bucket key for one reference entry under composite key
/// `composite`: `composite ++ 0x10 ++ reference` (spec §6). Unlike
/// [`compose`], the delimiter is always inserted, even when `composite` is
/// itself empty (an indexer list whose sole level is absent), since this is
/// the final framing between the composite key and the reference, not a
/// join between two key components.
pub fn leaf_key(composite: &[u8], reference: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(composite.len() + 1 + reference.len());
    out.extend_from_slice(composite);
    out.push(DELIMITER);
    out.extend_from_slice(reference);
    out
}

/// Prefix that bounds the sub-bucket of references stored under composite
/// key `composite` ("opening the sub-bucket at K", spec §4.4). Every key
/// written by [`leaf_key`] for this `composite` starts with this prefix, and
/// no key for a different composite does.
pub fn sub_bucket_prefix(composite: &[u8]) -> Vec<u8> {
    let mut out = composite.to_vec();
    out.push(DELIMITER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_then_split_round_trips() {
        let k1 = compose(b"", b"a");
        let k2 = compose(&k1, b"b");
        let k3 = compose(&k2, b"c");
        assert_eq!(split(&k3), vec![b"a".as_slice(), b"b", b"c"]);
    }

    #[test]
    fn empty_leading_key_yields_component_verbatim() {
        assert_eq!(compose(b"", b"only"), b"only".to_vec());
    }

    #[test]
    fn empty_components_preserved() {
        let k = compose(&compose(b"", ABSENT), b"x");
        assert_eq!(split(&k), vec![ABSENT, b"x"]);
    }

    #[test]
    fn component_at_reads_by_depth() {
        let k = compose(&compose(b"", b"a"), b"b");
        assert_eq!(component_at(&k, 0), Some(b"a".as_slice()));
        assert_eq!(component_at(&k, 1), Some(b"b".as_slice()));
        assert_eq!(component_at(&k, 2), None);
    }

    #[test]
    fn prefix_upper_bound_sorts_after_all_children() {
        let prefix = compose(b"", b"a");
        let child1 = compose(&prefix, b"b");
        let child2 = compose(&prefix, &[0xFF]);
        let bound = prefix_upper_bound(&prefix);
        assert!(bound > child1);
        assert!(bound > child2);
    }

    #[test]
    fn leaf_key_starts_with_sub_bucket_prefix() {
        let composite = compose(&compose(b"", b"a"), b"b");
        let leaf = leaf_key(&composite, b"ref1");
        assert!(leaf.starts_with(&sub_bucket_prefix(&composite)));
    }

    #[test]
    fn leaf_key_on_empty_composite_still_has_delimiter() {
        let leaf = leaf_key(b"", b"ref1");
        let mut expected = vec![DELIMITER];
        expected.extend_from_slice(b"ref1");
        assert_eq!(leaf, expected);
    }
}
