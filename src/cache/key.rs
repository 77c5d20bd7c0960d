//! Deterministic cache-key derivation.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

/// Derive a cache key from a resource kind and its parameters.
///
/// Parameters are canonicalized by key-sorting before hashing, so the
/// same parameter set always maps to the same key regardless of
/// construction order. Later duplicates of a parameter name win.
pub fn derive_cache_key(kind: &str, params: &[(String, String)]) -> String {
    let canonical: BTreeMap<&str, &str> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b"\0");
    // BTreeMap serializes in key order, giving a canonical encoding.
    hasher.update(serde_json::to_string(&canonical).unwrap_or_default());

    format!("{}:{:x}", kind, hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_order_independent() {
        let a = derive_cache_key("schools", &params(&[("division", "1"), ("sport", "2")]));
        let b = derive_cache_key("schools", &params(&[("sport", "2"), ("division", "1")]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_values_differ() {
        let a = derive_cache_key("schools", &params(&[("division", "1")]));
        let b = derive_cache_key("schools", &params(&[("division", "2")]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_kind_is_part_of_key() {
        let a = derive_cache_key("schools", &[]);
        let b = derive_cache_key("conferences", &[]);
        assert_ne!(a, b);
        assert!(a.starts_with("schools:"));
    }

    #[test]
    fn test_empty_params_stable() {
        assert_eq!(derive_cache_key("k", &[]), derive_cache_key("k", &[]));
    }
}
