//! Plan fingerprints
//!
//! Two runs of the simulator with identical inputs must produce bit-identical
//! plans. A SHA-256 over the canonical JSON form makes that cheap to check and
//! to log.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Compute a deterministic SHA-256 hex digest of any serializable value
///
/// Object keys are sorted recursively before hashing, so the digest does not
/// depend on map iteration order.
pub fn compute_fingerprint<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let canonical = canonicalize(serde_json::to_value(value)?);
    let json = serde_json::to_string(&canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_fingerprint_ignores_map_order() {
        let mut a = HashMap::new();
        a.insert("x", 1);
        a.insert("y", 2);
        let mut b = HashMap::new();
        b.insert("y", 2);
        b.insert("x", 1);
        assert_eq!(compute_fingerprint(&a).unwrap(), compute_fingerprint(&b).unwrap());
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let digest = compute_fingerprint(&vec![1, 2, 3]).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
