//! Small shared helpers: canonical JSON bytes and base64 serde adapters

use serde::{Deserialize, Deserializer, Serializer};

use crate::errors::Result;

/// Serialize a JSON value to canonical bytes
///
/// `serde_json`'s map type is BTreeMap-backed (the `preserve_order`
/// feature is off in this workspace), so object keys serialize in sorted
/// order and the output is stable for hashing and cache keys.
pub fn canonical_json_bytes(value: &serde_json::Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Canonical JSON as a string, for diffs and logging
pub fn canonical_json_string(value: &serde_json::Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Serde adapter encoding `Vec<u8>` as standard base64 strings
pub mod base64_bytes {
    use super::*;
    use base64::Engine;

    /// Serialize bytes as base64
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    /// Deserialize base64 into bytes
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Encode bytes as standard base64
pub fn to_base64(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode standard base64
pub fn from_base64(s: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    Ok(base64::engine::general_purpose::STANDARD.decode(s.as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_bytes_sort_object_keys() {
        let a: serde_json::Value = serde_json::from_str(r#"{"b":1,"a":2}"#).unwrap();
        let b: serde_json::Value = serde_json::from_str(r#"{"a":2,"b":1}"#).unwrap();
        assert_eq!(
            canonical_json_bytes(&a).unwrap(),
            canonical_json_bytes(&b).unwrap()
        );
    }

    #[test]
    fn canonical_bytes_sort_nested_keys() {
        let v = json!({"outer": {"z": 1, "a": 2}});
        assert_eq!(
            canonical_json_string(&v).unwrap(),
            r#"{"outer":{"a":2,"z":1}}"#
        );
    }

    #[test]
    fn base64_round_trip() {
        let bytes = vec![0u8, 1, 2, 255];
        assert_eq!(from_base64(&to_base64(&bytes)).unwrap(), bytes);
    }
}
