//! SHA-256 content hashing and agent fingerprints
//!
//! The fingerprint anchors an agent's cryptographic identity: the same
//! identity tuple always produces the same 32-byte digest, bit-identical
//! across platforms. Inputs are UTF-8, integers are big-endian, and every
//! field is length-prefixed so no two tuples can collide by concatenation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 256-bit content hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash32(pub [u8; 32]);

impl Hash32 {
    /// Raw bytes of the digest
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from lowercase hex
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| crate::ChrysalisError::validation("hash must be 32 bytes"))?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Hash32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Hash arbitrary bytes to a 32-byte SHA-256 digest
pub fn hash(data: &[u8]) -> Hash32 {
    let digest = Sha256::digest(data);
    Hash32(digest.into())
}

const FINGERPRINT_DOMAIN: &[u8] = b"CHRYSALIS_AGENT_FINGERPRINT_V1";

/// Compute the identity fingerprint of an agent
///
/// The tuple (name, designation, created-at, id) is hashed with a domain
/// prefix and per-field length framing. `created_at_ms` is encoded
/// big-endian.
pub fn fingerprint(name: &str, designation: &str, created_at_ms: u64, id: &str) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(FINGERPRINT_DOMAIN);
    for field in [name.as_bytes(), designation.as_bytes()] {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field);
    }
    hasher.update(8u64.to_be_bytes());
    hasher.update(created_at_ms.to_be_bytes());
    hasher.update((id.len() as u64).to_be_bytes());
    hasher.update(id.as_bytes());
    Hash32(hasher.finalize().into())
}
