//! PBKDF2 key derivation for shadow envelopes
//!
//! The restoration key pairs a random salt with the AEAD tag; the actual
//! encryption key is re-derived from (fingerprint, salt) on demand and
//! never stored. Derivation must be deterministic across platforms.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::hash::Hash32;
use crate::errors::{ChrysalisError, Result};

/// Minimum PBKDF2 iteration count accepted by `derive_key`
pub const MIN_PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// A 256-bit symmetric key, zeroized on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key32(pub [u8; 32]);

impl Key32 {
    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for Key32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        write!(f, "Key32(..)")
    }
}

/// Generate a random salt for key derivation
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 256-bit key from an agent fingerprint and salt
///
/// PBKDF2-HMAC-SHA256. The same (fingerprint, salt, iterations) always
/// yields the same key. Iteration counts below the floor are refused.
pub fn derive_key(fingerprint: &Hash32, salt: &[u8], iterations: u32) -> Result<Key32> {
    if iterations < MIN_PBKDF2_ITERATIONS {
        return Err(ChrysalisError::configuration(format!(
            "pbkdf2 iterations {} below the {} floor",
            iterations, MIN_PBKDF2_ITERATIONS
        )));
    }
    if salt.is_empty() {
        return Err(ChrysalisError::configuration("empty key derivation salt"));
    }
    let mut out = [0u8; 32];
    pbkdf2_hmac::<Sha256>(fingerprint.as_bytes(), salt, iterations, &mut out);
    Ok(Key32(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::fingerprint;

    #[test]
    fn derivation_is_deterministic() {
        let fp = fingerprint("atlas", "researcher", 1, "a");
        let salt = [7u8; SALT_LEN];
        let k1 = derive_key(&fp, &salt, MIN_PBKDF2_ITERATIONS).unwrap();
        let k2 = derive_key(&fp, &salt, MIN_PBKDF2_ITERATIONS).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn different_salt_different_key() {
        let fp = fingerprint("atlas", "researcher", 1, "a");
        let k1 = derive_key(&fp, &[1u8; SALT_LEN], MIN_PBKDF2_ITERATIONS).unwrap();
        let k2 = derive_key(&fp, &[2u8; SALT_LEN], MIN_PBKDF2_ITERATIONS).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn iteration_floor_enforced() {
        let fp = fingerprint("atlas", "researcher", 1, "a");
        let err = derive_key(&fp, &[1u8; SALT_LEN], 99_999).unwrap_err();
        assert!(matches!(err, ChrysalisError::Configuration { .. }));
    }

    #[test]
    fn debug_never_leaks_key_bytes() {
        let fp = fingerprint("atlas", "researcher", 1, "a");
        let key = derive_key(&fp, &[1u8; SALT_LEN], MIN_PBKDF2_ITERATIONS).unwrap();
        assert_eq!(format!("{:?}", key), "Key32(..)");
    }
}
