//! AES-256-GCM authenticated encryption
//!
//! The envelope keeps ciphertext, IV, and tag as separate fields because
//! the restoration key carries a copy of the tag and the signature covers
//! all three. Tag mismatch on decrypt is an `IntegrityFail`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::keys::Key32;
use crate::errors::{ChrysalisError, Result};

/// IV length for AES-GCM (96 bits)
pub const IV_LEN: usize = 12;

/// Authentication tag length (128 bits)
pub const TAG_LEN: usize = 16;

/// Output of authenticated encryption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherEnvelope {
    /// Ciphertext without the tag
    #[serde(with = "crate::util::base64_bytes")]
    pub ciphertext: Vec<u8>,
    /// Random 96-bit IV
    #[serde(with = "crate::util::base64_bytes")]
    pub iv: Vec<u8>,
    /// 128-bit GCM authentication tag
    #[serde(with = "crate::util::base64_bytes")]
    pub tag: Vec<u8>,
}

/// Encrypt plaintext under a 256-bit key with a random IV
pub fn encrypt(plaintext: &[u8], key: &Key32) -> Result<CipherEnvelope> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let mut combined = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| ChrysalisError::internal("AEAD encryption failed"))?;

    // aes-gcm appends the tag to the ciphertext
    let tag = combined.split_off(combined.len() - TAG_LEN);
    Ok(CipherEnvelope {
        ciphertext: combined,
        iv: iv.to_vec(),
        tag,
    })
}

/// Decrypt an envelope, verifying the authentication tag
pub fn decrypt(envelope: &CipherEnvelope, key: &Key32) -> Result<Vec<u8>> {
    if envelope.iv.len() != IV_LEN {
        return Err(ChrysalisError::integrity("malformed IV"));
    }
    if envelope.tag.len() != TAG_LEN {
        return Err(ChrysalisError::integrity("malformed auth tag"));
    }
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let mut combined = envelope.ciphertext.clone();
    combined.extend_from_slice(&envelope.tag);
    cipher
        .decrypt(Nonce::from_slice(&envelope.iv), combined.as_slice())
        .map_err(|_| ChrysalisError::integrity("AEAD tag mismatch"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::fingerprint;
    use crate::crypto::keys::{derive_key, MIN_PBKDF2_ITERATIONS, SALT_LEN};

    fn test_key(seed: u8) -> Key32 {
        let fp = fingerprint("atlas", "researcher", seed as u64, "a");
        derive_key(&fp, &[seed; SALT_LEN], MIN_PBKDF2_ITERATIONS).unwrap()
    }

    #[test]
    fn round_trip() {
        let key = test_key(1);
        let env = encrypt(b"secret payload", &key).unwrap();
        assert_eq!(decrypt(&env, &key).unwrap(), b"secret payload");
    }

    #[test]
    fn tampered_ciphertext_fails_integrity() {
        let key = test_key(1);
        let mut env = encrypt(b"secret payload", &key).unwrap();
        env.ciphertext[0] ^= 0xff;
        let err = decrypt(&env, &key).unwrap_err();
        assert!(matches!(err, ChrysalisError::IntegrityFail { .. }));
    }

    #[test]
    fn wrong_key_fails_integrity() {
        let env = encrypt(b"secret payload", &test_key(1)).unwrap();
        let err = decrypt(&env, &test_key(2)).unwrap_err();
        assert!(matches!(err, ChrysalisError::IntegrityFail { .. }));
    }

    #[test]
    fn ivs_are_unique_per_encryption() {
        let key = test_key(1);
        let a = encrypt(b"x", &key).unwrap();
        let b = encrypt(b"x", &key).unwrap();
        assert_ne!(a.iv, b.iv);
    }
}
