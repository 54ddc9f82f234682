//! Cryptographic primitives for content addressing and shadow envelopes
//!
//! Everything here is deterministic (hashing, fingerprinting, key
//! derivation) or explicitly seeded with OS randomness (IVs, salts,
//! signing keys). Integrity and authenticity failures are fatal: callers
//! must never retry them.

pub mod aead;
pub mod hash;
pub mod keys;
pub mod signing;

pub use aead::{decrypt, encrypt, CipherEnvelope};
pub use hash::{fingerprint, hash, Hash32};
pub use keys::{derive_key, generate_salt, Key32, MIN_PBKDF2_ITERATIONS, SALT_LEN};
pub use signing::{sign, verify, SigningKeyPair};
