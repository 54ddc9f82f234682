//! Ed25519 signing for shadow envelope authenticity

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

/// An Ed25519 keypair used to sign shadow envelopes
///
/// The private half stays with the party that builds shadows; consumers
/// verify with the public half.
pub struct SigningKeyPair {
    signing: SigningKey,
}

impl SigningKeyPair {
    /// Generate a fresh keypair from OS randomness
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }

    /// Reconstruct from 32 secret bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(bytes),
        }
    }

    /// The public verification key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing.sign(message)
    }
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningKeyPair({})", hex::encode(self.verifying_key().as_bytes()))
    }
}

/// Sign a message with a keypair
pub fn sign(message: &[u8], keypair: &SigningKeyPair) -> Signature {
    keypair.sign(message)
}

/// Verify a signature against a public key
pub fn verify(message: &[u8], signature: &Signature, key: &VerifyingKey) -> bool {
    key.verify(message, signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let pair = SigningKeyPair::generate();
        let sig = sign(b"envelope bytes", &pair);
        assert!(verify(b"envelope bytes", &sig, &pair.verifying_key()));
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let pair = SigningKeyPair::generate();
        let sig = sign(b"envelope bytes", &pair);
        assert!(!verify(b"envelope byteZ", &sig, &pair.verifying_key()));
    }

    #[test]
    fn verify_rejects_foreign_key() {
        let pair = SigningKeyPair::generate();
        let other = SigningKeyPair::generate();
        let sig = sign(b"envelope bytes", &pair);
        assert!(!verify(b"envelope bytes", &sig, &other.verifying_key()));
    }

    #[test]
    fn keypair_is_recoverable_from_bytes() {
        let pair = SigningKeyPair::generate();
        let restored = SigningKeyPair::from_bytes(&pair.signing.to_bytes());
        assert_eq!(
            pair.verifying_key().as_bytes(),
            restored.verifying_key().as_bytes()
        );
    }
}
