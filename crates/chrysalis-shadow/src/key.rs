//! Restoration keys
//!
//! The pair (salt, auth-tag) serialized as `base64(salt):base64(tag)`.
//! The salt re-derives the encryption key from the agent fingerprint; the
//! tag copy binds the key to one specific envelope.

use chrysalis_core::errors::{ChrysalisError, Result};
use chrysalis_core::util::{from_base64, to_base64};

/// The caller-held secret needed to open a shadow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestorationKey {
    /// PBKDF2 salt
    pub salt: Vec<u8>,
    /// Copy of the envelope's AEAD tag
    pub tag: Vec<u8>,
}

impl RestorationKey {
    /// Construct from raw parts
    pub fn new(salt: Vec<u8>, tag: Vec<u8>) -> Self {
        Self { salt, tag }
    }

    /// Serialize as `base64(salt):base64(tag)`
    pub fn encode(&self) -> String {
        format!("{}:{}", to_base64(&self.salt), to_base64(&self.tag))
    }

    /// Parse the ASCII form; a missing `:` is an `InvalidKey` error
    pub fn parse(encoded: &str) -> Result<Self> {
        let (salt_part, tag_part) = encoded
            .split_once(':')
            .ok_or_else(|| ChrysalisError::invalid_key("missing ':' separator"))?;
        let salt = from_base64(salt_part)
            .map_err(|_| ChrysalisError::invalid_key("salt is not valid base64"))?;
        let tag = from_base64(tag_part)
            .map_err(|_| ChrysalisError::invalid_key("tag is not valid base64"))?;
        if salt.is_empty() || tag.is_empty() {
            return Err(ChrysalisError::invalid_key("empty salt or tag"));
        }
        Ok(Self { salt, tag })
    }
}

impl std::fmt::Display for RestorationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}
