//! # Chrysalis Shadow Envelopes
//!
//! A shadow is an encrypted, signed envelope embedded in a translated
//! agent, carrying everything the target framework could not express: the
//! source's unmapped fields, the original document byte-for-byte, and the
//! canonical representation. Given the restoration key (salt and tag) and
//! the signer's public key, the source agent is reconstructed exactly.
//!
//! Integrity failures (tag or checksum mismatch) and authenticity failures
//! (bad signature) are fatal and never retried.

#![forbid(unsafe_code)]

pub mod envelope;
pub mod key;
pub mod state;

pub use envelope::{
    build, open, strip, verify_embedded, ShadowEnvelope, ShadowMetadata, SHADOW_SCHEMA_VERSION,
};
pub use key::RestorationKey;
pub use state::ShadowState;
