//! Building, verifying, and opening shadow envelopes

use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use chrysalis_adapters::paths::{get_path, remove_path, set_path};
use chrysalis_adapters::AgentAdapter;
use chrysalis_core::config::CryptoConfig;
use chrysalis_core::crypto::{
    decrypt, derive_key, encrypt, fingerprint, generate_salt, hash, CipherEnvelope, Hash32,
    SigningKeyPair,
};
use chrysalis_core::errors::{ChrysalisError, Result};
use chrysalis_core::identifiers::FrameworkTag;
use chrysalis_core::model::{CanonicalAgent, NativeAgent};
use chrysalis_core::time::Timestamp;
use chrysalis_core::util::canonical_json_bytes;

use crate::key::RestorationKey;

/// Wire schema version of the envelope
pub const SHADOW_SCHEMA_VERSION: u16 = 1;

/// AEAD algorithm identifier recorded in the envelope
pub const SHADOW_ALGORITHM: &str = "AES-256-GCM";

/// Cleartext metadata carried alongside the ciphertext
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowMetadata {
    /// Framework the original agent came from
    pub source_framework: FrameworkTag,
    /// When the shadow was built
    pub created_at: Timestamp,
    /// SHA-256 over the plaintext body
    pub checksum: Hash32,
    /// Agent identity fingerprint the key derives from
    pub fingerprint: Hash32,
    /// Envelope schema version
    pub schema_version: u16,
}

/// The embedded envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowEnvelope {
    /// AEAD algorithm name
    pub algorithm: String,
    /// Ciphertext, IV, and tag
    #[serde(flatten)]
    pub cipher: CipherEnvelope,
    /// Ed25519 signature over ciphertext ∥ iv ∥ tag ∥ fingerprint
    #[serde(with = "chrysalis_core::util::base64_bytes")]
    pub signature: Vec<u8>,
    /// Cleartext metadata
    pub metadata: ShadowMetadata,
}

/// Plaintext under the derived key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ShadowBody {
    source_framework: FrameworkTag,
    unmapped_fields: serde_json::Map<String, Value>,
    original_agent: Value,
    canonical: CanonicalAgent,
}

fn signed_payload(cipher: &CipherEnvelope, fp: &Hash32) -> Vec<u8> {
    let mut payload =
        Vec::with_capacity(cipher.ciphertext.len() + cipher.iv.len() + cipher.tag.len() + 32);
    payload.extend_from_slice(&cipher.ciphertext);
    payload.extend_from_slice(&cipher.iv);
    payload.extend_from_slice(&cipher.tag);
    payload.extend_from_slice(fp.as_bytes());
    payload
}

fn identity_fingerprint(canonical: &CanonicalAgent) -> Hash32 {
    use chrysalis_core::model::namespaces::ontology;
    let name = canonical.literal_value(ontology::NAME).unwrap_or_default();
    let designation = canonical
        .literal_value(ontology::DESIGNATION)
        .unwrap_or_default();
    fingerprint(
        name,
        designation,
        canonical.metadata.translated_at.as_millis(),
        canonical.id.as_str(),
    )
}

/// Build a shadow for a translation and embed it in the target
///
/// The plaintext body combines the source's nonmappable fields, the
/// original document verbatim, and the canonical representation. Returns
/// the target with the envelope attached plus the restoration key.
pub fn build(
    source_adapter: &dyn AgentAdapter,
    target_adapter: &dyn AgentAdapter,
    source: &NativeAgent,
    canonical: &CanonicalAgent,
    mut target: NativeAgent,
    signing_key: &SigningKeyPair,
    crypto: &CryptoConfig,
) -> Result<(NativeAgent, RestorationKey)> {
    if !target_adapter.supports_shadow() {
        return Err(ChrysalisError::configuration(format!(
            "adapter '{}' does not support shadow embedding",
            target_adapter.name()
        )));
    }

    let body = ShadowBody {
        source_framework: source.framework.clone(),
        unmapped_fields: source_adapter.nonmappable(source)?,
        original_agent: source.document.clone(),
        canonical: canonical.clone(),
    };
    let body_bytes = canonical_json_bytes(&serde_json::to_value(&body)?)?;
    let checksum = hash(&body_bytes);

    let fp = identity_fingerprint(canonical);
    let salt = generate_salt();
    let key = derive_key(&fp, &salt, crypto.pbkdf2_iterations)?;
    let cipher = encrypt(&body_bytes, &key)?;

    let signature = signing_key.sign(&signed_payload(&cipher, &fp));

    let restoration_key = RestorationKey::new(salt.to_vec(), cipher.tag.clone());
    let envelope = ShadowEnvelope {
        algorithm: SHADOW_ALGORITHM.to_string(),
        cipher,
        signature: signature.to_bytes().to_vec(),
        metadata: ShadowMetadata {
            source_framework: source.framework.clone(),
            created_at: Timestamp::now(),
            checksum,
            fingerprint: fp,
            schema_version: SHADOW_SCHEMA_VERSION,
        },
    };

    set_path(
        &mut target.document,
        target_adapter.shadow_attachment_path(),
        serde_json::to_value(&envelope)?,
    );
    debug!(framework = %target.framework, "embedded shadow envelope");
    Ok((target, restoration_key))
}

fn extract(target: &NativeAgent, attachment_path: &str) -> Result<ShadowEnvelope> {
    let raw = get_path(&target.document, attachment_path)
        .ok_or_else(|| ChrysalisError::not_found("no shadow embedded in target agent"))?;
    let envelope: ShadowEnvelope = serde_json::from_value(raw.clone())?;
    if envelope.metadata.schema_version != SHADOW_SCHEMA_VERSION {
        return Err(ChrysalisError::validation(format!(
            "unknown shadow schema version {}",
            envelope.metadata.schema_version
        )));
    }
    Ok(envelope)
}

fn check_signature(envelope: &ShadowEnvelope, verifying_key: &VerifyingKey) -> Result<()> {
    let signature = Signature::from_slice(&envelope.signature)
        .map_err(|_| ChrysalisError::authenticity("malformed signature"))?;
    let payload = signed_payload(&envelope.cipher, &envelope.metadata.fingerprint);
    if !chrysalis_core::crypto::verify(&payload, &signature, verifying_key) {
        return Err(ChrysalisError::authenticity("shadow signature mismatch"));
    }
    Ok(())
}

/// Verify an embedded shadow's signature without opening it
pub fn verify_embedded(
    target: &NativeAgent,
    target_adapter: &dyn AgentAdapter,
    verifying_key: &VerifyingKey,
) -> Result<()> {
    let envelope = extract(target, target_adapter.shadow_attachment_path())?;
    check_signature(&envelope, verifying_key)
}

/// Open a shadow and return the original source agent byte-for-byte
///
/// Authenticity is checked before any decryption; the restoration key's
/// tag copy, the AEAD tag, and the body checksum must all agree.
pub fn open(
    target: &NativeAgent,
    target_adapter: &dyn AgentAdapter,
    restoration_key: &RestorationKey,
    verifying_key: &VerifyingKey,
    crypto: &CryptoConfig,
) -> Result<NativeAgent> {
    let envelope = extract(target, target_adapter.shadow_attachment_path())?;
    check_signature(&envelope, verifying_key)?;

    if restoration_key.tag != envelope.cipher.tag {
        return Err(ChrysalisError::integrity(
            "restoration key does not match this envelope",
        ));
    }

    let key = derive_key(
        &envelope.metadata.fingerprint,
        &restoration_key.salt,
        crypto.pbkdf2_iterations,
    )?;
    let body_bytes = decrypt(&envelope.cipher, &key)?;

    if hash(&body_bytes) != envelope.metadata.checksum {
        return Err(ChrysalisError::integrity("shadow body checksum mismatch"));
    }

    let body: ShadowBody = serde_json::from_slice(&body_bytes)?;
    Ok(NativeAgent::new(body.source_framework, body.original_agent))
}

/// Remove an embedded shadow from a target document
pub fn strip(target: &mut NativeAgent, target_adapter: &dyn AgentAdapter) -> bool {
    remove_path(&mut target.document, target_adapter.shadow_attachment_path()).is_some()
}
