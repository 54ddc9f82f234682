//! Shadow lifecycle state machine
//!
//! `Absent → Embedded → (Verified | Rejected) → Opened`. Verified and
//! Opened are reachable only through Embedded with the signature and AEAD
//! checks passing; transitions out of order are internal errors.

use serde::{Deserialize, Serialize};

use chrysalis_core::errors::{ChrysalisError, Result};

/// Lifecycle position of a shadow within a target agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowState {
    /// No shadow embedded
    Absent,
    /// Envelope embedded, not yet checked
    Embedded,
    /// Signature and AEAD checks passed
    Verified,
    /// A check failed; terminal
    Rejected,
    /// Body decrypted and returned
    Opened,
}

impl ShadowState {
    fn illegal(self, to: &str) -> ChrysalisError {
        ChrysalisError::internal(format!("illegal shadow transition {:?} -> {}", self, to))
    }

    /// Embed an envelope
    pub fn embed(self) -> Result<Self> {
        match self {
            ShadowState::Absent => Ok(ShadowState::Embedded),
            other => Err(other.illegal("Embedded")),
        }
    }

    /// Record a passing verification
    pub fn verify_ok(self) -> Result<Self> {
        match self {
            ShadowState::Embedded => Ok(ShadowState::Verified),
            other => Err(other.illegal("Verified")),
        }
    }

    /// Record a failing verification
    pub fn reject(self) -> Result<Self> {
        match self {
            ShadowState::Embedded => Ok(ShadowState::Rejected),
            other => Err(other.illegal("Rejected")),
        }
    }

    /// Open a verified shadow
    pub fn open(self) -> Result<Self> {
        match self {
            ShadowState::Verified => Ok(ShadowState::Opened),
            other => Err(other.illegal("Opened")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_opened() {
        let state = ShadowState::Absent
            .embed()
            .and_then(ShadowState::verify_ok)
            .and_then(ShadowState::open)
            .unwrap();
        assert_eq!(state, ShadowState::Opened);
    }

    #[test]
    fn rejected_is_terminal() {
        let state = ShadowState::Absent.embed().and_then(ShadowState::reject).unwrap();
        assert!(state.open().is_err());
        assert!(state.verify_ok().is_err());
    }

    #[test]
    fn open_requires_verification() {
        let state = ShadowState::Absent.embed().unwrap();
        assert!(state.open().is_err());
    }

    #[test]
    fn cannot_embed_twice() {
        let state = ShadowState::Absent.embed().unwrap();
        assert!(state.embed().is_err());
    }
}
