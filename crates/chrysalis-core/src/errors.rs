//! Unified error system for Chrysalis
//!
//! A single error enum covers the whole taxonomy: validation, translation,
//! storage, configuration, connection, timeout/abort, disposal, absence,
//! crypto integrity/authenticity, and rate limiting. Callers branch on the
//! variant or on `category()`; `is_retryable()` encodes the recovery policy.

use serde::{Deserialize, Serialize};

use crate::identifiers::CorrelationId;

/// Unified error type for all Chrysalis operations
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ChrysalisError {
    /// Native input failed a structural check
    #[error("Validation failed: {message}")]
    Validation {
        /// What failed and where (JSON field path when known)
        message: String,
        /// Dotted field path of the offending field, when known
        field_path: Option<String>,
    },

    /// Adapter could not produce canonical output or vice versa
    #[error("Translation failed: {message}")]
    Translation {
        /// Description of the failure
        message: String,
    },

    /// Store I/O or index failure
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the failure
        message: String,
    },

    /// Write raced with a concurrent snapshot; retry with a fresh version
    #[error("Temporal conflict: expected version {expected}, found {actual}")]
    TemporalConflict {
        /// Version the writer assumed
        expected: u64,
        /// Version actually present
        actual: u64,
    },

    /// Bad options or missing adapter
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the misconfiguration
        message: String,
    },

    /// Gossip peer unreachable
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection failure
        message: String,
    },

    /// Operation exceeded its deadline
    #[error("Operation timed out after {elapsed_ms}ms")]
    Timeout {
        /// Elapsed time before the deadline fired
        elapsed_ms: u64,
    },

    /// Operation was cancelled cooperatively
    #[error("Operation aborted")]
    Aborted,

    /// Component used after disposal
    #[error("Component disposed: {component}")]
    Disposed {
        /// Name of the disposed component
        component: String,
    },

    /// Explicit absence where the contract requires presence
    #[error("Not found: {message}")]
    NotFound {
        /// What was missing
        message: String,
    },

    /// AEAD tag or checksum mismatch. Fatal, never retried.
    #[error("Integrity failure: {message}")]
    IntegrityFail {
        /// Which integrity check failed
        message: String,
    },

    /// Signature verification failure. Fatal, never retried.
    #[error("Authenticity failure: {message}")]
    AuthenticityFail {
        /// Which signature check failed
        message: String,
    },

    /// Malformed restoration key
    #[error("Invalid restoration key: {message}")]
    InvalidKey {
        /// Why the key could not be parsed
        message: String,
    },

    /// Caller exceeded a rate limit
    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited {
        /// Suggested backoff
        retry_after_ms: u64,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the failure
        message: String,
    },

    /// Internal invariant violation
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure
        message: String,
    },
}

impl ChrysalisError {
    /// Create a validation error without a field path
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_path: None,
        }
    }

    /// Create a validation error pointing at a specific field
    pub fn validation_at(message: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_path: Some(field_path.into()),
        }
    }

    /// Create a translation error
    pub fn translation(message: impl Into<String>) -> Self {
        Self::Translation {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an integrity failure
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::IntegrityFail {
            message: message.into(),
        }
    }

    /// Create an authenticity failure
    pub fn authenticity(message: impl Into<String>) -> Self {
        Self::AuthenticityFail {
            message: message.into(),
        }
    }

    /// Create an invalid key error
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Create a disposed error
    pub fn disposed(component: impl Into<String>) -> Self {
        Self::Disposed {
            component: component.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the caller may retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TemporalConflict { .. }
                | Self::Connection { .. }
                | Self::Timeout { .. }
                | Self::Aborted
                | Self::RateLimited { .. }
        )
    }

    /// Error category as a stable string (used in events and metrics)
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Translation { .. } => "translation",
            Self::Storage { .. } => "storage",
            Self::TemporalConflict { .. } => "temporal_conflict",
            Self::Configuration { .. } => "configuration",
            Self::Connection { .. } => "connection",
            Self::Timeout { .. } => "timeout",
            Self::Aborted => "aborted",
            Self::Disposed { .. } => "disposed",
            Self::NotFound { .. } => "not_found",
            Self::IntegrityFail { .. } => "integrity_fail",
            Self::AuthenticityFail { .. } => "authenticity_fail",
            Self::InvalidKey { .. } => "invalid_key",
            Self::RateLimited { .. } => "rate_limited",
            Self::Serialization { .. } => "serialization",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Standard Result type for Chrysalis operations
pub type Result<T> = std::result::Result<T, ChrysalisError>;

/// Context record attached when an error crosses a component boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Component that surfaced the error ("store", "adapter:usa", ...)
    pub component: String,
    /// Operation in flight ("create_snapshot", "translate", ...)
    pub operation: String,
    /// Correlation id of the enclosing orchestrator operation
    pub correlation_id: Option<CorrelationId>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(component: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            operation: operation.into(),
            correlation_id: None,
        }
    }

    /// Attach a correlation id
    pub fn with_correlation(mut self, id: CorrelationId) -> Self {
        self.correlation_id = Some(id);
        self
    }
}

impl From<serde_json::Error> for ChrysalisError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for ChrysalisError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::storage(err.to_string()),
        }
    }
}

impl From<uuid::Error> for ChrysalisError {
    fn from(err: uuid::Error) -> Self {
        Self::validation(format!("UUID error: {}", err))
    }
}

impl From<hex::FromHexError> for ChrysalisError {
    fn from(err: hex::FromHexError) -> Self {
        Self::serialization(format!("Hex decoding error: {}", err))
    }
}

impl From<base64::DecodeError> for ChrysalisError {
    fn from(err: base64::DecodeError) -> Self {
        Self::serialization(format!("Base64 decoding error: {}", err))
    }
}
