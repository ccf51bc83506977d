/*!
 * Error Handling for QaSa Composite Cryptography
 *
 * Provides the typed failures surfaced by hybrid and composite operations,
 * with error codes, user-friendly messages and suggested remediation.
 */

use std::collections::HashMap;
use thiserror::Error;

/// Error type for all hybrid and composite operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Configuration error: {item} - {cause}")]
    ConfigurationError {
        item: String,
        cause: String,
        error_code: u32,
    },

    #[error("Allocation error: {what} - {cause}")]
    AllocationError {
        what: String,
        cause: String,
        error_code: u32,
    },

    #[error("Encoding error: {what} - {cause}")]
    EncodingError {
        what: String,
        cause: String,
        error_code: u32,
    },

    #[error("Key recreation failed for slot {slot}: {cause}")]
    KeyRecreateError {
        slot: usize,
        cause: String,
        error_code: u32,
    },

    #[error("Buffer too small: {buffer} needs {required} bytes, got {provided}")]
    BufferTooSmall {
        buffer: String,
        required: usize,
        provided: usize,
        error_code: u32,
    },

    #[error("Adapter failure: {adapter} {operation} - {cause}")]
    AdapterFailure {
        adapter: String,
        operation: String,
        cause: String,
        error_code: u32,
        context: HashMap<String, String>,
    },

    #[error("Composite signature verification failed for {algorithm}")]
    CompositeVerifyFailure { algorithm: String, error_code: u32 },
}

/// Error code constants for different error categories
pub mod error_codes {
    // Configuration errors: 1000-1999
    pub const UNKNOWN_ALGORITHM: u32 = 1001;
    pub const MISSING_ADAPTER: u32 = 1002;
    pub const WRONG_KEY_KIND: u32 = 1003;
    pub const CONTEXT_NOT_INITIALIZED: u32 = 1004;
    pub const MISSING_KEY_MATERIAL: u32 = 1005;
    pub const PUBLIC_KEY_ALREADY_SET: u32 = 1006;

    // Allocation errors: 2000-2999
    pub const UNKNOWN_SLOT_LENGTH: u32 = 2001;
    pub const LENGTH_OVERFLOW: u32 = 2002;

    // Encoding errors: 3000-3999
    pub const MALFORMED_KEY: u32 = 3001;
    pub const MALFORMED_CIPHERTEXT: u32 = 3002;
    pub const MALFORMED_SIGNATURE: u32 = 3003;
    pub const DER_DECODE_FAILED: u32 = 3004;
    pub const DER_ENCODE_FAILED: u32 = 3005;

    // Key recreation errors: 4000-4999
    pub const CLASSICAL_DECODE_FAILED: u32 = 4001;
    pub const CLASSICAL_SIZE_MISMATCH: u32 = 4002;
    pub const PUBLIC_KEY_MISMATCH: u32 = 4003;

    // Buffer errors: 5000-5999
    pub const OUTPUT_BUFFER_TOO_SMALL: u32 = 5001;

    // Adapter errors: 6000-6999
    pub const CLASSICAL_KEYGEN_FAILED: u32 = 6001;
    pub const CLASSICAL_SIGN_FAILED: u32 = 6002;
    pub const CLASSICAL_DERIVE_FAILED: u32 = 6003;
    pub const PQC_KEYGEN_FAILED: u32 = 6101;
    pub const PQC_SIGN_FAILED: u32 = 6102;
    pub const PQC_ENCAPSULATION_FAILED: u32 = 6103;
    pub const PQC_DECAPSULATION_FAILED: u32 = 6104;
    pub const PQC_LIBRARY_ERROR: u32 = 6199;

    // Verification errors: 7000-7999
    pub const SIGNATURE_INVALID: u32 = 7001;
}

impl CryptoError {
    /// Get the numeric error code for this error
    pub fn error_code(&self) -> u32 {
        match self {
            CryptoError::ConfigurationError { error_code, .. } => *error_code,
            CryptoError::AllocationError { error_code, .. } => *error_code,
            CryptoError::EncodingError { error_code, .. } => *error_code,
            CryptoError::KeyRecreateError { error_code, .. } => *error_code,
            CryptoError::BufferTooSmall { error_code, .. } => *error_code,
            CryptoError::AdapterFailure { error_code, .. } => *error_code,
            CryptoError::CompositeVerifyFailure { error_code, .. } => *error_code,
        }
    }

    /// Get a user-friendly error message
    pub fn user_friendly_message(&self) -> String {
        match self {
            CryptoError::ConfigurationError { item, .. } => {
                format!("'{}' is not a usable algorithm configuration.", item)
            }
            CryptoError::AllocationError { what, .. } => {
                format!("Could not size the buffer for '{}'.", what)
            }
            CryptoError::EncodingError { what, .. } => {
                format!("The {} is malformed and cannot be decoded.", what)
            }
            CryptoError::KeyRecreateError { slot, .. } => {
                format!("The classical key in slot {} could not be restored.", slot)
            }
            CryptoError::BufferTooSmall {
                buffer, required, ..
            } => {
                format!(
                    "The {} buffer is too small. At least {} bytes are required.",
                    buffer, required
                )
            }
            CryptoError::AdapterFailure {
                adapter, operation, ..
            } => {
                format!(
                    "The {} implementation failed during '{}'. No partial result was produced.",
                    adapter, operation
                )
            }
            CryptoError::CompositeVerifyFailure { algorithm, .. } => {
                format!(
                    "The {} signature is not valid. Message authenticity cannot be verified.",
                    algorithm
                )
            }
        }
    }

    /// Get technical details for debugging
    pub fn technical_details(&self) -> HashMap<String, String> {
        let mut details = HashMap::new();

        details.insert("error_code".to_string(), self.error_code().to_string());
        details.insert("error_type".to_string(), self.error_type().to_string());
        details.insert("timestamp".to_string(), chrono::Utc::now().to_rfc3339());

        match self {
            CryptoError::AdapterFailure {
                adapter,
                operation,
                cause,
                context,
                ..
            } => {
                details.insert("adapter".to_string(), adapter.clone());
                details.insert("operation".to_string(), operation.clone());
                details.insert("cause".to_string(), cause.clone());
                details.extend(context.clone());
            }
            CryptoError::BufferTooSmall {
                buffer,
                required,
                provided,
                ..
            } => {
                details.insert("buffer".to_string(), buffer.clone());
                details.insert("required".to_string(), required.to_string());
                details.insert("provided".to_string(), provided.to_string());
            }
            CryptoError::KeyRecreateError { slot, cause, .. } => {
                details.insert("slot".to_string(), slot.to_string());
                details.insert("cause".to_string(), cause.clone());
            }
            _ => {
                details.insert("details".to_string(), format!("{:?}", self));
            }
        }

        details
    }

    /// Get suggested remediation steps
    pub fn suggested_remediation(&self) -> Option<String> {
        match self {
            CryptoError::ConfigurationError { error_code, .. } => match *error_code {
                error_codes::UNKNOWN_ALGORITHM => Some(
                    "Use one of the names listed by registry::algorithms().".to_string(),
                ),
                error_codes::CONTEXT_NOT_INITIALIZED => {
                    Some("Initialise the context with a key before use.".to_string())
                }
                _ => Some("Check that the key kind matches the requested operation.".to_string()),
            },
            CryptoError::BufferTooSmall { .. } => Some(
                "Call the operation without an output buffer first to learn the required size."
                    .to_string(),
            ),
            CryptoError::EncodingError { .. } | CryptoError::KeyRecreateError { .. } => Some(
                "Check that the bytes were produced for the same algorithm name.".to_string(),
            ),
            CryptoError::CompositeVerifyFailure { .. } => Some(
                "Verify the signature, message and public key are correct. Check for data tampering."
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// Get the error category/type as a string
    pub fn error_type(&self) -> &'static str {
        match self {
            CryptoError::ConfigurationError { .. } => "ConfigurationError",
            CryptoError::AllocationError { .. } => "AllocationError",
            CryptoError::EncodingError { .. } => "EncodingError",
            CryptoError::KeyRecreateError { .. } => "KeyRecreateError",
            CryptoError::BufferTooSmall { .. } => "BufferTooSmall",
            CryptoError::AdapterFailure { .. } => "AdapterFailure",
            CryptoError::CompositeVerifyFailure { .. } => "CompositeVerifyFailure",
        }
    }
}

/// Convenience constructors for common error types
impl CryptoError {
    pub fn configuration(item: &str, cause: &str, error_code: u32) -> Self {
        CryptoError::ConfigurationError {
            item: item.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn unknown_algorithm(name: &str) -> Self {
        Self::configuration(name, "no such algorithm", error_codes::UNKNOWN_ALGORITHM)
    }

    pub fn allocation(what: &str, cause: &str, error_code: u32) -> Self {
        CryptoError::AllocationError {
            what: what.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn encoding(what: &str, cause: &str, error_code: u32) -> Self {
        CryptoError::EncodingError {
            what: what.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn key_recreate(slot: usize, cause: &str, error_code: u32) -> Self {
        CryptoError::KeyRecreateError {
            slot,
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn buffer_too_small(buffer: &str, required: usize, provided: usize) -> Self {
        CryptoError::BufferTooSmall {
            buffer: buffer.to_string(),
            required,
            provided,
            error_code: error_codes::OUTPUT_BUFFER_TOO_SMALL,
        }
    }

    pub fn adapter(adapter: &str, operation: &str, cause: &str, error_code: u32) -> Self {
        CryptoError::AdapterFailure {
            adapter: adapter.to_string(),
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
            context: HashMap::new(),
        }
    }

    pub fn verify_failure(algorithm: &str) -> Self {
        CryptoError::CompositeVerifyFailure {
            algorithm: algorithm.to_string(),
            error_code: error_codes::SIGNATURE_INVALID,
        }
    }

    /// Attach a key/value pair to an adapter failure; other variants are returned unchanged
    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        if let CryptoError::AdapterFailure { context, .. } = &mut self {
            context.insert(key.to_string(), value.to_string());
        }
        self
    }
}

// From implementations for automatic error conversion
impl From<oqs::Error> for CryptoError {
    fn from(err: oqs::Error) -> Self {
        CryptoError::adapter(
            "liboqs",
            "library call",
            &err.to_string(),
            error_codes::PQC_LIBRARY_ERROR,
        )
    }
}

impl From<der::Error> for CryptoError {
    fn from(err: der::Error) -> Self {
        CryptoError::encoding("DER structure", &err.to_string(), error_codes::DER_DECODE_FAILED)
    }
}

/// Result type alias for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_generation() {
        let error = CryptoError::adapter(
            "P-256",
            "derive",
            "point at infinity",
            error_codes::CLASSICAL_DERIVE_FAILED,
        );
        assert_eq!(error.error_code(), error_codes::CLASSICAL_DERIVE_FAILED);
        assert_eq!(error.error_type(), "AdapterFailure");
    }

    #[test]
    fn test_user_friendly_message() {
        let error = CryptoError::buffer_too_small("signature", 2500, 64);
        let message = error.user_friendly_message();
        assert!(message.contains("2500"));
    }

    #[test]
    fn test_technical_details() {
        let error = CryptoError::adapter("ML-KEM-768", "encapsulate", "bad key", 6103)
            .with_context("slot", "1");
        let details = error.technical_details();
        assert!(details.contains_key("error_code"));
        assert!(details.contains_key("timestamp"));
        assert_eq!(details.get("slot").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_remediation_suggestions() {
        let error = CryptoError::unknown_algorithm("p999_mlkem768");
        let suggestion = error.suggested_remediation();
        assert!(suggestion.is_some());
        assert!(suggestion.unwrap().contains("registry"));
        assert!(CryptoError::adapter("RSA", "sign", "x", 6002)
            .suggested_remediation()
            .is_none());
    }

    #[test]
    fn test_der_error_maps_to_encoding() {
        let err: CryptoError = der::Error::from(der::ErrorKind::Failed).into();
        assert_eq!(err.error_type(), "EncodingError");
    }
}
