//! Secure Memory Handling Utilities
//!
//! Private key buffers and shared secrets live in [`SecureBytes`], which is
//! zeroed when dropped. Because composite keys are shared through `Arc`, the
//! zeroing happens exactly once, when the last reference goes away.

use std::fmt;
use std::ops::Range;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A byte container for sensitive data that is securely zeroed on drop.
///
/// # Security Properties
///
/// 1. Automatically zeroes memory when dropped
/// 2. Prevents contents from being inadvertently logged or displayed
/// 3. Truncation zeroes the discarded tail before shrinking
///
/// # Example
///
/// ```
/// use qasa_composite::secure_memory::SecureBytes;
///
/// let key = SecureBytes::new(&[0x01, 0x02, 0x03, 0x04]);
/// assert_eq!(key.len(), 4);
/// ```
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureBytes {
    bytes: Vec<u8>,
}

impl SecureBytes {
    /// Create a new SecureBytes holding a copy of `data`
    pub fn new(data: &[u8]) -> Self {
        Self {
            bytes: data.to_vec(),
        }
    }

    /// Create a zero-filled buffer of `len` bytes
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: vec![0u8; len],
        }
    }

    /// Take ownership of an existing vector
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow a sub-range, returning `None` if it is out of bounds
    pub fn slice(&self, range: Range<usize>) -> Option<&[u8]> {
        self.bytes.get(range)
    }

    /// Shrink to `len` bytes, zeroing the discarded tail first
    pub fn truncate(&mut self, len: usize) {
        if len < self.bytes.len() {
            self.bytes[len..].zeroize();
            self.bytes.truncate(len);
        }
    }

    /// Append bytes to the end of the buffer.
    ///
    /// Capacity is reserved up front by callers that know the final size, so
    /// a reallocation never leaves a stale copy behind.
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        if self.bytes.capacity() - self.bytes.len() < data.len() {
            let mut grown = Vec::with_capacity(self.bytes.len() + data.len());
            grown.extend_from_slice(&self.bytes);
            self.bytes.zeroize();
            self.bytes = grown;
        }
        self.bytes.extend_from_slice(data);
    }

    /// Create an empty buffer with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }
}

impl AsRef<[u8]> for SecureBytes {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq for SecureBytes {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;
        self.bytes.len() == other.bytes.len() && bool::from(self.bytes.ct_eq(&other.bytes))
    }
}

impl Eq for SecureBytes {}

// Never print the contents
impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureBytes([REDACTED; {}])", self.bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_prefix() {
        let mut buf = SecureBytes::new(&[1, 2, 3, 4, 5]);
        buf.truncate(2);
        assert_eq!(buf.as_bytes(), &[1, 2]);
        buf.truncate(10);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_extend_grows() {
        let mut buf = SecureBytes::with_capacity(2);
        buf.extend_from_slice(&[1, 2]);
        buf.extend_from_slice(&[3, 4, 5]);
        assert_eq!(buf.as_bytes(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_debug_is_redacted() {
        let buf = SecureBytes::new(b"secret");
        let shown = format!("{:?}", buf);
        assert!(!shown.contains("secret"));
        assert!(shown.contains("REDACTED"));
    }

    #[test]
    fn test_constant_time_equality() {
        assert_eq!(SecureBytes::new(&[9; 32]), SecureBytes::new(&[9; 32]));
        assert_ne!(SecureBytes::new(&[9; 32]), SecureBytes::new(&[9; 31]));
        assert_ne!(SecureBytes::new(&[9; 32]), SecureBytes::new(&[8; 32]));
    }
}
