//! Utilities shared by the key composer and the protocols

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;

use crate::error::{error_codes, CryptoError, CryptoResult};

/// Size of the big-endian length prefix used by the hybrid layouts
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Message digests used to pre-hash before classical signing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Hash `data` with this algorithm
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Output length in bytes
    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Internal block size in bytes
    pub fn block_size(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 64,
            DigestAlgorithm::Sha384 | DigestAlgorithm::Sha512 => 128,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestAlgorithm::Sha256 => write!(f, "SHA-256"),
            DigestAlgorithm::Sha384 => write!(f, "SHA-384"),
            DigestAlgorithm::Sha512 => write!(f, "SHA-512"),
        }
    }
}

/// Encode a component length as the 4-byte big-endian prefix
pub fn length_prefix(len: usize, what: &str) -> CryptoResult<[u8; LENGTH_PREFIX_SIZE]> {
    let len = u32::try_from(len).map_err(|_| {
        CryptoError::allocation(what, "length does not fit in 32 bits", error_codes::LENGTH_OVERFLOW)
    })?;
    Ok(len.to_be_bytes())
}

/// Read the 4-byte big-endian prefix at the start of `data`
pub fn read_length_prefix(data: &[u8], what: &str, error_code: u32) -> CryptoResult<usize> {
    let prefix: [u8; LENGTH_PREFIX_SIZE] = data
        .get(..LENGTH_PREFIX_SIZE)
        .and_then(|p| p.try_into().ok())
        .ok_or_else(|| CryptoError::encoding(what, "missing 4-byte length prefix", error_code))?;
    Ok(u32::from_be_bytes(prefix) as usize)
}

/// Length of a DER TLV whose value is `content_len` bytes long
pub fn der_tlv_len(content_len: usize) -> usize {
    let length_octets = match content_len {
        0..=0x7f => 1,
        0x80..=0xff => 2,
        0x100..=0xffff => 3,
        0x1_0000..=0xff_ffff => 4,
        _ => 5,
    };
    1 + length_octets + content_len
}

/// Copy `src` into an optional caller buffer, failing if it does not fit.
///
/// Returns the number of bytes `src` occupies whether or not a buffer was given.
pub fn write_output(out: Option<&mut [u8]>, src: &[u8], buffer: &str) -> CryptoResult<usize> {
    if let Some(out) = out {
        if out.len() < src.len() {
            return Err(CryptoError::buffer_too_small(buffer, src.len(), out.len()));
        }
        out[..src.len()].copy_from_slice(src);
    }
    Ok(src.len())
}

/// Check an optional caller buffer against the size a call will need
pub fn check_output(out: &Option<&mut [u8]>, required: usize, buffer: &str) -> CryptoResult<()> {
    match out {
        Some(out) if out.len() < required => {
            Err(CryptoError::buffer_too_small(buffer, required, out.len()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_prefix_roundtrip() {
        let prefix = length_prefix(65, "key").unwrap();
        assert_eq!(prefix, [0, 0, 0, 65]);
        let mut data = prefix.to_vec();
        data.extend_from_slice(&[0xAA; 65]);
        assert_eq!(read_length_prefix(&data, "key", 0).unwrap(), 65);
    }

    #[test]
    fn test_read_length_prefix_too_short() {
        assert!(read_length_prefix(&[0, 0, 1], "key", 0).is_err());
    }

    #[test]
    fn test_der_tlv_len() {
        assert_eq!(der_tlv_len(0), 2);
        assert_eq!(der_tlv_len(127), 129);
        assert_eq!(der_tlv_len(128), 131);
        assert_eq!(der_tlv_len(300), 304);
        assert_eq!(der_tlv_len(70_000), 70_005);
    }

    #[test]
    fn test_digest_lengths() {
        for alg in [DigestAlgorithm::Sha256, DigestAlgorithm::Sha384, DigestAlgorithm::Sha512] {
            assert_eq!(alg.digest(b"abc").len(), alg.output_len());
        }
        assert_eq!(
            hex::encode(DigestAlgorithm::Sha256.digest(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_write_output() {
        let mut small = [0u8; 2];
        assert!(write_output(Some(&mut small), &[1, 2, 3], "sig").is_err());
        let mut big = [0u8; 4];
        assert_eq!(write_output(Some(&mut big), &[1, 2, 3], "sig").unwrap(), 3);
        assert_eq!(&big[..3], &[1, 2, 3]);
        assert_eq!(write_output(None, &[1, 2, 3], "sig").unwrap(), 3);
    }
}
