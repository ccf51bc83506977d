//! DER codec for composite signatures and component key sequences
//!
//! A composite signature is `SEQUENCE { BIT STRING, BIT STRING }` holding the
//! two component signatures in slot order. At the key boundary the component
//! encodings travel as `SEQUENCE OF BIT STRING` (public keys) or
//! `SEQUENCE OF OCTET STRING` (private keys).

use der::asn1::{BitString, OctetString};
use der::{Decode, Encode, Sequence};
use zeroize::Zeroize;

use super::layout::KeyPart;
use crate::error::{error_codes, CryptoError, CryptoResult};
use crate::secure_memory::SecureBytes;
use crate::utils::der_tlv_len;

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct CompositeSignatureValue {
    first: BitString,
    second: BitString,
}

fn bit_string(bytes: &[u8], what: &str) -> CryptoResult<BitString> {
    BitString::from_bytes(bytes)
        .map_err(|e| CryptoError::encoding(what, &e.to_string(), error_codes::DER_ENCODE_FAILED))
}

// Only whole-byte bit strings are valid here
fn bit_string_bytes<'a>(value: &'a BitString, what: &str) -> CryptoResult<&'a [u8]> {
    value.as_bytes().ok_or_else(|| {
        CryptoError::encoding(what, "bit string has unused bits", error_codes::MALFORMED_SIGNATURE)
    })
}

/// DER-encode the two component signatures
pub fn encode(first: &[u8], second: &[u8]) -> CryptoResult<Vec<u8>> {
    let value = CompositeSignatureValue {
        first: bit_string(first, "composite signature")?,
        second: bit_string(second, "composite signature")?,
    };
    value.to_der().map_err(|e| {
        CryptoError::encoding("composite signature", &e.to_string(), error_codes::DER_ENCODE_FAILED)
    })
}

/// Parse a composite signature into its two component signatures
pub fn decode(der: &[u8]) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
    let value = CompositeSignatureValue::from_der(der).map_err(|e| {
        CryptoError::encoding("composite signature", &e.to_string(), error_codes::MALFORMED_SIGNATURE)
    })?;
    let first = bit_string_bytes(&value.first, "composite signature")?.to_vec();
    let second = bit_string_bytes(&value.second, "composite signature")?.to_vec();
    Ok((first, second))
}

/// Exact DER size of a composite signature with components of `first` and `second` bytes
pub fn max_encoded_len(first: usize, second: usize) -> usize {
    // each BIT STRING carries one extra unused-bits octet
    der_tlv_len(der_tlv_len(first + 1) + der_tlv_len(second + 1))
}

/// Wrap per-slot key encodings in a DER `SEQUENCE OF`
pub fn encode_key_sequence(part: KeyPart, components: &[&[u8]]) -> CryptoResult<SecureBytes> {
    let failed = |e: der::Error| {
        CryptoError::encoding("component key sequence", &e.to_string(), error_codes::DER_ENCODE_FAILED)
    };
    match part {
        KeyPart::Public => {
            let sequence = components
                .iter()
                .map(|c| bit_string(c, "component key sequence"))
                .collect::<CryptoResult<Vec<_>>>()?;
            Ok(SecureBytes::from_vec(sequence.to_der().map_err(failed)?))
        }
        KeyPart::Private => {
            let sequence = components
                .iter()
                .map(|c| OctetString::new(c.to_vec()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(failed)?;
            let encoded = sequence.to_der().map_err(failed);
            scrub(sequence);
            Ok(SecureBytes::from_vec(encoded?))
        }
    }
}

/// Unwrap a DER `SEQUENCE OF` into per-slot key encodings
pub fn decode_key_sequence(part: KeyPart, der: &[u8]) -> CryptoResult<Vec<SecureBytes>> {
    match part {
        KeyPart::Public => Vec::<BitString>::from_der(der)?
            .iter()
            .map(|b| bit_string_bytes(b, "component key sequence").map(SecureBytes::new))
            .collect(),
        KeyPart::Private => {
            let sequence = Vec::<OctetString>::from_der(der)?;
            let components = sequence.iter().map(|o| SecureBytes::new(o.as_bytes())).collect();
            scrub(sequence);
            Ok(components)
        }
    }
}

fn scrub(sequence: Vec<OctetString>) {
    for octets in sequence {
        octets.into_bytes().zeroize();
    }
}
