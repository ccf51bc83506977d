//! Hybrid and Composite Signatures
//!
//! Two wire formats combine a classical and a post-quantum signature:
//!
//! - **Hybrid**: the classical slot signs a digest of the message chosen by
//!   the PQC component's NIST level, the PQC slot signs the raw message, and
//!   the result is `u32be(len(classical)) || classical || pqc`.
//! - **Composite**: the message is pre-hashed once and prefixed with the DER
//!   composite OID; every slot signs that prefixed digest and the signatures
//!   are carried in a DER `SEQUENCE { BIT STRING, BIT STRING }`.
//!
//! Plain signature keys sign the message with the PQC slot alone.

use std::fmt;

use crate::composite::{codec, SharedCompositeKey};
use crate::error::{error_codes, CryptoError, CryptoResult};
use crate::registry::{AlgorithmDescriptor, KeyKind};
use crate::utils::{self, LENGTH_PREFIX_SIZE};

use super::in_slot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SignatureHandler {
    Plain,
    Hybrid,
    Composite,
}

/// Signing and verification bound to one signature key.
///
/// # Example
///
/// ```no_run
/// use qasa_composite::composite::CompositeKey;
/// use qasa_composite::hybrid::SignatureContext;
///
/// let key = CompositeKey::generate("mldsa65_p256").unwrap().into_shared();
/// let ctx = SignatureContext::new(key).unwrap();
/// let signature = ctx.sign_to_vec(b"attack at dawn").unwrap();
/// assert!(ctx.verify(b"attack at dawn", &signature).is_ok());
/// ```
pub struct SignatureContext {
    key: SharedCompositeKey,
    handler: SignatureHandler,
}

impl fmt::Debug for SignatureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureContext")
            .field("key", &self.key.name())
            .field("handler", &self.handler)
            .finish()
    }
}

impl SignatureContext {
    pub fn new(key: SharedCompositeKey) -> CryptoResult<Self> {
        let handler = match key.kind() {
            KeyKind::PlainSig => SignatureHandler::Plain,
            KeyKind::HybridSig => SignatureHandler::Hybrid,
            KeyKind::CompositeSig => SignatureHandler::Composite,
            other => {
                return Err(CryptoError::configuration(
                    key.name(),
                    &format!("{} key cannot sign", other),
                    error_codes::WRONG_KEY_KIND,
                ))
            }
        };
        Ok(Self { key, handler })
    }

    pub fn key(&self) -> &SharedCompositeKey {
        &self.key
    }

    /// Upper bound on the signature length; exact when every slot's signature has a fixed size
    pub fn max_signature_len(&self) -> CryptoResult<usize> {
        let pqc = self.key.pqc_engine().signature_len();
        Ok(match self.handler {
            SignatureHandler::Plain => pqc,
            SignatureHandler::Hybrid => {
                LENGTH_PREFIX_SIZE + self.key.classical_slot()?.algorithm().signature_len() + pqc
            }
            SignatureHandler::Composite => {
                let classical = self.key.classical_slot()?.algorithm().signature_len();
                if self.key.descriptor().pqc_index() == 0 {
                    codec::max_encoded_len(pqc, classical)
                } else {
                    codec::max_encoded_len(classical, pqc)
                }
            }
        })
    }

    /// Sign `message`, writing the signature into `signature`.
    ///
    /// With no buffer this is a size query returning [`max_signature_len`]
    /// without doing any cryptography. Otherwise the buffer must hold the
    /// maximum length and the number of bytes written is returned.
    ///
    /// [`max_signature_len`]: SignatureContext::max_signature_len
    pub fn sign(&self, message: &[u8], signature: Option<&mut [u8]>) -> CryptoResult<usize> {
        let max = self.max_signature_len()?;
        let signature = match signature {
            Some(signature) => signature,
            None => {
                #[cfg(feature = "debug")]
                log::trace!("{}: signature size query {}", self.key.name(), max);
                return Ok(max);
            }
        };
        if signature.len() < max {
            return Err(CryptoError::buffer_too_small("signature", max, signature.len()));
        }

        let produced = match self.handler {
            SignatureHandler::Plain => {
                log::trace!("{}: PQC sign", self.key.name());
                self.key
                    .pqc_engine()
                    .sign(self.key.pqc_private()?, message)
                    .map_err(in_slot(0))?
            }
            SignatureHandler::Hybrid => self.sign_hybrid(message)?,
            SignatureHandler::Composite => self.sign_composite(message)?,
        };
        utils::write_output(Some(signature), &produced, "signature")
    }

    /// Sign, allocating the output once from a size query
    pub fn sign_to_vec(&self, message: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut signature = vec![0u8; self.sign(message, None)?];
        let used = self.sign(message, Some(&mut signature))?;
        signature.truncate(used);
        Ok(signature)
    }

    /// Verify `signature` over `message`.
    ///
    /// Malformed framing is an `EncodingError`; a well-formed signature that
    /// does not verify in every slot is a `CompositeVerifyFailure`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> CryptoResult<()> {
        let valid = match self.handler {
            SignatureHandler::Plain => {
                log::trace!("{}: PQC verify", self.key.name());
                self.key
                    .pqc_engine()
                    .verify(self.key.pqc_public()?, message, signature)?
            }
            SignatureHandler::Hybrid => self.verify_hybrid(message, signature)?,
            SignatureHandler::Composite => self.verify_composite(message, signature)?,
        };
        if valid {
            Ok(())
        } else {
            Err(CryptoError::verify_failure(self.key.name()))
        }
    }

    fn sign_hybrid(&self, message: &[u8]) -> CryptoResult<Vec<u8>> {
        let key = &self.key;
        let descriptor = key.descriptor();
        let hash = descriptor.hybrid_digest();
        let digest = hash.digest(message);

        log::trace!("{}: classical sign over {} digest", key.name(), hash);
        let classical = key
            .classical_slot()?
            .sign_prehashed(&digest, hash)
            .map_err(in_slot(descriptor.classical_index().unwrap_or(0)))?;
        log::trace!("{}: PQC sign", key.name());
        let pqc = key
            .pqc_engine()
            .sign(key.pqc_private()?, message)
            .map_err(in_slot(descriptor.pqc_index()))?;

        let prefix = utils::length_prefix(classical.len(), "hybrid signature")?;
        let mut signature = Vec::with_capacity(LENGTH_PREFIX_SIZE + classical.len() + pqc.len());
        signature.extend_from_slice(&prefix);
        signature.extend_from_slice(&classical);
        signature.extend_from_slice(&pqc);
        Ok(signature)
    }

    fn verify_hybrid(&self, message: &[u8], signature: &[u8]) -> CryptoResult<bool> {
        let key = &self.key;
        let classical_key = key.classical_slot()?;
        let (classical, pqc) = split_hybrid_signature(key.descriptor(), signature)?;

        let hash = key.descriptor().hybrid_digest();
        let digest = hash.digest(message);
        let classical_ok = classical_key.verify_prehashed(&digest, hash, classical)?;
        let pqc_ok = key.pqc_engine().verify(key.pqc_public()?, message, pqc)?;
        Ok(classical_ok && pqc_ok)
    }

    fn sign_composite(&self, message: &[u8]) -> CryptoResult<Vec<u8>> {
        let key = &self.key;
        let descriptor = key.descriptor();
        let prefixed = composite_message(descriptor, message)?;
        let hash = descriptor.composite_digest();

        log::trace!("{}: PQC sign over prefixed {} digest", key.name(), hash);
        let pqc = key
            .pqc_engine()
            .sign(key.pqc_private()?, &prefixed)
            .map_err(in_slot(descriptor.pqc_index()))?;
        log::trace!("{}: classical sign", key.name());
        let classical = key
            .classical_slot()?
            .sign_message(&prefixed, hash)
            .map_err(in_slot(descriptor.classical_index().unwrap_or(1)))?;

        if descriptor.pqc_index() == 0 {
            codec::encode(&pqc, &classical)
        } else {
            codec::encode(&classical, &pqc)
        }
    }

    fn verify_composite(&self, message: &[u8], signature: &[u8]) -> CryptoResult<bool> {
        let key = &self.key;
        let descriptor = key.descriptor();
        let (first, second) = codec::decode(signature)?;
        let (pqc, classical) = if descriptor.pqc_index() == 0 {
            (first, second)
        } else {
            (second, first)
        };

        let prefixed = composite_message(descriptor, message)?;
        let hash = descriptor.composite_digest();
        let pqc_ok = key.pqc_engine().verify(key.pqc_public()?, &prefixed, &pqc)?;
        let classical_ok = key.classical_slot()?.verify_message(&prefixed, hash, &classical)?;
        Ok(pqc_ok && classical_ok)
    }
}

/// The message every composite slot signs: the DER composite OID followed by
/// the composite pre-hash of `message`
pub fn composite_message(descriptor: &AlgorithmDescriptor, message: &[u8]) -> CryptoResult<Vec<u8>> {
    let oid = descriptor.composite_oid().ok_or_else(|| {
        CryptoError::configuration(
            descriptor.name,
            "algorithm has no composite OID",
            error_codes::WRONG_KEY_KIND,
        )
    })?;
    let digest = descriptor.composite_digest().digest(message);
    let mut prefixed = Vec::with_capacity(oid.len() + digest.len());
    prefixed.extend_from_slice(&oid);
    prefixed.extend_from_slice(&digest);
    Ok(prefixed)
}

/// Split a hybrid signature into its classical and PQC parts, checking the
/// framing against the descriptor's declared lengths
pub fn split_hybrid_signature<'a>(
    descriptor: &AlgorithmDescriptor,
    signature: &'a [u8],
) -> CryptoResult<(&'a [u8], &'a [u8])> {
    let what = format!("{} signature", descriptor.name);
    let malformed = |cause: String| CryptoError::encoding(&what, &cause, error_codes::MALFORMED_SIGNATURE);
    let classical = descriptor.classical.ok_or_else(|| {
        CryptoError::configuration(descriptor.name, "key has no classical slot", error_codes::WRONG_KEY_KIND)
    })?;

    let classical_len = utils::read_length_prefix(signature, &what, error_codes::MALFORMED_SIGNATURE)?;
    let classical_max = classical.signature_len();
    let length_ok = if classical.fixed_signature_len() {
        classical_len == classical_max
    } else {
        classical_len > 0 && classical_len <= classical_max
    };
    if !length_ok {
        return Err(malformed(format!(
            "classical signature is {} bytes, declared {}",
            classical_len, classical_max
        )));
    }

    let rest = &signature[LENGTH_PREFIX_SIZE..];
    if rest.len() <= classical_len {
        return Err(malformed("signature is truncated".to_string()));
    }
    let (classical_sig, pqc_sig) = rest.split_at(classical_len);
    let pqc_max = descriptor.pqc.engine()?.signature_len();
    if pqc_sig.len() > pqc_max {
        return Err(malformed(format!(
            "post-quantum signature is {} bytes, maximum {}",
            pqc_sig.len(),
            pqc_max
        )));
    }
    Ok((classical_sig, pqc_sig))
}
