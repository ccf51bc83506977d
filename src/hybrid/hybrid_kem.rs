//! Hybrid Key Encapsulation Mechanism (KEM)
//!
//! Encapsulation runs the classical slot as an ephemeral-static key agreement
//! and the post-quantum slot as a KEM, then concatenates both outputs in slot
//! order:
//!
//! - ciphertext = classical ephemeral public key || PQC ciphertext
//! - shared secret = classical secret || PQC secret
//!
//! Plain KEM keys use the same context with only the post-quantum slot.

use std::fmt;

use crate::composite::SharedCompositeKey;
use crate::error::{error_codes, CryptoError, CryptoResult};
use crate::registry::KeyKind;
use crate::secure_memory::SecureBytes;
use crate::utils;

use super::in_slot;

/// Lifecycle of a [`KemContext`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KemState {
    Uninitialized,
    Initialized,
    EncapsulationDone,
    DecapsulationDone,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KemHandler {
    Plain,
    Hybrid,
}

/// Encapsulation and decapsulation over a plain or hybrid KEM key.
///
/// Every call is synchronous and atomic: on failure nothing is written to the
/// caller's buffers. A context can be reused after a completed operation.
///
/// # Example
///
/// ```no_run
/// use qasa_composite::composite::CompositeKey;
/// use qasa_composite::hybrid::KemContext;
///
/// let key = CompositeKey::generate("x25519_mlkem768").unwrap().into_shared();
/// let mut ctx = KemContext::with_key(key).unwrap();
/// let (ciphertext, sender_secret) = ctx.encapsulate_to_vec().unwrap();
/// let receiver_secret = ctx.decapsulate_to_vec(&ciphertext).unwrap();
/// assert_eq!(sender_secret, receiver_secret);
/// ```
pub struct KemContext {
    key: Option<SharedCompositeKey>,
    handler: KemHandler,
    state: KemState,
}

impl fmt::Debug for KemContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KemContext")
            .field("key", &self.key.as_ref().map(|k| k.name()))
            .field("state", &self.state)
            .finish()
    }
}

impl Default for KemContext {
    fn default() -> Self {
        Self::new()
    }
}

impl KemContext {
    /// An uninitialized context; call [`KemContext::init`] before use
    pub fn new() -> Self {
        Self {
            key: None,
            handler: KemHandler::Plain,
            state: KemState::Uninitialized,
        }
    }

    pub fn with_key(key: SharedCompositeKey) -> CryptoResult<Self> {
        let mut ctx = Self::new();
        ctx.init(key)?;
        Ok(ctx)
    }

    /// Bind a KEM key, replacing any previous one
    pub fn init(&mut self, key: SharedCompositeKey) -> CryptoResult<()> {
        self.handler = match key.kind() {
            KeyKind::PlainKem => KemHandler::Plain,
            KeyKind::HybridKem => KemHandler::Hybrid,
            other => {
                return Err(CryptoError::configuration(
                    key.name(),
                    &format!("{} key cannot encapsulate", other),
                    error_codes::WRONG_KEY_KIND,
                ))
            }
        };
        self.key = Some(key);
        self.state = KemState::Initialized;
        Ok(())
    }

    pub fn state(&self) -> KemState {
        self.state
    }

    pub fn key(&self) -> Option<&SharedCompositeKey> {
        self.key.as_ref()
    }

    fn bound_key(&self) -> CryptoResult<&SharedCompositeKey> {
        self.key.as_ref().ok_or_else(|| {
            CryptoError::configuration(
                "KEM context",
                "no key has been set",
                error_codes::CONTEXT_NOT_INITIALIZED,
            )
        })
    }

    /// Exact ciphertext length
    pub fn ciphertext_len(&self) -> CryptoResult<usize> {
        let key = self.bound_key()?;
        let pqc = key.pqc_engine().ciphertext_len();
        Ok(match self.handler {
            KemHandler::Plain => pqc,
            KemHandler::Hybrid => key.classical_slot()?.algorithm().ephemeral_len() + pqc,
        })
    }

    /// Exact shared secret length
    pub fn shared_secret_len(&self) -> CryptoResult<usize> {
        let key = self.bound_key()?;
        let pqc = key.pqc_engine().shared_secret_len();
        Ok(match self.handler {
            KemHandler::Plain => pqc,
            KemHandler::Hybrid => key.classical_slot()?.algorithm().shared_secret_len() + pqc,
        })
    }

    /// Encapsulate against the bound public key.
    ///
    /// Passing `None` for either buffer is a size query: the required
    /// `(ciphertext, secret)` lengths are returned and no cryptography runs.
    pub fn encapsulate(
        &mut self,
        ciphertext: Option<&mut [u8]>,
        secret: Option<&mut [u8]>,
    ) -> CryptoResult<(usize, usize)> {
        let ct_len = self.ciphertext_len()?;
        let ss_len = self.shared_secret_len()?;
        let (ciphertext, secret) = match (ciphertext, secret) {
            (Some(ciphertext), Some(secret)) => (ciphertext, secret),
            _ => {
                #[cfg(feature = "debug")]
                log::trace!("encapsulate size query: ciphertext {} secret {}", ct_len, ss_len);
                return Ok((ct_len, ss_len));
            }
        };
        if ciphertext.len() < ct_len {
            return Err(CryptoError::buffer_too_small("ciphertext", ct_len, ciphertext.len()));
        }
        if secret.len() < ss_len {
            return Err(CryptoError::buffer_too_small("shared secret", ss_len, secret.len()));
        }

        let (ct, ss) = self.run_encapsulate()?;
        utils::write_output(Some(ciphertext), &ct, "ciphertext")?;
        utils::write_output(Some(secret), ss.as_bytes(), "shared secret")?;
        self.state = KemState::EncapsulationDone;
        Ok((ct.len(), ss.len()))
    }

    /// Recover the shared secret from `ciphertext` with the bound private key.
    ///
    /// Passing `None` for the secret buffer is a size query.
    pub fn decapsulate(&mut self, ciphertext: &[u8], secret: Option<&mut [u8]>) -> CryptoResult<usize> {
        let ss_len = self.shared_secret_len()?;
        let secret = match secret {
            Some(secret) => secret,
            None => return Ok(ss_len),
        };
        if secret.len() < ss_len {
            return Err(CryptoError::buffer_too_small("shared secret", ss_len, secret.len()));
        }

        let ss = self.run_decapsulate(ciphertext)?;
        utils::write_output(Some(secret), ss.as_bytes(), "shared secret")?;
        self.state = KemState::DecapsulationDone;
        Ok(ss.len())
    }

    /// Encapsulate, allocating the outputs once from a size query
    pub fn encapsulate_to_vec(&mut self) -> CryptoResult<(Vec<u8>, SecureBytes)> {
        let (ct_len, ss_len) = self.encapsulate(None, None)?;
        let mut ciphertext = vec![0u8; ct_len];
        let mut secret = SecureBytes::zeroed(ss_len);
        let (ct_used, ss_used) = self.encapsulate(Some(&mut ciphertext), Some(secret.as_mut_bytes()))?;
        ciphertext.truncate(ct_used);
        secret.truncate(ss_used);
        Ok((ciphertext, secret))
    }

    /// Decapsulate, allocating the secret once from a size query
    pub fn decapsulate_to_vec(&mut self, ciphertext: &[u8]) -> CryptoResult<SecureBytes> {
        let ss_len = self.decapsulate(ciphertext, None)?;
        let mut secret = SecureBytes::zeroed(ss_len);
        let used = self.decapsulate(ciphertext, Some(secret.as_mut_bytes()))?;
        secret.truncate(used);
        Ok(secret)
    }

    fn run_encapsulate(&self) -> CryptoResult<(Vec<u8>, SecureBytes)> {
        let key = self.bound_key()?;
        let engine = key.pqc_engine();
        let pqc_public = key.pqc_public()?;

        match self.handler {
            KemHandler::Plain => {
                log::trace!("{}: PQC encapsulation", key.name());
                engine.encapsulate(pqc_public).map_err(in_slot(0))
            }
            KemHandler::Hybrid => {
                let classical = key.classical_slot()?;
                let classical_index = key.descriptor().classical_index().unwrap_or(0);
                let peer = key.comp_pub(classical_index).ok_or_else(|| {
                    CryptoError::configuration(
                        key.name(),
                        "classical public key is not present",
                        error_codes::MISSING_KEY_MATERIAL,
                    )
                })?;

                log::trace!("{}: classical ephemeral agreement", key.name());
                let (ephemeral, classical_secret) = classical
                    .algorithm()
                    .ephemeral_derive(peer)
                    .map_err(in_slot(classical_index))?;
                log::trace!("{}: PQC encapsulation", key.name());
                let (pqc_ciphertext, pqc_secret) = engine
                    .encapsulate(pqc_public)
                    .map_err(in_slot(key.descriptor().pqc_index()))?;

                let mut ciphertext = Vec::with_capacity(ephemeral.len() + pqc_ciphertext.len());
                ciphertext.extend_from_slice(&ephemeral);
                ciphertext.extend_from_slice(&pqc_ciphertext);
                Ok((ciphertext, join_secrets(&classical_secret, &pqc_secret)))
            }
        }
    }

    fn run_decapsulate(&self, ciphertext: &[u8]) -> CryptoResult<SecureBytes> {
        let expected = self.ciphertext_len()?;
        let key = self.bound_key()?;
        if ciphertext.len() != expected {
            return Err(CryptoError::encoding(
                &format!("{} ciphertext", key.name()),
                &format!("{} bytes, expected {}", ciphertext.len(), expected),
                error_codes::MALFORMED_CIPHERTEXT,
            ));
        }
        let engine = key.pqc_engine();
        let pqc_private = key.pqc_private()?;

        match self.handler {
            KemHandler::Plain => {
                log::trace!("{}: PQC decapsulation", key.name());
                engine.decapsulate(pqc_private, ciphertext).map_err(in_slot(0))
            }
            KemHandler::Hybrid => {
                let classical = key.classical_slot()?;
                let (ephemeral, pqc_ciphertext) =
                    ciphertext.split_at(classical.algorithm().ephemeral_len());

                log::trace!("{}: classical agreement", key.name());
                let descriptor = key.descriptor();
                let classical_secret = classical
                    .derive_secret(ephemeral)
                    .map_err(in_slot(descriptor.classical_index().unwrap_or(0)))?;
                log::trace!("{}: PQC decapsulation", key.name());
                let pqc_secret = engine
                    .decapsulate(pqc_private, pqc_ciphertext)
                    .map_err(in_slot(descriptor.pqc_index()))?;
                Ok(join_secrets(&classical_secret, &pqc_secret))
            }
        }
    }
}

fn join_secrets(classical: &SecureBytes, pqc: &SecureBytes) -> SecureBytes {
    let mut secret = SecureBytes::with_capacity(classical.len() + pqc.len());
    secret.extend_from_slice(classical.as_bytes());
    secret.extend_from_slice(pqc.as_bytes());
    secret
}
