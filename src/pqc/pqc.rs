use oqs::kem::{self, Kem};
use oqs::sig::{self, Sig};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{error_codes, CryptoError, CryptoResult};
use crate::secure_memory::SecureBytes;

/// Post-quantum algorithms that can occupy a PQC slot
///
/// # Security Levels
///
/// Every variant carries the NIST level claimed by its authors. The level
/// drives digest selection in the hybrid and composite signature protocols,
/// so it is recorded here explicitly rather than parsed from names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PqcAlgorithm {
    /// ML-KEM-512 (FIPS 203, level 1)
    MlKem512,
    /// ML-KEM-768 (FIPS 203, level 3)
    MlKem768,
    /// ML-KEM-1024 (FIPS 203, level 5)
    MlKem1024,
    /// Round 3 Kyber768 (level 3)
    Kyber768,
    /// ML-DSA-44 (FIPS 204, level 2)
    MlDsa44,
    /// ML-DSA-65 (FIPS 204, level 3)
    MlDsa65,
    /// ML-DSA-87 (FIPS 204, level 5)
    MlDsa87,
    /// Falcon-512 (level 1)
    Falcon512,
    /// Falcon-1024 (level 5)
    Falcon1024,
    /// SPHINCS+-SHA2-128f-simple (level 1)
    SphincsSha2128fSimple,
}

impl fmt::Display for PqcAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PqcAlgorithm::MlKem512 => "ML-KEM-512",
            PqcAlgorithm::MlKem768 => "ML-KEM-768",
            PqcAlgorithm::MlKem1024 => "ML-KEM-1024",
            PqcAlgorithm::Kyber768 => "Kyber768",
            PqcAlgorithm::MlDsa44 => "ML-DSA-44",
            PqcAlgorithm::MlDsa65 => "ML-DSA-65",
            PqcAlgorithm::MlDsa87 => "ML-DSA-87",
            PqcAlgorithm::Falcon512 => "Falcon-512",
            PqcAlgorithm::Falcon1024 => "Falcon-1024",
            PqcAlgorithm::SphincsSha2128fSimple => "SPHINCS+-SHA2-128f-simple",
        };
        write!(f, "{}", name)
    }
}

impl PqcAlgorithm {
    /// Whether this is a key encapsulation mechanism (otherwise a signature scheme)
    pub fn is_kem(&self) -> bool {
        self.oqs_kem().is_some()
    }

    /// NIST security level claimed for this algorithm (1 to 5)
    pub const fn nist_level(&self) -> u8 {
        match self {
            PqcAlgorithm::MlKem512 => 1,
            PqcAlgorithm::MlKem768 => 3,
            PqcAlgorithm::MlKem1024 => 5,
            PqcAlgorithm::Kyber768 => 3,
            PqcAlgorithm::MlDsa44 => 2,
            PqcAlgorithm::MlDsa65 => 3,
            PqcAlgorithm::MlDsa87 => 5,
            PqcAlgorithm::Falcon512 => 1,
            PqcAlgorithm::Falcon1024 => 5,
            PqcAlgorithm::SphincsSha2128fSimple => 1,
        }
    }

    /// Classical-equivalent strength in bits for the claimed level
    pub fn security_bits(&self) -> u32 {
        match self.nist_level() {
            1 | 2 => 128,
            3 | 4 => 192,
            _ => 256,
        }
    }

    // Module rank k of the lattice KEMs
    fn kem_rank(&self) -> Option<usize> {
        match self {
            PqcAlgorithm::MlKem512 => Some(2),
            PqcAlgorithm::MlKem768 | PqcAlgorithm::Kyber768 => Some(3),
            PqcAlgorithm::MlKem1024 => Some(4),
            _ => None,
        }
    }

    fn oqs_kem(&self) -> Option<kem::Algorithm> {
        match self {
            PqcAlgorithm::MlKem512 => Some(kem::Algorithm::MlKem512),
            PqcAlgorithm::MlKem768 => Some(kem::Algorithm::MlKem768),
            PqcAlgorithm::MlKem1024 => Some(kem::Algorithm::MlKem1024),
            PqcAlgorithm::Kyber768 => Some(kem::Algorithm::Kyber768),
            _ => None,
        }
    }

    fn oqs_sig(&self) -> Option<sig::Algorithm> {
        match self {
            PqcAlgorithm::MlDsa44 => Some(sig::Algorithm::MlDsa44),
            PqcAlgorithm::MlDsa65 => Some(sig::Algorithm::MlDsa65),
            PqcAlgorithm::MlDsa87 => Some(sig::Algorithm::MlDsa87),
            PqcAlgorithm::Falcon512 => Some(sig::Algorithm::Falcon512),
            PqcAlgorithm::Falcon1024 => Some(sig::Algorithm::Falcon1024),
            PqcAlgorithm::SphincsSha2128fSimple => Some(sig::Algorithm::SphincsSha2128fSimple),
            _ => None,
        }
    }

    /// Open a liboqs context for this algorithm.
    ///
    /// Opening a context performs no cryptography; it only loads the
    /// algorithm's parameters, so it is used to answer size querys.
    pub fn engine(&self) -> CryptoResult<PqcEngine> {
        oqs::init();
        let inner = match (self.oqs_kem(), self.oqs_sig()) {
            (Some(alg), _) => EngineInner::Kem(Kem::new(alg)?),
            (None, Some(alg)) => EngineInner::Sig(Sig::new(alg)?),
            (None, None) => {
                return Err(CryptoError::configuration(
                    &self.to_string(),
                    "no liboqs mapping",
                    error_codes::MISSING_ADAPTER,
                ))
            }
        };
        Ok(PqcEngine {
            algorithm: *self,
            inner,
        })
    }
}

enum EngineInner {
    Kem(Kem),
    Sig(Sig),
}

/// An owned liboqs context bound to one [`PqcAlgorithm`].
///
/// Each composite key owns its own engine; engines are never shared between keys.
pub struct PqcEngine {
    algorithm: PqcAlgorithm,
    inner: EngineInner,
}

impl fmt::Debug for PqcEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PqcEngine")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl PqcEngine {
    pub fn algorithm(&self) -> PqcAlgorithm {
        self.algorithm
    }

    pub fn public_key_len(&self) -> usize {
        match &self.inner {
            EngineInner::Kem(kem) => kem.length_public_key(),
            EngineInner::Sig(sig) => sig.length_public_key(),
        }
    }

    pub fn secret_key_len(&self) -> usize {
        match &self.inner {
            EngineInner::Kem(kem) => kem.length_secret_key(),
            EngineInner::Sig(sig) => sig.length_secret_key(),
        }
    }

    /// Maximum signature length (zero for a KEM)
    pub fn signature_len(&self) -> usize {
        match &self.inner {
            EngineInner::Kem(_) => 0,
            EngineInner::Sig(sig) => sig.length_signature(),
        }
    }

    /// Ciphertext length (zero for a signature scheme)
    pub fn ciphertext_len(&self) -> usize {
        match &self.inner {
            EngineInner::Kem(kem) => kem.length_ciphertext(),
            EngineInner::Sig(_) => 0,
        }
    }

    /// Shared secret length (zero for a signature scheme)
    pub fn shared_secret_len(&self) -> usize {
        match &self.inner {
            EngineInner::Kem(kem) => kem.length_shared_secret(),
            EngineInner::Sig(_) => 0,
        }
    }

    /// Generate a fresh key pair, returning `(public, secret)`
    pub fn keypair(&self) -> CryptoResult<(Vec<u8>, SecureBytes)> {
        let failed = |e: oqs::Error| {
            CryptoError::adapter(
                &self.algorithm.to_string(),
                "keygen",
                &e.to_string(),
                error_codes::PQC_KEYGEN_FAILED,
            )
        };
        match &self.inner {
            EngineInner::Kem(kem) => {
                let (pk, sk) = kem.keypair().map_err(failed)?;
                Ok((pk.into_vec(), SecureBytes::from_vec(sk.into_vec())))
            }
            EngineInner::Sig(sig) => {
                let (pk, sk) = sig.keypair().map_err(failed)?;
                Ok((pk.into_vec(), SecureBytes::from_vec(sk.into_vec())))
            }
        }
    }

    /// Sign `message` as-is; the scheme hashes internally
    pub fn sign(&self, secret_key: &[u8], message: &[u8]) -> CryptoResult<Vec<u8>> {
        let sig = self.sig("sign")?;
        let sk = sig.secret_key_from_bytes(secret_key).ok_or_else(|| {
            self.failure("sign", "secret key has the wrong length", error_codes::PQC_SIGN_FAILED)
        })?;
        let signature = sig.sign(message, sk).map_err(|e| {
            self.failure("sign", &e.to_string(), error_codes::PQC_SIGN_FAILED)
        })?;
        Ok(signature.into_vec())
    }

    /// Verify `signature` over `message`; malformed inputs count as invalid
    pub fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> CryptoResult<bool> {
        let sig = self.sig("verify")?;
        let pk = match sig.public_key_from_bytes(public_key) {
            Some(pk) => pk,
            None => return Ok(false),
        };
        let signature = match sig.signature_from_bytes(signature) {
            Some(signature) => signature,
            None => return Ok(false),
        };
        Ok(sig.verify(message, signature, pk).is_ok())
    }

    /// Encapsulate against `public_key`, returning `(ciphertext, shared_secret)`
    pub fn encapsulate(&self, public_key: &[u8]) -> CryptoResult<(Vec<u8>, SecureBytes)> {
        let kem = self.kem("encapsulate")?;
        let pk = kem.public_key_from_bytes(public_key).ok_or_else(|| {
            self.failure(
                "encapsulate",
                "public key has the wrong length",
                error_codes::PQC_ENCAPSULATION_FAILED,
            )
        })?;
        let (ct, ss) = kem.encapsulate(pk).map_err(|e| {
            self.failure("encapsulate", &e.to_string(), error_codes::PQC_ENCAPSULATION_FAILED)
        })?;
        Ok((ct.into_vec(), SecureBytes::from_vec(ss.into_vec())))
    }

    /// Recover the shared secret carried by `ciphertext`
    pub fn decapsulate(&self, secret_key: &[u8], ciphertext: &[u8]) -> CryptoResult<SecureBytes> {
        let kem = self.kem("decapsulate")?;
        let sk = kem.secret_key_from_bytes(secret_key).ok_or_else(|| {
            self.failure(
                "decapsulate",
                "secret key has the wrong length",
                error_codes::PQC_DECAPSULATION_FAILED,
            )
        })?;
        let ct = kem.ciphertext_from_bytes(ciphertext).ok_or_else(|| {
            self.failure(
                "decapsulate",
                "ciphertext has the wrong length",
                error_codes::PQC_DECAPSULATION_FAILED,
            )
        })?;
        let ss = kem.decapsulate(sk, ct).map_err(|e| {
            self.failure("decapsulate", &e.to_string(), error_codes::PQC_DECAPSULATION_FAILED)
        })?;
        Ok(SecureBytes::from_vec(ss.into_vec()))
    }

    /// Public key carried inside a secret key.
    ///
    /// ML-KEM and Kyber secret keys are `dk_pke || ek || H(ek) || z`, with
    /// `dk_pke` of 384k bytes, so `ek` can be read back. Signature schemes
    /// give `None`.
    pub fn public_from_secret(&self, secret_key: &[u8]) -> Option<Vec<u8>> {
        let k = self.algorithm.kem_rank()?;
        if secret_key.len() != self.secret_key_len() {
            return None;
        }
        let start = 384 * k;
        let end = start + self.public_key_len();
        secret_key.get(start..end).map(|ek| ek.to_vec())
    }

    fn kem(&self, operation: &str) -> CryptoResult<&Kem> {
        match &self.inner {
            EngineInner::Kem(kem) => Ok(kem),
            EngineInner::Sig(_) => Err(CryptoError::configuration(
                &self.algorithm.to_string(),
                &format!("{} needs a KEM", operation),
                error_codes::WRONG_KEY_KIND,
            )),
        }
    }

    fn sig(&self, operation: &str) -> CryptoResult<&Sig> {
        match &self.inner {
            EngineInner::Sig(sig) => Ok(sig),
            EngineInner::Kem(_) => Err(CryptoError::configuration(
                &self.algorithm.to_string(),
                &format!("{} needs a signature scheme", operation),
                error_codes::WRONG_KEY_KIND,
            )),
        }
    }

    fn failure(&self, operation: &str, cause: &str, error_code: u32) -> CryptoError {
        CryptoError::adapter(&self.algorithm.to_string(), operation, cause, error_code)
    }
}
