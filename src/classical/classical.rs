use rand::rngs::OsRng;
use rand::RngCore;
use ring::signature::{Ed25519KeyPair, KeyPair, UnparsedPublicKey, ED25519};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};
use std::fmt;

use crate::error::{error_codes, CryptoError, CryptoResult};
use crate::secure_memory::SecureBytes;
use crate::utils::DigestAlgorithm;

/// Classical algorithms that can occupy a classical slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassicalAlgorithm {
    /// NIST P-256 (ECDH or ECDSA)
    P256,
    /// NIST P-384 (ECDH or ECDSA)
    P384,
    /// X25519 key agreement
    X25519,
    /// Ed25519 signatures
    Ed25519,
    /// RSA-2048 with PKCS#1 v1.5 signatures
    Rsa2048,
    /// RSA-3072 with PKCS#1 v1.5 signatures
    Rsa3072,
    /// RSA-2048 with PSS signatures
    RsaPss2048,
    /// RSA-3072 with PSS signatures
    RsaPss3072,
}

/// Wire key type of a classical slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyFamily {
    /// SEC1 point public key, SEC1 `ECPrivateKey` DER private key
    Ec,
    /// Raw 32-byte keys
    X25519,
    /// Raw 32-byte keys (seed as private key)
    Ed25519,
    /// PKCS#1 DER keys
    Rsa,
}

/// RSA signature padding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsaPadding {
    Pkcs1v15,
    Pss,
}

impl fmt::Display for ClassicalAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassicalAlgorithm::P256 => write!(f, "P-256"),
            ClassicalAlgorithm::P384 => write!(f, "P-384"),
            ClassicalAlgorithm::X25519 => write!(f, "X25519"),
            ClassicalAlgorithm::Ed25519 => write!(f, "Ed25519"),
            ClassicalAlgorithm::Rsa2048 => write!(f, "RSA-2048"),
            ClassicalAlgorithm::Rsa3072 => write!(f, "RSA-3072"),
            ClassicalAlgorithm::RsaPss2048 => write!(f, "RSA-PSS-2048"),
            ClassicalAlgorithm::RsaPss3072 => write!(f, "RSA-PSS-3072"),
        }
    }
}

impl ClassicalAlgorithm {
    pub fn family(&self) -> KeyFamily {
        match self {
            ClassicalAlgorithm::P256 | ClassicalAlgorithm::P384 => KeyFamily::Ec,
            ClassicalAlgorithm::X25519 => KeyFamily::X25519,
            ClassicalAlgorithm::Ed25519 => KeyFamily::Ed25519,
            _ => KeyFamily::Rsa,
        }
    }

    /// Edwards-curve signature algorithms sign messages without a separate pre-hash
    pub fn is_ed(&self) -> bool {
        matches!(self, ClassicalAlgorithm::Ed25519)
    }

    /// Whether keys are imported as raw bytes rather than DER
    pub fn uses_raw_keys(&self) -> bool {
        matches!(self.family(), KeyFamily::X25519 | KeyFamily::Ed25519)
    }

    pub fn supports_derive(&self) -> bool {
        matches!(self.family(), KeyFamily::Ec | KeyFamily::X25519)
    }

    pub fn supports_sign(&self) -> bool {
        !matches!(self.family(), KeyFamily::X25519)
    }

    pub fn rsa_padding(&self) -> Option<RsaPadding> {
        match self {
            ClassicalAlgorithm::Rsa2048 | ClassicalAlgorithm::Rsa3072 => Some(RsaPadding::Pkcs1v15),
            ClassicalAlgorithm::RsaPss2048 | ClassicalAlgorithm::RsaPss3072 => Some(RsaPadding::Pss),
            _ => None,
        }
    }

    fn rsa_bits(&self) -> usize {
        match self {
            ClassicalAlgorithm::Rsa2048 | ClassicalAlgorithm::RsaPss2048 => 2048,
            _ => 3072,
        }
    }

    /// Public key length; exact for EC and raw keys, the family maximum for RSA
    pub fn public_key_len(&self) -> usize {
        match self {
            ClassicalAlgorithm::P256 => 65,
            ClassicalAlgorithm::P384 => 97,
            ClassicalAlgorithm::X25519 | ClassicalAlgorithm::Ed25519 => 32,
            ClassicalAlgorithm::Rsa2048 | ClassicalAlgorithm::RsaPss2048 => 270,
            ClassicalAlgorithm::Rsa3072 | ClassicalAlgorithm::RsaPss3072 => 398,
        }
    }

    /// Private key length; exact for raw keys, the family maximum for DER encodings
    pub fn private_key_len(&self) -> usize {
        match self {
            ClassicalAlgorithm::P256 => 121,
            ClassicalAlgorithm::P384 => 167,
            ClassicalAlgorithm::X25519 | ClassicalAlgorithm::Ed25519 => 32,
            ClassicalAlgorithm::Rsa2048 | ClassicalAlgorithm::RsaPss2048 => 1194,
            ClassicalAlgorithm::Rsa3072 | ClassicalAlgorithm::RsaPss3072 => 1770,
        }
    }

    /// Maximum signature length (zero when the algorithm cannot sign)
    pub fn signature_len(&self) -> usize {
        match self {
            ClassicalAlgorithm::P256 => 72,
            ClassicalAlgorithm::P384 => 104,
            ClassicalAlgorithm::X25519 => 0,
            ClassicalAlgorithm::Ed25519 => 64,
            ClassicalAlgorithm::Rsa2048 | ClassicalAlgorithm::RsaPss2048 => 256,
            ClassicalAlgorithm::Rsa3072 | ClassicalAlgorithm::RsaPss3072 => 384,
        }
    }

    /// Whether every public key has exactly `public_key_len` bytes
    pub fn fixed_public_len(&self) -> bool {
        self.family() != KeyFamily::Rsa
    }

    /// Whether every private key has exactly `private_key_len` bytes
    pub fn fixed_private_len(&self) -> bool {
        self.uses_raw_keys()
    }

    /// Whether every signature has exactly `signature_len` bytes
    pub fn fixed_signature_len(&self) -> bool {
        !matches!(self.family(), KeyFamily::Ec)
    }

    /// Shared secret length (zero when the algorithm cannot derive)
    pub fn shared_secret_len(&self) -> usize {
        match self {
            ClassicalAlgorithm::P256 | ClassicalAlgorithm::X25519 => 32,
            ClassicalAlgorithm::P384 => 48,
            _ => 0,
        }
    }

    /// Length of the ephemeral public key sent as the classical ciphertext
    pub fn ephemeral_len(&self) -> usize {
        if self.supports_derive() {
            self.public_key_len()
        } else {
            0
        }
    }

    pub fn security_bits(&self) -> u32 {
        match self {
            ClassicalAlgorithm::P384 => 192,
            ClassicalAlgorithm::Rsa2048 | ClassicalAlgorithm::RsaPss2048 => 112,
            _ => 128,
        }
    }

    /// Generate a fresh key pair
    pub fn generate(&self) -> CryptoResult<ClassicalKey> {
        let material = match self {
            ClassicalAlgorithm::P256 => {
                let secret = p256_ops::generate();
                KeyMaterial::P256 {
                    public: secret.public_key(),
                    secret: Some(secret),
                }
            }
            ClassicalAlgorithm::P384 => {
                let secret = p384_ops::generate();
                KeyMaterial::P384 {
                    public: secret.public_key(),
                    secret: Some(secret),
                }
            }
            ClassicalAlgorithm::X25519 => {
                let secret = x25519_dalek::StaticSecret::random_from_rng(OsRng);
                KeyMaterial::X25519 {
                    public: x25519_dalek::PublicKey::from(&secret),
                    secret: Some(secret),
                }
            }
            ClassicalAlgorithm::Ed25519 => {
                let mut seed = SecureBytes::zeroed(32);
                OsRng.fill_bytes(seed.as_mut_bytes());
                let public = ed25519_public(&seed, 0)?;
                KeyMaterial::Ed25519 {
                    seed: Some(seed),
                    public,
                }
            }
            _ => {
                let secret = RsaPrivateKey::new(&mut OsRng, self.rsa_bits()).map_err(|e| {
                    CryptoError::adapter(
                        &self.to_string(),
                        "keygen",
                        &e.to_string(),
                        error_codes::CLASSICAL_KEYGEN_FAILED,
                    )
                })?;
                KeyMaterial::Rsa {
                    public: secret.to_public_key(),
                    secret: Some(secret),
                }
            }
        };
        Ok(ClassicalKey {
            algorithm: *self,
            material,
        })
    }

    /// Rebuild a key from its private encoding, re-deriving the public half.
    ///
    /// `slot` only labels errors.
    pub fn decode_private(&self, bytes: &[u8], slot: usize) -> CryptoResult<ClassicalKey> {
        self.check_encoded_len(bytes.len(), self.private_key_len(), self.fixed_private_len(), slot, "private")?;
        let bad = |what: &str| {
            CryptoError::key_recreate(
                slot,
                &format!("{} private key: {}", self, what),
                error_codes::CLASSICAL_DECODE_FAILED,
            )
        };
        let material = match self {
            ClassicalAlgorithm::P256 => {
                let secret = p256::SecretKey::from_sec1_der(bytes).map_err(|e| bad(&e.to_string()))?;
                KeyMaterial::P256 {
                    public: secret.public_key(),
                    secret: Some(secret),
                }
            }
            ClassicalAlgorithm::P384 => {
                let secret = p384::SecretKey::from_sec1_der(bytes).map_err(|e| bad(&e.to_string()))?;
                KeyMaterial::P384 {
                    public: secret.public_key(),
                    secret: Some(secret),
                }
            }
            ClassicalAlgorithm::X25519 => {
                let raw: [u8; 32] = bytes.try_into().map_err(|_| bad("expected 32 bytes"))?;
                let secret = x25519_dalek::StaticSecret::from(raw);
                KeyMaterial::X25519 {
                    public: x25519_dalek::PublicKey::from(&secret),
                    secret: Some(secret),
                }
            }
            ClassicalAlgorithm::Ed25519 => {
                let seed = SecureBytes::new(bytes);
                let public = ed25519_public(&seed, slot)?;
                KeyMaterial::Ed25519 {
                    seed: Some(seed),
                    public,
                }
            }
            _ => {
                let secret = RsaPrivateKey::from_pkcs1_der(bytes).map_err(|e| bad(&e.to_string()))?;
                self.check_rsa_modulus(secret.size(), slot)?;
                KeyMaterial::Rsa {
                    public: secret.to_public_key(),
                    secret: Some(secret),
                }
            }
        };
        Ok(ClassicalKey {
            algorithm: *self,
            material,
        })
    }

    /// Rebuild a public-only key from its public encoding
    pub fn decode_public(&self, bytes: &[u8], slot: usize) -> CryptoResult<ClassicalKey> {
        self.check_encoded_len(bytes.len(), self.public_key_len(), self.fixed_public_len(), slot, "public")?;
        let bad = |what: &str| {
            CryptoError::key_recreate(
                slot,
                &format!("{} public key: {}", self, what),
                error_codes::CLASSICAL_DECODE_FAILED,
            )
        };
        let material = match self {
            ClassicalAlgorithm::P256 => KeyMaterial::P256 {
                secret: None,
                public: p256::PublicKey::from_sec1_bytes(bytes).map_err(|e| bad(&e.to_string()))?,
            },
            ClassicalAlgorithm::P384 => KeyMaterial::P384 {
                secret: None,
                public: p384::PublicKey::from_sec1_bytes(bytes).map_err(|e| bad(&e.to_string()))?,
            },
            ClassicalAlgorithm::X25519 => {
                let raw: [u8; 32] = bytes.try_into().map_err(|_| bad("expected 32 bytes"))?;
                KeyMaterial::X25519 {
                    secret: None,
                    public: x25519_dalek::PublicKey::from(raw),
                }
            }
            ClassicalAlgorithm::Ed25519 => KeyMaterial::Ed25519 {
                seed: None,
                public: bytes.try_into().map_err(|_| bad("expected 32 bytes"))?,
            },
            _ => {
                let public = RsaPublicKey::from_pkcs1_der(bytes).map_err(|e| bad(&e.to_string()))?;
                self.check_rsa_modulus(public.size(), slot)?;
                KeyMaterial::Rsa {
                    secret: None,
                    public,
                }
            }
        };
        Ok(ClassicalKey {
            algorithm: *self,
            material,
        })
    }

    /// Generate an ephemeral key, agree with `peer_public` and return
    /// `(ephemeral_public, shared_secret)`
    pub fn ephemeral_derive(&self, peer_public: &[u8]) -> CryptoResult<(Vec<u8>, SecureBytes)> {
        if !self.supports_derive() {
            return Err(CryptoError::configuration(
                &self.to_string(),
                "algorithm cannot derive shared secrets",
                error_codes::WRONG_KEY_KIND,
            ));
        }
        let ephemeral = self.generate()?;
        let secret = ephemeral.derive_secret(peer_public)?;
        Ok((ephemeral.encode_public()?, secret))
    }

    fn check_encoded_len(&self, len: usize, declared: usize, fixed: bool, slot: usize, part: &str) -> CryptoResult<()> {
        let fits = if fixed { len == declared } else { len > 0 && len <= declared };
        if fits {
            Ok(())
        } else {
            Err(CryptoError::key_recreate(
                slot,
                &format!("{} {} key is {} bytes, declared {}", self, part, len, declared),
                error_codes::CLASSICAL_SIZE_MISMATCH,
            ))
        }
    }

    fn check_rsa_modulus(&self, modulus_bytes: usize, slot: usize) -> CryptoResult<()> {
        if modulus_bytes * 8 == self.rsa_bits() {
            Ok(())
        } else {
            Err(CryptoError::key_recreate(
                slot,
                &format!("{} key has a {}-bit modulus", self, modulus_bytes * 8),
                error_codes::CLASSICAL_SIZE_MISMATCH,
            ))
        }
    }
}

fn ed25519_public(seed: &SecureBytes, slot: usize) -> CryptoResult<[u8; 32]> {
    let pair = Ed25519KeyPair::from_seed_unchecked(seed.as_bytes()).map_err(|e| {
        CryptoError::key_recreate(slot, &format!("Ed25519 seed: {}", e), error_codes::CLASSICAL_DECODE_FAILED)
    })?;
    let mut public = [0u8; 32];
    public.copy_from_slice(pair.public_key().as_ref());
    Ok(public)
}

enum KeyMaterial {
    P256 {
        secret: Option<p256::SecretKey>,
        public: p256::PublicKey,
    },
    P384 {
        secret: Option<p384::SecretKey>,
        public: p384::PublicKey,
    },
    X25519 {
        secret: Option<x25519_dalek::StaticSecret>,
        public: x25519_dalek::PublicKey,
    },
    Ed25519 {
        seed: Option<SecureBytes>,
        public: [u8; 32],
    },
    Rsa {
        secret: Option<RsaPrivateKey>,
        public: RsaPublicKey,
    },
}

/// Opaque classical key object held by a classical slot.
///
/// Always carries the public half; the private half is present when the key
/// was generated or imported from private bytes. Secrets are zeroized on drop
/// by their owning crates.
pub struct ClassicalKey {
    algorithm: ClassicalAlgorithm,
    material: KeyMaterial,
}

impl fmt::Debug for ClassicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassicalKey")
            .field("algorithm", &self.algorithm)
            .field("has_private", &self.has_private())
            .finish()
    }
}

impl ClassicalKey {
    pub fn algorithm(&self) -> ClassicalAlgorithm {
        self.algorithm
    }

    pub fn has_private(&self) -> bool {
        match &self.material {
            KeyMaterial::P256 { secret, .. } => secret.is_some(),
            KeyMaterial::P384 { secret, .. } => secret.is_some(),
            KeyMaterial::X25519 { secret, .. } => secret.is_some(),
            KeyMaterial::Ed25519 { seed, .. } => seed.is_some(),
            KeyMaterial::Rsa { secret, .. } => secret.is_some(),
        }
    }

    /// Encode the public half in its wire form
    pub fn encode_public(&self) -> CryptoResult<Vec<u8>> {
        match &self.material {
            KeyMaterial::P256 { public, .. } => Ok(p256_ops::encode_public(public)),
            KeyMaterial::P384 { public, .. } => Ok(p384_ops::encode_public(public)),
            KeyMaterial::X25519 { public, .. } => Ok(public.as_bytes().to_vec()),
            KeyMaterial::Ed25519 { public, .. } => Ok(public.to_vec()),
            KeyMaterial::Rsa { public, .. } => public
                .to_pkcs1_der()
                .map(|doc| doc.as_bytes().to_vec())
                .map_err(|e| self.failure("encode public key", &e.to_string(), error_codes::DER_ENCODE_FAILED)),
        }
    }

    /// Encode the private half in its wire form
    pub fn encode_private(&self) -> CryptoResult<SecureBytes> {
        let encoded = match &self.material {
            KeyMaterial::P256 {
                secret: Some(secret),
                ..
            } => p256_ops::encode_private(secret),
            KeyMaterial::P384 {
                secret: Some(secret),
                ..
            } => p384_ops::encode_private(secret),
            KeyMaterial::X25519 {
                secret: Some(secret),
                ..
            } => Ok(SecureBytes::new(secret.as_bytes())),
            KeyMaterial::Ed25519 { seed: Some(seed), .. } => Ok(seed.clone()),
            KeyMaterial::Rsa {
                secret: Some(secret),
                ..
            } => secret
                .to_pkcs1_der()
                .map(|doc| SecureBytes::new(doc.as_bytes()))
                .map_err(|e| e.to_string()),
            _ => return Err(self.missing_private()),
        };
        encoded.map_err(|e| self.failure("encode private key", &e, error_codes::DER_ENCODE_FAILED))
    }

    /// Sign an already-computed digest of the message.
    ///
    /// Ed25519 has no pre-hash mode, so it signs the digest bytes as its message.
    pub fn sign_prehashed(&self, digest: &[u8], hash: DigestAlgorithm) -> CryptoResult<Vec<u8>> {
        let signed = match &self.material {
            KeyMaterial::P256 {
                secret: Some(secret),
                ..
            } => p256_ops::sign_prehash(secret, digest),
            KeyMaterial::P384 {
                secret: Some(secret),
                ..
            } => p384_ops::sign_prehash(secret, digest),
            KeyMaterial::Ed25519 { seed: Some(seed), .. } => Ed25519KeyPair::from_seed_unchecked(seed.as_bytes())
                .map(|pair| pair.sign(digest).as_ref().to_vec())
                .map_err(|e| e.to_string()),
            KeyMaterial::Rsa {
                secret: Some(secret),
                ..
            } => {
                let signed = match self.algorithm.rsa_padding() {
                    Some(RsaPadding::Pss) => secret.sign_with_rng(&mut OsRng, pss(hash), digest),
                    _ => secret.sign(pkcs1v15(hash), digest),
                };
                signed.map_err(|e| e.to_string())
            }
            KeyMaterial::X25519 { .. } => {
                return Err(CryptoError::configuration(
                    &self.algorithm.to_string(),
                    "algorithm cannot sign",
                    error_codes::WRONG_KEY_KIND,
                ))
            }
            _ => return Err(self.missing_private()),
        };
        signed.map_err(|e| self.failure("sign", &e, error_codes::CLASSICAL_SIGN_FAILED))
    }

    /// Sign a message, hashing it with `hash` first unless the algorithm is Ed-based
    pub fn sign_message(&self, message: &[u8], hash: DigestAlgorithm) -> CryptoResult<Vec<u8>> {
        if self.algorithm.is_ed() {
            self.sign_prehashed(message, hash)
        } else {
            self.sign_prehashed(&hash.digest(message), hash)
        }
    }

    /// Verify a signature over an already-computed digest
    pub fn verify_prehashed(&self, digest: &[u8], hash: DigestAlgorithm, signature: &[u8]) -> CryptoResult<bool> {
        let valid = match &self.material {
            KeyMaterial::P256 { public, .. } => p256_ops::verify_prehash(public, digest, signature),
            KeyMaterial::P384 { public, .. } => p384_ops::verify_prehash(public, digest, signature),
            KeyMaterial::Ed25519 { public, .. } => UnparsedPublicKey::new(&ED25519, public)
                .verify(digest, signature)
                .is_ok(),
            KeyMaterial::Rsa { public, .. } => match self.algorithm.rsa_padding() {
                Some(RsaPadding::Pss) => public.verify(pss(hash), digest, signature).is_ok(),
                _ => public.verify(pkcs1v15(hash), digest, signature).is_ok(),
            },
            KeyMaterial::X25519 { .. } => {
                return Err(CryptoError::configuration(
                    &self.algorithm.to_string(),
                    "algorithm cannot verify",
                    error_codes::WRONG_KEY_KIND,
                ))
            }
        };
        Ok(valid)
    }

    /// Verify a signature produced by [`ClassicalKey::sign_message`]
    pub fn verify_message(&self, message: &[u8], hash: DigestAlgorithm, signature: &[u8]) -> CryptoResult<bool> {
        if self.algorithm.is_ed() {
            self.verify_prehashed(message, hash, signature)
        } else {
            self.verify_prehashed(&hash.digest(message), hash, signature)
        }
    }

    /// Agree on a shared secret with a peer's encoded public key
    pub fn derive_secret(&self, peer_public: &[u8]) -> CryptoResult<SecureBytes> {
        let peer_failure = |cause: &str| self.failure("derive", cause, error_codes::CLASSICAL_DERIVE_FAILED);
        match &self.material {
            KeyMaterial::P256 {
                secret: Some(secret),
                ..
            } => {
                let peer = p256::PublicKey::from_sec1_bytes(peer_public)
                    .map_err(|_| peer_failure("peer public key is not a P-256 point"))?;
                Ok(p256_ops::diffie_hellman(secret, &peer))
            }
            KeyMaterial::P384 {
                secret: Some(secret),
                ..
            } => {
                let peer = p384::PublicKey::from_sec1_bytes(peer_public)
                    .map_err(|_| peer_failure("peer public key is not a P-384 point"))?;
                Ok(p384_ops::diffie_hellman(secret, &peer))
            }
            KeyMaterial::X25519 {
                secret: Some(secret),
                ..
            } => {
                let raw: [u8; 32] = peer_public
                    .try_into()
                    .map_err(|_| peer_failure("peer public key must be 32 bytes"))?;
                let shared = secret.diffie_hellman(&x25519_dalek::PublicKey::from(raw));
                if !shared.was_contributory() {
                    return Err(peer_failure("peer public key is a low-order point"));
                }
                Ok(SecureBytes::new(shared.as_bytes()))
            }
            KeyMaterial::Ed25519 { .. } | KeyMaterial::Rsa { .. } => Err(CryptoError::configuration(
                &self.algorithm.to_string(),
                "algorithm cannot derive shared secrets",
                error_codes::WRONG_KEY_KIND,
            )),
            _ => Err(self.missing_private()),
        }
    }

    fn missing_private(&self) -> CryptoError {
        CryptoError::configuration(
            &self.algorithm.to_string(),
            "operation needs the private key",
            error_codes::MISSING_KEY_MATERIAL,
        )
    }

    fn failure(&self, operation: &str, cause: &str, error_code: u32) -> CryptoError {
        CryptoError::adapter(&self.algorithm.to_string(), operation, cause, error_code)
    }
}

fn pkcs1v15(hash: DigestAlgorithm) -> Pkcs1v15Sign {
    match hash {
        DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

fn pss(hash: DigestAlgorithm) -> Pss {
    match hash {
        DigestAlgorithm::Sha256 => Pss::new::<Sha256>(),
        DigestAlgorithm::Sha384 => Pss::new::<Sha384>(),
        DigestAlgorithm::Sha512 => Pss::new::<Sha512>(),
    }
}

// P-256 and P-384 share every operation; only the curve crate differs.
macro_rules! nist_curve_ops {
    ($module:ident, $curve:ident) => {
        mod $module {
            use crate::secure_memory::SecureBytes;
            use $curve::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
            use $curve::ecdsa::{Signature, SigningKey, VerifyingKey};
            use $curve::elliptic_curve::sec1::ToEncodedPoint;
            use $curve::{PublicKey, SecretKey};
            use rand::rngs::OsRng;

            pub fn generate() -> SecretKey {
                SecretKey::random(&mut OsRng)
            }

            pub fn encode_public(public: &PublicKey) -> Vec<u8> {
                public.to_encoded_point(false).as_bytes().to_vec()
            }

            pub fn encode_private(secret: &SecretKey) -> Result<SecureBytes, String> {
                secret
                    .to_sec1_der()
                    .map(|der| SecureBytes::new(&der))
                    .map_err(|e| e.to_string())
            }

            pub fn sign_prehash(secret: &SecretKey, digest: &[u8]) -> Result<Vec<u8>, String> {
                let signing_key = SigningKey::from(secret);
                let signature: Signature = signing_key.sign_prehash(digest).map_err(|e| e.to_string())?;
                Ok(signature.to_der().as_bytes().to_vec())
            }

            pub fn verify_prehash(public: &PublicKey, digest: &[u8], signature: &[u8]) -> bool {
                let verifying_key = match VerifyingKey::from_affine(*public.as_affine()) {
                    Ok(key) => key,
                    Err(_) => return false,
                };
                match Signature::from_der(signature) {
                    Ok(signature) => verifying_key.verify_prehash(digest, &signature).is_ok(),
                    Err(_) => false,
                }
            }

            pub fn diffie_hellman(secret: &SecretKey, peer: &PublicKey) -> SecureBytes {
                let shared = $curve::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
                SecureBytes::new(shared.raw_secret_bytes())
            }
        }
    };
}

nist_curve_ops!(p256_ops, p256);
nist_curve_ops!(p384_ops, p384);
