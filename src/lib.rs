/*!
 * QaSa Composite Cryptography
 *
 * Hybrid and composite public-key primitives that pair one classical
 * algorithm with one post-quantum algorithm in a single logical key.
 *
 * - Hybrid KEMs (P-256/P-384/X25519 with ML-KEM or Kyber) concatenate an
 *   ephemeral key agreement with a post-quantum encapsulation.
 * - Hybrid signatures (EC or RSA with ML-DSA, Falcon or SPHINCS+) carry a
 *   length-prefixed classical signature followed by the post-quantum one.
 * - Composite signatures (ML-DSA or Falcon with RSA, ECDSA or Ed25519) sign
 *   an OID-prefixed digest in every slot and ship both signatures as a DER
 *   `SEQUENCE { BIT STRING, BIT STRING }`.
 *
 * Algorithms are selected by combined name, for example `p256_mlkem768` or
 * `mldsa65_p256`; see [`registry::algorithms`] for the full list.
 */

/// Registry of combined algorithm names
pub mod registry;

/// Classical slot adapter (EC, X25519, Ed25519, RSA)
pub mod classical;

/// Post-quantum slot adapter over liboqs
pub mod pqc;

/// Composite key material, wire layouts and DER codec
pub mod composite;

/// Hybrid KEM and hybrid/composite signature protocols
pub mod hybrid;

/// Common error types
pub mod error;

/// Secure memory handling utilities
pub mod secure_memory;

/// Shared helpers
pub mod utils;

pub use composite::{CompositeKey, KeyPart, SharedCompositeKey};
pub use error::{CryptoError, CryptoResult};
pub use hybrid::{KemContext, SignatureContext};
pub use registry::KeyKind;

/// Initialize the library.
///
/// Initializes liboqs and builds the algorithm registry index. Calling it is
/// optional, since both happen lazily on first use, but doing it up front
/// keeps that one-time cost out of the first real operation.
///
/// # Example
///
/// ```
/// use qasa_composite::prelude::*;
///
/// fn main() -> Result<(), CryptoError> {
///     init()?;
///     Ok(())
/// }
/// ```
pub fn init() -> Result<(), CryptoError> {
    oqs::init();
    registry::force();
    log::debug!("qasa-composite initialized");
    Ok(())
}

/// Everyday types in one import
pub mod prelude {
    pub use crate::composite::{CompositeKey, KeyPart, SharedCompositeKey};
    pub use crate::error::{CryptoError, CryptoResult};
    pub use crate::hybrid::{KemContext, KemState, SignatureContext};
    pub use crate::init;
    pub use crate::registry::{algorithms, lookup, AlgorithmDescriptor, KeyKind};
    pub use crate::secure_memory::SecureBytes;
}
