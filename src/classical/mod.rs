/*!
 * Classical slot adapter
 *
 * Key generation, signing, verification and key agreement for the classical
 * half of a hybrid or composite key. EC and RSA use the RustCrypto crates,
 * Ed25519 uses ring and X25519 uses x25519-dalek.
 */

mod classical;

pub use classical::*;
