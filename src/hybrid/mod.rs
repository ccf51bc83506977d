//! Hybrid Classical/Post-Quantum Protocols
//!
//! This module drives the slots of a [`CompositeKey`](crate::composite::CompositeKey)
//! through the two combination protocols: hybrid key encapsulation and
//! hybrid/composite signatures. Each context picks its handler once, from the
//! key's kind, when it is constructed.

mod hybrid_kem;
mod hybrid_signature;

pub use hybrid_kem::{KemContext, KemState};

pub use hybrid_signature::{composite_message, split_hybrid_signature, SignatureContext};

use crate::error::CryptoError;

/// Record which slot an adapter failure came from
fn in_slot(index: usize) -> impl Fn(CryptoError) -> CryptoError {
    move |e| e.with_context("slot", &index.to_string())
}
