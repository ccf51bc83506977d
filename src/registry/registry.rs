use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::table::ALGORITHMS;
use crate::classical::ClassicalAlgorithm;
use crate::error::{CryptoError, CryptoResult};
use crate::pqc::PqcAlgorithm;
use crate::utils::DigestAlgorithm;

/// DER encoding of the composite signature OID arc `2.16.840.1.114027.80.8.1`,
/// tag and length included; the final byte is the per-algorithm arc.
pub const COMPOSITE_OID_PREFIX: [u8; 12] = [
    0x06, 0x0B, 0x60, 0x86, 0x48, 0x01, 0x86, 0xFA, 0x6B, 0x50, 0x08, 0x01,
];

/// Total length of a composite OID prefix
pub const COMPOSITE_OID_LEN: usize = COMPOSITE_OID_PREFIX.len() + 1;

/// How the slots of a key are combined
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyKind {
    /// A single post-quantum KEM
    PlainKem,
    /// A single post-quantum signature scheme
    PlainSig,
    /// Classical key agreement plus post-quantum KEM, length-prefixed layout
    HybridKem,
    /// Classical plus post-quantum signature, length-prefixed layout
    HybridSig,
    /// Post-quantum plus classical signature, ASN.1 dual bit-string layout
    CompositeSig,
}

impl KeyKind {
    pub fn is_kem(&self) -> bool {
        matches!(self, KeyKind::PlainKem | KeyKind::HybridKem)
    }

    pub fn is_hybrid(&self) -> bool {
        matches!(self, KeyKind::HybridKem | KeyKind::HybridSig)
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::PlainKem => write!(f, "plain KEM"),
            KeyKind::PlainSig => write!(f, "plain signature"),
            KeyKind::HybridKem => write!(f, "hybrid KEM"),
            KeyKind::HybridSig => write!(f, "hybrid signature"),
            KeyKind::CompositeSig => write!(f, "composite signature"),
        }
    }
}

/// The algorithm occupying one slot of a key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotAlgorithm {
    Classical(ClassicalAlgorithm),
    Pqc(PqcAlgorithm),
}

/// One registry entry
#[derive(Debug, PartialEq, Eq)]
pub struct AlgorithmDescriptor {
    /// Canonical combined name
    pub name: &'static str,
    pub kind: KeyKind,
    pub pqc: PqcAlgorithm,
    /// Absent for plain keys
    pub classical: Option<ClassicalAlgorithm>,
    /// NIST level claimed for the post-quantum component
    pub pqc_level: u8,
    /// Final arc of the composite OID, composite signatures only
    pub composite_arc: Option<u8>,
}

impl AlgorithmDescriptor {
    pub fn numkeys(&self) -> usize {
        if self.classical.is_some() {
            2
        } else {
            1
        }
    }

    /// Slot index of the post-quantum component.
    ///
    /// Hybrid keys put the classical slot first, composite keys the PQC slot.
    pub fn pqc_index(&self) -> usize {
        if self.kind.is_hybrid() {
            1
        } else {
            0
        }
    }

    /// Slot index of the classical component, if any
    pub fn classical_index(&self) -> Option<usize> {
        self.classical.map(|_| 1 - self.pqc_index())
    }

    /// Algorithm in slot `index`
    pub fn slot(&self, index: usize) -> Option<SlotAlgorithm> {
        if index == self.pqc_index() {
            Some(SlotAlgorithm::Pqc(self.pqc))
        } else if Some(index) == self.classical_index() {
            self.classical.map(SlotAlgorithm::Classical)
        } else {
            None
        }
    }

    /// Slot algorithms in wire order
    pub fn slots(&self) -> Vec<SlotAlgorithm> {
        (0..self.numkeys()).filter_map(|i| self.slot(i)).collect()
    }

    /// Claimed strength: the weaker of the two components
    pub fn security_bits(&self) -> u32 {
        let pqc_bits = match self.pqc_level {
            1 | 2 => 128,
            3 | 4 => 192,
            _ => 256,
        };
        match self.classical {
            Some(classical) => pqc_bits.min(classical.security_bits()),
            None => pqc_bits,
        }
    }

    /// Digest the classical slot signs in the hybrid signature layout
    pub fn hybrid_digest(&self) -> DigestAlgorithm {
        match self.pqc_level {
            1 => DigestAlgorithm::Sha256,
            2 | 3 => DigestAlgorithm::Sha384,
            _ => DigestAlgorithm::Sha512,
        }
    }

    /// Pre-hash applied once in the composite signature layout
    pub fn composite_digest(&self) -> DigestAlgorithm {
        let ed_slot = self.classical.map_or(false, |c| c.is_ed());
        if self.pqc_level >= 3 || ed_slot {
            DigestAlgorithm::Sha512
        } else {
            DigestAlgorithm::Sha256
        }
    }

    /// DER-encoded composite OID used as the domain separator, composite signatures only
    pub fn composite_oid(&self) -> Option<[u8; COMPOSITE_OID_LEN]> {
        self.composite_arc.map(|arc| {
            let mut oid = [0u8; COMPOSITE_OID_LEN];
            oid[..COMPOSITE_OID_PREFIX.len()].copy_from_slice(&COMPOSITE_OID_PREFIX);
            oid[COMPOSITE_OID_PREFIX.len()] = arc;
            oid
        })
    }

    /// Serializable summary of this entry
    pub fn info(&self) -> AlgorithmInfo {
        AlgorithmInfo {
            name: self.name.to_string(),
            kind: self.kind,
            slots: self.slots(),
            pqc_level: self.pqc_level,
            security_bits: self.security_bits(),
            composite_oid: self
                .composite_arc
                .map(|arc| format!("2.16.840.1.114027.80.8.1.{}", arc)),
        }
    }
}

/// Serializable description of a registered algorithm
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmInfo {
    pub name: String,
    pub kind: KeyKind,
    pub slots: Vec<SlotAlgorithm>,
    pub pqc_level: u8,
    pub security_bits: u32,
    pub composite_oid: Option<String>,
}

static REGISTRY: Lazy<HashMap<&'static str, &'static AlgorithmDescriptor>> = Lazy::new(|| {
    let map: HashMap<_, _> = ALGORITHMS.iter().map(|d| (d.name, d)).collect();
    log::debug!("algorithm registry built with {} entries", map.len());
    map
});

/// Look up a combined algorithm name
pub fn lookup(name: &str) -> CryptoResult<&'static AlgorithmDescriptor> {
    REGISTRY
        .get(name)
        .copied()
        .ok_or_else(|| CryptoError::unknown_algorithm(name))
}

/// Every registered algorithm, in table order
pub fn algorithms() -> impl Iterator<Item = &'static AlgorithmDescriptor> {
    ALGORITHMS.iter()
}

pub fn algorithms_of_kind(kind: KeyKind) -> impl Iterator<Item = &'static AlgorithmDescriptor> {
    algorithms().filter(move |d| d.kind == kind)
}

/// Build the lookup index now rather than on first use
pub(crate) fn force() {
    Lazy::force(&REGISTRY);
}
